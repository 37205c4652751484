// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Fixed vertex layouts.
//!
//! Attributes always appear in the order position, texture coordinate, colour.
//! Positions and texture coordinates are `f32`, colours are four `u8` channels
//! in RGBA order that shaders read as normalized values.

use crate::math::{Rgba8, Vec2, Vec3};

/// The closed set of vertex layouts accepted by the draw dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// Position and texture coordinate.
    PositionTexture,
    /// Position and colour.
    PositionColour,
    /// Position, texture coordinate and colour.
    PositionTextureColour,
}

impl VertexFormat {
    /// Size of one vertex in bytes.
    #[inline]
    pub const fn stride(self) -> usize {
        match self {
            VertexFormat::PositionTexture => 20,
            VertexFormat::PositionColour => 16,
            VertexFormat::PositionTextureColour => 24,
        }
    }

    /// Returns `true` if the layout carries a texture coordinate.
    #[inline]
    pub const fn has_tex_coord(self) -> bool {
        !matches!(self, VertexFormat::PositionColour)
    }

    /// Returns `true` if the layout carries a per-vertex colour.
    #[inline]
    pub const fn has_colour(self) -> bool {
        !matches!(self, VertexFormat::PositionTexture)
    }

    /// Byte offset of the texture coordinate, if present.
    #[inline]
    pub const fn tex_coord_offset(self) -> Option<usize> {
        if self.has_tex_coord() {
            Some(12)
        } else {
            None
        }
    }

    /// Byte offset of the colour, if present.
    #[inline]
    pub const fn colour_offset(self) -> Option<usize> {
        match self {
            VertexFormat::PositionTexture => None,
            VertexFormat::PositionColour => Some(12),
            VertexFormat::PositionTextureColour => Some(20),
        }
    }
}

/// A plain-old-data vertex type with a fixed [`VertexFormat`].
pub trait Vertex: bytemuck::Pod {
    /// The layout of this vertex type.
    const FORMAT: VertexFormat;
}

/// A vertex with a position and a texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct VertexPosTex {
    /// Position.
    pub position: Vec3,
    /// Texture coordinate.
    pub uv: Vec2,
}

impl VertexPosTex {
    /// Creates a vertex from raw components.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, u: f32, v: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            uv: Vec2::new(u, v),
        }
    }
}

impl Vertex for VertexPosTex {
    const FORMAT: VertexFormat = VertexFormat::PositionTexture;
}

/// A vertex with a position and a colour.
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct VertexPosCol {
    /// Position.
    pub position: Vec3,
    /// Colour.
    pub colour: Rgba8,
}

impl VertexPosCol {
    /// Creates a vertex from raw components.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, colour: Rgba8) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            colour,
        }
    }
}

impl Vertex for VertexPosCol {
    const FORMAT: VertexFormat = VertexFormat::PositionColour;
}

/// A vertex with a position, a texture coordinate and a colour.
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct VertexPosTexCol {
    /// Position.
    pub position: Vec3,
    /// Texture coordinate.
    pub uv: Vec2,
    /// Colour.
    pub colour: Rgba8,
}

impl VertexPosTexCol {
    /// Creates a vertex from raw components.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, u: f32, v: f32, colour: Rgba8) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            uv: Vec2::new(u, v),
            colour,
        }
    }
}

impl Vertex for VertexPosTexCol {
    const FORMAT: VertexFormat = VertexFormat::PositionTextureColour;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn strides_match_struct_sizes() {
        assert_eq!(size_of::<VertexPosTex>(), VertexFormat::PositionTexture.stride());
        assert_eq!(size_of::<VertexPosCol>(), VertexFormat::PositionColour.stride());
        assert_eq!(
            size_of::<VertexPosTexCol>(),
            VertexFormat::PositionTextureColour.stride()
        );
    }

    #[test]
    fn colour_sits_after_position_and_uv() {
        let v = VertexPosTexCol::new(1.0, 2.0, 3.0, 0.5, 0.25, Rgba8::new(9, 8, 7, 6));
        let bytes = bytemuck::bytes_of(&v);
        let offset = VertexFormat::PositionTextureColour.colour_offset().unwrap();
        assert_eq!(&bytes[offset..offset + 4], &[9, 8, 7, 6]);
        assert_eq!(VertexFormat::PositionColour.tex_coord_offset(), None);
    }
}
