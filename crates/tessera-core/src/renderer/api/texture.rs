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

//! Texture ingestion types and textured-quad placement.

use crate::renderer::error::ResourceError;

/// Layout of one pixel in a [`TextureData`] buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit red, green, blue, alpha.
    Rgba8,
    /// 8-bit blue, green, red, alpha.
    Bgra8,
    /// 8-bit red, green, blue with no alpha.
    Rgb8,
    /// A single 8-bit luminance channel.
    Luma8,
}

impl PixelFormat {
    /// Size of one pixel in bytes.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Luma8 => 1,
        }
    }
}

/// A ready-to-upload image: tightly packed rows, top-left origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Layout of `pixels`.
    pub format: PixelFormat,
    /// `width * height * format.bytes_per_pixel()` bytes.
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Wraps raw pixels without validating them.
    pub fn new(width: u32, height: u32, format: PixelFormat, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            pixels,
        }
    }

    /// Creates a texture filled with a single RGBA colour.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::new(width, height, PixelFormat::Rgba8, pixels)
    }

    /// Takes ownership of a decoded RGBA8 image.
    pub fn from_rgba_image(image: image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(width, height, PixelFormat::Rgba8, image.into_raw())
    }

    /// Checks that the image is non-empty and that `pixels` has exactly the packed length.
    pub fn validate_layout(&self) -> Result<(), ResourceError> {
        if self.width == 0 || self.height == 0 {
            return Err(ResourceError::UnsupportedFormat(format!(
                "texture has zero size ({}x{})",
                self.width, self.height
            )));
        }
        let expected =
            self.width as usize * self.height as usize * self.format.bytes_per_pixel();
        if self.pixels.len() != expected {
            return Err(ResourceError::UnsupportedFormat(format!(
                "expected {expected} bytes for a {}x{} {:?} texture, got {}",
                self.width,
                self.height,
                self.format,
                self.pixels.len()
            )));
        }
        Ok(())
    }

    /// Returns the pixels in RGBA8 order, swizzling BGRA8 if needed.
    ///
    /// Only the four-channel formats can be converted.
    pub fn to_rgba8(&self) -> Result<Vec<u8>, ResourceError> {
        match self.format {
            PixelFormat::Rgba8 => Ok(self.pixels.clone()),
            PixelFormat::Bgra8 => Ok(self
                .pixels
                .chunks_exact(4)
                .flat_map(|p| [p[2], p[1], p[0], p[3]])
                .collect()),
            other => Err(ResourceError::unsupported_pixel_format(other)),
        }
    }
}

/// A screen rectangle and the texture region mapped onto it.
///
/// `(x1, y1)` is the top-left corner and `(x2, y2)` the bottom-right, in the
/// coordinates of the current 2D projection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TexturedQuad {
    /// Left edge.
    pub x1: f32,
    /// Top edge.
    pub y1: f32,
    /// Right edge.
    pub x2: f32,
    /// Bottom edge.
    pub y2: f32,
    /// Texture coordinate at the left edge.
    pub u1: f32,
    /// Texture coordinate at the top edge.
    pub v1: f32,
    /// Texture coordinate at the right edge.
    pub u2: f32,
    /// Texture coordinate at the bottom edge.
    pub v2: f32,
}

impl TexturedQuad {
    /// Places the whole texture (`uv` from `0` to `1`) on the given rectangle.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::with_uv(x, y, width, height, [0.0, 0.0, 1.0, 1.0])
    }

    /// Places the region `uv = [u1, v1, u2, v2]` on the given rectangle.
    pub fn with_uv(x: f32, y: f32, width: f32, height: f32, uv: [f32; 4]) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + height,
            u1: uv[0],
            v1: uv[1],
            u2: uv[2],
            v2: uv[3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_validation() {
        assert!(TextureData::solid(2, 2, [1, 2, 3, 4]).validate_layout().is_ok());

        let short = TextureData::new(2, 2, PixelFormat::Rgba8, vec![0; 15]);
        assert!(matches!(
            short.validate_layout(),
            Err(ResourceError::UnsupportedFormat(_))
        ));

        let empty = TextureData::new(0, 4, PixelFormat::Rgba8, Vec::new());
        assert!(empty.validate_layout().is_err());
    }

    #[test]
    fn bgra_is_swizzled() {
        let data = TextureData::new(1, 1, PixelFormat::Bgra8, vec![1, 2, 3, 4]);
        assert_eq!(data.to_rgba8().unwrap(), vec![3, 2, 1, 4]);

        let luma = TextureData::new(1, 1, PixelFormat::Luma8, vec![9]);
        assert!(luma.to_rgba8().is_err());
    }

    #[test]
    fn quad_corners() {
        let q = TexturedQuad::with_uv(10.0, 20.0, 30.0, 40.0, [0.25, 0.5, 0.75, 1.0]);
        assert_eq!((q.x2, q.y2), (40.0, 60.0));
        assert_eq!((q.u1, q.v2), (0.25, 1.0));
    }
}
