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

//! Mappings from the command surface's enums to OpenGL constants.

use tessera_core::math::{Mat4, Vec4};
use tessera_core::renderer::api::{BlendFunc, CompareFunc, DrawMode, FogMode, PixelFormat};

/// Remaps clip depth from `[0, 1]` to OpenGL's `[-1, 1]`: `z' = 2z - w`.
pub const DEPTH_RANGE_CORRECTION: Mat4 = Mat4::from_cols(
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 2.0, 0.0),
    Vec4::new(0.0, 0.0, -1.0, 1.0),
);

/// Converts a zero-to-one depth projection to OpenGL's clip range.
pub fn gl_projection(projection: &Mat4) -> Mat4 {
    DEPTH_RANGE_CORRECTION * *projection
}

pub fn compare_func(func: CompareFunc) -> u32 {
    match func {
        CompareFunc::Always => glow::ALWAYS,
        CompareFunc::NotEqual => glow::NOTEQUAL,
        CompareFunc::Never => glow::NEVER,
        CompareFunc::Less => glow::LESS,
        CompareFunc::LessEqual => glow::LEQUAL,
        CompareFunc::Equal => glow::EQUAL,
        CompareFunc::GreaterEqual => glow::GEQUAL,
        CompareFunc::Greater => glow::GREATER,
    }
}

pub fn blend_func(func: BlendFunc) -> u32 {
    match func {
        BlendFunc::Zero => glow::ZERO,
        BlendFunc::One => glow::ONE,
        BlendFunc::SourceAlpha => glow::SRC_ALPHA,
        BlendFunc::InvSourceAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFunc::DestAlpha => glow::DST_ALPHA,
        BlendFunc::InvDestAlpha => glow::ONE_MINUS_DST_ALPHA,
    }
}

pub fn draw_mode(mode: DrawMode) -> u32 {
    match mode {
        DrawMode::Triangles => glow::TRIANGLES,
        DrawMode::Lines => glow::LINES,
        DrawMode::TriangleStrip => glow::TRIANGLE_STRIP,
    }
}

/// `(internal format, format)` for uploading pixels of this layout, if supported.
pub fn pixel_format(format: PixelFormat) -> Option<(u32, u32)> {
    match format {
        PixelFormat::Rgba8 => Some((glow::RGBA8, glow::RGBA)),
        PixelFormat::Bgra8 => Some((glow::RGBA8, glow::BGRA)),
        PixelFormat::Rgb8 => Some((glow::RGB8, glow::RGB)),
        PixelFormat::Luma8 => None,
    }
}

/// Alpha test code for the fragment shader, zero when disabled.
pub fn alpha_func_code(func: CompareFunc) -> i32 {
    match func {
        CompareFunc::Always => 1,
        CompareFunc::NotEqual => 2,
        CompareFunc::Never => 3,
        CompareFunc::Less => 4,
        CompareFunc::LessEqual => 5,
        CompareFunc::Equal => 6,
        CompareFunc::GreaterEqual => 7,
        CompareFunc::Greater => 8,
    }
}

/// Fog code for the fragment shader, zero when disabled.
pub fn fog_mode_code(mode: FogMode) -> i32 {
    match mode {
        FogMode::Linear => 1,
        FogMode::Exp => 2,
        FogMode::Exp2 => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn depth_correction_maps_near_and_far_planes() {
        let projection = Mat4::orthographic_rh_zo(0.0, 100.0, 100.0, 0.0, 0.0, 1.0);
        let gl = gl_projection(&projection);

        let near = gl.transform_point(tessera_core::math::Vec3::new(0.0, 0.0, 0.0));
        let far = gl.transform_point(tessera_core::math::Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(near.z / near.w, -1.0);
        assert_relative_eq!(far.z / far.w, 1.0);
    }

    #[test]
    fn luminance_is_not_uploadable() {
        assert!(pixel_format(PixelFormat::Luma8).is_none());
        assert_eq!(pixel_format(PixelFormat::Bgra8), Some((glow::RGBA8, glow::BGRA)));
    }
}
