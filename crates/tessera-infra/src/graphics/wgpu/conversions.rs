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

//! Conversions from the command surface's types to wgpu types, and the integer
//! codes the shader uses for the fixed-function emulation.

use tessera_core::math::Rgba8;
use tessera_core::renderer::api::{
    BlendFunc, CompareFunc, DrawMode, FogMode, GraphicsBackendType, PixelFormat,
    RendererDeviceType, VertexFormat,
};

/// A local extension trait to convert our types into wgpu types.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_wgpu()` syntax.
pub trait IntoWgpu<T> {
    /// Consumes self and converts it into a wgpu type.
    fn into_wgpu(self) -> T;
}

impl IntoWgpu<wgpu::CompareFunction> for CompareFunc {
    fn into_wgpu(self) -> wgpu::CompareFunction {
        match self {
            CompareFunc::Always => wgpu::CompareFunction::Always,
            CompareFunc::NotEqual => wgpu::CompareFunction::NotEqual,
            CompareFunc::Never => wgpu::CompareFunction::Never,
            CompareFunc::Less => wgpu::CompareFunction::Less,
            CompareFunc::LessEqual => wgpu::CompareFunction::LessEqual,
            CompareFunc::Equal => wgpu::CompareFunction::Equal,
            CompareFunc::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
            CompareFunc::Greater => wgpu::CompareFunction::Greater,
        }
    }
}

impl IntoWgpu<wgpu::BlendFactor> for BlendFunc {
    fn into_wgpu(self) -> wgpu::BlendFactor {
        match self {
            BlendFunc::Zero => wgpu::BlendFactor::Zero,
            BlendFunc::One => wgpu::BlendFactor::One,
            BlendFunc::SourceAlpha => wgpu::BlendFactor::SrcAlpha,
            BlendFunc::InvSourceAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
            BlendFunc::DestAlpha => wgpu::BlendFactor::DstAlpha,
            BlendFunc::InvDestAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        }
    }
}

impl IntoWgpu<wgpu::PrimitiveTopology> for DrawMode {
    fn into_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            DrawMode::Triangles => wgpu::PrimitiveTopology::TriangleList,
            DrawMode::Lines => wgpu::PrimitiveTopology::LineList,
            DrawMode::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }
}

impl IntoWgpu<wgpu::Color> for Rgba8 {
    fn into_wgpu(self) -> wgpu::Color {
        let [r, g, b, a] = self.to_normalized();
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        }
    }
}

impl IntoWgpu<Option<wgpu::TextureFormat>> for PixelFormat {
    fn into_wgpu(self) -> Option<wgpu::TextureFormat> {
        match self {
            PixelFormat::Rgba8 => Some(wgpu::TextureFormat::Rgba8Unorm),
            PixelFormat::Bgra8 => Some(wgpu::TextureFormat::Bgra8Unorm),
            PixelFormat::Rgb8 | PixelFormat::Luma8 => None,
        }
    }
}

const POS_TEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];
const POS_COL_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 2 => Unorm8x4];
const POS_TEX_COL_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Unorm8x4];

/// The buffer layout of a vertex format. Position is location 0, texture
/// coordinates location 1 and colour location 2.
pub fn vertex_layout(format: VertexFormat) -> wgpu::VertexBufferLayout<'static> {
    let attributes: &'static [wgpu::VertexAttribute] = match format {
        VertexFormat::PositionTexture => &POS_TEX_ATTRIBUTES,
        VertexFormat::PositionColour => &POS_COL_ATTRIBUTES,
        VertexFormat::PositionTextureColour => &POS_TEX_COL_ATTRIBUTES,
    };
    wgpu::VertexBufferLayout {
        array_stride: format.stride() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

/// The vertex shader entry point for a vertex format.
pub fn vertex_entry_point(format: VertexFormat) -> &'static str {
    match format {
        VertexFormat::PositionTexture => "vs_pos_tex",
        VertexFormat::PositionColour => "vs_pos_col",
        VertexFormat::PositionTextureColour => "vs_pos_tex_col",
    }
}

/// Alpha test function code understood by the shader. Zero disables the test.
pub fn alpha_func_code(func: CompareFunc) -> u32 {
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

/// Fog mode code understood by the shader. Zero disables fog.
pub fn fog_mode_code(mode: FogMode) -> u32 {
    match mode {
        FogMode::Linear => 1,
        FogMode::Exp => 2,
        FogMode::Exp2 => 3,
    }
}

/// Converts a wgpu backend to our generic backend type.
pub fn backend_to_type(backend: wgpu::Backend) -> GraphicsBackendType {
    match backend {
        wgpu::Backend::Vulkan => GraphicsBackendType::Vulkan,
        wgpu::Backend::Dx12 => GraphicsBackendType::Dx12,
        wgpu::Backend::Gl => GraphicsBackendType::OpenGL,
        wgpu::Backend::Metal => GraphicsBackendType::Metal,
        wgpu::Backend::BrowserWebGpu => GraphicsBackendType::WebGpu,
        #[allow(unreachable_patterns)]
        _ => GraphicsBackendType::Unknown,
    }
}

/// Converts a wgpu device type to our generic device type.
pub fn device_type_to_type(device_type: wgpu::DeviceType) -> RendererDeviceType {
    match device_type {
        wgpu::DeviceType::IntegratedGpu => RendererDeviceType::IntegratedGpu,
        wgpu::DeviceType::DiscreteGpu => RendererDeviceType::DiscreteGpu,
        wgpu::DeviceType::VirtualGpu => RendererDeviceType::VirtualGpu,
        wgpu::DeviceType::Cpu => RendererDeviceType::Cpu,
        wgpu::DeviceType::Other => RendererDeviceType::Unknown,
    }
}

/// Converts our generic backend type to a wgpu backend.
pub fn type_to_backend(backend_type: GraphicsBackendType) -> wgpu::Backend {
    match backend_type {
        GraphicsBackendType::Vulkan => wgpu::Backend::Vulkan,
        GraphicsBackendType::Dx12 => wgpu::Backend::Dx12,
        GraphicsBackendType::OpenGL => wgpu::Backend::Gl,
        GraphicsBackendType::Metal => wgpu::Backend::Metal,
        GraphicsBackendType::WebGpu => wgpu::Backend::BrowserWebGpu,
        GraphicsBackendType::Unknown => wgpu::Backend::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layouts_match_strides() {
        for format in [
            VertexFormat::PositionTexture,
            VertexFormat::PositionColour,
            VertexFormat::PositionTextureColour,
        ] {
            let layout = vertex_layout(format);
            assert_eq!(layout.array_stride, format.stride() as u64);
            let colour = layout.attributes.iter().find(|a| a.shader_location == 2);
            assert_eq!(
                colour.map(|a| a.offset as usize),
                format.colour_offset(),
                "{format:?}"
            );
            let uv = layout.attributes.iter().find(|a| a.shader_location == 1);
            assert_eq!(uv.map(|a| a.offset as usize), format.tex_coord_offset());
        }
    }

    #[test]
    fn shader_codes_are_non_zero() {
        assert_ne!(alpha_func_code(CompareFunc::Always), 0);
        assert_ne!(fog_mode_code(FogMode::Linear), 0);
        assert_eq!(alpha_func_code(CompareFunc::Greater), 8);
    }

    #[test]
    fn backend_type_round_trips() {
        for ty in [
            GraphicsBackendType::Vulkan,
            GraphicsBackendType::Metal,
            GraphicsBackendType::Dx12,
            GraphicsBackendType::OpenGL,
        ] {
            assert_eq!(backend_to_type(type_to_backend(ty)), ty);
        }
    }

    #[test]
    fn pixel_formats_without_alpha_have_no_wgpu_format() {
        let rgb: Option<wgpu::TextureFormat> = PixelFormat::Rgb8.into_wgpu();
        assert!(rgb.is_none());
        let bgra: Option<wgpu::TextureFormat> = PixelFormat::Bgra8.into_wgpu();
        assert_eq!(bgra, Some(wgpu::TextureFormat::Bgra8Unorm));
    }
}
