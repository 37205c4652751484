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

//! Render pipelines keyed by the fixed-function state they bake in.
//!
//! wgpu has no mutable blend, depth or cull state, so every distinct combination
//! the command stream uses becomes one pipeline, created on first use.

use super::conversions::{self, IntoWgpu};
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;
use tessera_core::renderer::api::{BlendFunc, CompareFunc, DrawMode, RenderState, VertexFormat};

const SHADER_SOURCE: &str = include_str!("shader.wgsl");

/// Depth format of the depth target paired with every colour target.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Per-draw uniform block, laid out to match `DrawUniforms` in `shader.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    pub mvp: [f32; 16],
    pub modelview: [f32; 16],
    pub tex_matrix: [f32; 16],
    pub fog_colour: [f32; 4],
    pub fog_params: [f32; 4],
    pub alpha_params: [f32; 4],
}

impl DrawUniforms {
    /// Size of the block in bytes.
    pub const SIZE: u64 = std::mem::size_of::<DrawUniforms>() as u64;
}

/// The state a pipeline bakes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub format: VertexFormat,
    pub mode: DrawMode,
    pub blend: Option<(BlendFunc, BlendFunc)>,
    pub depth_func: CompareFunc,
    pub depth_write: bool,
    pub cull: bool,
    pub colour_write: bool,
}

impl PipelineKey {
    /// Derives the key for a draw. With the depth test off, depth neither rejects
    /// fragments nor gets written, as in OpenGL.
    pub fn new(format: VertexFormat, mode: DrawMode, state: &RenderState) -> Self {
        let (depth_func, depth_write) = if state.depth.test {
            (state.depth.func, state.depth.write)
        } else {
            (CompareFunc::Always, false)
        };
        Self {
            format,
            mode,
            blend: state
                .blend
                .enabled
                .then_some((state.blend.src, state.blend.dst)),
            depth_func,
            depth_write,
            cull: state.face_culling,
            colour_write: state.colour_write,
        }
    }
}

/// Shader, layouts and every pipeline created so far for one colour format.
#[derive(Debug)]
pub struct PipelineCache {
    shader: wgpu::ShaderModule,
    texture_layout: wgpu::BindGroupLayout,
    uniform_layout: wgpu::BindGroupLayout,
    layout: wgpu::PipelineLayout,
    target_format: wgpu::TextureFormat,
    pipelines: HashMap<PipelineKey, Arc<wgpu::RenderPipeline>>,
}

impl PipelineCache {
    pub fn new(device: &wgpu::Device, target_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Tessera Fixed Function Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Tessera Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Tessera Draw Uniforms Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(DrawUniforms::SIZE),
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Tessera Pipeline Layout"),
            bind_group_layouts: &[&texture_layout, &uniform_layout],
            push_constant_ranges: &[],
        });

        log::debug!("PipelineCache created for colour format {target_format:?}");
        Self {
            shader,
            texture_layout,
            uniform_layout,
            layout,
            target_format,
            pipelines: HashMap::new(),
        }
    }

    /// Layout of bind group 0 (texture and sampler).
    pub fn texture_layout(&self) -> &wgpu::BindGroupLayout {
        &self.texture_layout
    }

    /// Layout of bind group 1 (per-draw uniforms, dynamic offset).
    pub fn uniform_layout(&self) -> &wgpu::BindGroupLayout {
        &self.uniform_layout
    }

    /// Number of pipelines created so far.
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    /// Returns `true` if no pipeline was created yet.
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Returns the pipeline for `key`, creating it on first use.
    pub fn get_or_create(
        &mut self,
        device: &wgpu::Device,
        key: PipelineKey,
    ) -> Arc<wgpu::RenderPipeline> {
        if let Some(pipeline) = self.pipelines.get(&key) {
            return Arc::clone(pipeline);
        }
        let pipeline = Arc::new(self.create_pipeline(device, &key));
        log::debug!(
            "Created render pipeline #{} for {key:?}",
            self.pipelines.len() + 1
        );
        self.pipelines.insert(key, Arc::clone(&pipeline));
        pipeline
    }

    fn create_pipeline(&self, device: &wgpu::Device, key: &PipelineKey) -> wgpu::RenderPipeline {
        let blend = key.blend.map(|(src, dst)| {
            let component = wgpu::BlendComponent {
                src_factor: src.into_wgpu(),
                dst_factor: dst.into_wgpu(),
                operation: wgpu::BlendOperation::Add,
            };
            wgpu::BlendState {
                color: component,
                alpha: component,
            }
        });
        let write_mask = if key.colour_write {
            wgpu::ColorWrites::ALL
        } else {
            wgpu::ColorWrites::empty()
        };
        let topology: wgpu::PrimitiveTopology = key.mode.into_wgpu();

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Tessera Render Pipeline"),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some(conversions::vertex_entry_point(key.format)),
                buffers: &[conversions::vertex_layout(key.format)],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.target_format,
                    blend,
                    write_mask,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: (key.mode == DrawMode::TriangleStrip)
                    .then_some(wgpu::IndexFormat::Uint16),
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: key.cull.then_some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: key.depth_write,
                depth_compare: key.depth_func.into_wgpu(),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}
