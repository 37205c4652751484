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

//! The retained-mode backend.
//!
//! wgpu has no immediate state: blend, depth and cull state live in pipeline
//! objects and draws are encoded into render passes. The device therefore records
//! every draw together with the state, transforms and bindings it observed, and
//! encodes the recorded stream into a single render pass at flush points: before a
//! clear, before reading the framebuffer and at the end of the frame. Dynamic
//! vertex data is copied into a per-flush arena at the time of each draw, so a
//! buffer rewritten several times in one frame renders every draw with its own
//! contents.

use super::backend::WgpuBackendSelector;
use super::context::{RenderTarget, WgpuGraphicsContext};
use super::conversions::{self, IntoWgpu};
use super::pipeline::{DrawUniforms, PipelineCache, PipelineKey, DEPTH_FORMAT};
use std::any::Any;
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;
use tessera_core::math::{Mat4, Rgba8};
use tessera_core::renderer::api::*;
use tessera_core::renderer::{
    DeviceError, GraphicsBackendSelector, GraphicsDevice, RenderError, ResourceError,
};
use wgpu::util::DeviceExt;

#[derive(Debug)]
struct WgpuTextureEntry {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    bind_group: Arc<wgpu::BindGroup>,
    size_bytes: usize,
}

#[derive(Debug)]
struct WgpuBufferEntry {
    wgpu_buffer: Arc<wgpu::Buffer>,
    format: Option<VertexFormat>,
    size: usize,
}

#[derive(Debug, Clone, Copy)]
struct WgpuDynamicEntry {
    format: VertexFormat,
    capacity: usize,
}

#[derive(Debug)]
enum DrawSource {
    Static {
        buffer: Arc<wgpu::Buffer>,
        first_vertex: u32,
        count: u32,
    },
    Indexed {
        vertices: Arc<wgpu::Buffer>,
        indices: Arc<wgpu::Buffer>,
        first_index: u32,
        index_count: u32,
        base_vertex: i32,
    },
    /// A slice of the per-flush vertex arena.
    Dynamic { offset: u64, len: u64, count: u32 },
}

/// A draw as observed in program order, waiting for the next flush.
#[derive(Debug)]
struct RecordedDraw {
    key: PipelineKey,
    textures: Arc<wgpu::BindGroup>,
    uniform_offset: u32,
    source: DrawSource,
}

/// Clear requested since the last flush, applied as the next pass's load ops.
#[derive(Debug, Clone, Copy, Default)]
struct PendingClear {
    colour: Option<Rgba8>,
    depth: bool,
}

/// Rounds `value` up to a multiple of `alignment`.
fn align_to(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

/// A [`GraphicsDevice`] on top of wgpu.
#[derive(Debug)]
pub struct WgpuDevice {
    context: WgpuGraphicsContext,
    pipelines: PipelineCache,
    sampler: wgpu::Sampler,
    white_texture: WgpuTextureEntry,
    depth_view: wgpu::TextureView,

    next_id: usize,
    textures: HashMap<TextureId, WgpuTextureEntry>,
    vertex_buffers: HashMap<VertexBufferId, WgpuBufferEntry>,
    dynamic_buffers: HashMap<DynamicVertexBufferId, WgpuDynamicEntry>,
    index_buffers: HashMap<IndexBufferId, WgpuBufferEntry>,

    bound_texture: TextureId,
    bound_vertex_buffer: VertexBufferId,
    bound_index_buffer: IndexBufferId,
    batch_format: Option<VertexFormat>,

    state: RenderState,
    clear_colour: Rgba8,
    matrices: [Mat4; 3],

    pending: Vec<RecordedDraw>,
    pending_clear: Option<PendingClear>,
    vertex_arena: Vec<u8>,
    uniform_arena: Vec<u8>,
    uniform_stride: u64,

    current_frame: Option<wgpu::SurfaceTexture>,
}

impl WgpuDevice {
    /// Creates a device on an initialized context.
    pub fn new(context: WgpuGraphicsContext) -> Self {
        let device = &context.device;
        let pipelines = PipelineCache::new(device, context.colour_format());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Tessera Nearest Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let white = TextureData::solid(1, 1, [255; 4]);
        let white_texture = Self::upload_texture(
            &context,
            &pipelines,
            &sampler,
            &white,
            wgpu::TextureFormat::Rgba8Unorm,
        );
        let (width, height) = context.size();
        let depth_view = Self::create_depth_view(device, width, height);
        let uniform_stride = align_to(
            DrawUniforms::SIZE,
            context.device_limits.min_uniform_buffer_offset_alignment as u64,
        );

        log::info!(
            "WgpuDevice created on \"{}\" ({:?})",
            context.adapter_name,
            context.adapter_backend
        );
        Self {
            context,
            pipelines,
            sampler,
            white_texture,
            depth_view,
            next_id: 1,
            textures: HashMap::new(),
            vertex_buffers: HashMap::new(),
            dynamic_buffers: HashMap::new(),
            index_buffers: HashMap::new(),
            bound_texture: TextureId::NONE,
            bound_vertex_buffer: VertexBufferId::NONE,
            bound_index_buffer: IndexBufferId::NONE,
            batch_format: None,
            state: RenderState::default(),
            clear_colour: Rgba8::BLACK,
            matrices: [Mat4::IDENTITY; 3],
            pending: Vec::new(),
            pending_clear: None,
            vertex_arena: Vec::new(),
            uniform_arena: Vec::new(),
            uniform_stride,
            current_frame: None,
        }
    }

    /// Selects an adapter according to `settings` and creates a device rendering
    /// offscreen at `settings.initial_size`.
    pub fn create_offscreen(settings: &GraphicsSettings) -> Result<Self, RenderError> {
        let selector = WgpuBackendSelector::default();
        let selection = pollster::block_on(selector.select_backend(&settings.backend_selection()))
            .map_err(RenderError::InitializationFailed)?;
        log::info!(
            "Adapter selected in {} ms after trying {:?}",
            selection.selection_time_ms,
            selection.attempted_backends
        );
        let (width, height) = settings.initial_size;
        let context = pollster::block_on(WgpuGraphicsContext::new_offscreen(
            selection.adapter,
            width,
            height,
        ))
        .map_err(|e| RenderError::InitializationFailed(e.to_string()))?;
        Ok(Self::new(context))
    }

    /// The underlying wgpu context.
    pub fn context(&self) -> &WgpuGraphicsContext {
        &self.context
    }

    /// Number of pipeline variants created so far.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    // --- ID Generation Helpers ---

    fn generate_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // --- Resource helpers ---

    /// Runs `create` inside an out-of-memory error scope.
    fn with_oom_scope<R>(
        device: &wgpu::Device,
        create: impl FnOnce(&wgpu::Device) -> R,
    ) -> Result<R, ResourceError> {
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let resource = create(device);
        match pollster::block_on(device.pop_error_scope()) {
            Some(e) => {
                log::error!("WgpuDevice: allocation failed: {e}");
                Err(DeviceError::OutOfMemory.into())
            }
            None => Ok(resource),
        }
    }

    fn upload_texture(
        context: &WgpuGraphicsContext,
        pipelines: &PipelineCache,
        sampler: &wgpu::Sampler,
        data: &TextureData,
        format: wgpu::TextureFormat,
    ) -> WgpuTextureEntry {
        let size = wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        };
        let texture = context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Tessera Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        context.queue.write_texture(
            texture.as_image_copy(),
            &data.pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(data.width * data.format.bytes_per_pixel() as u32),
                rows_per_image: Some(data.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Tessera Texture Bind Group"),
                layout: pipelines.texture_layout(),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            });
        WgpuTextureEntry {
            texture,
            bind_group: Arc::new(bind_group),
            size_bytes: data.pixels.len(),
        }
    }

    fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("Tessera Depth Target"),
                size: wgpu::Extent3d {
                    width: width.max(1),
                    height: height.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn create_buffer(
        &self,
        label: &str,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> Result<Arc<wgpu::Buffer>, ResourceError> {
        Self::with_oom_scope(&self.context.device, |device| {
            Arc::new(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            }))
        })
    }

    // --- Recording ---

    fn current_uniforms(&self) -> DrawUniforms {
        let projection = self.matrices[MatrixType::Projection.index()];
        let modelview = self.matrices[MatrixType::Modelview.index()];
        let fog = &self.state.fog;
        let alpha = &self.state.alpha_test;
        let fog_mode = if fog.enabled {
            conversions::fog_mode_code(fog.mode)
        } else {
            0
        };
        let alpha_func = if alpha.enabled {
            conversions::alpha_func_code(alpha.func)
        } else {
            0
        };
        DrawUniforms {
            mvp: (projection * modelview).to_cols_array(),
            modelview: modelview.to_cols_array(),
            tex_matrix: self.matrices[MatrixType::Texture.index()].to_cols_array(),
            fog_colour: fog.colour.to_normalized(),
            fog_params: [fog_mode as f32, fog.density, fog.start, fog.end],
            alpha_params: [
                alpha_func as f32,
                alpha.reference,
                if self.state.texturing { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }

    fn record_draw(&mut self, format: VertexFormat, mode: DrawMode, source: DrawSource) {
        let offset = self.uniform_arena.len() as u64;
        let uniforms = self.current_uniforms();
        self.uniform_arena
            .extend_from_slice(bytemuck::bytes_of(&uniforms));
        self.uniform_arena
            .resize((offset + self.uniform_stride) as usize, 0);

        let textures = self
            .textures
            .get(&self.bound_texture)
            .map(|t| Arc::clone(&t.bind_group))
            .unwrap_or_else(|| Arc::clone(&self.white_texture.bind_group));

        self.pending.push(RecordedDraw {
            key: PipelineKey::new(format, mode, &self.state),
            textures,
            uniform_offset: offset as u32,
            source,
        });
    }

    // --- Encoding ---

    /// Returns a view of the colour target, acquiring the surface texture for
    /// this frame if needed.
    fn target_view(&mut self) -> Result<wgpu::TextureView, RenderError> {
        let texture = match &self.context.target {
            RenderTarget::Offscreen { texture } => texture,
            RenderTarget::Surface { surface, config, .. } => {
                if self.current_frame.is_none() {
                    let frame = match surface.get_current_texture() {
                        Ok(frame) => frame,
                        Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                            log::warn!("Surface outdated, reconfiguring");
                            surface.configure(&self.context.device, config);
                            surface.get_current_texture().map_err(|e| {
                                RenderError::SurfaceAcquisitionFailed(e.to_string())
                            })?
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            return Err(DeviceError::OutOfMemory.into())
                        }
                        Err(e) => return Err(RenderError::SurfaceAcquisitionFailed(e.to_string())),
                    };
                    self.current_frame = Some(frame);
                }
                match &self.current_frame {
                    Some(frame) => &frame.texture,
                    None => {
                        return Err(RenderError::SurfaceAcquisitionFailed(
                            "no surface texture".to_string(),
                        ))
                    }
                }
            }
        };
        Ok(texture.create_view(&wgpu::TextureViewDescriptor::default()))
    }

    /// Encodes and submits everything recorded since the last flush.
    fn flush(&mut self) -> Result<(), RenderError> {
        if self.pending.is_empty() && self.pending_clear.is_none() {
            return Ok(());
        }
        let view = self.target_view()?;
        let draws = std::mem::take(&mut self.pending);
        let clear = self.pending_clear.take().unwrap_or_default();

        let pipelines: Vec<_> = draws
            .iter()
            .map(|d| self.pipelines.get_or_create(&self.context.device, d.key))
            .collect();

        let device = &self.context.device;
        let uniform_buffer = (!self.uniform_arena.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Tessera Draw Uniforms"),
                contents: &self.uniform_arena,
                usage: wgpu::BufferUsages::UNIFORM,
            })
        });
        let uniform_bind_group = uniform_buffer.as_ref().map(|buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Tessera Draw Uniforms Bind Group"),
                layout: self.pipelines.uniform_layout(),
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer,
                        offset: 0,
                        size: NonZeroU64::new(DrawUniforms::SIZE),
                    }),
                }],
            })
        });
        let arena_buffer = (!self.vertex_arena.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Tessera Dynamic Vertex Arena"),
                contents: &self.vertex_arena,
                usage: wgpu::BufferUsages::VERTEX,
            })
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Tessera Frame Encoder"),
        });
        {
            let colour_load = match clear.colour {
                Some(colour) => wgpu::LoadOp::Clear(colour.into_wgpu()),
                None => wgpu::LoadOp::Load,
            };
            let depth_load = if clear.depth {
                wgpu::LoadOp::Clear(1.0)
            } else {
                wgpu::LoadOp::Load
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Tessera Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: colour_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for (draw, pipeline) in draws.iter().zip(&pipelines) {
                let Some(uniforms) = &uniform_bind_group else {
                    break;
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, draw.textures.as_ref(), &[]);
                pass.set_bind_group(1, uniforms, &[draw.uniform_offset]);
                match &draw.source {
                    DrawSource::Static {
                        buffer,
                        first_vertex,
                        count,
                    } => {
                        pass.set_vertex_buffer(0, buffer.slice(..));
                        pass.draw(*first_vertex..first_vertex + count, 0..1);
                    }
                    DrawSource::Indexed {
                        vertices,
                        indices,
                        first_index,
                        index_count,
                        base_vertex,
                    } => {
                        pass.set_vertex_buffer(0, vertices.slice(..));
                        pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint16);
                        pass.draw_indexed(
                            *first_index..first_index + index_count,
                            *base_vertex,
                            0..1,
                        );
                    }
                    DrawSource::Dynamic { offset, len, count } => {
                        if let Some(arena) = &arena_buffer {
                            pass.set_vertex_buffer(0, arena.slice(*offset..offset + len));
                            pass.draw(0..*count, 0..1);
                        }
                    }
                }
            }
        }
        self.context.queue.submit(Some(encoder.finish()));
        log::trace!("WgpuDevice: flushed {} draws", draws.len());

        self.vertex_arena.clear();
        self.uniform_arena.clear();
        Ok(())
    }

    /// Copies the colour target back to the CPU as RGBA8.
    fn read_target(&mut self) -> Result<TextureData, RenderError> {
        if !self.context.supports_readback() {
            return Err(DeviceError::Backend(
                "the surface cannot be read back (no COPY_SRC support)".to_string(),
            )
            .into());
        }
        // Make sure a surface frame exists even if nothing was drawn yet.
        self.target_view()?;
        let (width, height) = self.context.size();
        let format = self.context.colour_format();
        let texture = match (&self.context.target, &self.current_frame) {
            (RenderTarget::Offscreen { texture }, _) => texture,
            (RenderTarget::Surface { .. }, Some(frame)) => &frame.texture,
            (RenderTarget::Surface { .. }, None) => {
                return Err(RenderError::SurfaceAcquisitionFailed(
                    "no surface texture to read".to_string(),
                ))
            }
        };

        let unpadded_row = width as u64 * 4;
        let padded_row = align_to(unpadded_row, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64);
        let device = &self.context.device;
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Tessera Readback Buffer"),
            size: padded_row * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Tessera Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            texture.as_image_copy(),
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row as u32),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.context.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = flume::bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| RenderError::Device(DeviceError::DeviceLost))?
            .map_err(|e| DeviceError::Backend(format!("failed to map readback buffer: {e}")))?;

        let mut pixels = Vec::with_capacity((unpadded_row * height as u64) as usize);
        {
            let mapped = slice.get_mapped_range();
            for row in mapped.chunks_exact(padded_row as usize) {
                pixels.extend_from_slice(&row[..unpadded_row as usize]);
            }
        }
        staging.unmap();

        let data = match format {
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => {
                let bgra = TextureData::new(width, height, PixelFormat::Bgra8, pixels);
                TextureData::new(width, height, PixelFormat::Rgba8, bgra.to_rgba8()?)
            }
            _ => TextureData::new(width, height, PixelFormat::Rgba8, pixels),
        };
        Ok(data)
    }
}

impl GraphicsDevice for WgpuDevice {
    // --- Information ---

    fn info(&self) -> GraphicsAdapterInfo {
        GraphicsAdapterInfo {
            name: self.context.adapter_name.clone(),
            backend_type: conversions::backend_to_type(self.context.adapter_backend),
            device_type: conversions::device_type_to_type(self.context.adapter_device_type),
        }
    }

    fn log_api_info(&self) {
        let info = self.context.adapter.get_info();
        log::info!(
            "wgpu adapter: \"{}\" ({:?}, {:?}), driver: {} {}",
            info.name,
            info.backend,
            info.device_type,
            info.driver,
            info.driver_info
        );
        log::info!(
            "Render target: {:?} {:?}, {} pipeline variants cached",
            self.context.colour_format(),
            self.context.size(),
            self.pipelines.len()
        );
        log::info!("Device limits: {:?}", self.context.device_limits);
    }

    fn max_texture_dimensions(&self) -> (u32, u32) {
        let max = self.context.device_limits.max_texture_dimension_2d;
        (max, max)
    }

    fn supports_pixel_format(&self, format: PixelFormat) -> bool {
        let converted: Option<wgpu::TextureFormat> = format.into_wgpu();
        converted.is_some()
    }

    fn resource_usage(&self) -> ResourceUsage {
        ResourceUsage {
            textures: self.textures.len(),
            texture_bytes: self.textures.values().map(|t| t.size_bytes).sum(),
            vertex_buffers: self.vertex_buffers.len() + self.dynamic_buffers.len(),
            vertex_buffer_bytes: self.vertex_buffers.values().map(|b| b.size).sum::<usize>()
                + self
                    .dynamic_buffers
                    .values()
                    .map(|b| b.capacity * b.format.stride())
                    .sum::<usize>(),
            index_buffers: self.index_buffers.len(),
            index_buffer_bytes: self.index_buffers.values().map(|b| b.size).sum(),
        }
    }

    // --- Resources ---

    fn create_texture(&mut self, data: &TextureData) -> Result<TextureId, ResourceError> {
        let format: Option<wgpu::TextureFormat> = data.format.into_wgpu();
        let format = format.ok_or_else(|| ResourceError::unsupported_pixel_format(data.format))?;
        let entry = Self::with_oom_scope(&self.context.device, |_| {
            Self::upload_texture(&self.context, &self.pipelines, &self.sampler, data, format)
        })?;
        let id = TextureId(self.generate_id());
        self.textures.insert(id, entry);
        log::debug!(
            "WgpuDevice: Created texture {id:?} ({}x{} {:?})",
            data.width,
            data.height,
            data.format
        );
        Ok(id)
    }

    fn delete_texture(&mut self, id: TextureId) {
        if self.textures.remove(&id).is_some() {
            log::debug!("WgpuDevice: Destroyed texture {id:?}");
        } else {
            log::warn!("WgpuDevice: Ignoring deletion of unknown texture {id:?}");
        }
        if self.bound_texture == id {
            self.bound_texture = TextureId::NONE;
        }
    }

    fn bind_texture(&mut self, id: TextureId) {
        self.bound_texture = id;
    }

    fn create_vertex_buffer(
        &mut self,
        format: VertexFormat,
        data: &[u8],
        count: usize,
    ) -> Result<VertexBufferId, ResourceError> {
        let buffer = self.create_buffer("Tessera Vertex Buffer", data, wgpu::BufferUsages::VERTEX)?;
        let id = VertexBufferId(self.generate_id());
        self.vertex_buffers.insert(
            id,
            WgpuBufferEntry {
                wgpu_buffer: buffer,
                format: Some(format),
                size: data.len(),
            },
        );
        log::debug!("WgpuDevice: Created vertex buffer {id:?} ({count} x {format:?})");
        Ok(id)
    }

    fn create_dynamic_vertex_buffer(
        &mut self,
        format: VertexFormat,
        max_vertices: usize,
    ) -> Result<DynamicVertexBufferId, ResourceError> {
        // Contents are streamed through the per-flush arena, so no buffer is needed up front.
        let id = DynamicVertexBufferId(self.generate_id());
        self.dynamic_buffers.insert(
            id,
            WgpuDynamicEntry {
                format,
                capacity: max_vertices,
            },
        );
        log::debug!(
            "WgpuDevice: Created dynamic vertex buffer {id:?} ({max_vertices} x {format:?})"
        );
        Ok(id)
    }

    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<IndexBufferId, ResourceError> {
        let bytes: &[u8] = bytemuck::cast_slice(indices);
        let buffer = self.create_buffer("Tessera Index Buffer", bytes, wgpu::BufferUsages::INDEX)?;
        let id = IndexBufferId(self.generate_id());
        self.index_buffers.insert(
            id,
            WgpuBufferEntry {
                wgpu_buffer: buffer,
                format: None,
                size: bytes.len(),
            },
        );
        log::debug!("WgpuDevice: Created index buffer {id:?} ({} indices)", indices.len());
        Ok(id)
    }

    fn delete_vertex_buffer(&mut self, id: VertexBufferId) {
        if self.vertex_buffers.remove(&id).is_some() {
            log::debug!("WgpuDevice: Destroyed vertex buffer {id:?}");
        }
        if self.bound_vertex_buffer == id {
            self.bound_vertex_buffer = VertexBufferId::NONE;
        }
    }

    fn delete_dynamic_vertex_buffer(&mut self, id: DynamicVertexBufferId) {
        if self.dynamic_buffers.remove(&id).is_some() {
            log::debug!("WgpuDevice: Destroyed dynamic vertex buffer {id:?}");
        }
    }

    fn delete_index_buffer(&mut self, id: IndexBufferId) {
        if self.index_buffers.remove(&id).is_some() {
            log::debug!("WgpuDevice: Destroyed index buffer {id:?}");
        }
        if self.bound_index_buffer == id {
            self.bound_index_buffer = IndexBufferId::NONE;
        }
    }

    fn bind_vertex_buffer(&mut self, id: VertexBufferId) {
        self.bound_vertex_buffer = id;
    }

    fn bind_index_buffer(&mut self, id: IndexBufferId) {
        self.bound_index_buffer = id;
    }

    // --- Render state ---
    // State is sampled when a draw is recorded.

    fn set_texturing(&mut self, enabled: bool) {
        self.state.texturing = enabled;
    }

    fn set_fog(&mut self, enabled: bool) {
        self.state.fog.enabled = enabled;
    }

    fn set_fog_mode(&mut self, mode: FogMode) {
        self.state.fog.mode = mode;
    }

    fn set_fog_colour(&mut self, colour: Rgba8) {
        self.state.fog.colour = colour;
    }

    fn set_fog_density(&mut self, density: f32) {
        self.state.fog.density = density;
    }

    fn set_fog_start(&mut self, start: f32) {
        self.state.fog.start = start;
    }

    fn set_fog_end(&mut self, end: f32) {
        self.state.fog.end = end;
    }

    fn set_face_culling(&mut self, enabled: bool) {
        self.state.face_culling = enabled;
    }

    fn set_alpha_test(&mut self, enabled: bool) {
        self.state.alpha_test.enabled = enabled;
    }

    fn set_alpha_test_func(&mut self, func: CompareFunc, reference: f32) {
        self.state.alpha_test.func = func;
        self.state.alpha_test.reference = reference;
    }

    fn set_alpha_blending(&mut self, enabled: bool) {
        self.state.blend.enabled = enabled;
    }

    fn set_alpha_blend_func(&mut self, src: BlendFunc, dst: BlendFunc) {
        self.state.blend.src = src;
        self.state.blend.dst = dst;
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.state.depth.test = enabled;
    }

    fn set_depth_test_func(&mut self, func: CompareFunc) {
        self.state.depth.func = func;
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.state.depth.write = enabled;
    }

    fn set_colour_write(&mut self, enabled: bool) {
        self.state.colour_write = enabled;
    }

    fn set_clear_colour(&mut self, colour: Rgba8) {
        self.clear_colour = colour;
    }

    fn clear(&mut self) {
        if let Err(e) = self.flush() {
            log::error!("WgpuDevice: flush before clear failed: {e}");
        }
        // Masks apply to clears as they do in OpenGL.
        let clear = PendingClear {
            colour: self.state.colour_write.then_some(self.clear_colour),
            depth: self.state.depth.write,
        };
        if clear.colour.is_some() || clear.depth {
            self.pending_clear = Some(clear);
        }
    }

    // --- Transforms ---

    fn load_matrix(&mut self, kind: MatrixType, matrix: &Mat4) {
        self.matrices[kind.index()] = *matrix;
    }

    // --- Drawing ---

    fn set_batch_format(&mut self, format: VertexFormat) {
        self.batch_format = Some(format);
    }

    fn draw_vertex_buffer(
        &mut self,
        mode: DrawMode,
        id: VertexBufferId,
        start_vertex: usize,
        count: usize,
    ) {
        if count == 0 {
            return;
        }
        let Some(entry) = self.vertex_buffers.get(&id) else {
            log::warn!("WgpuDevice: Ignoring draw of unknown vertex buffer {id:?}");
            return;
        };
        // wgpu rejects slices of zero-sized buffers.
        let (Some(format), false) = (entry.format, entry.size == 0) else {
            return;
        };
        let source = DrawSource::Static {
            buffer: Arc::clone(&entry.wgpu_buffer),
            first_vertex: start_vertex as u32,
            count: count as u32,
        };
        self.record_draw(format, mode, source);
    }

    fn draw_indexed_vertex_buffer(
        &mut self,
        mode: DrawMode,
        index_count: usize,
        start_vertex: usize,
        start_index: usize,
    ) {
        if index_count == 0 {
            return;
        }
        let (Some(vb), Some(ib)) = (
            self.vertex_buffers.get(&self.bound_vertex_buffer),
            self.index_buffers.get(&self.bound_index_buffer),
        ) else {
            log::warn!("WgpuDevice: Ignoring indexed draw without bound buffers");
            return;
        };
        if vb.size == 0 || ib.size == 0 {
            return;
        }
        let Some(format) = self.batch_format.or(vb.format) else {
            return;
        };
        let source = DrawSource::Indexed {
            vertices: Arc::clone(&vb.wgpu_buffer),
            indices: Arc::clone(&ib.wgpu_buffer),
            first_index: start_index as u32,
            index_count: index_count as u32,
            base_vertex: start_vertex as i32,
        };
        self.record_draw(format, mode, source);
    }

    fn draw_dynamic_vertex_buffer(
        &mut self,
        mode: DrawMode,
        id: DynamicVertexBufferId,
        data: &[u8],
        count: usize,
    ) {
        if count == 0 || data.is_empty() {
            return;
        }
        let Some(entry) = self.dynamic_buffers.get(&id).copied() else {
            log::warn!("WgpuDevice: Ignoring draw of unknown dynamic vertex buffer {id:?}");
            return;
        };
        let offset = align_to(self.vertex_arena.len() as u64, wgpu::VERTEX_STRIDE_ALIGNMENT);
        self.vertex_arena.resize(offset as usize, 0);
        self.vertex_arena.extend_from_slice(data);
        let source = DrawSource::Dynamic {
            offset,
            len: data.len() as u64,
            count: count as u32,
        };
        self.record_draw(entry.format, mode, source);
    }

    // --- Frame ---

    fn begin_frame(&mut self) {
        log::trace!("WgpuDevice: frame begins with {} draws pending", self.pending.len());
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.flush()?;
        if let Some(frame) = self.current_frame.take() {
            frame.present();
        }
        Ok(())
    }

    fn set_vsync(&mut self, enabled: bool) {
        self.context.set_vsync(enabled);
    }

    fn on_window_resize(&mut self, width: u32, height: u32) {
        if let Err(e) = self.flush() {
            log::error!("WgpuDevice: flush before resize failed: {e}");
        }
        // A frame acquired at the old size cannot be presented after reconfiguring.
        self.current_frame = None;
        self.context.resize(width, height);
        self.depth_view = Self::create_depth_view(&self.context.device, width, height);
    }

    fn read_framebuffer(&mut self) -> Result<TextureData, RenderError> {
        self.flush()?;
        self.read_target()
    }

    // --- Downcasting ---

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_rounds_up() {
        assert_eq!(align_to(240, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(0, 256), 0);
        assert_eq!(align_to(20, wgpu::VERTEX_STRIDE_ALIGNMENT), 20);
    }

    // Needs an adapter; skipped when none is available.
    #[test]
    fn offscreen_clear_reads_back() {
        let settings = GraphicsSettings {
            initial_size: (8, 4),
            ..Default::default()
        };
        let Ok(mut device) = WgpuDevice::create_offscreen(&settings) else {
            eprintln!("no wgpu adapter available, skipping");
            return;
        };
        device.set_clear_colour(Rgba8::rgb(255, 0, 0));
        device.clear();
        let frame = device.read_framebuffer().unwrap();
        assert_eq!((frame.width, frame.height), (8, 4));
        assert_eq!(&frame.pixels[..4], &[255, 0, 0, 255]);
    }

    // Needs an adapter; skipped when none is available.
    #[test]
    fn zero_sized_draws_are_skipped() {
        let settings = GraphicsSettings {
            initial_size: (8, 4),
            ..Default::default()
        };
        let Ok(mut device) = WgpuDevice::create_offscreen(&settings) else {
            eprintln!("no wgpu adapter available, skipping");
            return;
        };
        let quad = [VertexPosCol::new(0.0, 0.0, 0.0, Rgba8::WHITE); 4];
        let dynamic = device
            .create_dynamic_vertex_buffer(VertexFormat::PositionColour, 4)
            .unwrap();
        let empty_vb = device
            .create_vertex_buffer(VertexFormat::PositionColour, &[], 0)
            .unwrap();
        let empty_ib = device.create_index_buffer(&[]).unwrap();

        device.begin_frame();
        device.draw_dynamic_vertex_buffer(
            DrawMode::TriangleStrip,
            dynamic,
            bytemuck::cast_slice(&quad),
            4,
        );
        device.draw_dynamic_vertex_buffer(DrawMode::Triangles, dynamic, &[], 0);
        device.draw_vertex_buffer(DrawMode::Triangles, empty_vb, 0, 0);
        device.bind_vertex_buffer(empty_vb);
        device.bind_index_buffer(empty_ib);
        device.set_batch_format(VertexFormat::PositionColour);
        device.draw_indexed_vertex_buffer(DrawMode::Triangles, 0, 0, 0);
        assert_eq!(device.pending.len(), 1);

        device.end_frame().unwrap();
        let frame = device.read_framebuffer().unwrap();
        assert_eq!((frame.width, frame.height), (8, 4));
    }
}
