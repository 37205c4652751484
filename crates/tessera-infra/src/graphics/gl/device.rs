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

//! The immediate-mode backend.
//!
//! OpenGL is itself a state machine, so every call maps onto GL state directly.
//! Only the fixed-function parts the core profile removed (alpha test, fog, the
//! matrix stacks) are emulated through uniforms of a single program.

use super::conversions::{self, gl_projection};
use super::program::GlProgram;
use glow::HasContext;
use std::any::Any;
use std::collections::HashMap;
use tessera_core::math::{Mat4, Rgba8};
use tessera_core::renderer::api::*;
use tessera_core::renderer::{DeviceError, GraphicsDevice, RenderError, ResourceError};

const ATTRIB_POSITION: u32 = 0;
const ATTRIB_UV: u32 = 1;
const ATTRIB_COLOUR: u32 = 2;

/// Buffer swapping for the window the GL context renders to.
///
/// Window and context creation stay with the caller; the device only needs to
/// present and to change the swap interval.
pub trait GlSurface: std::fmt::Debug {
    /// Presents the back buffer.
    fn swap_buffers(&mut self) -> anyhow::Result<()>;

    /// Sets the swap interval to 1 (`true`) or 0 (`false`).
    fn set_swap_interval(&mut self, vsync: bool) -> anyhow::Result<()>;
}

#[derive(Debug)]
struct GlTexture {
    texture: glow::Texture,
    size_bytes: usize,
}

#[derive(Debug)]
struct GlBuffer {
    buffer: glow::Buffer,
    format: Option<VertexFormat>,
    size: usize,
}

/// A [`GraphicsDevice`] on top of an OpenGL 3.3 core context.
#[derive(Debug)]
pub struct GlDevice {
    gl: glow::Context,
    surface: Box<dyn GlSurface>,
    program: GlProgram,
    vao: glow::VertexArray,

    next_id: usize,
    textures: HashMap<TextureId, GlTexture>,
    vertex_buffers: HashMap<VertexBufferId, GlBuffer>,
    dynamic_buffers: HashMap<DynamicVertexBufferId, GlBuffer>,
    index_buffers: HashMap<IndexBufferId, GlBuffer>,

    bound_texture: TextureId,
    bound_vertex_buffer: VertexBufferId,
    bound_index_buffer: IndexBufferId,
    batch_format: Option<VertexFormat>,

    state: RenderState,
    matrices: [Mat4; 3],
    uniforms_dirty: bool,

    size: (u32, u32),
    max_texture_size: u32,
    renderer_name: String,
}

impl GlDevice {
    /// Wraps a GL context and its surface.
    ///
    /// # Safety
    ///
    /// `gl` must be a valid OpenGL 3.3 core (or newer) context, current on the
    /// calling thread for the whole lifetime of the device.
    pub unsafe fn new(
        gl: glow::Context,
        surface: Box<dyn GlSurface>,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let program = GlProgram::new(&gl)
            .map_err(|e| RenderError::InitializationFailed(e.to_string()))?;
        let vao = gl
            .create_vertex_array()
            .map_err(RenderError::InitializationFailed)?;
        gl.bind_vertex_array(Some(vao));
        gl.use_program(Some(program.program));
        gl.uniform_1_i32(program.uniforms.texture.as_ref(), 0);
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
        gl.front_face(glow::CCW);
        gl.cull_face(glow::BACK);
        gl.viewport(0, 0, width as i32, height as i32);

        let renderer_name = gl.get_parameter_string(glow::RENDERER);
        let max_texture_size = gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE).max(0) as u32;
        log::info!("GlDevice created on \"{renderer_name}\" ({width}x{height})");

        Ok(Self {
            gl,
            surface,
            program,
            vao,
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
            matrices: [Mat4::IDENTITY; 3],
            uniforms_dirty: true,
            size: (width, height),
            max_texture_size,
            renderer_name,
        })
    }

    /// The wrapped context, for callers that mix in their own GL calls.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    fn generate_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn check_allocation(&self) -> Result<(), ResourceError> {
        // SAFETY: the context is current for the lifetime of the device.
        match unsafe { self.gl.get_error() } {
            glow::NO_ERROR => Ok(()),
            glow::OUT_OF_MEMORY => Err(DeviceError::OutOfMemory.into()),
            code => Err(DeviceError::Backend(format!("GL error 0x{code:04X}")).into()),
        }
    }

    fn toggle(&self, capability: u32, enabled: bool) {
        // SAFETY: the context is current for the lifetime of the device.
        unsafe {
            if enabled {
                self.gl.enable(capability);
            } else {
                self.gl.disable(capability);
            }
        }
    }

    fn create_gl_buffer(
        &self,
        target: u32,
        data: &[u8],
        usage: u32,
    ) -> Result<glow::Buffer, ResourceError> {
        // SAFETY: the context is current for the lifetime of the device.
        unsafe {
            let buffer = self
                .gl
                .create_buffer()
                .map_err(|e| ResourceError::Device(DeviceError::Backend(e)))?;
            self.gl.bind_buffer(target, Some(buffer));
            self.gl.buffer_data_u8_slice(target, data, usage);
            if let Err(e) = self.check_allocation() {
                self.gl.delete_buffer(buffer);
                return Err(e);
            }
            Ok(buffer)
        }
    }

    /// Uploads transforms, alpha test and fog if they changed since the last draw.
    fn flush_uniforms(&mut self) {
        if !self.uniforms_dirty {
            return;
        }
        self.uniforms_dirty = false;
        let u = &self.program.uniforms;
        let projection = gl_projection(&self.matrices[MatrixType::Projection.index()]);
        let fog = &self.state.fog;
        let alpha = &self.state.alpha_test;
        // SAFETY: the context is current for the lifetime of the device.
        unsafe {
            let gl = &self.gl;
            gl.uniform_matrix_4_f32_slice(
                u.projection.as_ref(),
                false,
                &projection.to_cols_array(),
            );
            gl.uniform_matrix_4_f32_slice(
                u.modelview.as_ref(),
                false,
                &self.matrices[MatrixType::Modelview.index()].to_cols_array(),
            );
            gl.uniform_matrix_4_f32_slice(
                u.tex_matrix.as_ref(),
                false,
                &self.matrices[MatrixType::Texture.index()].to_cols_array(),
            );
            let texturing = self.state.texturing && self.textures.contains_key(&self.bound_texture);
            gl.uniform_1_i32(u.texturing.as_ref(), texturing as i32);
            let alpha_func = if alpha.enabled {
                conversions::alpha_func_code(alpha.func)
            } else {
                0
            };
            gl.uniform_1_i32(u.alpha_func.as_ref(), alpha_func);
            gl.uniform_1_f32(u.alpha_ref.as_ref(), alpha.reference);
            let fog_mode = if fog.enabled {
                conversions::fog_mode_code(fog.mode)
            } else {
                0
            };
            gl.uniform_1_i32(u.fog_mode.as_ref(), fog_mode);
            let [r, g, b, a] = fog.colour.to_normalized();
            gl.uniform_4_f32(u.fog_colour.as_ref(), r, g, b, a);
            gl.uniform_3_f32(u.fog_params.as_ref(), fog.density, fog.start, fog.end);
        }
    }

    /// Points the vertex attributes at the bound `ARRAY_BUFFER`, starting at `base` bytes.
    fn setup_attributes(&self, format: VertexFormat, base: i32) {
        let stride = format.stride() as i32;
        // SAFETY: the context is current for the lifetime of the device.
        unsafe {
            let gl = &self.gl;
            gl.enable_vertex_attrib_array(ATTRIB_POSITION);
            gl.vertex_attrib_pointer_f32(ATTRIB_POSITION, 3, glow::FLOAT, false, stride, base);
            match format.tex_coord_offset() {
                Some(offset) => {
                    gl.enable_vertex_attrib_array(ATTRIB_UV);
                    gl.vertex_attrib_pointer_f32(
                        ATTRIB_UV,
                        2,
                        glow::FLOAT,
                        false,
                        stride,
                        base + offset as i32,
                    );
                }
                None => {
                    gl.disable_vertex_attrib_array(ATTRIB_UV);
                    gl.vertex_attrib_4_f32(ATTRIB_UV, 0.0, 0.0, 0.0, 1.0);
                }
            }
            match format.colour_offset() {
                Some(offset) => {
                    gl.enable_vertex_attrib_array(ATTRIB_COLOUR);
                    gl.vertex_attrib_pointer_f32(
                        ATTRIB_COLOUR,
                        4,
                        glow::UNSIGNED_BYTE,
                        true,
                        stride,
                        base + offset as i32,
                    );
                }
                None => {
                    gl.disable_vertex_attrib_array(ATTRIB_COLOUR);
                    gl.vertex_attrib_4_f32(ATTRIB_COLOUR, 1.0, 1.0, 1.0, 1.0);
                }
            }
        }
    }
}

impl GraphicsDevice for GlDevice {
    // --- Information ---

    fn info(&self) -> GraphicsAdapterInfo {
        GraphicsAdapterInfo {
            name: self.renderer_name.clone(),
            backend_type: GraphicsBackendType::OpenGL,
            device_type: RendererDeviceType::Unknown,
        }
    }

    fn log_api_info(&self) {
        // SAFETY: the context is current for the lifetime of the device.
        let (vendor, version, glsl) = unsafe {
            (
                self.gl.get_parameter_string(glow::VENDOR),
                self.gl.get_parameter_string(glow::VERSION),
                self.gl.get_parameter_string(glow::SHADING_LANGUAGE_VERSION),
            )
        };
        log::info!("OpenGL renderer: {} ({vendor})", self.renderer_name);
        log::info!("OpenGL version: {version}, GLSL {glsl}");
        log::info!("Max texture size: {}", self.max_texture_size);
    }

    fn max_texture_dimensions(&self) -> (u32, u32) {
        (self.max_texture_size, self.max_texture_size)
    }

    fn supports_pixel_format(&self, format: PixelFormat) -> bool {
        conversions::pixel_format(format).is_some()
    }

    fn resource_usage(&self) -> ResourceUsage {
        ResourceUsage {
            textures: self.textures.len(),
            texture_bytes: self.textures.values().map(|t| t.size_bytes).sum(),
            vertex_buffers: self.vertex_buffers.len() + self.dynamic_buffers.len(),
            vertex_buffer_bytes: self
                .vertex_buffers
                .values()
                .chain(self.dynamic_buffers.values())
                .map(|b| b.size)
                .sum(),
            index_buffers: self.index_buffers.len(),
            index_buffer_bytes: self.index_buffers.values().map(|b| b.size).sum(),
        }
    }

    // --- Resources ---

    fn create_texture(&mut self, data: &TextureData) -> Result<TextureId, ResourceError> {
        let (internal_format, format) = conversions::pixel_format(data.format)
            .ok_or_else(|| ResourceError::unsupported_pixel_format(data.format))?;
        // SAFETY: the context is current for the lifetime of the device.
        let texture = unsafe {
            let gl = &self.gl;
            let texture = gl
                .create_texture()
                .map_err(|e| ResourceError::Device(DeviceError::Backend(e)))?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                internal_format as i32,
                data.width as i32,
                data.height as i32,
                0,
                format,
                glow::UNSIGNED_BYTE,
                Some(data.pixels.as_slice()),
            );
            if let Err(e) = self.check_allocation() {
                gl.delete_texture(texture);
                return Err(e);
            }
            texture
        };
        // Creation disturbed the binding; restore it.
        self.bind_texture(self.bound_texture);

        let id = TextureId(self.generate_id());
        self.textures.insert(
            id,
            GlTexture {
                texture,
                size_bytes: data.pixels.len(),
            },
        );
        log::debug!("GlDevice: Created texture {id:?} ({}x{})", data.width, data.height);
        Ok(id)
    }

    fn delete_texture(&mut self, id: TextureId) {
        if let Some(entry) = self.textures.remove(&id) {
            // SAFETY: the context is current for the lifetime of the device.
            unsafe { self.gl.delete_texture(entry.texture) };
            log::debug!("GlDevice: Destroyed texture {id:?}");
        }
        if self.bound_texture == id {
            self.bound_texture = TextureId::NONE;
            self.uniforms_dirty = true;
        }
    }

    fn bind_texture(&mut self, id: TextureId) {
        self.bound_texture = id;
        self.uniforms_dirty = true;
        let texture = self.textures.get(&id).map(|t| t.texture);
        // SAFETY: the context is current for the lifetime of the device.
        unsafe {
            self.gl.active_texture(glow::TEXTURE0);
            self.gl.bind_texture(glow::TEXTURE_2D, texture);
        }
    }

    fn create_vertex_buffer(
        &mut self,
        format: VertexFormat,
        data: &[u8],
        count: usize,
    ) -> Result<VertexBufferId, ResourceError> {
        let buffer = self.create_gl_buffer(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW)?;
        let id = VertexBufferId(self.generate_id());
        self.vertex_buffers.insert(
            id,
            GlBuffer {
                buffer,
                format: Some(format),
                size: data.len(),
            },
        );
        log::debug!("GlDevice: Created vertex buffer {id:?} ({count} x {format:?})");
        Ok(id)
    }

    fn create_dynamic_vertex_buffer(
        &mut self,
        format: VertexFormat,
        max_vertices: usize,
    ) -> Result<DynamicVertexBufferId, ResourceError> {
        let size = max_vertices * format.stride();
        // SAFETY: the context is current for the lifetime of the device.
        let buffer = unsafe {
            let buffer = self
                .gl
                .create_buffer()
                .map_err(|e| ResourceError::Device(DeviceError::Backend(e)))?;
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.gl
                .buffer_data_size(glow::ARRAY_BUFFER, size as i32, glow::DYNAMIC_DRAW);
            if let Err(e) = self.check_allocation() {
                self.gl.delete_buffer(buffer);
                return Err(e);
            }
            buffer
        };
        let id = DynamicVertexBufferId(self.generate_id());
        self.dynamic_buffers.insert(
            id,
            GlBuffer {
                buffer,
                format: Some(format),
                size,
            },
        );
        log::debug!("GlDevice: Created dynamic vertex buffer {id:?} ({max_vertices} x {format:?})");
        Ok(id)
    }

    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<IndexBufferId, ResourceError> {
        let bytes: &[u8] = bytemuck::cast_slice(indices);
        let buffer = self.create_gl_buffer(glow::ELEMENT_ARRAY_BUFFER, bytes, glow::STATIC_DRAW)?;
        let id = IndexBufferId(self.generate_id());
        self.index_buffers.insert(
            id,
            GlBuffer {
                buffer,
                format: None,
                size: bytes.len(),
            },
        );
        log::debug!("GlDevice: Created index buffer {id:?} ({} indices)", indices.len());
        Ok(id)
    }

    fn delete_vertex_buffer(&mut self, id: VertexBufferId) {
        if let Some(entry) = self.vertex_buffers.remove(&id) {
            // SAFETY: the context is current for the lifetime of the device.
            unsafe { self.gl.delete_buffer(entry.buffer) };
        }
        if self.bound_vertex_buffer == id {
            self.bound_vertex_buffer = VertexBufferId::NONE;
        }
    }

    fn delete_dynamic_vertex_buffer(&mut self, id: DynamicVertexBufferId) {
        if let Some(entry) = self.dynamic_buffers.remove(&id) {
            // SAFETY: the context is current for the lifetime of the device.
            unsafe { self.gl.delete_buffer(entry.buffer) };
        }
    }

    fn delete_index_buffer(&mut self, id: IndexBufferId) {
        if let Some(entry) = self.index_buffers.remove(&id) {
            // SAFETY: the context is current for the lifetime of the device.
            unsafe { self.gl.delete_buffer(entry.buffer) };
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

    fn set_texturing(&mut self, enabled: bool) {
        self.state.texturing = enabled;
        self.uniforms_dirty = true;
    }

    fn set_fog(&mut self, enabled: bool) {
        self.state.fog.enabled = enabled;
        self.uniforms_dirty = true;
    }

    fn set_fog_mode(&mut self, mode: FogMode) {
        self.state.fog.mode = mode;
        self.uniforms_dirty = true;
    }

    fn set_fog_colour(&mut self, colour: Rgba8) {
        self.state.fog.colour = colour;
        self.uniforms_dirty = true;
    }

    fn set_fog_density(&mut self, density: f32) {
        self.state.fog.density = density;
        self.uniforms_dirty = true;
    }

    fn set_fog_start(&mut self, start: f32) {
        self.state.fog.start = start;
        self.uniforms_dirty = true;
    }

    fn set_fog_end(&mut self, end: f32) {
        self.state.fog.end = end;
        self.uniforms_dirty = true;
    }

    fn set_face_culling(&mut self, enabled: bool) {
        self.state.face_culling = enabled;
        self.toggle(glow::CULL_FACE, enabled);
    }

    fn set_alpha_test(&mut self, enabled: bool) {
        self.state.alpha_test.enabled = enabled;
        self.uniforms_dirty = true;
    }

    fn set_alpha_test_func(&mut self, func: CompareFunc, reference: f32) {
        self.state.alpha_test.func = func;
        self.state.alpha_test.reference = reference;
        self.uniforms_dirty = true;
    }

    fn set_alpha_blending(&mut self, enabled: bool) {
        self.state.blend.enabled = enabled;
        self.toggle(glow::BLEND, enabled);
    }

    fn set_alpha_blend_func(&mut self, src: BlendFunc, dst: BlendFunc) {
        self.state.blend.src = src;
        self.state.blend.dst = dst;
        // SAFETY: the context is current for the lifetime of the device.
        unsafe {
            self.gl
                .blend_func(conversions::blend_func(src), conversions::blend_func(dst))
        };
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.state.depth.test = enabled;
        self.toggle(glow::DEPTH_TEST, enabled);
    }

    fn set_depth_test_func(&mut self, func: CompareFunc) {
        self.state.depth.func = func;
        // SAFETY: the context is current for the lifetime of the device.
        unsafe { self.gl.depth_func(conversions::compare_func(func)) };
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.state.depth.write = enabled;
        // SAFETY: the context is current for the lifetime of the device.
        unsafe { self.gl.depth_mask(enabled) };
    }

    fn set_colour_write(&mut self, enabled: bool) {
        self.state.colour_write = enabled;
        // SAFETY: the context is current for the lifetime of the device.
        unsafe { self.gl.color_mask(enabled, enabled, enabled, enabled) };
    }

    fn set_clear_colour(&mut self, colour: Rgba8) {
        let [r, g, b, a] = colour.to_normalized();
        // SAFETY: the context is current for the lifetime of the device.
        unsafe { self.gl.clear_color(r, g, b, a) };
    }

    fn clear(&mut self) {
        // SAFETY: the context is current for the lifetime of the device.
        unsafe {
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT)
        };
    }

    // --- Transforms ---

    fn load_matrix(&mut self, kind: MatrixType, matrix: &Mat4) {
        self.matrices[kind.index()] = *matrix;
        self.uniforms_dirty = true;
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
        let Some((buffer, Some(format))) = self.vertex_buffers.get(&id).map(|b| (b.buffer, b.format))
        else {
            log::warn!("GlDevice: Ignoring draw of unknown vertex buffer {id:?}");
            return;
        };
        self.flush_uniforms();
        // SAFETY: the context is current for the lifetime of the device.
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer)) };
        self.setup_attributes(format, 0);
        // SAFETY: as above.
        unsafe {
            self.gl
                .draw_arrays(conversions::draw_mode(mode), start_vertex as i32, count as i32)
        };
    }

    fn draw_indexed_vertex_buffer(
        &mut self,
        mode: DrawMode,
        index_count: usize,
        start_vertex: usize,
        start_index: usize,
    ) {
        let vb = self.vertex_buffers.get(&self.bound_vertex_buffer);
        let ib = self.index_buffers.get(&self.bound_index_buffer);
        let (Some(vb), Some(ib)) = (vb, ib) else {
            log::warn!("GlDevice: Ignoring indexed draw without bound buffers");
            return;
        };
        let (vertices, indices) = (vb.buffer, ib.buffer);
        let Some(format) = self.batch_format.or(vb.format) else {
            return;
        };
        self.flush_uniforms();
        // SAFETY: the context is current for the lifetime of the device.
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertices));
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(indices));
        }
        self.setup_attributes(format, 0);
        // SAFETY: as above.
        unsafe {
            self.gl.draw_elements_base_vertex(
                conversions::draw_mode(mode),
                index_count as i32,
                glow::UNSIGNED_SHORT,
                (start_index * std::mem::size_of::<u16>()) as i32,
                start_vertex as i32,
            );
        }
    }

    fn draw_dynamic_vertex_buffer(
        &mut self,
        mode: DrawMode,
        id: DynamicVertexBufferId,
        data: &[u8],
        count: usize,
    ) {
        let Some((buffer, Some(format))) = self.dynamic_buffers.get(&id).map(|b| (b.buffer, b.format))
        else {
            log::warn!("GlDevice: Ignoring draw of unknown dynamic vertex buffer {id:?}");
            return;
        };
        self.flush_uniforms();
        // SAFETY: the context is current for the lifetime of the device.
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.gl.buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, 0, data);
        }
        self.setup_attributes(format, 0);
        // SAFETY: as above.
        unsafe {
            self.gl
                .draw_arrays(conversions::draw_mode(mode), 0, count as i32)
        };
    }

    // --- Frame ---

    fn begin_frame(&mut self) {
        // SAFETY: the context is current for the lifetime of the device.
        unsafe {
            self.gl.bind_vertex_array(Some(self.vao));
            self.gl.use_program(Some(self.program.program));
        }
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        // SAFETY: the context is current for the lifetime of the device.
        if unsafe { self.gl.get_error() } == glow::CONTEXT_LOST {
            return Err(DeviceError::DeviceLost.into());
        }
        self.surface
            .swap_buffers()
            .map_err(|e| RenderError::Device(DeviceError::Backend(e.to_string())))
    }

    fn set_vsync(&mut self, enabled: bool) {
        if let Err(e) = self.surface.set_swap_interval(enabled) {
            log::warn!("GlDevice: failed to set swap interval: {e}");
        }
    }

    fn on_window_resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        // The default framebuffer's depth buffer is resized with the window.
        // SAFETY: the context is current for the lifetime of the device.
        unsafe { self.gl.viewport(0, 0, width as i32, height as i32) };
    }

    fn read_framebuffer(&mut self) -> Result<TextureData, RenderError> {
        let (width, height) = self.size;
        let row = width as usize * 4;
        let mut pixels = vec![0u8; row * height as usize];
        // SAFETY: the context is current for the lifetime of the device.
        unsafe {
            self.gl.read_pixels(
                0,
                0,
                width as i32,
                height as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(&mut pixels),
            );
        }
        // GL rows start at the bottom.
        let flipped = pixels
            .chunks_exact(row)
            .rev()
            .flatten()
            .copied()
            .collect();
        Ok(TextureData::new(width, height, PixelFormat::Rgba8, flipped))
    }

    // --- Downcasting ---

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drop for GlDevice {
    fn drop(&mut self) {
        // SAFETY: the context is current for the lifetime of the device.
        unsafe {
            for texture in self.textures.values() {
                self.gl.delete_texture(texture.texture);
            }
            for buffer in self
                .vertex_buffers
                .values()
                .chain(self.dynamic_buffers.values())
                .chain(self.index_buffers.values())
            {
                self.gl.delete_buffer(buffer.buffer);
            }
            self.gl.delete_vertex_array(self.vao);
            self.program.destroy(&self.gl);
        }
        log::info!("GlDevice destroyed.");
    }
}
