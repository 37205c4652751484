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

use super::command::DeviceCommand;
use std::any::Any;
use std::collections::HashMap;
use tessera_core::math::{Mat4, Rgba8};
use tessera_core::renderer::api::*;
use tessera_core::renderer::{DeviceError, GraphicsDevice, RenderError, ResourceError};

const DEFAULT_MAX_TEXTURE_DIMENSION: u32 = 8192;

/// Reads vertices back out of an uploaded byte stream.
///
/// The bytes may come from a `Vec<u8>` and are therefore read unaligned.
pub fn decode_vertices<V: Vertex>(bytes: &[u8]) -> Vec<V> {
    bytes
        .chunks_exact(std::mem::size_of::<V>())
        .map(bytemuck::pod_read_unaligned)
        .collect()
}

#[derive(Debug)]
struct HeadlessBuffer {
    format: VertexFormat,
    capacity: usize,
    data: Vec<u8>,
}

/// A device that keeps backend state in memory and records every call.
///
/// Its framebuffer only reflects clears; draws are recorded but not rasterised.
/// The command log is reset at every `begin_frame`, so a long-running headless
/// context stays bounded; [`HeadlessDevice::with_full_history`] keeps everything.
#[derive(Debug)]
pub struct HeadlessDevice {
    commands: Vec<DeviceCommand>,
    retain_history: bool,
    next_id: usize,

    textures: HashMap<TextureId, TextureData>,
    vertex_buffers: HashMap<VertexBufferId, HeadlessBuffer>,
    dynamic_buffers: HashMap<DynamicVertexBufferId, HeadlessBuffer>,
    index_buffers: HashMap<IndexBufferId, Vec<u16>>,

    bound_texture: TextureId,
    bound_vertex_buffer: VertexBufferId,
    bound_index_buffer: IndexBufferId,
    batch_format: Option<VertexFormat>,

    state: RenderState,
    clear_colour: Rgba8,
    matrices: [Mat4; 3],

    size: (u32, u32),
    framebuffer: Vec<u8>,
    max_texture_dimension: u32,
    vsync: bool,
    in_frame: bool,
    frames_presented: u64,

    fail_next_allocation: bool,
    device_lost: bool,
}

impl HeadlessDevice {
    /// Creates a device with a `width` x `height` framebuffer cleared to transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        log::info!("HeadlessDevice created with a {width}x{height} framebuffer");
        Self {
            commands: Vec::new(),
            retain_history: false,
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
            size: (width, height),
            framebuffer: vec![0; width as usize * height as usize * 4],
            max_texture_dimension: DEFAULT_MAX_TEXTURE_DIMENSION,
            vsync: true,
            in_frame: false,
            frames_presented: 0,
            fail_next_allocation: false,
            device_lost: false,
        }
    }

    /// Overrides the maximum texture size the device reports.
    pub fn with_max_texture_dimension(mut self, max: u32) -> Self {
        self.max_texture_dimension = max;
        self
    }

    /// Keeps the command log across frames instead of resetting it at `begin_frame`.
    pub fn with_full_history(mut self) -> Self {
        self.retain_history = true;
        self
    }

    // --- Inspection ---

    /// Calls received since the current frame began (or since creation, with
    /// full history), oldest first.
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Drains the command log.
    pub fn take_commands(&mut self) -> Vec<DeviceCommand> {
        std::mem::take(&mut self.commands)
    }

    /// The render state as last written by the context.
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// The clear colour as last written.
    pub fn clear_colour(&self) -> Rgba8 {
        self.clear_colour
    }

    /// The matrix last loaded for `kind`.
    pub fn matrix(&self, kind: MatrixType) -> Mat4 {
        self.matrices[kind.index()]
    }

    /// The layout declared for indexed draws.
    pub fn batch_format(&self) -> Option<VertexFormat> {
        self.batch_format
    }

    /// The currently bound texture.
    pub fn bound_texture(&self) -> TextureId {
        self.bound_texture
    }

    /// The currently bound vertex buffer.
    pub fn bound_vertex_buffer(&self) -> VertexBufferId {
        self.bound_vertex_buffer
    }

    /// The currently bound index buffer.
    pub fn bound_index_buffer(&self) -> IndexBufferId {
        self.bound_index_buffer
    }

    /// The pixels of a live texture.
    pub fn texture(&self, id: TextureId) -> Option<&TextureData> {
        self.textures.get(&id)
    }

    /// The contents of a live index buffer.
    pub fn index_buffer(&self, id: IndexBufferId) -> Option<&[u16]> {
        self.index_buffers.get(&id).map(Vec::as_slice)
    }

    /// The bytes most recently uploaded to a dynamic buffer.
    pub fn dynamic_contents(&self, id: DynamicVertexBufferId) -> Option<&[u8]> {
        self.dynamic_buffers.get(&id).map(|b| b.data.as_slice())
    }

    /// Whether vsync was last requested.
    pub fn vsync(&self) -> bool {
        self.vsync
    }

    /// The framebuffer size.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Returns `true` between `begin_frame` and `end_frame`.
    pub fn is_in_frame(&self) -> bool {
        self.in_frame
    }

    /// Frames successfully ended.
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    // --- Failure injection ---

    /// Makes the next resource creation fail with [`DeviceError::OutOfMemory`].
    pub fn fail_next_allocation(&mut self) {
        self.fail_next_allocation = true;
    }

    /// Makes every following `end_frame` fail with [`DeviceError::DeviceLost`].
    pub fn lose_device(&mut self) {
        log::warn!("HeadlessDevice: simulating device loss");
        self.device_lost = true;
    }

    // --- Internals ---

    fn record(&mut self, command: DeviceCommand) {
        log::trace!("HeadlessDevice: {command:?}");
        self.commands.push(command);
    }

    fn allocate_id(&mut self) -> Result<usize, ResourceError> {
        if std::mem::take(&mut self.fail_next_allocation) {
            log::error!("HeadlessDevice: injected allocation failure");
            return Err(DeviceError::OutOfMemory.into());
        }
        let id = self.next_id;
        self.next_id += 1;
        Ok(id)
    }

    fn fill_framebuffer(&mut self, colour: Rgba8) {
        let rgba = [colour.r, colour.g, colour.b, colour.a];
        for pixel in self.framebuffer.chunks_exact_mut(4) {
            pixel.copy_from_slice(&rgba);
        }
    }
}

impl GraphicsDevice for HeadlessDevice {
    // --- Information ---

    fn info(&self) -> GraphicsAdapterInfo {
        GraphicsAdapterInfo {
            name: "Headless".to_string(),
            backend_type: GraphicsBackendType::Unknown,
            device_type: RendererDeviceType::Cpu,
        }
    }

    fn log_api_info(&self) {
        log::info!(
            "HeadlessDevice: {}x{} framebuffer, {} commands recorded",
            self.size.0,
            self.size.1,
            self.commands.len()
        );
    }

    fn max_texture_dimensions(&self) -> (u32, u32) {
        (self.max_texture_dimension, self.max_texture_dimension)
    }

    fn supports_pixel_format(&self, format: PixelFormat) -> bool {
        matches!(format, PixelFormat::Rgba8 | PixelFormat::Bgra8)
    }

    fn resource_usage(&self) -> ResourceUsage {
        let vertex_bytes = |b: &HeadlessBuffer| b.capacity * b.format.stride();
        ResourceUsage {
            textures: self.textures.len(),
            texture_bytes: self.textures.values().map(|t| t.pixels.len()).sum(),
            vertex_buffers: self.vertex_buffers.len() + self.dynamic_buffers.len(),
            vertex_buffer_bytes: self
                .vertex_buffers
                .values()
                .chain(self.dynamic_buffers.values())
                .map(vertex_bytes)
                .sum(),
            index_buffers: self.index_buffers.len(),
            index_buffer_bytes: self.index_buffers.values().map(|b| b.len() * 2).sum(),
        }
    }

    // --- Resources ---

    fn create_texture(&mut self, data: &TextureData) -> Result<TextureId, ResourceError> {
        let id = TextureId(self.allocate_id()?);
        self.textures.insert(id, data.clone());
        self.record(DeviceCommand::CreateTexture {
            id,
            width: data.width,
            height: data.height,
            format: data.format,
        });
        Ok(id)
    }

    fn delete_texture(&mut self, id: TextureId) {
        if self.textures.remove(&id).is_none() {
            log::warn!("HeadlessDevice: delete of unknown texture {id:?}");
        }
        if self.bound_texture == id {
            self.bound_texture = TextureId::NONE;
        }
        self.record(DeviceCommand::DeleteTexture(id));
    }

    fn bind_texture(&mut self, id: TextureId) {
        self.bound_texture = id;
        self.record(DeviceCommand::BindTexture(id));
    }

    fn create_vertex_buffer(
        &mut self,
        format: VertexFormat,
        data: &[u8],
        count: usize,
    ) -> Result<VertexBufferId, ResourceError> {
        let id = VertexBufferId(self.allocate_id()?);
        self.vertex_buffers.insert(
            id,
            HeadlessBuffer {
                format,
                capacity: count,
                data: data.to_vec(),
            },
        );
        self.record(DeviceCommand::CreateVertexBuffer { id, format, count });
        Ok(id)
    }

    fn create_dynamic_vertex_buffer(
        &mut self,
        format: VertexFormat,
        max_vertices: usize,
    ) -> Result<DynamicVertexBufferId, ResourceError> {
        let id = DynamicVertexBufferId(self.allocate_id()?);
        self.dynamic_buffers.insert(
            id,
            HeadlessBuffer {
                format,
                capacity: max_vertices,
                data: Vec::new(),
            },
        );
        self.record(DeviceCommand::CreateDynamicVertexBuffer {
            id,
            format,
            max_vertices,
        });
        Ok(id)
    }

    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<IndexBufferId, ResourceError> {
        let id = IndexBufferId(self.allocate_id()?);
        self.index_buffers.insert(id, indices.to_vec());
        self.record(DeviceCommand::CreateIndexBuffer {
            id,
            len: indices.len(),
        });
        Ok(id)
    }

    fn delete_vertex_buffer(&mut self, id: VertexBufferId) {
        self.vertex_buffers.remove(&id);
        if self.bound_vertex_buffer == id {
            self.bound_vertex_buffer = VertexBufferId::NONE;
        }
        self.record(DeviceCommand::DeleteVertexBuffer(id));
    }

    fn delete_dynamic_vertex_buffer(&mut self, id: DynamicVertexBufferId) {
        self.dynamic_buffers.remove(&id);
        self.record(DeviceCommand::DeleteDynamicVertexBuffer(id));
    }

    fn delete_index_buffer(&mut self, id: IndexBufferId) {
        self.index_buffers.remove(&id);
        if self.bound_index_buffer == id {
            self.bound_index_buffer = IndexBufferId::NONE;
        }
        self.record(DeviceCommand::DeleteIndexBuffer(id));
    }

    fn bind_vertex_buffer(&mut self, id: VertexBufferId) {
        self.bound_vertex_buffer = id;
        self.record(DeviceCommand::BindVertexBuffer(id));
    }

    fn bind_index_buffer(&mut self, id: IndexBufferId) {
        self.bound_index_buffer = id;
        self.record(DeviceCommand::BindIndexBuffer(id));
    }

    // --- Render state ---

    fn set_texturing(&mut self, enabled: bool) {
        self.state.texturing = enabled;
        self.record(DeviceCommand::SetTexturing(enabled));
    }

    fn set_fog(&mut self, enabled: bool) {
        self.state.fog.enabled = enabled;
        self.record(DeviceCommand::SetFog(enabled));
    }

    fn set_fog_mode(&mut self, mode: FogMode) {
        self.state.fog.mode = mode;
        self.record(DeviceCommand::SetFogMode(mode));
    }

    fn set_fog_colour(&mut self, colour: Rgba8) {
        self.state.fog.colour = colour;
        self.record(DeviceCommand::SetFogColour(colour));
    }

    fn set_fog_density(&mut self, density: f32) {
        self.state.fog.density = density;
        self.record(DeviceCommand::SetFogDensity(density));
    }

    fn set_fog_start(&mut self, start: f32) {
        self.state.fog.start = start;
        self.record(DeviceCommand::SetFogStart(start));
    }

    fn set_fog_end(&mut self, end: f32) {
        self.state.fog.end = end;
        self.record(DeviceCommand::SetFogEnd(end));
    }

    fn set_face_culling(&mut self, enabled: bool) {
        self.state.face_culling = enabled;
        self.record(DeviceCommand::SetFaceCulling(enabled));
    }

    fn set_alpha_test(&mut self, enabled: bool) {
        self.state.alpha_test.enabled = enabled;
        self.record(DeviceCommand::SetAlphaTest(enabled));
    }

    fn set_alpha_test_func(&mut self, func: CompareFunc, reference: f32) {
        self.state.alpha_test.func = func;
        self.state.alpha_test.reference = reference;
        self.record(DeviceCommand::SetAlphaTestFunc(func, reference));
    }

    fn set_alpha_blending(&mut self, enabled: bool) {
        self.state.blend.enabled = enabled;
        self.record(DeviceCommand::SetAlphaBlending(enabled));
    }

    fn set_alpha_blend_func(&mut self, src: BlendFunc, dst: BlendFunc) {
        self.state.blend.src = src;
        self.state.blend.dst = dst;
        self.record(DeviceCommand::SetAlphaBlendFunc(src, dst));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.state.depth.test = enabled;
        self.record(DeviceCommand::SetDepthTest(enabled));
    }

    fn set_depth_test_func(&mut self, func: CompareFunc) {
        self.state.depth.func = func;
        self.record(DeviceCommand::SetDepthTestFunc(func));
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.state.depth.write = enabled;
        self.record(DeviceCommand::SetDepthWrite(enabled));
    }

    fn set_colour_write(&mut self, enabled: bool) {
        self.state.colour_write = enabled;
        self.record(DeviceCommand::SetColourWrite(enabled));
    }

    fn set_clear_colour(&mut self, colour: Rgba8) {
        self.clear_colour = colour;
        self.record(DeviceCommand::SetClearColour(colour));
    }

    fn clear(&mut self) {
        // Colour writes gate the clear the same way a colour mask does.
        if self.state.colour_write {
            self.fill_framebuffer(self.clear_colour);
        }
        self.record(DeviceCommand::Clear);
    }

    // --- Transforms ---

    fn load_matrix(&mut self, kind: MatrixType, matrix: &Mat4) {
        self.matrices[kind.index()] = *matrix;
        self.record(DeviceCommand::LoadMatrix(kind, *matrix));
    }

    // --- Drawing ---

    fn set_batch_format(&mut self, format: VertexFormat) {
        self.batch_format = Some(format);
        self.record(DeviceCommand::SetBatchFormat(format));
    }

    fn draw_vertex_buffer(
        &mut self,
        mode: DrawMode,
        id: VertexBufferId,
        start_vertex: usize,
        count: usize,
    ) {
        self.record(DeviceCommand::DrawVertexBuffer {
            mode,
            id,
            start_vertex,
            count,
        });
    }

    fn draw_indexed_vertex_buffer(
        &mut self,
        mode: DrawMode,
        index_count: usize,
        start_vertex: usize,
        start_index: usize,
    ) {
        self.record(DeviceCommand::DrawIndexedVertexBuffer {
            mode,
            index_count,
            start_vertex,
            start_index,
        });
    }

    fn draw_dynamic_vertex_buffer(
        &mut self,
        mode: DrawMode,
        id: DynamicVertexBufferId,
        data: &[u8],
        count: usize,
    ) {
        match self.dynamic_buffers.get_mut(&id) {
            Some(buffer) => {
                buffer.data.clear();
                buffer.data.extend_from_slice(data);
            }
            None => log::warn!("HeadlessDevice: draw of unknown dynamic buffer {id:?}"),
        }
        self.record(DeviceCommand::DrawDynamicVertexBuffer {
            mode,
            id,
            data: data.to_vec(),
            count,
        });
    }

    // --- Frame ---

    fn begin_frame(&mut self) {
        if !self.retain_history {
            self.commands.clear();
        }
        self.in_frame = true;
        self.record(DeviceCommand::BeginFrame);
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.in_frame = false;
        self.record(DeviceCommand::EndFrame);
        if self.device_lost {
            return Err(DeviceError::DeviceLost.into());
        }
        self.frames_presented += 1;
        Ok(())
    }

    fn set_vsync(&mut self, enabled: bool) {
        self.vsync = enabled;
        self.record(DeviceCommand::SetVsync(enabled));
    }

    fn on_window_resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.framebuffer = vec![0; width as usize * height as usize * 4];
        self.record(DeviceCommand::Resize(width, height));
    }

    fn read_framebuffer(&mut self) -> Result<TextureData, RenderError> {
        self.record(DeviceCommand::ReadFramebuffer);
        let (width, height) = self.size;
        Ok(TextureData::new(
            width,
            height,
            PixelFormat::Rgba8,
            self.framebuffer.clone(),
        ))
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
    fn ids_start_at_one_and_are_unique() {
        let mut device = HeadlessDevice::new(4, 4);
        let a = device
            .create_texture(&TextureData::solid(1, 1, [255; 4]))
            .unwrap();
        let b = device.create_index_buffer(&[0, 1, 2]).unwrap();
        assert_eq!(a, TextureId(1));
        assert_eq!(b, IndexBufferId(2));
    }

    #[test]
    fn injected_allocation_failure_is_one_shot() {
        let mut device = HeadlessDevice::new(4, 4);
        device.fail_next_allocation();
        let err = device.create_index_buffer(&[0]).unwrap_err();
        assert!(matches!(err, ResourceError::Device(DeviceError::OutOfMemory)));
        assert!(device.create_index_buffer(&[0]).is_ok());
    }

    #[test]
    fn clear_fills_framebuffer_unless_colour_writes_are_off() {
        let mut device = HeadlessDevice::new(2, 1);
        device.set_clear_colour(Rgba8::RED);
        device.clear();
        let frame = device.read_framebuffer().unwrap();
        assert_eq!(frame.pixels, vec![255, 0, 0, 255, 255, 0, 0, 255]);

        device.set_colour_write(false);
        device.set_clear_colour(Rgba8::BLUE);
        device.clear();
        let frame = device.read_framebuffer().unwrap();
        assert_eq!(&frame.pixels[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn dynamic_draw_replaces_contents() {
        let mut device = HeadlessDevice::new(1, 1);
        let id = device
            .create_dynamic_vertex_buffer(VertexFormat::PositionColour, 4)
            .unwrap();
        let quad = [VertexPosCol::new(1.0, 2.0, 0.0, Rgba8::GREEN)];
        device.draw_dynamic_vertex_buffer(DrawMode::Triangles, id, bytemuck::cast_slice(&quad), 1);

        let stored = decode_vertices::<VertexPosCol>(device.dynamic_contents(id).unwrap());
        assert_eq!(stored, quad.to_vec());
    }

    #[test]
    fn lost_device_fails_end_frame() {
        let mut device = HeadlessDevice::new(1, 1);
        device.begin_frame();
        device.lose_device();
        let err = device.end_frame().unwrap_err();
        assert!(matches!(err, RenderError::Device(DeviceError::DeviceLost)));
        assert_eq!(device.frames_presented(), 0);
    }

    #[test]
    fn command_log_is_reset_every_frame() {
        let mut device = HeadlessDevice::new(2, 2);
        for _ in 0..1000 {
            device.begin_frame();
            device.clear();
            device.end_frame().unwrap();
        }
        assert_eq!(
            device.commands(),
            &[
                DeviceCommand::BeginFrame,
                DeviceCommand::Clear,
                DeviceCommand::EndFrame
            ]
        );
    }

    #[test]
    fn full_history_keeps_every_frame() {
        let mut device = HeadlessDevice::new(2, 2).with_full_history();
        for _ in 0..3 {
            device.begin_frame();
            device.end_frame().unwrap();
        }
        assert_eq!(device.commands().len(), 6);
    }
}
