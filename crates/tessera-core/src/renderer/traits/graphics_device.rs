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

use crate::math::{Mat4, Rgba8};
use crate::renderer::api::*;
use crate::renderer::error::{RenderError, ResourceError};
use std::any::Any;
use std::fmt::Debug;

/// The primitive command surface a graphics backend implements.
///
/// A device is driven by exactly one [`GraphicsContext`](crate::renderer::GraphicsContext),
/// which validates every call before forwarding it. Implementations may therefore
/// assume that handles passed in were created by them and not yet deleted, that
/// dynamic uploads fit their buffer, and that the vertex formats match. Anything
/// they cannot honour (an unknown handle, a zero-size resize) is logged and ignored.
///
/// Calls are applied in program order. A backend that records commands and encodes
/// them later must preserve that order, including the contents of a dynamic buffer
/// at the time of each individual draw.
///
/// Devices are single-threaded and are not required to be `Send`.
pub trait GraphicsDevice: Debug + 'static {
    // --- Information ---

    /// Returns information about the adapter the device runs on.
    fn info(&self) -> GraphicsAdapterInfo;

    /// Logs backend-specific details (adapter, driver, limits) at `info` level.
    fn log_api_info(&self);

    /// The largest texture width and height the device accepts.
    fn max_texture_dimensions(&self) -> (u32, u32);

    /// Returns `true` if textures in `format` can be uploaded.
    fn supports_pixel_format(&self, format: PixelFormat) -> bool;

    /// Offset subtracted from screen-space quad corners so that texels map
    /// exactly onto pixels. Zero for APIs that sample at pixel centres.
    fn pixel_centre_offset(&self) -> f32 {
        0.0
    }

    /// Live resources held by the device.
    fn resource_usage(&self) -> ResourceUsage;

    // --- Resources ---

    /// Uploads a validated texture. The returned handle is never [`TextureId::NONE`].
    fn create_texture(&mut self, data: &TextureData) -> Result<TextureId, ResourceError>;

    /// Releases a texture. If it is bound, the texture slot becomes empty.
    fn delete_texture(&mut self, id: TextureId);

    /// Makes `id` the texture sampled by subsequent draws. `NONE` unbinds.
    fn bind_texture(&mut self, id: TextureId);

    /// Creates an immutable vertex buffer holding `count` vertices of `format`.
    fn create_vertex_buffer(
        &mut self,
        format: VertexFormat,
        data: &[u8],
        count: usize,
    ) -> Result<VertexBufferId, ResourceError>;

    /// Creates a dynamic vertex buffer able to hold `max_vertices` vertices of `format`.
    fn create_dynamic_vertex_buffer(
        &mut self,
        format: VertexFormat,
        max_vertices: usize,
    ) -> Result<DynamicVertexBufferId, ResourceError>;

    /// Creates an immutable index buffer.
    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<IndexBufferId, ResourceError>;

    /// Releases a static vertex buffer, unbinding it if bound.
    fn delete_vertex_buffer(&mut self, id: VertexBufferId);

    /// Releases a dynamic vertex buffer.
    fn delete_dynamic_vertex_buffer(&mut self, id: DynamicVertexBufferId);

    /// Releases an index buffer, unbinding it if bound.
    fn delete_index_buffer(&mut self, id: IndexBufferId);

    /// Makes `id` the vertex buffer used by indexed draws.
    fn bind_vertex_buffer(&mut self, id: VertexBufferId);

    /// Makes `id` the index buffer used by indexed draws.
    fn bind_index_buffer(&mut self, id: IndexBufferId);

    // --- Render state ---

    /// Enables or disables sampling of the bound texture.
    fn set_texturing(&mut self, enabled: bool);
    /// Enables or disables fog.
    fn set_fog(&mut self, enabled: bool);
    /// Sets the fog falloff curve.
    fn set_fog_mode(&mut self, mode: FogMode);
    /// Sets the fog colour.
    fn set_fog_colour(&mut self, colour: Rgba8);
    /// Sets the density used by the exponential fog modes.
    fn set_fog_density(&mut self, density: f32);
    /// Sets the distance where linear fog begins.
    fn set_fog_start(&mut self, start: f32);
    /// Sets the distance where linear fog is total.
    fn set_fog_end(&mut self, end: f32);
    /// Enables or disables back-face culling.
    fn set_face_culling(&mut self, enabled: bool);
    /// Enables or disables the alpha test.
    fn set_alpha_test(&mut self, enabled: bool);
    /// Sets the alpha test comparison and reference value.
    fn set_alpha_test_func(&mut self, func: CompareFunc, reference: f32);
    /// Enables or disables alpha blending.
    fn set_alpha_blending(&mut self, enabled: bool);
    /// Sets the source and destination blend factors.
    fn set_alpha_blend_func(&mut self, src: BlendFunc, dst: BlendFunc);
    /// Enables or disables the depth test.
    fn set_depth_test(&mut self, enabled: bool);
    /// Sets the depth comparison.
    fn set_depth_test_func(&mut self, func: CompareFunc);
    /// Enables or disables depth writes.
    fn set_depth_write(&mut self, enabled: bool);
    /// Enables or disables colour writes.
    fn set_colour_write(&mut self, enabled: bool);
    /// Sets the colour used by [`GraphicsDevice::clear`].
    fn set_clear_colour(&mut self, colour: Rgba8);
    /// Clears the colour and depth of the current render target.
    fn clear(&mut self);

    // --- Transforms ---

    /// Replaces the active matrix of the given kind. Projections use a `[0, 1]` depth range.
    fn load_matrix(&mut self, kind: MatrixType, matrix: &Mat4);

    // --- Drawing ---

    /// Declares the layout of the bound vertex buffer for indexed draws.
    fn set_batch_format(&mut self, format: VertexFormat);

    /// Draws `count` vertices of a static buffer starting at `start_vertex`.
    fn draw_vertex_buffer(
        &mut self,
        mode: DrawMode,
        id: VertexBufferId,
        start_vertex: usize,
        count: usize,
    );

    /// Draws `index_count` indices of the bound index buffer, starting at `start_index`,
    /// with every index offset by `start_vertex` into the bound vertex buffer.
    fn draw_indexed_vertex_buffer(
        &mut self,
        mode: DrawMode,
        index_count: usize,
        start_vertex: usize,
        start_index: usize,
    );

    /// Replaces the first `count` vertices of a dynamic buffer with `data` and draws them.
    fn draw_dynamic_vertex_buffer(
        &mut self,
        mode: DrawMode,
        id: DynamicVertexBufferId,
        data: &[u8],
        count: usize,
    );

    // --- Frame ---

    /// Starts a frame.
    fn begin_frame(&mut self);

    /// Finishes a frame and presents it, if the device has a surface.
    fn end_frame(&mut self) -> Result<(), RenderError>;

    /// Enables or disables waiting for vertical sync on presentation.
    fn set_vsync(&mut self, enabled: bool);

    /// Rebuilds the viewport and depth target for a new framebuffer size.
    fn on_window_resize(&mut self, width: u32, height: u32);

    /// Reads back the current colour target as tightly packed RGBA8, top row first.
    fn read_framebuffer(&mut self) -> Result<TextureData, RenderError>;

    // --- Downcasting ---

    /// Returns the device as `&dyn Any`, for backend-specific access.
    fn as_any(&self) -> &dyn Any;

    /// Returns the device as `&mut dyn Any`, for backend-specific access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
