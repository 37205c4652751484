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

//! Texture, vertex buffer and index buffer lifecycle.

use super::GraphicsContext;
use crate::event::{TextureEvent, FONT_TEXTURE_NAME};
use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub(super) struct VertexBufferInfo {
    pub format: VertexFormat,
    pub count: usize,
}

/// Everything the context knows about live resources, used to validate calls
/// before they reach the device.
#[derive(Debug, Default)]
pub(super) struct ResourceRegistry {
    pub textures: HashMap<TextureId, (u32, u32)>,
    pub vertex_buffers: HashMap<VertexBufferId, VertexBufferInfo>,
    pub dynamic_buffers: HashMap<DynamicVertexBufferId, VertexBufferInfo>,
    pub index_buffers: HashMap<IndexBufferId, usize>,

    pub bound_texture: TextureId,
    pub bound_vertex_buffer: VertexBufferId,
    pub bound_index_buffer: IndexBufferId,

    /// Four `PositionColour` vertices, for `draw_2d_quad`.
    pub quad_colour_vb: DynamicVertexBufferId,
    /// Four `PositionTexture` vertices, for `draw_2d_texture`.
    pub quad_texture_vb: DynamicVertexBufferId,
    /// The default quad index buffer, once built.
    pub quad_ib: IndexBufferId,
}

impl ResourceRegistry {
    fn is_shared_dynamic(&self, id: DynamicVertexBufferId) -> bool {
        id == self.quad_colour_vb || id == self.quad_texture_vb
    }
}

impl GraphicsContext {
    /// The largest texture width and height accepted, after the settings clamp.
    pub fn max_texture_dimensions(&self) -> (u32, u32) {
        let (w, h) = self.device.max_texture_dimensions();
        match self.max_texture_clamp {
            Some(limit) => (w.min(limit), h.min(limit)),
            None => (w, h),
        }
    }

    /// Returns `true` if the backend can upload textures in `format`.
    pub fn supports_pixel_format(&self, format: PixelFormat) -> bool {
        self.device.supports_pixel_format(format)
    }

    /// Live resources reported by the backend.
    pub fn resource_usage(&self) -> ResourceUsage {
        self.device.resource_usage()
    }

    /// Uploads a texture.
    ///
    /// # Errors
    ///
    /// [`ResourceError::UnsupportedFormat`] for a zero size, a pixel buffer of the wrong
    /// length or a pixel format the backend does not support, and
    /// [`ResourceError::DimensionTooLarge`] above [`Self::max_texture_dimensions`].
    pub fn create_texture(&mut self, data: &TextureData) -> Result<TextureId, ResourceError> {
        data.validate_layout()?;
        if !self.device.supports_pixel_format(data.format) {
            return Err(ResourceError::unsupported_pixel_format(data.format));
        }
        let max = self.max_texture_dimensions();
        if data.width > max.0 || data.height > max.1 {
            return Err(ResourceError::DimensionTooLarge {
                width: data.width,
                height: data.height,
                max,
            });
        }

        let id = self.device.create_texture(data)?;
        self.resources
            .textures
            .insert(id, (data.width, data.height));
        log::debug!("Created texture {:?} ({}x{})", id, data.width, data.height);
        Ok(id)
    }

    /// Decodes an image file and uploads it as RGBA8.
    pub fn create_texture_from_path(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<TextureId, ResourceError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ResourceError::NotFound(path.to_path_buf()));
        }
        let image = image::open(path).map_err(|e| {
            ResourceError::UnsupportedFormat(format!("failed to decode '{}': {e}", path.display()))
        })?;
        self.create_texture_from_image(&image.to_rgba8())
    }

    /// Uploads a decoded RGBA8 image.
    pub fn create_texture_from_image(
        &mut self,
        image: &image::RgbaImage,
    ) -> Result<TextureId, ResourceError> {
        self.create_texture(&TextureData::from_rgba_image(image.clone()))
    }

    /// Replaces a named texture with a newly decoded image and notifies subscribers.
    ///
    /// On success `id` refers to the new texture and the old one has been released.
    /// A [`TextureEvent::TextureChanged`] is published, followed by
    /// [`TextureEvent::FontChanged`] when `name` is the font bitmap. On failure the
    /// old texture is left untouched.
    pub fn replace_texture(
        &mut self,
        id: &mut TextureId,
        name: &str,
        encoded: &[u8],
    ) -> Result<(), ResourceError> {
        let image = image::load_from_memory(encoded).map_err(|e| {
            ResourceError::UnsupportedFormat(format!("failed to decode '{name}': {e}"))
        })?;
        let data = TextureData::from_rgba_image(image.to_rgba8());
        let new_id = self.create_texture(&data)?;
        self.delete_texture(id);
        *id = new_id;

        log::info!("Replaced texture '{name}' with {new_id:?}");
        self.texture_events.publish(TextureEvent::TextureChanged {
            name: name.to_string(),
            data,
        });
        if name == FONT_TEXTURE_NAME {
            self.texture_events.publish(TextureEvent::FontChanged);
        }
        Ok(())
    }

    /// Returns the size of a live texture.
    pub fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.resources.textures.get(&id).copied()
    }

    /// Releases a texture and resets `id` to [`TextureId::NONE`]. No-op on `NONE`.
    pub fn delete_texture(&mut self, id: &mut TextureId) {
        if id.is_none() {
            return;
        }
        if self.resources.textures.remove(id).is_some() {
            self.device.delete_texture(*id);
            if self.resources.bound_texture == *id {
                self.resources.bound_texture = TextureId::NONE;
            }
            log::debug!("Deleted texture {id:?}");
        } else {
            log::warn!("Ignoring deletion of unknown texture {id:?}");
        }
        *id = TextureId::NONE;
    }

    /// Makes `id` the texture sampled by subsequent draws. `NONE` unbinds.
    pub fn bind_texture(&mut self, id: TextureId) {
        if id.is_some() && !self.resources.textures.contains_key(&id) {
            log::warn!("Ignoring bind of unknown texture {id:?}");
            return;
        }
        self.resources.bound_texture = id;
        self.device.bind_texture(id);
    }

    /// The currently bound texture.
    pub fn bound_texture(&self) -> TextureId {
        self.resources.bound_texture
    }

    /// Creates an immutable vertex buffer from typed vertices.
    pub fn create_vertex_buffer<V: Vertex>(
        &mut self,
        vertices: &[V],
    ) -> Result<VertexBufferId, ResourceError> {
        self.create_vertex_buffer_raw(V::FORMAT, bytemuck::cast_slice(vertices), vertices.len())
    }

    /// Creates an immutable vertex buffer from the first `count` vertices of raw bytes.
    ///
    /// # Panics
    ///
    /// If `bytes` holds fewer than `count` vertices of `format`.
    pub fn create_vertex_buffer_raw(
        &mut self,
        format: VertexFormat,
        bytes: &[u8],
        count: usize,
    ) -> Result<VertexBufferId, ResourceError> {
        let len = count * format.stride();
        assert!(
            bytes.len() >= len,
            "vertex data holds {} bytes, {count} {format:?} vertices need {len}",
            bytes.len()
        );
        let id = self
            .device
            .create_vertex_buffer(format, &bytes[..len], count)?;
        self.resources
            .vertex_buffers
            .insert(id, VertexBufferInfo { format, count });
        log::debug!("Created vertex buffer {id:?} ({count} x {format:?})");
        Ok(id)
    }

    /// Creates a vertex buffer whose contents are replaced on every draw.
    pub fn create_dynamic_vertex_buffer(
        &mut self,
        format: VertexFormat,
        max_vertices: usize,
    ) -> Result<DynamicVertexBufferId, ResourceError> {
        let id = self
            .device
            .create_dynamic_vertex_buffer(format, max_vertices)?;
        self.resources.dynamic_buffers.insert(
            id,
            VertexBufferInfo {
                format,
                count: max_vertices,
            },
        );
        log::debug!("Created dynamic vertex buffer {id:?} ({max_vertices} x {format:?})");
        Ok(id)
    }

    /// Creates an immutable buffer of 16-bit indices.
    pub fn create_index_buffer(&mut self, indices: &[u16]) -> Result<IndexBufferId, ResourceError> {
        let id = self.device.create_index_buffer(indices)?;
        self.resources.index_buffers.insert(id, indices.len());
        log::debug!("Created index buffer {id:?} ({} indices)", indices.len());
        Ok(id)
    }

    /// Releases a static vertex buffer and resets `id` to `NONE`. No-op on `NONE`.
    pub fn delete_vertex_buffer(&mut self, id: &mut VertexBufferId) {
        if id.is_none() {
            return;
        }
        if self.resources.vertex_buffers.remove(id).is_some() {
            self.device.delete_vertex_buffer(*id);
            if self.resources.bound_vertex_buffer == *id {
                self.resources.bound_vertex_buffer = VertexBufferId::NONE;
            }
            log::debug!("Deleted vertex buffer {id:?}");
        } else {
            log::warn!("Ignoring deletion of unknown vertex buffer {id:?}");
        }
        *id = VertexBufferId::NONE;
    }

    /// Releases a dynamic vertex buffer and resets `id` to `NONE`. No-op on `NONE`.
    ///
    /// # Panics
    ///
    /// If `id` is one of the context's shared quad buffers.
    pub fn delete_dynamic_vertex_buffer(&mut self, id: &mut DynamicVertexBufferId) {
        if id.is_none() {
            return;
        }
        assert!(
            !self.resources.is_shared_dynamic(*id),
            "the shared quad buffer {id:?} is owned by the graphics context"
        );
        self.release_dynamic_vertex_buffer(*id);
        *id = DynamicVertexBufferId::NONE;
    }

    pub(super) fn release_dynamic_vertex_buffer(&mut self, id: DynamicVertexBufferId) {
        if self.resources.dynamic_buffers.remove(&id).is_some() {
            self.device.delete_dynamic_vertex_buffer(id);
            log::debug!("Deleted dynamic vertex buffer {id:?}");
        } else {
            log::warn!("Ignoring deletion of unknown dynamic vertex buffer {id:?}");
        }
    }

    /// Releases an index buffer and resets `id` to `NONE`. No-op on `NONE`.
    ///
    /// # Panics
    ///
    /// If `id` is the shared quad index buffer.
    pub fn delete_index_buffer(&mut self, id: &mut IndexBufferId) {
        if id.is_none() {
            return;
        }
        assert!(
            *id != self.resources.quad_ib,
            "the shared quad index buffer {id:?} is owned by the graphics context"
        );
        self.release_index_buffer(*id);
        *id = IndexBufferId::NONE;
    }

    pub(super) fn release_index_buffer(&mut self, id: IndexBufferId) {
        if self.resources.index_buffers.remove(&id).is_some() {
            self.device.delete_index_buffer(id);
            if self.resources.bound_index_buffer == id {
                self.resources.bound_index_buffer = IndexBufferId::NONE;
            }
            log::debug!("Deleted index buffer {id:?}");
        } else {
            log::warn!("Ignoring deletion of unknown index buffer {id:?}");
        }
    }

    /// Makes `id` the vertex buffer used by indexed draws.
    pub fn bind_vertex_buffer(&mut self, id: VertexBufferId) {
        if id.is_some() && !self.resources.vertex_buffers.contains_key(&id) {
            log::warn!("Ignoring bind of unknown vertex buffer {id:?}");
            return;
        }
        self.resources.bound_vertex_buffer = id;
        self.device.bind_vertex_buffer(id);
    }

    /// Makes `id` the index buffer used by indexed draws.
    pub fn bind_index_buffer(&mut self, id: IndexBufferId) {
        if id.is_some() && !self.resources.index_buffers.contains_key(&id) {
            log::warn!("Ignoring bind of unknown index buffer {id:?}");
            return;
        }
        self.resources.bound_index_buffer = id;
        self.device.bind_index_buffer(id);
    }

    /// The shared coloured quad buffer used by `draw_2d_quad`.
    pub fn shared_colour_quad_buffer(&self) -> DynamicVertexBufferId {
        self.resources.quad_colour_vb
    }

    /// The shared textured quad buffer used by `draw_2d_texture`.
    pub fn shared_texture_quad_buffer(&self) -> DynamicVertexBufferId {
        self.resources.quad_texture_vb
    }
}
