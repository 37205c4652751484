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

//! The draw dispatcher: static, indexed and dynamic submissions plus quad helpers.

use super::GraphicsContext;
use crate::math::Rgba8;
use crate::renderer::api::*;
use crate::renderer::error::ResourceError;

/// The most quads a single draw through the shared quad index buffer can cover.
pub const MAX_QUADS: usize = 16384;

/// Length of the shared quad index buffer.
pub const MAX_QUAD_INDICES: usize = MAX_QUADS * 6;

/// Generates the index list for `quad_count` quads whose corners are stored as
/// four consecutive vertices. Quad `i` becomes the triangles
/// `{4i, 4i+1, 4i+2}` and `{4i+2, 4i+3, 4i}`.
///
/// # Panics
///
/// Above [`MAX_QUADS`], since later corners would not fit in a `u16`.
pub fn quad_indices(quad_count: usize) -> Vec<u16> {
    assert!(
        quad_count <= MAX_QUADS,
        "{quad_count} quads exceed the limit of {MAX_QUADS}"
    );
    (0..quad_count)
        .flat_map(|quad| {
            let base = (quad * 4) as u16;
            [base, base + 1, base + 2, base + 2, base + 3, base]
        })
        .collect()
}

impl GraphicsContext {
    /// Declares the vertex layout of the bound vertex buffer for indexed draws.
    pub fn set_batch_format(&mut self, format: VertexFormat) {
        self.batch_format = Some(format);
        self.device.set_batch_format(format);
    }

    /// Draws `count` vertices of a static buffer starting at `start_vertex`.
    ///
    /// # Panics
    ///
    /// If `id` is `NONE` or the range exceeds the buffer.
    pub fn draw_vertex_buffer(
        &mut self,
        mode: DrawMode,
        id: VertexBufferId,
        start_vertex: usize,
        count: usize,
    ) {
        assert!(id.is_some(), "draw_vertex_buffer called with no vertex buffer");
        let Some(info) = self.resources.vertex_buffers.get(&id).copied() else {
            log::warn!("Ignoring draw of unknown vertex buffer {id:?}");
            return;
        };
        assert!(
            start_vertex + count <= info.count,
            "vertices {start_vertex}..{} exceed the {} vertices of {id:?}",
            start_vertex + count,
            info.count
        );

        log::trace!("draw_vertex_buffer {mode:?} {id:?} [{start_vertex}; {count}]");
        self.device
            .draw_vertex_buffer(mode, id, start_vertex, count);
        self.record_draw(count);
    }

    /// Draws from the bound index and vertex buffers.
    ///
    /// Every index is offset by `start_vertex`; `index_count` indices are read starting at
    /// `start_index`.
    ///
    /// # Panics
    ///
    /// If no vertex or index buffer is bound, the batch format disagrees with the bound
    /// vertex buffer, or the index range exceeds the bound index buffer.
    pub fn draw_indexed_vertex_buffer(
        &mut self,
        mode: DrawMode,
        index_count: usize,
        start_vertex: usize,
        start_index: usize,
    ) {
        let vb = self.resources.bound_vertex_buffer;
        let ib = self.resources.bound_index_buffer;
        assert!(vb.is_some(), "indexed draw with no vertex buffer bound");
        assert!(ib.is_some(), "indexed draw with no index buffer bound");

        let vb_format = self.resources.vertex_buffers[&vb].format;
        assert_eq!(
            self.batch_format,
            Some(vb_format),
            "batch format does not match the bound vertex buffer"
        );
        let ib_len = self.resources.index_buffers[&ib];
        assert!(
            start_index + index_count <= ib_len,
            "indices {start_index}..{} exceed the {ib_len} indices of {ib:?}",
            start_index + index_count
        );

        log::trace!(
            "draw_indexed_vertex_buffer {mode:?} {index_count} indices from {start_index}, base vertex {start_vertex}"
        );
        self.device
            .draw_indexed_vertex_buffer(mode, index_count, start_vertex, start_index);
        self.record_draw(index_count);
    }

    /// Replaces the contents of a dynamic buffer with `vertices[..count]` and draws them.
    ///
    /// # Panics
    ///
    /// If `V`'s format differs from the buffer's declared format or `count` exceeds
    /// its capacity or `vertices.len()`.
    pub fn draw_dynamic_vertex_buffer<V: Vertex>(
        &mut self,
        mode: DrawMode,
        id: DynamicVertexBufferId,
        vertices: &[V],
        count: usize,
    ) {
        self.draw_dynamic_vertex_buffer_raw(
            mode,
            id,
            V::FORMAT,
            bytemuck::cast_slice(vertices),
            count,
        );
    }

    /// Untyped form of [`Self::draw_dynamic_vertex_buffer`].
    pub fn draw_dynamic_vertex_buffer_raw(
        &mut self,
        mode: DrawMode,
        id: DynamicVertexBufferId,
        format: VertexFormat,
        bytes: &[u8],
        count: usize,
    ) {
        assert!(id.is_some(), "dynamic draw with no vertex buffer");
        let Some(info) = self.resources.dynamic_buffers.get(&id).copied() else {
            log::warn!("Ignoring draw of unknown dynamic vertex buffer {id:?}");
            return;
        };
        assert_eq!(
            format, info.format,
            "vertex format does not match dynamic buffer {id:?}"
        );
        assert!(
            count <= info.count,
            "{count} vertices exceed the capacity {} of {id:?}",
            info.count
        );
        let len = count * format.stride();
        assert!(
            bytes.len() >= len,
            "vertex data holds {} bytes, {count} vertices need {len}",
            bytes.len()
        );

        log::trace!("draw_dynamic_vertex_buffer {mode:?} {id:?} [{count}]");
        self.device
            .draw_dynamic_vertex_buffer(mode, id, &bytes[..len], count);
        self.record_draw(count);
    }

    /// Draws a solid rectangle through the shared coloured quad buffer.
    ///
    /// The four vertices are submitted as a triangle strip in the order top-right,
    /// bottom-right, top-left, bottom-left.
    pub fn draw_2d_quad(&mut self, x: f32, y: f32, width: f32, height: f32, colour: Rgba8) {
        let vertices = [
            VertexPosCol::new(x + width, y, 0.0, colour),
            VertexPosCol::new(x + width, y + height, 0.0, colour),
            VertexPosCol::new(x, y, 0.0, colour),
            VertexPosCol::new(x, y + height, 0.0, colour),
        ];
        let vb = self.resources.quad_colour_vb;
        self.draw_dynamic_vertex_buffer(DrawMode::TriangleStrip, vb, &vertices, 4);
    }

    /// Draws a textured rectangle through the shared textured quad buffer, sampling
    /// the bound texture.
    pub fn draw_2d_texture(&mut self, quad: &TexturedQuad) {
        let offset = self.device.pixel_centre_offset();
        let (x1, y1) = (quad.x1 - offset, quad.y1 - offset);
        let (x2, y2) = (quad.x2 - offset, quad.y2 - offset);
        let vertices = [
            VertexPosTex::new(x2, y1, 0.0, quad.u2, quad.v1),
            VertexPosTex::new(x2, y2, 0.0, quad.u2, quad.v2),
            VertexPosTex::new(x1, y1, 0.0, quad.u1, quad.v1),
            VertexPosTex::new(x1, y2, 0.0, quad.u1, quad.v2),
        ];
        let vb = self.resources.quad_texture_vb;
        self.draw_dynamic_vertex_buffer(DrawMode::TriangleStrip, vb, &vertices, 4);
    }

    /// Returns the shared quad index buffer, uploading it on first use.
    ///
    /// The buffer holds [`MAX_QUAD_INDICES`] indices generated by [`quad_indices`] and
    /// lives as long as the context.
    pub fn build_shared_quad_index_buffer(&mut self) -> Result<IndexBufferId, ResourceError> {
        if self.resources.quad_ib.is_none() {
            let id = self.create_index_buffer(&quad_indices(MAX_QUADS))?;
            self.resources.quad_ib = id;
            log::debug!("Built shared quad index buffer {id:?}");
        }
        Ok(self.resources.quad_ib)
    }

    /// Draws `quad_count` quads stored as four consecutive vertices each in a static buffer,
    /// starting at `start_vertex`, through the shared quad index buffer.
    ///
    /// Binds `vb` and the shared index buffer and sets the batch format as a side effect.
    ///
    /// # Panics
    ///
    /// Above [`MAX_QUADS`], if `vb` is unknown or not in `format`, or if the quads
    /// read past the end of `vb`.
    pub fn draw_quads(
        &mut self,
        mode: DrawMode,
        vb: VertexBufferId,
        format: VertexFormat,
        quad_count: usize,
        start_vertex: usize,
    ) -> Result<(), ResourceError> {
        assert!(
            quad_count <= MAX_QUADS,
            "{quad_count} quads exceed the limit of {MAX_QUADS} per draw"
        );
        let Some(info) = self.resources.vertex_buffers.get(&vb).copied() else {
            panic!("draw_quads with unknown vertex buffer {vb:?}");
        };
        let end_vertex = start_vertex + quad_count * 4;
        assert!(
            end_vertex <= info.count,
            "quads read vertices {start_vertex}..{end_vertex}, past the {} vertices of {vb:?}",
            info.count
        );
        let ib = self.build_shared_quad_index_buffer()?;
        self.bind_index_buffer(ib);
        self.bind_vertex_buffer(vb);
        self.set_batch_format(format);
        self.draw_indexed_vertex_buffer(mode, quad_count * 6, start_vertex, 0);
        Ok(())
    }

    fn record_draw(&mut self, vertices: usize) {
        self.stats.draw_calls += 1;
        self.stats.vertices += vertices as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_indices_pattern() {
        let indices = quad_indices(2);
        assert_eq!(indices, vec![0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn full_quad_index_buffer_fits_u16() {
        let indices = quad_indices(MAX_QUADS);
        assert_eq!(indices.len(), MAX_QUAD_INDICES);
        assert_eq!(MAX_QUAD_INDICES, 98304);
        let last = &indices[MAX_QUAD_INDICES - 6..];
        assert_eq!(last, &[65532, 65533, 65534, 65534, 65535, 65532]);
    }

    #[test]
    #[should_panic]
    fn too_many_quads_panics() {
        quad_indices(MAX_QUADS + 1);
    }
}
