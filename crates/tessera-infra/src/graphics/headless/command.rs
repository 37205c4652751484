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

use tessera_core::math::{Mat4, Rgba8};
use tessera_core::renderer::api::*;

/// One call received by a [`HeadlessDevice`](super::HeadlessDevice), in the order it arrived.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    // --- Resources ---
    CreateTexture {
        id: TextureId,
        width: u32,
        height: u32,
        format: PixelFormat,
    },
    DeleteTexture(TextureId),
    BindTexture(TextureId),
    CreateVertexBuffer {
        id: VertexBufferId,
        format: VertexFormat,
        count: usize,
    },
    CreateDynamicVertexBuffer {
        id: DynamicVertexBufferId,
        format: VertexFormat,
        max_vertices: usize,
    },
    CreateIndexBuffer {
        id: IndexBufferId,
        len: usize,
    },
    DeleteVertexBuffer(VertexBufferId),
    DeleteDynamicVertexBuffer(DynamicVertexBufferId),
    DeleteIndexBuffer(IndexBufferId),
    BindVertexBuffer(VertexBufferId),
    BindIndexBuffer(IndexBufferId),

    // --- Render state ---
    SetTexturing(bool),
    SetFog(bool),
    SetFogMode(FogMode),
    SetFogColour(Rgba8),
    SetFogDensity(f32),
    SetFogStart(f32),
    SetFogEnd(f32),
    SetFaceCulling(bool),
    SetAlphaTest(bool),
    SetAlphaTestFunc(CompareFunc, f32),
    SetAlphaBlending(bool),
    SetAlphaBlendFunc(BlendFunc, BlendFunc),
    SetDepthTest(bool),
    SetDepthTestFunc(CompareFunc),
    SetDepthWrite(bool),
    SetColourWrite(bool),
    SetClearColour(Rgba8),
    Clear,

    // --- Transforms ---
    LoadMatrix(MatrixType, Mat4),

    // --- Drawing ---
    SetBatchFormat(VertexFormat),
    DrawVertexBuffer {
        mode: DrawMode,
        id: VertexBufferId,
        start_vertex: usize,
        count: usize,
    },
    DrawIndexedVertexBuffer {
        mode: DrawMode,
        index_count: usize,
        start_vertex: usize,
        start_index: usize,
    },
    /// Carries a copy of the uploaded vertex bytes.
    DrawDynamicVertexBuffer {
        mode: DrawMode,
        id: DynamicVertexBufferId,
        data: Vec<u8>,
        count: usize,
    },

    // --- Frame ---
    BeginFrame,
    EndFrame,
    SetVsync(bool),
    Resize(u32, u32),
    ReadFramebuffer,
}

impl DeviceCommand {
    /// Returns `true` for commands that change render state.
    pub fn is_state_change(&self) -> bool {
        matches!(
            self,
            DeviceCommand::SetTexturing(_)
                | DeviceCommand::SetFog(_)
                | DeviceCommand::SetFogMode(_)
                | DeviceCommand::SetFogColour(_)
                | DeviceCommand::SetFogDensity(_)
                | DeviceCommand::SetFogStart(_)
                | DeviceCommand::SetFogEnd(_)
                | DeviceCommand::SetFaceCulling(_)
                | DeviceCommand::SetAlphaTest(_)
                | DeviceCommand::SetAlphaTestFunc(..)
                | DeviceCommand::SetAlphaBlending(_)
                | DeviceCommand::SetAlphaBlendFunc(..)
                | DeviceCommand::SetDepthTest(_)
                | DeviceCommand::SetDepthTestFunc(_)
                | DeviceCommand::SetDepthWrite(_)
                | DeviceCommand::SetColourWrite(_)
        )
    }

    /// Returns `true` for the three draw commands.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            DeviceCommand::DrawVertexBuffer { .. }
                | DeviceCommand::DrawIndexedVertexBuffer { .. }
                | DeviceCommand::DrawDynamicVertexBuffer { .. }
        )
    }
}
