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

//! Adapter and device information.

use serde::{Deserialize, Serialize};

/// The native graphics API underneath a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GraphicsBackendType {
    /// Vulkan API.
    Vulkan,
    /// Apple's Metal API.
    Metal,
    /// Microsoft's DirectX 12 API.
    Dx12,
    /// OpenGL or OpenGL ES.
    OpenGL,
    /// WebGPU API (for web builds).
    WebGpu,
    /// An unknown backend, or none at all.
    #[default]
    Unknown,
}

/// The physical type of a graphics device (GPU).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RendererDeviceType {
    /// A GPU integrated into the CPU.
    IntegratedGpu,
    /// A discrete, dedicated GPU.
    DiscreteGpu,
    /// A virtualized GPU.
    VirtualGpu,
    /// A software renderer running on the CPU.
    Cpu,
    /// An unknown device type.
    #[default]
    Unknown,
}

/// Backend-agnostic information about the adapter a device runs on.
#[derive(Debug, Clone, Default)]
pub struct GraphicsAdapterInfo {
    /// The name of the adapter (e.g., "NVIDIA GeForce RTX 4090").
    pub name: String,
    /// The graphics API this adapter is driven through.
    pub backend_type: GraphicsBackendType,
    /// The physical type of the adapter.
    pub device_type: RendererDeviceType,
}

/// Live resources held by a device, as reported by the backend.
///
/// Shared context resources (the two quad buffers and the quad index buffer)
/// are included in the counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceUsage {
    /// Number of live textures.
    pub textures: usize,
    /// Bytes of pixel data held by live textures.
    pub texture_bytes: usize,
    /// Number of live static and dynamic vertex buffers.
    pub vertex_buffers: usize,
    /// Bytes held by live vertex buffers.
    pub vertex_buffer_bytes: usize,
    /// Number of live index buffers.
    pub index_buffers: usize,
    /// Bytes held by live index buffers.
    pub index_buffer_bytes: usize,
}

/// Counters for one frame, kept by the graphics context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// A sequential counter of begun frames, starting at 1 for the first frame.
    pub frame_number: u64,
    /// Draw calls submitted during the frame.
    pub draw_calls: u32,
    /// Vertices (or indices, for indexed draws) submitted during the frame.
    pub vertices: u64,
}
