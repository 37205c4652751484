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

//! # Tessera Infra
//!
//! Concrete implementations of the [`tessera_core::renderer::GraphicsDevice`] contract:
//!
//! - [`graphics::wgpu`]: a retained-mode backend that records the command stream and
//!   encodes it into render passes at flush points.
//! - [`graphics::gl`]: an immediate-mode OpenGL backend on top of `glow` (feature `gl`).
//! - [`graphics::headless`]: a recording backend with no GPU, used on servers and in tests.

pub mod graphics;

pub use graphics::headless::{DeviceCommand, HeadlessDevice};
pub use graphics::wgpu::{WgpuBackendSelector, WgpuDevice, WgpuGraphicsContext};

#[cfg(feature = "gl")]
pub use graphics::gl::{GlDevice, GlSurface};
