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

//! Backend-agnostic rendering contracts.
//!
//! This module defines the "what" of rendering: the data types of the command
//! surface ([`api`]), the [`GraphicsDevice`] trait a backend implements, the error
//! hierarchy, and the [`GraphicsContext`] that validates calls and builds the
//! composed helpers (2D mode, quads, the shared quad index buffer) on top of the
//! device primitives. The "how" lives in the backends of `tessera-infra`.

pub mod api;
pub mod context;
pub mod error;
pub mod traits;

pub use self::api::*;
pub use self::context::{quad_indices, GraphicsContext, MatrixStack, MAX_QUADS, MAX_QUAD_INDICES};
pub use self::error::{DeviceError, RenderError, ResourceError, SettingsError};
pub use self::traits::{GraphicsBackendSelector, GraphicsDevice};
