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

//! Backend-agnostic data types of the rendering command surface.
//!
//! - **[`handle`]**: opaque resource handles with a zero "none" sentinel.
//! - **[`vertex`]**: the fixed vertex layouts and their `Pod` vertex structs.
//! - **[`enums`]**: draw modes, comparison and blend functions, fog modes, matrix stacks.
//! - **[`state`]**: the fixed-function [`RenderState`] and its defaults.
//! - **[`texture`]**: texture ingestion and textured-quad placement.
//! - **[`adapter`]**: adapter information, resource accounting and frame counters.
//! - **[`settings`]** / **[`selection`]**: configuration for building a context.

pub mod adapter;
pub mod enums;
pub mod handle;
pub mod selection;
pub mod settings;
pub mod state;
pub mod texture;
pub mod vertex;

pub use self::adapter::*;
pub use self::enums::*;
pub use self::handle::*;
pub use self::selection::*;
pub use self::settings::*;
pub use self::state::*;
pub use self::texture::*;
pub use self::vertex::*;
