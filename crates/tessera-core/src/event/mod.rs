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

//! Event channels and the notifications published by the graphics context.
//!
//! The [`EventBus`] is generic so that consumers outside this crate can define
//! their own event types; [`TextureEvent`] is the one the graphics context emits.

mod bus;

pub use self::bus::EventBus;

use crate::renderer::api::TextureData;

/// The file name of the font bitmap. Replacing it also emits [`TextureEvent::FontChanged`].
pub const FONT_TEXTURE_NAME: &str = "default.png";

/// Notifications emitted when a named texture is replaced at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureEvent {
    /// A named texture was replaced. `data` is the decoded RGBA8 image that was uploaded.
    TextureChanged {
        /// The texture's file name, e.g. `"terrain.png"`.
        name: String,
        /// The pixels that were uploaded.
        data: TextureData,
    },
    /// The font bitmap was replaced; text measurements must be rebuilt.
    FontChanged,
}
