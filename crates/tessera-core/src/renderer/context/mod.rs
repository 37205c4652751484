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

//! The graphics context: one uniform command surface over a [`GraphicsDevice`].
//!
//! The context owns the device and is split by concern:
//!
//! - **resources**: texture and buffer lifecycle, plus the shared quad buffers.
//! - **state**: the render state machine and its shadow [`RenderState`].
//! - **transform**: the three matrix stacks and 2D/3D mode switching.
//! - **draw**: static, indexed and dynamic draws and the quad helpers.
//! - **frame**: frame bracketing, vsync, resize and screenshots.
//!
//! All validation happens here, so every backend receives only well-formed calls.
//! Misuse of the API (unbalanced stacks, drawing without bound buffers, mismatched
//! formats, bad frame bracketing) panics.

mod draw;
mod frame;
mod resources;
mod state;
mod transform;

pub use self::draw::{quad_indices, MAX_QUADS, MAX_QUAD_INDICES};
pub use self::transform::MatrixStack;

use self::resources::ResourceRegistry;
use crate::event::{EventBus, TextureEvent};
use crate::math::Rgba8;
use crate::renderer::api::*;
use crate::renderer::error::RenderError;
use crate::renderer::traits::GraphicsDevice;

/// Number of vertices in each shared quad buffer.
const QUAD_VERTICES: usize = 4;

/// The backend-independent rendering context.
#[derive(Debug)]
pub struct GraphicsContext {
    device: Box<dyn GraphicsDevice>,

    state: RenderState,
    clear_colour: Rgba8,

    matrix_mode: MatrixType,
    stacks: [MatrixStack; 3],

    resources: ResourceRegistry,
    batch_format: Option<VertexFormat>,
    max_texture_clamp: Option<u32>,

    in_frame: bool,
    stats: FrameStats,
    vsync: bool,
    framebuffer_size: (u32, u32),

    texture_events: EventBus<TextureEvent>,
    disposed: bool,
}

impl GraphicsContext {
    /// Wraps a device and brings it to the initial state.
    ///
    /// Every render state field, the three identity matrices, the clear colour and
    /// vsync are pushed to the device, and the shared quad buffers and quad index
    /// buffer are created.
    pub fn new(
        device: Box<dyn GraphicsDevice>,
        settings: &GraphicsSettings,
    ) -> Result<Self, RenderError> {
        let mut context = Self {
            device,
            state: RenderState::default(),
            clear_colour: settings.clear_colour,
            matrix_mode: MatrixType::Modelview,
            stacks: Default::default(),
            resources: ResourceRegistry::default(),
            batch_format: None,
            max_texture_clamp: settings.max_texture_dimensions,
            in_frame: false,
            stats: FrameStats::default(),
            vsync: settings.vsync,
            framebuffer_size: settings.initial_size,
            texture_events: EventBus::new(),
            disposed: false,
        };

        context.apply_render_state(RenderState::default());
        for kind in MatrixType::ALL {
            context.upload_matrix(kind);
        }
        context.set_clear_colour(settings.clear_colour);
        context.set_vsync(settings.vsync);

        context.resources.quad_colour_vb = context
            .create_dynamic_vertex_buffer(VertexFormat::PositionColour, QUAD_VERTICES)?;
        context.resources.quad_texture_vb = context
            .create_dynamic_vertex_buffer(VertexFormat::PositionTexture, QUAD_VERTICES)?;
        context.build_shared_quad_index_buffer()?;

        let info = context.device.info();
        log::info!(
            "GraphicsContext created on '{}' ({:?})",
            info.name,
            info.backend_type
        );
        Ok(context)
    }

    /// The device behind the context.
    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    /// Mutable access to the device, bypassing validation.
    pub fn device_mut(&mut self) -> &mut dyn GraphicsDevice {
        self.device.as_mut()
    }

    /// Downcasts the device to a concrete backend type.
    pub fn device_as<T: GraphicsDevice>(&self) -> Option<&T> {
        self.device.as_any().downcast_ref::<T>()
    }

    /// Mutable form of [`Self::device_as`].
    pub fn device_as_mut<T: GraphicsDevice>(&mut self) -> Option<&mut T> {
        self.device.as_any_mut().downcast_mut::<T>()
    }

    /// The bus texture replacement notifications are published on.
    pub fn texture_events(&self) -> &EventBus<TextureEvent> {
        &self.texture_events
    }

    /// Subscribes to texture replacement notifications.
    pub fn subscribe_texture_events(&self) -> flume::Receiver<TextureEvent> {
        self.texture_events.subscribe()
    }

    /// Releases the resources owned by the context: both shared quad buffers and
    /// the shared quad index buffer. Idempotent; also run on drop.
    ///
    /// Textures and buffers created by callers are not tracked for release and remain
    /// the caller's responsibility.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        for id in [self.resources.quad_colour_vb, self.resources.quad_texture_vb] {
            if id.is_some() {
                self.release_dynamic_vertex_buffer(id);
            }
        }
        self.resources.quad_colour_vb = DynamicVertexBufferId::NONE;
        self.resources.quad_texture_vb = DynamicVertexBufferId::NONE;

        let ib = self.resources.quad_ib;
        if ib.is_some() {
            self.release_index_buffer(ib);
            self.resources.quad_ib = IndexBufferId::NONE;
        }
        log::info!("GraphicsContext disposed.");
    }
}

impl Drop for GraphicsContext {
    fn drop(&mut self) {
        self.dispose();
    }
}
