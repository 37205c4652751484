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

//! The render state machine.
//!
//! Every setter records the value in the context's shadow [`RenderState`] and
//! forwards it to the device, even when it equals the current value.

use super::GraphicsContext;
use crate::math::Rgba8;
use crate::renderer::api::{BlendFunc, CompareFunc, FogMode, RenderState};

impl GraphicsContext {
    /// The last value set for every render state field.
    pub fn render_state(&self) -> &RenderState {
        &self.state
    }

    /// The colour used by [`Self::clear`].
    pub fn clear_colour(&self) -> Rgba8 {
        self.clear_colour
    }

    /// Enables or disables sampling of the bound texture.
    pub fn set_texturing(&mut self, enabled: bool) {
        self.state.texturing = enabled;
        self.device.set_texturing(enabled);
    }

    /// Enables or disables fog.
    pub fn set_fog(&mut self, enabled: bool) {
        self.state.fog.enabled = enabled;
        self.device.set_fog(enabled);
    }

    /// Sets the fog falloff curve.
    pub fn set_fog_mode(&mut self, mode: FogMode) {
        self.state.fog.mode = mode;
        self.device.set_fog_mode(mode);
    }

    /// Sets the colour fragments fade towards.
    pub fn set_fog_colour(&mut self, colour: Rgba8) {
        self.state.fog.colour = colour;
        self.device.set_fog_colour(colour);
    }

    /// Sets the density used by [`FogMode::Exp`] and [`FogMode::Exp2`].
    pub fn set_fog_density(&mut self, density: f32) {
        self.state.fog.density = density;
        self.device.set_fog_density(density);
    }

    /// Sets the distance where [`FogMode::Linear`] fog begins.
    pub fn set_fog_start(&mut self, start: f32) {
        self.state.fog.start = start;
        self.device.set_fog_start(start);
    }

    /// Sets the distance where [`FogMode::Linear`] fog is total.
    pub fn set_fog_end(&mut self, end: f32) {
        self.state.fog.end = end;
        self.device.set_fog_end(end);
    }

    /// Enables or disables back-face culling.
    pub fn set_face_culling(&mut self, enabled: bool) {
        self.state.face_culling = enabled;
        self.device.set_face_culling(enabled);
    }

    /// Enables or disables the alpha test.
    pub fn set_alpha_test(&mut self, enabled: bool) {
        self.state.alpha_test.enabled = enabled;
        self.device.set_alpha_test(enabled);
    }

    /// Fragments whose alpha fails `alpha <func> reference` are discarded while the test is on.
    pub fn set_alpha_test_func(&mut self, func: CompareFunc, reference: f32) {
        self.state.alpha_test.func = func;
        self.state.alpha_test.reference = reference;
        self.device.set_alpha_test_func(func, reference);
    }

    /// Enables or disables alpha blending.
    pub fn set_alpha_blending(&mut self, enabled: bool) {
        self.state.blend.enabled = enabled;
        self.device.set_alpha_blending(enabled);
    }

    /// Sets the source and destination blend factors.
    pub fn set_alpha_blend_func(&mut self, src: BlendFunc, dst: BlendFunc) {
        self.state.blend.src = src;
        self.state.blend.dst = dst;
        self.device.set_alpha_blend_func(src, dst);
    }

    /// Enables or disables the depth test.
    pub fn set_depth_test(&mut self, enabled: bool) {
        self.state.depth.test = enabled;
        self.device.set_depth_test(enabled);
    }

    /// Sets the depth comparison.
    pub fn set_depth_test_func(&mut self, func: CompareFunc) {
        self.state.depth.func = func;
        self.device.set_depth_test_func(func);
    }

    /// Enables or disables depth writes.
    pub fn set_depth_write(&mut self, enabled: bool) {
        self.state.depth.write = enabled;
        self.device.set_depth_write(enabled);
    }

    /// Enables or disables colour writes.
    pub fn set_colour_write(&mut self, enabled: bool) {
        self.state.colour_write = enabled;
        self.device.set_colour_write(enabled);
    }

    /// Sets the colour used by [`Self::clear`].
    pub fn set_clear_colour(&mut self, colour: Rgba8) {
        self.clear_colour = colour;
        self.device.set_clear_colour(colour);
    }

    /// Clears the colour and depth of the current render target.
    pub fn clear(&mut self) {
        self.device.clear();
    }

    /// Pushes every field of `state` to the device, in a fixed order.
    pub(super) fn apply_render_state(&mut self, state: RenderState) {
        self.set_texturing(state.texturing);

        self.set_fog_mode(state.fog.mode);
        self.set_fog_colour(state.fog.colour);
        self.set_fog_density(state.fog.density);
        self.set_fog_start(state.fog.start);
        self.set_fog_end(state.fog.end);
        self.set_fog(state.fog.enabled);

        self.set_face_culling(state.face_culling);

        self.set_alpha_test_func(state.alpha_test.func, state.alpha_test.reference);
        self.set_alpha_test(state.alpha_test.enabled);

        self.set_alpha_blend_func(state.blend.src, state.blend.dst);
        self.set_alpha_blending(state.blend.enabled);

        self.set_depth_test_func(state.depth.func);
        self.set_depth_test(state.depth.test);
        self.set_depth_write(state.depth.write);

        self.set_colour_write(state.colour_write);
    }
}
