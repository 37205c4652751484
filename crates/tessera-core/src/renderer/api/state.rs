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

//! The fixed-function render state.

use super::enums::{BlendFunc, CompareFunc, FogMode};
use crate::math::Rgba8;

/// Fog parameters.
///
/// `density` only matters for the exponential modes and `start`/`end` only for
/// [`FogMode::Linear`], but all of them are stored regardless of the mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogState {
    /// Whether fog is applied.
    pub enabled: bool,
    /// Falloff curve.
    pub mode: FogMode,
    /// Colour fragments are blended towards.
    pub colour: Rgba8,
    /// Density for the exponential modes.
    pub density: f32,
    /// Eye distance where linear fog begins.
    pub start: f32,
    /// Eye distance where linear fog is total.
    pub end: f32,
}

impl Default for FogState {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: FogMode::Linear,
            colour: Rgba8::BLACK,
            density: 1.0,
            start: 0.0,
            end: 1.0,
        }
    }
}

/// Alpha test parameters. Fragments failing `alpha <func> reference` are discarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaTestState {
    /// Whether the test runs.
    pub enabled: bool,
    /// The comparison.
    pub func: CompareFunc,
    /// Reference alpha in `[0, 1]`.
    pub reference: f32,
}

impl Default for AlphaTestState {
    fn default() -> Self {
        Self {
            enabled: false,
            func: CompareFunc::Greater,
            reference: 0.5,
        }
    }
}

/// Alpha blending parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    /// Whether blending is applied.
    pub enabled: bool,
    /// Source factor.
    pub src: BlendFunc,
    /// Destination factor.
    pub dst: BlendFunc,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            enabled: false,
            src: BlendFunc::SourceAlpha,
            dst: BlendFunc::InvSourceAlpha,
        }
    }
}

/// Depth buffer parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthState {
    /// Whether fragments are depth tested.
    pub test: bool,
    /// Comparison used by the depth test.
    pub func: CompareFunc,
    /// Whether passing fragments write depth.
    pub write: bool,
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            test: true,
            func: CompareFunc::LessEqual,
            write: true,
        }
    }
}

/// Every toggle and parameter of the fixed-function pipeline.
///
/// A graphics context owns exactly one of these as the last-set value of each
/// field; it is applied in full to a backend when the context is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    /// Whether the bound texture is sampled.
    pub texturing: bool,
    /// Fog.
    pub fog: FogState,
    /// Back-face culling.
    pub face_culling: bool,
    /// Alpha test.
    pub alpha_test: AlphaTestState,
    /// Alpha blending.
    pub blend: BlendState,
    /// Depth test and write.
    pub depth: DepthState,
    /// Whether colour channels are written.
    pub colour_write: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            texturing: false,
            fog: FogState::default(),
            face_culling: false,
            alpha_test: AlphaTestState::default(),
            blend: BlendState::default(),
            depth: DepthState::default(),
            colour_write: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_defaults() {
        let s = RenderState::default();
        assert!(!s.texturing);
        assert!(!s.fog.enabled);
        assert_eq!(s.fog.mode, FogMode::Linear);
        assert_eq!(s.fog.density, 1.0);
        assert_eq!((s.fog.start, s.fog.end), (0.0, 1.0));
        assert!(!s.face_culling);
        assert_eq!(s.alpha_test.func, CompareFunc::Greater);
        assert_eq!(s.alpha_test.reference, 0.5);
        assert!(!s.blend.enabled);
        assert_eq!(
            (s.blend.src, s.blend.dst),
            (BlendFunc::SourceAlpha, BlendFunc::InvSourceAlpha)
        );
        assert!(s.depth.test && s.depth.write);
        assert_eq!(s.depth.func, CompareFunc::LessEqual);
        assert!(s.colour_write);
    }
}
