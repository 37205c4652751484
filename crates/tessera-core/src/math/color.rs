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

//! Defines the packed `Rgba8` colour used for vertex colours, fog and clear colours.

use serde::{Deserialize, Serialize};

/// An 8-bit-per-channel RGBA colour.
///
/// This is the layout stored in coloured vertices, so `#[repr(C)]` and `Pod` are
/// required for the vertex structs to be byte-castable.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    bytemuck::Pod,
    bytemuck::Zeroable,
    Serialize,
    Deserialize,
)]
#[repr(C)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel, 255 is opaque.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque red.
    pub const RED: Self = Self::rgb(255, 0, 0);
    /// Opaque green.
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    /// Opaque blue.
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Creates a colour from explicit RGBA channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque colour.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Returns the channels scaled to `[0.0, 1.0]`, in RGBA order.
    #[inline]
    pub fn to_normalized(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }

    /// Parses a `#RRGGBB` or `#RRGGBBAA` hex string. The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_channels() {
        assert_eq!(Rgba8::WHITE.to_normalized(), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(Rgba8::TRANSPARENT.to_normalized(), [0.0; 4]);
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(Rgba8::from_hex("#ff0000"), Some(Rgba8::RED));
        assert_eq!(Rgba8::from_hex("00ff0080"), Some(Rgba8::new(0, 255, 0, 128)));
        assert_eq!(Rgba8::from_hex("#fff"), None);
        assert_eq!(Rgba8::from_hex("#zz0000"), None);
    }

    #[test]
    fn layout_is_four_bytes() {
        assert_eq!(std::mem::size_of::<Rgba8>(), 4);
        assert_eq!(bytemuck::bytes_of(&Rgba8::new(1, 2, 3, 4)), &[1, 2, 3, 4]);
    }
}
