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

//! Closed enumerations of the command surface.
//!
//! Backends map these by name; the discriminant values carry no meaning.

/// How submitted vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawMode {
    /// Every three vertices form a triangle.
    Triangles,
    /// Every two vertices form a line.
    Lines,
    /// Each vertex after the second forms a triangle with the two before it.
    TriangleStrip,
}

/// Comparison used by the depth and alpha tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    /// The test always passes.
    Always,
    /// Passes if the new value differs from the reference.
    NotEqual,
    /// The test never passes.
    Never,
    /// Passes if the new value is less than the reference.
    Less,
    /// Passes if the new value is less than or equal to the reference.
    LessEqual,
    /// Passes if the new value equals the reference.
    Equal,
    /// Passes if the new value is greater than or equal to the reference.
    GreaterEqual,
    /// Passes if the new value is greater than the reference.
    Greater,
}

impl CompareFunc {
    /// Evaluates `value <op> reference`.
    pub fn test(self, value: f32, reference: f32) -> bool {
        match self {
            CompareFunc::Always => true,
            CompareFunc::NotEqual => value != reference,
            CompareFunc::Never => false,
            CompareFunc::Less => value < reference,
            CompareFunc::LessEqual => value <= reference,
            CompareFunc::Equal => value == reference,
            CompareFunc::GreaterEqual => value >= reference,
            CompareFunc::Greater => value > reference,
        }
    }
}

/// A factor in the alpha blending equation `src * s + dst * d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFunc {
    /// `0`
    Zero,
    /// `1`
    One,
    /// Source alpha.
    SourceAlpha,
    /// `1 - source alpha`.
    InvSourceAlpha,
    /// Destination alpha.
    DestAlpha,
    /// `1 - destination alpha`.
    InvDestAlpha,
}

/// Fog falloff curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FogMode {
    /// Fog grows linearly between the start and end distances.
    #[default]
    Linear,
    /// `exp(-density * z)`.
    Exp,
    /// `exp(-(density * z)^2)`.
    Exp2,
}

/// Selects one of the three matrix stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixType {
    /// The projection stack.
    Projection,
    /// The model-view stack.
    Modelview,
    /// The texture-coordinate transform stack.
    Texture,
}

impl MatrixType {
    /// All stacks, in storage order.
    pub const ALL: [MatrixType; 3] = [
        MatrixType::Projection,
        MatrixType::Modelview,
        MatrixType::Texture,
    ];

    /// Storage index of this stack.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            MatrixType::Projection => 0,
            MatrixType::Modelview => 1,
            MatrixType::Texture => 2,
        }
    }
}
