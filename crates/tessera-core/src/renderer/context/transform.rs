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

//! The transform pipeline: three matrix stacks and 2D/3D mode switching.

use super::GraphicsContext;
use crate::math::Mat4;
use crate::renderer::api::MatrixType;

/// A stack of matrices that always holds its base entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixStack {
    entries: Vec<Mat4>,
}

impl MatrixStack {
    /// Creates a stack holding only an identity base entry.
    pub fn new() -> Self {
        Self {
            entries: vec![Mat4::IDENTITY],
        }
    }

    /// The current top matrix.
    #[inline]
    pub fn top(&self) -> Mat4 {
        self.entries[self.entries.len() - 1]
    }

    /// Number of pushes above the base entry.
    #[inline]
    pub fn depth(&self) -> usize {
        self.entries.len() - 1
    }

    /// Duplicates the top.
    pub fn push(&mut self) {
        let top = self.top();
        self.entries.push(top);
    }

    /// Removes the top, revealing the entry below.
    ///
    /// # Panics
    ///
    /// At depth 0.
    pub fn pop(&mut self) {
        assert!(self.depth() > 0, "matrix stack underflow");
        self.entries.pop();
    }

    /// Replaces the top.
    pub fn load(&mut self, matrix: Mat4) {
        let last = self.entries.len() - 1;
        self.entries[last] = matrix;
    }

    /// Post-multiplies the top: `top = top * matrix`, so `matrix` applies to vertices first.
    pub fn multiply(&mut self, matrix: Mat4) {
        let last = self.entries.len() - 1;
        self.entries[last] = self.entries[last] * matrix;
    }
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsContext {
    /// Selects the stack used by the matrix operations below.
    pub fn set_matrix_mode(&mut self, kind: MatrixType) {
        self.matrix_mode = kind;
    }

    /// The stack currently selected by [`Self::set_matrix_mode`].
    pub fn matrix_mode(&self) -> MatrixType {
        self.matrix_mode
    }

    /// The top matrix of a stack.
    pub fn matrix(&self, kind: MatrixType) -> Mat4 {
        self.stacks[kind.index()].top()
    }

    /// The number of pushes above the base entry of a stack.
    pub fn matrix_depth(&self, kind: MatrixType) -> usize {
        self.stacks[kind.index()].depth()
    }

    /// Replaces the top of the selected stack.
    pub fn load_matrix(&mut self, matrix: &Mat4) {
        self.active_stack().load(*matrix);
        self.upload_matrix(self.matrix_mode);
    }

    /// Replaces the top of the selected stack with the identity.
    pub fn load_identity_matrix(&mut self) {
        self.load_matrix(&Mat4::IDENTITY);
    }

    /// Post-multiplies the top of the selected stack by `matrix`.
    pub fn multiply_matrix(&mut self, matrix: &Mat4) {
        self.active_stack().multiply(*matrix);
        self.upload_matrix(self.matrix_mode);
    }

    /// Duplicates the top of the selected stack.
    pub fn push_matrix(&mut self) {
        self.active_stack().push();
    }

    /// Restores the entry below the top of the selected stack.
    ///
    /// # Panics
    ///
    /// If the selected stack has no pushed entries.
    pub fn pop_matrix(&mut self) {
        self.active_stack().pop();
        self.upload_matrix(self.matrix_mode);
    }

    /// Switches to screen-space rendering for a `width` x `height` target.
    ///
    /// Pushes an orthographic projection with `(0, 0)` at the top-left and an identity
    /// model-view, turns the depth test off and alpha blending on. Leaves the model-view
    /// stack selected. Must be balanced by [`Self::mode_3d`].
    pub fn mode_2d(&mut self, width: f32, height: f32) {
        self.set_matrix_mode(MatrixType::Projection);
        self.push_matrix();
        self.load_identity_matrix();
        self.set_depth_test(false);
        self.load_matrix(&Mat4::orthographic_rh_zo(0.0, width, height, 0.0, 0.0, 1.0));

        self.set_matrix_mode(MatrixType::Modelview);
        self.push_matrix();
        self.load_identity_matrix();
        self.set_alpha_blending(true);
    }

    /// Leaves screen-space rendering: pops the matrices pushed by [`Self::mode_2d`],
    /// turns the depth test on and alpha blending off.
    ///
    /// # Panics
    ///
    /// If not preceded by a matching `mode_2d`.
    pub fn mode_3d(&mut self) {
        self.set_matrix_mode(MatrixType::Projection);
        self.pop_matrix();
        self.set_matrix_mode(MatrixType::Modelview);
        self.pop_matrix();
        self.set_depth_test(true);
        self.set_alpha_blending(false);
    }

    fn active_stack(&mut self) -> &mut MatrixStack {
        &mut self.stacks[self.matrix_mode.index()]
    }

    pub(super) fn upload_matrix(&mut self, kind: MatrixType) {
        let top = self.stacks[kind.index()].top();
        self.device.load_matrix(kind, &top);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn push_duplicates_and_pop_restores() {
        let mut stack = MatrixStack::new();
        let t = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        stack.load(t);
        stack.push();
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.top(), t);

        stack.load(Mat4::IDENTITY);
        stack.pop();
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.top(), t);
    }

    #[test]
    fn multiply_applies_new_matrix_first() {
        let mut stack = MatrixStack::new();
        stack.load(Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        stack.multiply(Mat4::from_scale(Vec3::new(2.0, 2.0, 2.0)));
        let p = stack.top().transform_point(Vec3::X);
        assert_eq!(p.x, 7.0);
    }

    #[test]
    #[should_panic(expected = "matrix stack underflow")]
    fn pop_at_base_panics() {
        MatrixStack::new().pop();
    }
}
