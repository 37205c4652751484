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

//! 4x4 transform matrices.
//!
//! Matrices are column-major and right-handed, and every projection produced here
//! targets a clip-space depth range of `[0, 1]`. Backends whose native clip range
//! differs are responsible for correcting the projection they receive.

use super::{Vec3, Vec4, EPSILON};
use std::ops::Mul;

/// A 4x4 column-major matrix.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Mat4 {
    /// The columns of the matrix. `cols[0]` is the first column, and so on.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// The 4x4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec4::X, Vec4::Y, Vec4::Z, Vec4::W],
    };

    /// A 4x4 matrix with all elements set to 0.
    pub const ZERO: Self = Self {
        cols: [Vec4::ZERO; 4],
    };

    /// Creates a new matrix from four column vectors.
    #[inline]
    pub const fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Returns a row of the matrix as a `Vec4`.
    #[inline]
    pub fn row(&self, index: usize) -> Vec4 {
        Vec4::new(
            self.cols[0][index],
            self.cols[1][index],
            self.cols[2][index],
            self.cols[3][index],
        )
    }

    /// Creates a translation matrix.
    #[inline]
    pub fn from_translation(v: Vec3) -> Self {
        Self::from_cols(Vec4::X, Vec4::Y, Vec4::Z, Vec4::from_vec3(v, 1.0))
    }

    /// Creates a non-uniform scaling matrix.
    #[inline]
    pub fn from_scale(scale: Vec3) -> Self {
        Self::from_cols(
            Vec4::new(scale.x, 0.0, 0.0, 0.0),
            Vec4::new(0.0, scale.y, 0.0, 0.0),
            Vec4::new(0.0, 0.0, scale.z, 0.0),
            Vec4::W,
        )
    }

    /// Creates a matrix for a rotation around the X-axis.
    #[inline]
    pub fn from_rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_cols(
            Vec4::X,
            Vec4::new(0.0, c, s, 0.0),
            Vec4::new(0.0, -s, c, 0.0),
            Vec4::W,
        )
    }

    /// Creates a matrix for a rotation around the Y-axis.
    #[inline]
    pub fn from_rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_cols(
            Vec4::new(c, 0.0, -s, 0.0),
            Vec4::Y,
            Vec4::new(s, 0.0, c, 0.0),
            Vec4::W,
        )
    }

    /// Creates a matrix for a rotation around the Z-axis.
    #[inline]
    pub fn from_rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_cols(
            Vec4::new(c, s, 0.0, 0.0),
            Vec4::new(-s, c, 0.0, 0.0),
            Vec4::Z,
            Vec4::W,
        )
    }

    /// Creates a right-handed perspective projection with a [0, 1] depth range.
    ///
    /// # Arguments
    ///
    /// * `fov_y_radians`: Vertical field of view.
    /// * `aspect_ratio`: Width divided by height.
    /// * `z_near`, `z_far`: Distances to the clipping planes, both positive.
    #[inline]
    pub fn perspective_rh_zo(fov_y_radians: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        let f = 1.0 / (0.5 * fov_y_radians).tan();
        let range = z_near - z_far;
        Self::from_cols(
            Vec4::new(f / aspect_ratio, 0.0, 0.0, 0.0),
            Vec4::new(0.0, f, 0.0, 0.0),
            Vec4::new(0.0, 0.0, z_far / range, -1.0),
            Vec4::new(0.0, 0.0, z_near * z_far / range, 0.0),
        )
    }

    /// Creates a right-handed orthographic projection matrix with a [0, 1] depth range.
    ///
    /// Passing `bottom > top` flips the Y axis, which is how screen-space
    /// projections with a downward-growing Y are built.
    #[inline]
    pub fn orthographic_rh_zo(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        z_near: f32,
        z_far: f32,
    ) -> Self {
        let rml = right - left;
        let tmb = top - bottom;
        let fmn = z_far - z_near;
        Self::from_cols(
            Vec4::new(2.0 / rml, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 / tmb, 0.0, 0.0),
            Vec4::new(0.0, 0.0, -1.0 / fmn, 0.0),
            Vec4::new(
                -(right + left) / rml,
                -(top + bottom) / tmb,
                -z_near / fmn,
                1.0,
            ),
        )
    }

    /// Creates a right-handed view matrix looking from `eye` towards `target`.
    ///
    /// Returns `None` if `up` is parallel to the viewing direction.
    pub fn look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Option<Self> {
        let forward = (target - eye).normalize();
        let side = forward.cross(up);
        if side.length() < EPSILON {
            return None;
        }
        let side = side.normalize();
        let up = side.cross(forward);
        Some(Self::from_cols(
            Vec4::new(side.x, up.x, -forward.x, 0.0),
            Vec4::new(side.y, up.y, -forward.y, 0.0),
            Vec4::new(side.z, up.z, -forward.z, 0.0),
            Vec4::new(-side.dot(eye), -up.dot(eye), forward.dot(eye), 1.0),
        ))
    }

    /// Returns the transpose of the matrix.
    #[inline]
    pub fn transpose(&self) -> Self {
        Self::from_cols(self.row(0), self.row(1), self.row(2), self.row(3))
    }

    /// Transforms a point (`w = 1`) and returns the homogeneous result.
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec4 {
        *self * Vec4::from_vec3(p, 1.0)
    }

    /// Returns the matrix as a flat column-major array, as uploaded to shaders.
    #[inline]
    pub fn to_cols_array(&self) -> [f32; 16] {
        bytemuck::cast(*self)
    }
}

impl Default for Mat4 {
    /// Returns the 4x4 identity matrix.
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Mat4) -> Self::Output {
        Self::from_cols(
            self * rhs.cols[0],
            self * rhs.cols[1],
            self * rhs.cols[2],
            self * rhs.cols[3],
        )
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    #[inline]
    fn mul(self, rhs: Vec4) -> Self::Output {
        self.cols[0] * rhs.x + self.cols[1] * rhs.y + self.cols[2] * rhs.z + self.cols[3] * rhs.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::FRAC_PI_2;
    use approx::assert_relative_eq;

    fn assert_vec4_eq(a: Vec4, b: Vec4) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-5);
        assert_relative_eq!(a.w, b.w, epsilon = 1e-5);
    }

    #[test]
    fn identity_is_neutral() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m * Mat4::IDENTITY, m);
        assert_eq!(Mat4::IDENTITY * m, m);
    }

    #[test]
    fn translation_moves_points() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_vec4_eq(
            m.transform_point(Vec3::new(1.0, 1.0, 1.0)),
            Vec4::new(2.0, 3.0, 4.0, 1.0),
        );
    }

    #[test]
    fn multiplication_applies_right_operand_first() {
        let t = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let s = Mat4::from_scale(Vec3::new(2.0, 2.0, 2.0));
        let p = (t * s).transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert_vec4_eq(p, Vec4::new(12.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn rotation_z_quarter_turn() {
        let m = Mat4::from_rotation_z(FRAC_PI_2);
        assert_vec4_eq(
            m.transform_point(Vec3::X),
            Vec4::new(0.0, 1.0, 0.0, 1.0),
        );
    }

    #[test]
    fn screen_space_orthographic_maps_corners() {
        // [0,w] x [h,0] x [0,1]: top-left of the screen is clip (-1, 1).
        let m = Mat4::orthographic_rh_zo(0.0, 800.0, 600.0, 0.0, 0.0, 1.0);
        assert_vec4_eq(
            m.transform_point(Vec3::new(0.0, 0.0, 0.0)),
            Vec4::new(-1.0, 1.0, 0.0, 1.0),
        );
        assert_vec4_eq(
            m.transform_point(Vec3::new(800.0, 600.0, 0.0)),
            Vec4::new(1.0, -1.0, 0.0, 1.0),
        );
        assert_vec4_eq(
            m.transform_point(Vec3::new(400.0, 300.0, -1.0)),
            Vec4::new(0.0, 0.0, 1.0, 1.0),
        );
    }

    #[test]
    fn perspective_maps_near_and_far_planes() {
        let m = Mat4::perspective_rh_zo(FRAC_PI_2, 1.0, 0.1, 100.0);
        let near = m.transform_point(Vec3::new(0.0, 0.0, -0.1));
        let far = m.transform_point(Vec3::new(0.0, 0.0, -100.0));
        assert_relative_eq!(near.z / near.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn look_at_places_target_in_front() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y).unwrap();
        let p = view.transform_point(Vec3::ZERO);
        assert_vec4_eq(p, Vec4::new(0.0, 0.0, -5.0, 1.0));
        assert!(Mat4::look_at_rh(Vec3::ZERO, Vec3::Y, Vec3::Y).is_none());
    }

    #[test]
    fn transpose_and_cols_array() {
        let m = Mat4::from_translation(Vec3::new(4.0, 5.0, 6.0));
        let flat = m.to_cols_array();
        assert_eq!(&flat[12..15], &[4.0, 5.0, 6.0]);
        assert_eq!(m.transpose().row(3), Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(m.transpose().cols[3], Vec4::W);
    }
}
