// Copyright 2025 the arbor authors
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

//! Provides a column-major 4x4 matrix for view/projection transforms.
//!
//! Only the operations the sampling heuristics need are implemented here:
//! composition and point transformation with perspective division.

use super::vector::Vec3;
use std::ops::Mul;

/// A column-major 4x4 matrix with `f32` components.
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Mat4 {
    /// The matrix columns.
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a matrix from column arrays.
    #[inline]
    pub const fn from_cols(cols: [[f32; 4]; 4]) -> Self {
        Self { cols }
    }

    /// Creates a uniform scale matrix.
    #[inline]
    pub fn from_scale(s: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0][0] = s;
        m.cols[1][1] = s;
        m.cols[2][2] = s;
        m
    }

    /// Creates a translation matrix.
    #[inline]
    pub fn from_translation(t: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3][0] = t.x;
        m.cols[3][1] = t.y;
        m.cols[3][2] = t.z;
        m
    }

    /// Transforms a point, applying the perspective division.
    ///
    /// A near-zero resulting `w` leaves the point untouched by the division
    /// to avoid producing non-finite coordinates.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let c = &self.cols;
        let x = c[0][0] * p.x + c[1][0] * p.y + c[2][0] * p.z + c[3][0];
        let y = c[0][1] * p.x + c[1][1] * p.y + c[2][1] * p.z + c[3][1];
        let z = c[0][2] * p.x + c[1][2] * p.y + c[2][2] * p.z + c[3][2];
        let w = c[0][3] * p.x + c[1][3] * p.y + c[2][3] * p.z + c[3][3];
        if w.abs() > super::EPSILON {
            Vec3::new(x / w, y / w, z / w)
        } else {
            Vec3::new(x, y, z)
        }
    }

    /// Transforms a direction vector, ignoring the translation part.
    pub fn transform_direction(&self, v: Vec3) -> Vec3 {
        let c = &self.cols;
        Vec3::new(
            c[0][0] * v.x + c[1][0] * v.y + c[2][0] * v.z,
            c[0][1] * v.x + c[1][1] * v.y + c[2][1] * v.z,
            c[0][2] * v.x + c[1][2] * v.y + c[2][2] * v.z,
        )
    }
}

impl Mul for Mat4 {
    type Output = Self;

    /// Composes two matrices (`self * rhs` applies `rhs` first).
    fn mul(self, rhs: Self) -> Self::Output {
        let mut out = [[0.0f32; 4]; 4];
        for (c, col) in rhs.cols.iter().enumerate() {
            for r in 0..4 {
                out[c][r] = self.cols[0][r] * col[0]
                    + self.cols[1][r] * col[1]
                    + self.cols[2][r] * col[2]
                    + self.cols[3][r] * col[3];
            }
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_transform() {
        let p = Vec3::new(1.0, -2.0, 3.0);
        assert_eq!(Mat4::IDENTITY.transform_point(p), p);
    }

    #[test]
    fn test_translation_then_scale() {
        let m = Mat4::from_scale(2.0) * Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let p = m.transform_point(Vec3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p.x, 4.0);
        assert_relative_eq!(p.y, 2.0);
        assert_relative_eq!(p.z, 2.0);
    }

    #[test]
    fn test_direction_ignores_translation() {
        let m = Mat4::from_translation(Vec3::new(10.0, 10.0, 10.0));
        let v = m.transform_direction(Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(v, Vec3::new(0.0, 0.0, 1.0));
    }
}
