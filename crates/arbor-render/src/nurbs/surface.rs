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

//! Analytic surface sampling: a regular grid of points and normals
//! evaluated directly from the B-spline description.
//!
//! Normals come from the cross product of the first-order partials. At
//! parametrically degenerate spots (collapsed edges, poles) that product
//! vanishes; such normals are patched from the adjacent sample along `u`
//! first, then along `v`, so shading stays continuous instead of going
//! black or NaN.

use arbor_core::math::bspline::RationalSurface;
use arbor_core::math::{Vec2, Vec3};
use arbor_core::renderer::{PrimitiveKind, PrimitiveSink};

/// A sampled `(steps_u + 1) x (steps_v + 1)` grid of surface data,
/// row-major with `u` varying fastest.
#[derive(Debug, Clone, Default)]
pub struct SurfaceGrid {
    /// Samples along `u` (cells, not points).
    pub steps_u: usize,
    /// Samples along `v` (cells, not points).
    pub steps_v: usize,
    /// Surface points.
    pub points: Vec<Vec3>,
    /// Unit normals; empty when normal generation is off.
    pub normals: Vec<Vec3>,
    /// Normalized parametric coordinates, usable as texture coordinates.
    pub texcoords: Vec<Vec2>,
}

impl SurfaceGrid {
    /// Samples the surface uniformly over its knot domain.
    pub fn sample(
        surface: &RationalSurface<'_>,
        steps_u: usize,
        steps_v: usize,
        compute_normals: bool,
    ) -> Self {
        debug_assert!(surface.is_consistent());
        let steps_u = steps_u.max(1);
        let steps_v = steps_v.max(1);

        let u_start = surface.knots_u[surface.degree_u];
        let u_end = surface.knots_u[surface.num_u];
        let v_start = surface.knots_v[surface.degree_v];
        let v_end = surface.knots_v[surface.num_v];

        let cols = steps_u + 1;
        let rows = steps_v + 1;
        let mut grid = Self {
            steps_u,
            steps_v,
            points: Vec::with_capacity(cols * rows),
            normals: Vec::with_capacity(if compute_normals { cols * rows } else { 0 }),
            texcoords: Vec::with_capacity(cols * rows),
        };

        for j in 0..rows {
            let tv = j as f32 / steps_v as f32;
            let v = v_start + (v_end - v_start) * tv;
            for i in 0..cols {
                let tu = i as f32 / steps_u as f32;
                let u = u_start + (u_end - u_start) * tu;
                if compute_normals {
                    let ders = surface.derivs(u, v, 1);
                    grid.points.push(ders.point());
                    grid.normals.push(ders.du().cross(ders.dv()).normalize());
                } else {
                    grid.points.push(surface.point(u, v));
                }
                grid.texcoords.push(Vec2::new(tu, tv));
            }
        }

        if compute_normals {
            grid.patch_degenerate_normals();
        }
        grid
    }

    /// Replaces zero normals with a neighboring sample's normal,
    /// preferring the adjacent-`u` sample and falling back to the
    /// adjacent-`v` one. A spot whose neighbors are both degenerate too
    /// stays zero.
    fn patch_degenerate_normals(&mut self) {
        let cols = self.steps_u + 1;
        let rows = self.steps_v + 1;
        let original = self.normals.clone();
        for j in 0..rows {
            for i in 0..cols {
                if original[j * cols + i] != Vec3::ZERO {
                    continue;
                }
                let iu = if i + 1 < cols { i + 1 } else { i - 1 };
                let jv = if j + 1 < rows { j + 1 } else { j - 1 };
                let u_neighbor = original[j * cols + iu];
                let v_neighbor = original[jv * cols + i];
                self.normals[j * cols + i] = if u_neighbor != Vec3::ZERO {
                    u_neighbor
                } else {
                    v_neighbor
                };
            }
        }
    }

    /// Emits the grid as one quad strip per `v` row.
    pub fn emit(&self, sink: &mut dyn PrimitiveSink) {
        let cols = self.steps_u + 1;
        let has_normals = !self.normals.is_empty();
        for j in 0..self.steps_v {
            sink.begin(PrimitiveKind::QuadStrip);
            for i in 0..cols {
                for row in [j + 1, j] {
                    let idx = row * cols + i;
                    if has_normals {
                        sink.normal(self.normals[idx]);
                    }
                    sink.tex_coord(self.texcoords[idx]);
                    sink.vertex(self.points[idx]);
                }
            }
            sink.end();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::math::Vec4;

    struct CountingSink {
        begins: usize,
        vertices: usize,
        normals: usize,
        ends: usize,
    }

    impl CountingSink {
        fn new() -> Self {
            Self {
                begins: 0,
                vertices: 0,
                normals: 0,
                ends: 0,
            }
        }
    }

    impl PrimitiveSink for CountingSink {
        fn begin(&mut self, kind: PrimitiveKind) {
            assert_eq!(kind, PrimitiveKind::QuadStrip);
            self.begins += 1;
        }
        fn vertex(&mut self, _position: Vec3) {
            self.vertices += 1;
        }
        fn normal(&mut self, _normal: Vec3) {
            self.normals += 1;
        }
        fn tex_coord(&mut self, _uv: Vec2) {}
        fn end(&mut self) {
            self.ends += 1;
        }
    }

    fn bilinear_square() -> (Vec<f32>, Vec<Vec4>) {
        let knots = vec![0.0, 0.0, 1.0, 1.0];
        let mut ctrl = Vec::new();
        for v in 0..2 {
            for u in 0..2 {
                ctrl.push(Vec4::from_point_weight(
                    Vec3::new(u as f32, v as f32, 0.0),
                    1.0,
                ));
            }
        }
        (knots, ctrl)
    }

    #[test]
    fn test_grid_dimensions_and_emission() {
        let (knots, ctrl) = bilinear_square();
        let surf = RationalSurface {
            degree_u: 1,
            degree_v: 1,
            knots_u: &knots,
            knots_v: &knots,
            num_u: 2,
            num_v: 2,
            ctrl: &ctrl,
        };
        let grid = SurfaceGrid::sample(&surf, 4, 3, true);
        assert_eq!(grid.points.len(), 5 * 4);
        assert_eq!(grid.normals.len(), 5 * 4);

        let mut sink = CountingSink::new();
        grid.emit(&mut sink);
        assert_eq!(sink.begins, 3);
        assert_eq!(sink.ends, 3);
        assert_eq!(sink.vertices, 3 * 5 * 2);
        assert_eq!(sink.normals, sink.vertices);
    }

    #[test]
    fn test_flat_patch_normals_are_uniform() {
        let (knots, ctrl) = bilinear_square();
        let surf = RationalSurface {
            degree_u: 1,
            degree_v: 1,
            knots_u: &knots,
            knots_v: &knots,
            num_u: 2,
            num_v: 2,
            ctrl: &ctrl,
        };
        let grid = SurfaceGrid::sample(&surf, 2, 2, true);
        for n in &grid.normals {
            assert!((n.z.abs() - 1.0).abs() < 1e-4, "normal {n:?}");
        }
    }

    #[test]
    fn test_degenerate_corner_normal_is_patched() {
        // Collapse the v=0 edge to a single point: the two bottom
        // control points coincide, so du vanishes along that edge and
        // the cross product degenerates there.
        let knots = vec![0.0, 0.0, 1.0, 1.0];
        let ctrl = vec![
            Vec4::from_point_weight(Vec3::new(0.5, 0.0, 0.0), 1.0),
            Vec4::from_point_weight(Vec3::new(0.5, 0.0, 0.0), 1.0),
            Vec4::from_point_weight(Vec3::new(0.0, 1.0, 0.0), 1.0),
            Vec4::from_point_weight(Vec3::new(1.0, 1.0, 0.0), 1.0),
        ];
        let surf = RationalSurface {
            degree_u: 1,
            degree_v: 1,
            knots_u: &knots,
            knots_v: &knots,
            num_u: 2,
            num_v: 2,
            ctrl: &ctrl,
        };
        let grid = SurfaceGrid::sample(&surf, 2, 2, true);
        // Interior rows have well-defined normals; the collapsed edge
        // row must have been patched from its v-neighbors rather than
        // left at zero.
        for n in &grid.normals {
            assert_ne!(*n, Vec3::ZERO);
        }
    }
}
