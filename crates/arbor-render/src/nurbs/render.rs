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

//! Drives surface and curve rendering: de-indexes control nets, picks a
//! sampling density, and hands the flat description to the tessellator
//! (or to the built-in grid sampler when analytic normals are wanted
//! and no trims are present).
//!
//! Callers must verify tessellator availability before constructing a
//! renderer; this module treats an unavailable tessellator as a
//! programmer error, not a runtime condition.

use crate::nurbs::complexity::{self, AxisInfo, ComplexityMetric};
use crate::nurbs::surface::SurfaceGrid;
use crate::scratch;
use arbor_core::math::bspline::{RationalCurve, RationalSurface};
use arbor_core::math::{Vec3, Vec4};
use arbor_core::renderer::{
    PrimitiveKind, PrimitiveSink, SurfaceDef, SurfaceTessellator, TessError, TrimCurve,
};
use arbor_core::RenderConfig;

/// A control net, either already flat or indexed into a point pool.
#[derive(Debug, Clone, Copy)]
pub enum ControlNet<'a> {
    /// A dense grid at a regular stride.
    Flat {
        /// Flat coordinate array, `u` varying fastest.
        data: &'a [f32],
        /// Coordinates per point: 3, or 4 for rational nets.
        coords: usize,
    },
    /// Points referenced through an index list (the layout trimmed and
    /// shared-vertex shapes use).
    Indexed {
        /// The coordinate pool.
        data: &'a [f32],
        /// Coordinates per point: 3, or 4 for rational nets.
        coords: usize,
        /// One index per grid position, `u` varying fastest.
        indices: &'a [u32],
    },
}

impl<'a> ControlNet<'a> {
    /// Coordinates per control point.
    pub fn coords(&self) -> usize {
        match self {
            ControlNet::Flat { coords, .. } | ControlNet::Indexed { coords, .. } => *coords,
        }
    }
}

/// A NURBS surface shape as it arrives from the scene graph.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceShape<'a> {
    /// Order (degree + 1) along `u`.
    pub order_u: usize,
    /// Order (degree + 1) along `v`.
    pub order_v: usize,
    /// Knot vector along `u`.
    pub knots_u: &'a [f32],
    /// Knot vector along `v`.
    pub knots_v: &'a [f32],
    /// The control net.
    pub net: ControlNet<'a>,
    /// Whether the surface wraps around in `u` (a seam the sampler
    /// should not flatten).
    pub closed_u: bool,
    /// Whether the surface wraps around in `v`.
    pub closed_v: bool,
    /// Trim loops, outermost first; empty for untrimmed surfaces.
    pub trims: &'a [&'a [TrimCurve<'a>]],
}

impl<'a> SurfaceShape<'a> {
    /// Number of control points along `u`.
    pub fn num_u(&self) -> usize {
        self.knots_u.len() - self.order_u
    }

    /// Number of control points along `v`.
    pub fn num_v(&self) -> usize {
        self.knots_v.len() - self.order_v
    }

    fn axis_u(&self) -> AxisInfo {
        axis_info(self.order_u, self.knots_u, self.num_u(), self.closed_u)
    }

    fn axis_v(&self) -> AxisInfo {
        axis_info(self.order_v, self.knots_v, self.num_v(), self.closed_v)
    }
}

/// A NURBS curve shape.
#[derive(Debug, Clone, Copy)]
pub struct CurveShape<'a> {
    /// Order (degree + 1) of the curve.
    pub order: usize,
    /// The knot vector.
    pub knots: &'a [f32],
    /// The control points.
    pub net: ControlNet<'a>,
}

fn axis_info(order: usize, knots: &[f32], num_ctrl: usize, closed: bool) -> AxisInfo {
    let degree = order - 1;
    AxisInfo {
        num_ctrl,
        order,
        closed,
        domain: knots[num_ctrl] - knots[degree],
    }
}

/// Renders NURBS shapes through a tessellator, with complexity-driven
/// sampling density.
#[derive(Debug)]
pub struct NurbsRenderer<'a> {
    tess: &'a dyn SurfaceTessellator,
    config: &'a RenderConfig,
}

impl<'a> NurbsRenderer<'a> {
    /// Creates a renderer over a tessellator the caller has verified to
    /// be available.
    pub fn new(tess: &'a dyn SurfaceTessellator, config: &'a RenderConfig) -> Self {
        assert!(
            tess.is_available(),
            "NurbsRenderer constructed without an availability check"
        );
        Self { tess, config }
    }

    /// Tessellates and emits a surface.
    ///
    /// Untrimmed surfaces with analytic normals enabled go through the
    /// built-in grid sampler (the tessellator's face normals are flat
    /// across each primitive); everything else goes to the tessellator,
    /// with indexed nets de-indexed into a regular-stride flat array
    /// first.
    pub fn render_surface(
        &self,
        shape: &SurfaceShape<'_>,
        complexity: f32,
        metric: ComplexityMetric,
        sink: &mut dyn PrimitiveSink,
    ) -> Result<(), TessError> {
        if shape.trims.is_empty()
            && self.config.calculate_nurbs_normals
            && metric == ComplexityMetric::ObjectSpace
        {
            return self.render_surface_grid(shape, complexity, sink);
        }

        let sampling = complexity::surface_sampling(
            complexity,
            metric,
            &shape.axis_u(),
            &shape.axis_v(),
            self.config,
        );

        scratch::with_float_buffer(|flat| {
            let coords = shape.net.coords();
            let ctrl: &[f32] = match shape.net {
                ControlNet::Flat { data, .. } => data,
                ControlNet::Indexed { data, indices, .. } => {
                    deindex(data, indices, coords, flat)?;
                    flat.as_slice()
                }
            };
            let def = SurfaceDef {
                order_u: shape.order_u,
                order_v: shape.order_v,
                knots_u: shape.knots_u,
                knots_v: shape.knots_v,
                ctrl,
                stride_u: coords,
                stride_v: coords * shape.num_u(),
                coords,
            };
            def.validate()?;
            self.tess.tessellate_surface(&def, shape.trims, sampling, sink)
        })
    }

    /// Samples and emits an untrimmed surface with analytic normals.
    fn render_surface_grid(
        &self,
        shape: &SurfaceShape<'_>,
        complexity: f32,
        sink: &mut dyn PrimitiveSink,
    ) -> Result<(), TessError> {
        let steps_u = complexity::axis_steps(complexity, &shape.axis_u(), self.config) as usize;
        let steps_v = complexity::axis_steps(complexity, &shape.axis_v(), self.config) as usize;

        let ctrl = homogeneous_net(&shape.net, shape.num_u() * shape.num_v())?;
        let surface = RationalSurface {
            degree_u: shape.order_u - 1,
            degree_v: shape.order_v - 1,
            knots_u: shape.knots_u,
            knots_v: shape.knots_v,
            num_u: shape.num_u(),
            num_v: shape.num_v(),
            ctrl: &ctrl,
        };
        if !surface.is_consistent() {
            return Err(TessError::InvalidSurface(
                "knot/control-point counts do not match".into(),
            ));
        }
        SurfaceGrid::sample(&surface, steps_u, steps_v, true).emit(sink);
        Ok(())
    }

    /// Evaluates and emits a curve as a line strip.
    pub fn render_curve(
        &self,
        shape: &CurveShape<'_>,
        complexity: f32,
        sink: &mut dyn PrimitiveSink,
    ) -> Result<(), TessError> {
        let num_ctrl = match shape.net {
            ControlNet::Flat { data, coords } => data.len() / coords,
            ControlNet::Indexed { indices, .. } => indices.len(),
        };
        if shape.knots.len() != num_ctrl + shape.order {
            return Err(TessError::InvalidSurface(
                "curve knot count does not match control points".into(),
            ));
        }

        let ctrl = homogeneous_net(&shape.net, num_ctrl)?;
        let curve = RationalCurve {
            degree: shape.order - 1,
            knots: shape.knots,
            ctrl: &ctrl,
        };
        let axis = axis_info(shape.order, shape.knots, num_ctrl, false);
        let steps = complexity::curve_steps(complexity, &axis, self.config).max(1);
        let (start, end) = curve.domain();

        sink.begin(PrimitiveKind::LineStrip);
        for i in 0..=steps {
            let u = start + (end - start) * (i as f32 / steps as f32);
            sink.vertex(curve.point(u));
        }
        sink.end();
        Ok(())
    }
}

/// De-indexes a control net into a flat regular-stride array.
fn deindex(
    data: &[f32],
    indices: &[u32],
    coords: usize,
    out: &mut Vec<f32>,
) -> Result<(), TessError> {
    out.clear();
    out.reserve(indices.len() * coords);
    for &idx in indices {
        let base = idx as usize * coords;
        let point = data
            .get(base..base + coords)
            .ok_or_else(|| TessError::InvalidSurface(format!("control index {idx} out of range")))?;
        out.extend_from_slice(point);
    }
    Ok(())
}

/// Converts a net to homogeneous control points, adding unit weights to
/// non-rational ones.
fn homogeneous_net(net: &ControlNet<'_>, expected: usize) -> Result<Vec<Vec4>, TessError> {
    let coords = net.coords();
    if coords != 3 && coords != 4 {
        return Err(TessError::InvalidSurface(format!(
            "control points must have 3 or 4 coordinates, got {coords}"
        )));
    }
    let mut out = Vec::with_capacity(expected);
    let mut push_point = |chunk: &[f32]| {
        out.push(if coords == 4 {
            Vec4::new(chunk[0], chunk[1], chunk[2], chunk[3])
        } else {
            Vec4::from_point_weight(Vec3::new(chunk[0], chunk[1], chunk[2]), 1.0)
        });
    };
    match net {
        ControlNet::Flat { data, .. } => {
            for chunk in data.chunks_exact(coords) {
                push_point(chunk);
            }
        }
        ControlNet::Indexed { data, indices, .. } => {
            for &idx in *indices {
                let base = idx as usize * coords;
                if base + coords > data.len() {
                    return Err(TessError::InvalidSurface(format!(
                        "control index {idx} out of range"
                    )));
                }
                push_point(&data[base..base + coords]);
            }
        }
    }
    if out.len() != expected {
        return Err(TessError::InvalidSurface(format!(
            "control net holds {} points, surface needs {expected}",
            out.len()
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::math::Vec2;
    use arbor_core::renderer::LibraryVersion;

    #[derive(Debug, Default)]
    struct RecordingTess {
        calls: std::cell::RefCell<Vec<(usize, usize)>>,
    }

    impl SurfaceTessellator for RecordingTess {
        fn is_available(&self) -> bool {
            true
        }
        fn version(&self) -> LibraryVersion {
            LibraryVersion::new(1, 3, 0)
        }
        fn tessellate_surface(
            &self,
            surface: &SurfaceDef<'_>,
            _trims: &[&[TrimCurve<'_>]],
            _sampling: arbor_core::renderer::SamplingMethod,
            _sink: &mut dyn PrimitiveSink,
        ) -> Result<(), TessError> {
            surface.validate()?;
            self.calls
                .borrow_mut()
                .push((surface.num_u(), surface.num_v()));
            Ok(())
        }
    }

    struct NullSink;
    impl PrimitiveSink for NullSink {
        fn begin(&mut self, _kind: PrimitiveKind) {}
        fn vertex(&mut self, _position: Vec3) {}
        fn normal(&mut self, _normal: Vec3) {}
        fn tex_coord(&mut self, _uv: Vec2) {}
        fn end(&mut self) {}
    }

    #[test]
    fn test_indexed_net_is_deindexed_before_tessellation() {
        let tess = RecordingTess::default();
        let config = RenderConfig::default();
        let renderer = NurbsRenderer::new(&tess, &config);

        // A 2x2 bilinear surface whose 4 grid slots all reference the
        // same pool of 3 points.
        let pool = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let indices = [0u32, 1, 2, 1];
        let knots = [0.0f32, 0.0, 1.0, 1.0];
        let shape = SurfaceShape {
            order_u: 2,
            order_v: 2,
            knots_u: &knots,
            knots_v: &knots,
            net: ControlNet::Indexed {
                data: &pool,
                coords: 3,
                indices: &indices,
            },
            closed_u: false,
            closed_v: false,
            trims: &[],
        };
        renderer
            .render_surface(
                &shape,
                0.5,
                ComplexityMetric::ScreenSpace,
                &mut NullSink,
            )
            .unwrap();
        assert_eq!(tess.calls.borrow().as_slice(), &[(2, 2)]);
    }

    #[test]
    fn test_curve_renders_line_strip() {
        struct StripSink {
            vertices: Vec<Vec3>,
            in_strip: bool,
        }
        impl PrimitiveSink for StripSink {
            fn begin(&mut self, kind: PrimitiveKind) {
                assert_eq!(kind, PrimitiveKind::LineStrip);
                self.in_strip = true;
            }
            fn vertex(&mut self, position: Vec3) {
                assert!(self.in_strip);
                self.vertices.push(position);
            }
            fn normal(&mut self, _normal: Vec3) {}
            fn tex_coord(&mut self, _uv: Vec2) {}
            fn end(&mut self) {
                self.in_strip = false;
            }
        }

        let tess = RecordingTess::default();
        let config = RenderConfig::default();
        let renderer = NurbsRenderer::new(&tess, &config);

        let ctrl = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
        let knots = [0.0f32, 0.0, 1.0, 1.0];
        let shape = CurveShape {
            order: 2,
            knots: &knots,
            net: ControlNet::Flat {
                data: &ctrl,
                coords: 3,
            },
        };
        let mut sink = StripSink {
            vertices: Vec::new(),
            in_strip: false,
        };
        renderer.render_curve(&shape, 0.5, &mut sink).unwrap();
        assert!(sink.vertices.len() >= 2);
        let first = sink.vertices.first().unwrap();
        let last = sink.vertices.last().unwrap();
        assert!((first.x - 0.0).abs() < 1e-5);
        assert!((last.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_mismatched_knots_are_rejected() {
        let tess = RecordingTess::default();
        let config = RenderConfig::default();
        let renderer = NurbsRenderer::new(&tess, &config);

        let ctrl = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
        let knots = [0.0f32, 0.0, 0.5, 1.0, 1.0]; // one knot too many
        let shape = CurveShape {
            order: 2,
            knots: &knots,
            net: ControlNet::Flat {
                data: &ctrl,
                coords: 3,
            },
        };
        assert!(renderer.render_curve(&shape, 0.5, &mut NullSink).is_err());
    }
}
