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

//! Capability trait for the optional NURBS tessellation library.
//!
//! The tessellator consumes a surface description (knot vectors, a
//! control net with explicit strides, optional trim loops) plus a
//! sampling property, and emits primitives through a [`PrimitiveSink`].
//! Availability must be verified by the caller before the rendering
//! pipeline is entered; the pipeline itself treats an unavailable
//! tessellator as a contract violation.

use super::LibraryVersion;
use crate::math::{Vec2, Vec3};
use crate::renderer::error::TessError;
use std::fmt::Debug;

/// The primitive classes a tessellator can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// Isolated points.
    Points,
    /// A connected line strip.
    LineStrip,
    /// Independent triangles.
    Triangles,
    /// A triangle strip.
    TriangleStrip,
    /// A triangle fan.
    TriangleFan,
    /// Independent quads.
    Quads,
    /// A quad strip.
    QuadStrip,
}

/// Receives the primitives produced by a tessellation run.
///
/// Calls arrive in `begin` / (`normal`? `tex_coord`? `vertex`)* / `end`
/// order; attribute calls apply to the vertices that follow them.
pub trait PrimitiveSink {
    /// Starts a primitive of the given kind.
    fn begin(&mut self, kind: PrimitiveKind);

    /// Emits a vertex position.
    fn vertex(&mut self, position: Vec3);

    /// Sets the normal for subsequent vertices.
    fn normal(&mut self, normal: Vec3);

    /// Sets the texture coordinate for subsequent vertices.
    fn tex_coord(&mut self, uv: Vec2);

    /// Ends the current primitive.
    fn end(&mut self);

    /// Reports a tessellation error. The default implementation logs it.
    fn error(&mut self, message: &str) {
        log::warn!("Tessellation error: {message}");
    }
}

/// How densely the tessellator samples the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingMethod {
    /// Screen-space: maximum pixel length of a tessellation edge.
    PathLength(f32),
    /// Screen-space: maximum pixel distance between the surface and its
    /// tessellated approximation.
    ParametricError(f32),
    /// Object-space variant of `PathLength`.
    ObjectPathLength(f32),
    /// Object-space variant of `ParametricError`.
    ObjectParametricError(f32),
    /// Fixed sample counts per unit of parametric domain.
    DomainDistance {
        /// Samples per unit parameter along `u`.
        u_step: f32,
        /// Samples per unit parameter along `v`.
        v_step: f32,
    },
}

/// A NURBS surface description in the flat layout tessellators expect.
///
/// The control array is a regular grid: moving one point along `u`
/// advances `stride_u` floats, one row along `v` advances `stride_v`
/// floats. Indexed layouts must be de-indexed before reaching this type.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceDef<'a> {
    /// Order (degree + 1) along `u`.
    pub order_u: usize,
    /// Order (degree + 1) along `v`.
    pub order_v: usize,
    /// Knot vector along `u`; `len = num_u + order_u`.
    pub knots_u: &'a [f32],
    /// Knot vector along `v`; `len = num_v + order_v`.
    pub knots_v: &'a [f32],
    /// Flat control-point array.
    pub ctrl: &'a [f32],
    /// Floats between consecutive control points along `u`.
    pub stride_u: usize,
    /// Floats between consecutive control rows along `v`.
    pub stride_v: usize,
    /// Coordinates per control point: 3, or 4 for rational surfaces.
    pub coords: usize,
}

impl<'a> SurfaceDef<'a> {
    /// Number of control points along `u`.
    #[inline]
    pub fn num_u(&self) -> usize {
        self.knots_u.len() - self.order_u
    }

    /// Number of control points along `v`.
    #[inline]
    pub fn num_v(&self) -> usize {
        self.knots_v.len() - self.order_v
    }

    /// Validates knot counts, strides, and the control-array length.
    pub fn validate(&self) -> Result<(), TessError> {
        if self.order_u < 2 || self.order_v < 2 {
            return Err(TessError::InvalidSurface("order must be at least 2".into()));
        }
        if self.coords != 3 && self.coords != 4 {
            return Err(TessError::InvalidSurface(format!(
                "control points must have 3 or 4 coordinates, got {}",
                self.coords
            )));
        }
        if self.knots_u.len() <= self.order_u || self.knots_v.len() <= self.order_v {
            return Err(TessError::InvalidSurface("knot vector too short".into()));
        }
        let needed = (self.num_v() - 1) * self.stride_v + (self.num_u() - 1) * self.stride_u
            + self.coords;
        if self.ctrl.len() < needed {
            return Err(TessError::InvalidSurface(format!(
                "control array holds {} floats, surface needs {}",
                self.ctrl.len(),
                needed
            )));
        }
        Ok(())
    }
}

/// One curve of a trim loop, in the surface's parametric domain.
#[derive(Debug, Clone, Copy)]
pub enum TrimCurve<'a> {
    /// A piecewise-linear curve: `dim`-dimensional points (2, or 3 for
    /// homogeneous domain coordinates) at a regular stride.
    Piecewise {
        /// Flat point array.
        points: &'a [f32],
        /// Floats between consecutive points.
        stride: usize,
        /// Coordinates per point.
        dim: usize,
    },
    /// A NURBS curve in the parametric domain.
    Nurbs {
        /// Order (degree + 1) of the curve.
        order: usize,
        /// Knot vector; `len = num_ctrl + order`.
        knots: &'a [f32],
        /// Flat control-point array.
        ctrl: &'a [f32],
        /// Floats between consecutive control points.
        stride: usize,
        /// Coordinates per control point.
        dim: usize,
    },
}

/// NURBS tessellation provided by an optional native library.
pub trait SurfaceTessellator: Debug {
    /// Whether the native library was found and carries the NURBS
    /// renderer capability.
    fn is_available(&self) -> bool;

    /// The library's parsed version; `0.0.0` when unavailable.
    fn version(&self) -> LibraryVersion;

    /// Converts the surface into primitives.
    ///
    /// `trims` is a list of trim loops, each a closed sequence of
    /// curves. Callers must have verified [`is_available`] first.
    ///
    /// [`is_available`]: SurfaceTessellator::is_available
    fn tessellate_surface(
        &self,
        surface: &SurfaceDef<'_>,
        trims: &[&[TrimCurve<'_>]],
        sampling: SamplingMethod,
        sink: &mut dyn PrimitiveSink,
    ) -> Result<(), TessError>;
}

/// The null-object tessellator used when the native library is absent.
///
/// Invoking it is a programmer error: availability must be checked at
/// the call site before the rendering pipeline is entered.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTessellator;

impl SurfaceTessellator for NullTessellator {
    fn is_available(&self) -> bool {
        false
    }

    fn version(&self) -> LibraryVersion {
        LibraryVersion::default()
    }

    fn tessellate_surface(
        &self,
        _surface: &SurfaceDef<'_>,
        _trims: &[&[TrimCurve<'_>]],
        _sampling: SamplingMethod,
        _sink: &mut dyn PrimitiveSink,
    ) -> Result<(), TessError> {
        debug_assert!(false, "tessellate_surface called without an availability check");
        Err(TessError::NativeError("tessellator unavailable".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_def_validation() {
        let knots = [0.0, 0.0, 1.0, 1.0];
        let ctrl = [0.0f32; 12]; // 2x2 grid of 3 coords
        let def = SurfaceDef {
            order_u: 2,
            order_v: 2,
            knots_u: &knots,
            knots_v: &knots,
            ctrl: &ctrl,
            stride_u: 3,
            stride_v: 6,
            coords: 3,
        };
        assert_eq!(def.num_u(), 2);
        assert_eq!(def.num_v(), 2);
        assert!(def.validate().is_ok());

        let short = SurfaceDef {
            ctrl: &ctrl[..10],
            ..def
        };
        assert!(short.validate().is_err());
    }
}
