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

//! Maps the user-facing complexity scalar to tessellator sampling
//! densities.
//!
//! The constants in here are empirically tuned against typical scene
//! content and are not derived from anything; two generations of the
//! formulas exist and both are kept, selectable through the
//! `old_nurbs_complexity` toggle. Do not unify them: behavioral
//! compatibility matters more than elegance.

use arbor_core::renderer::SamplingMethod;
use arbor_core::RenderConfig;

/// Whether sampling density is judged on screen or in object space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplexityMetric {
    /// Density follows the projected screen-space size.
    ScreenSpace,
    /// Density is fixed in the parametric domain.
    ObjectSpace,
}

/// Per-axis shape information the density mapping needs.
#[derive(Debug, Clone, Copy)]
pub struct AxisInfo {
    /// Number of control points along the axis.
    pub num_ctrl: usize,
    /// Order (degree + 1) along the axis.
    pub order: usize,
    /// Whether the axis wraps around (closed surface).
    pub closed: bool,
    /// Length of the axis' parametric domain.
    pub domain: f32,
}

impl AxisInfo {
    /// A linear axis is a straight span: two control points of order
    /// two. It needs no interior sampling at all.
    #[inline]
    pub fn is_linear(&self) -> bool {
        self.num_ctrl == 2 && self.order == 2
    }
}

/// Current-generation step count for an object-space axis.
fn steps_current(c: f32) -> u32 {
    if c <= 0.1 {
        2
    } else if c < 0.7 {
        2 + (16.0 * (c - 0.1)).round() as u32
    } else {
        12 + (40.0 * (c - 0.7)).round() as u32
    }
}

/// Previous-generation step count, kept for compatibility.
fn steps_legacy(c: f32) -> u32 {
    if c < 0.5 {
        3 + (c * 10.0).round() as u32
    } else {
        8 + ((c - 0.5) * 28.0).round() as u32
    }
}

/// Current-generation screen-space tolerance in pixels.
fn tolerance_current(c: f32) -> f32 {
    2.0 + (1.0 - c) * (1.0 - c) * 48.0
}

/// Previous-generation screen-space tolerance, kept for compatibility.
fn tolerance_legacy(c: f32) -> f32 {
    2.0 + (1.0 - c) * 58.0
}

/// Steps along one axis for the object-space metric.
pub fn axis_steps(complexity: f32, axis: &AxisInfo, config: &RenderConfig) -> u32 {
    let c = complexity.clamp(0.0, 1.0);
    if axis.is_linear() && config.reduce_linear_nurbs_steps {
        return 1;
    }
    let mut steps = if config.old_nurbs_complexity {
        steps_legacy(c)
    } else {
        steps_current(c)
    };
    if axis.closed {
        // Wrapping axes silhouette badly at the seam; give them half
        // again as many steps.
        steps += (steps / 2).max(2);
    }
    steps
}

/// Translates the complexity scalar into a tessellator sampling
/// property for a surface.
pub fn surface_sampling(
    complexity: f32,
    metric: ComplexityMetric,
    u: &AxisInfo,
    v: &AxisInfo,
    config: &RenderConfig,
) -> SamplingMethod {
    let c = complexity.clamp(0.0, 1.0);
    let sampling = match metric {
        ComplexityMetric::ScreenSpace => {
            let tolerance = if config.old_nurbs_complexity {
                tolerance_legacy(c)
            } else {
                tolerance_current(c)
            };
            SamplingMethod::PathLength(tolerance)
        }
        ComplexityMetric::ObjectSpace => {
            let steps_u = axis_steps(c, u, config);
            let steps_v = axis_steps(c, v, config);
            SamplingMethod::DomainDistance {
                u_step: steps_u as f32 / u.domain.max(f32::MIN_POSITIVE),
                v_step: steps_v as f32 / v.domain.max(f32::MIN_POSITIVE),
            }
        }
    };
    if config.debug_nurbs_complexity {
        log::debug!("Surface sampling for complexity {c}: {sampling:?}");
    }
    sampling
}

/// Number of line segments used to render a curve.
pub fn curve_steps(complexity: f32, axis: &AxisInfo, config: &RenderConfig) -> u32 {
    let per_span = axis_steps(complexity, axis, config);
    if axis.is_linear() && config.reduce_linear_nurbs_steps {
        return 1;
    }
    // Sample each knot span at the axis density.
    let spans = (axis.num_ctrl + 1 - axis.order).max(1) as u32;
    per_span * spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(num_ctrl: usize, order: usize) -> AxisInfo {
        AxisInfo {
            num_ctrl,
            order,
            closed: false,
            domain: 1.0,
        }
    }

    #[test]
    fn test_steps_grow_with_complexity() {
        let config = RenderConfig::default();
        let a = axis(8, 4);
        let low = axis_steps(0.1, &a, &config);
        let mid = axis_steps(0.5, &a, &config);
        let high = axis_steps(1.0, &a, &config);
        assert!(low < mid && mid < high);
    }

    #[test]
    fn test_generations_differ() {
        let mut config = RenderConfig::default();
        let a = axis(8, 4);
        let current = axis_steps(0.9, &a, &config);
        config.old_nurbs_complexity = true;
        let legacy = axis_steps(0.9, &a, &config);
        assert_ne!(current, legacy);
    }

    #[test]
    fn test_linear_axis_collapses_when_reduced() {
        let mut config = RenderConfig::default();
        let a = axis(2, 2);
        assert!(axis_steps(0.8, &a, &config) > 1);
        config.reduce_linear_nurbs_steps = true;
        assert_eq!(axis_steps(0.8, &a, &config), 1);
    }

    #[test]
    fn test_closed_axis_gets_extra_steps() {
        let config = RenderConfig::default();
        let open = axis(8, 4);
        let closed = AxisInfo {
            closed: true,
            ..open
        };
        assert!(axis_steps(0.5, &closed, &config) > axis_steps(0.5, &open, &config));
    }

    #[test]
    fn test_screen_space_tolerance_tightens() {
        let config = RenderConfig::default();
        let a = axis(4, 4);
        let lo = surface_sampling(0.2, ComplexityMetric::ScreenSpace, &a, &a, &config);
        let hi = surface_sampling(0.9, ComplexityMetric::ScreenSpace, &a, &a, &config);
        match (lo, hi) {
            (SamplingMethod::PathLength(t_lo), SamplingMethod::PathLength(t_hi)) => {
                assert!(t_hi < t_lo);
            }
            other => panic!("unexpected sampling methods: {other:?}"),
        }
    }

    #[test]
    fn test_object_space_uses_domain_distance() {
        let config = RenderConfig::default();
        let u = AxisInfo {
            domain: 2.0,
            ..axis(6, 3)
        };
        let v = axis(6, 3);
        match surface_sampling(0.5, ComplexityMetric::ObjectSpace, &u, &v, &config) {
            SamplingMethod::DomainDistance { u_step, v_step } => {
                // Same step count spread over twice the domain.
                assert!((u_step - v_step / 2.0).abs() < 1e-5);
            }
            other => panic!("unexpected sampling method: {other:?}"),
        }
    }
}
