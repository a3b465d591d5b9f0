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

//! Provides the mathematics primitives used by the resource and geometry
//! pipelines.
//!
//! This module contains the vector and matrix types needed by the surface
//! evaluator and the screen-space sampling heuristics, together with the
//! B-spline basis-function machinery in [`bspline`].

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

pub mod bspline;
pub mod matrix;
pub mod vector;

pub use self::matrix::Mat4;
pub use self::vector::{Vec2, Vec3, Vec4};
