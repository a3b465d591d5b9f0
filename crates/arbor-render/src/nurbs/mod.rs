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

//! The NURBS rendering pipeline: complexity-driven sampling density,
//! analytic surface sampling with normal generation, and the driver for
//! the optional native tessellator.

pub mod complexity;
pub mod render;
pub mod surface;

pub use complexity::{AxisInfo, ComplexityMetric};
pub use render::{ControlNet, CurveShape, NurbsRenderer, SurfaceShape};
pub use surface::SurfaceGrid;
