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

//! # Arbor Render
//!
//! Hot-path pipelines built on the `arbor-core` contracts: GL texture
//! resource lifecycle with age-based eviction, NURBS surface sampling and
//! tessellation, and tiled offscreen readback.

#![warn(missing_docs)]

pub mod nurbs;
pub mod offscreen;
pub mod scratch;
pub mod services;
pub mod texture;

pub use services::RenderServices;
pub use texture::registry::TextureRegistry;
pub use texture::resource::TextureResource;
