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

//! Rendering contracts: the GL backend seam, optional-library capability
//! traits, and the error hierarchy shared by their implementations.

pub mod error;
pub mod traits;

pub use error::{TessError, TextureError};
pub use traits::image_ops::{ImageOps, StubImageOps};
pub use traits::tessellator::{
    PrimitiveKind, PrimitiveSink, SamplingMethod, SurfaceDef, SurfaceTessellator, TrimCurve,
};
pub use traits::texture_backend::{
    CacheContextId, GlCapabilities, MagFilter, MinFilter, TextureBackend, TextureHandle,
    TextureSpec,
};
pub use traits::LibraryVersion;
