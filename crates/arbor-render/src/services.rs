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

//! The bundle of collaborators the texture pipeline pulls from its host.
//!
//! Instead of hidden singletons, the host constructs one value per
//! rendering context group and passes it by reference into every
//! render-path call.

use arbor_core::renderer::{ImageOps, StubImageOps, TextureBackend};
use arbor_core::RenderConfig;

/// Borrowed collaborators for texture render-path operations.
///
/// `backend` must have its GL context current on the calling thread.
/// `image_ops` is the high-quality native resize/loader capability and
/// `scale_ops` the universally-available scale primitive; both default
/// to stubs when the respective native library is absent.
#[derive(Debug, Clone, Copy)]
pub struct RenderServices<'a> {
    /// The GL driver seam for the current context group.
    pub backend: &'a dyn TextureBackend,
    /// Native image services (resize, file reading), if loaded.
    pub image_ops: &'a dyn ImageOps,
    /// The basic image-scale primitive (GLU-class library), if loaded.
    pub scale_ops: &'a dyn ImageOps,
    /// Tuning and diagnostics configuration.
    pub config: &'a RenderConfig,
}

impl<'a> RenderServices<'a> {
    /// Creates services with both optional libraries absent.
    pub fn without_native_libs(
        backend: &'a dyn TextureBackend,
        config: &'a RenderConfig,
    ) -> Self {
        static STUB: StubImageOps = StubImageOps;
        Self {
            backend,
            image_ops: &STUB,
            scale_ops: &STUB,
            config,
        }
    }
}
