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

//! # Arbor Infra
//!
//! Concrete implementations of the `arbor-core` contracts that talk to
//! external dependencies: the glow-backed OpenGL texture backend and the
//! runtime-loaded optional native libraries (GLU, simage).

#![warn(missing_docs)]

#[cfg(feature = "dynlib")]
pub mod dynlib;
#[cfg(feature = "graphics")]
pub mod graphics;

/// Initializes the diagnostic logging backend.
///
/// Idempotent: later calls are no-ops. Log verbosity follows the usual
/// `RUST_LOG` conventions; the library itself never writes to
/// stdout/stderr outside this logger.
pub fn init_diagnostics() {
    let _ = env_logger::Builder::from_default_env().try_init();
}
