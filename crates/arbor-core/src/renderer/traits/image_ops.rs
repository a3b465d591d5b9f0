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

//! Capability trait for an optional native image-services library.
//!
//! Callers depend only on this interface; whether it is backed by a
//! runtime-loaded native library or by [`StubImageOps`] is invisible to
//! them. A `None` return always means "capability absent", never an
//! error condition, so the resize preference chain can simply move on
//! to its next candidate.

use super::LibraryVersion;
use crate::texture::image::PixelImage;
use std::fmt::Debug;
use std::path::Path;

/// Image services provided by an optional native library.
pub trait ImageOps: Debug {
    /// Whether the native library was found and loaded.
    fn is_available(&self) -> bool;

    /// The library's parsed version; `0.0.0` when unavailable.
    fn version(&self) -> LibraryVersion;

    /// Resamples a 2D image to the given dimensions.
    ///
    /// Returns `None` when the capability is absent. The output
    /// dimensions are exactly as requested; the filter quality is
    /// implementation-defined.
    fn resize_2d(&self, src: &PixelImage, width: usize, height: usize) -> Option<PixelImage>;

    /// Resamples a volume image to the given dimensions.
    ///
    /// Returns `None` when absent (only newer library versions carry a
    /// 3D resize).
    fn resize_3d(
        &self,
        src: &PixelImage,
        width: usize,
        height: usize,
        depth: usize,
    ) -> Option<PixelImage>;

    /// Reads an image file from disk through the native loaders.
    ///
    /// Returns `None` when the capability is absent or the file cannot
    /// be decoded.
    fn read_file(&self, path: &Path) -> Option<PixelImage>;
}

/// The null-object implementation used when no native library is
/// available: reports unavailability and provides no capabilities.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubImageOps;

impl ImageOps for StubImageOps {
    fn is_available(&self) -> bool {
        false
    }

    fn version(&self) -> LibraryVersion {
        LibraryVersion::default()
    }

    fn resize_2d(&self, _src: &PixelImage, _width: usize, _height: usize) -> Option<PixelImage> {
        None
    }

    fn resize_3d(
        &self,
        _src: &PixelImage,
        _width: usize,
        _height: usize,
        _depth: usize,
    ) -> Option<PixelImage> {
        None
    }

    fn read_file(&self, _path: &Path) -> Option<PixelImage> {
        None
    }
}
