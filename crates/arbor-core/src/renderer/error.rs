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

//! Defines the error types for the texture and tessellation subsystems.
//!
//! A missing optional library is never an error here: capability tables
//! degrade to null/stub entries instead (the "keep rendering" policy).
//! These types cover the genuinely failing paths.

use std::fmt;

/// An error raised while creating or updating a GL texture object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureError {
    /// No legal texture size could be found even after repeated halving.
    ///
    /// This indicates a pathologically restrictive driver; the texture is
    /// skipped and geometry renders untextured.
    SizeNotSupported {
        /// The requested width in pixels.
        width: usize,
        /// The requested height in pixels.
        height: usize,
        /// The requested depth in pixels.
        depth: usize,
    },
    /// The backend rejected an upload or state change.
    BackendFailure(String),
    /// An operation needed pixel data but the resource holds none
    /// (reset, or attached to an externally managed GL object).
    NoPixelData,
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::SizeNotSupported {
                width,
                height,
                depth,
            } => {
                write!(
                    f,
                    "No legal texture size found for {width}x{height}x{depth} image"
                )
            }
            TextureError::BackendFailure(details) => {
                write!(f, "Texture backend failure: {details}")
            }
            TextureError::NoPixelData => {
                write!(f, "Operation requires pixel data but the resource holds none")
            }
        }
    }
}

impl std::error::Error for TextureError {}

/// An error raised by a surface tessellator while converting a NURBS
/// description into primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TessError {
    /// The surface description is internally inconsistent (knot counts,
    /// strides, orders).
    InvalidSurface(String),
    /// The native tessellator reported an error through its callback.
    NativeError(String),
}

impl fmt::Display for TessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TessError::InvalidSurface(details) => {
                write!(f, "Invalid surface description: {details}")
            }
            TessError::NativeError(details) => {
                write!(f, "Tessellator error: {details}")
            }
        }
    }
}

impl std::error::Error for TessError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_error_message_names_dimensions() {
        let err = TextureError::SizeNotSupported {
            width: 8192,
            height: 4096,
            depth: 1,
        };
        assert!(err.to_string().contains("8192x4096x1"));
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        takes_error(&TextureError::NoPixelData);
        takes_error(&TessError::NativeError("callback".into()));
    }
}
