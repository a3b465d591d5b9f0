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

//! The CPU-side pixel image: a flat interleaved byte buffer with
//! 1 to 4 components per pixel.

/// The per-pixel component layout of an image buffer.
///
/// All pixel data crossing the texture boundary is row-major with
/// interleaved 8-bit components, meaning luminance, luminance + alpha,
/// RGB, or RGBA respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Components {
    /// One component: grayscale intensity.
    Luminance,
    /// Two components: grayscale intensity plus alpha.
    LuminanceAlpha,
    /// Three components: red, green, blue.
    Rgb,
    /// Four components: red, green, blue, alpha.
    Rgba,
}

impl Components {
    /// The number of bytes per pixel for this layout.
    #[inline]
    pub const fn count(self) -> usize {
        match self {
            Components::Luminance => 1,
            Components::LuminanceAlpha => 2,
            Components::Rgb => 3,
            Components::Rgba => 4,
        }
    }

    /// Whether the layout carries an alpha channel (the last component).
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Components::LuminanceAlpha | Components::Rgba)
    }

    /// Maps a component count (1-4) back to a layout.
    pub const fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(Components::Luminance),
            2 => Some(Components::LuminanceAlpha),
            3 => Some(Components::Rgb),
            4 => Some(Components::Rgba),
            _ => None,
        }
    }
}

/// An owned CPU pixel buffer with its dimensions and component layout.
///
/// 2D images have `depth == 1`; volume (3D) images have `depth > 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
    depth: usize,
    components: Components,
}

impl PixelImage {
    /// Creates a 2D image from a flat row-major byte buffer.
    ///
    /// Returns `None` when the buffer length does not match
    /// `width * height * components`.
    pub fn new_2d(
        data: Vec<u8>,
        width: usize,
        height: usize,
        components: Components,
    ) -> Option<Self> {
        Self::new_3d(data, width, height, 1, components)
    }

    /// Creates a volume image from a flat slice-major byte buffer.
    ///
    /// Returns `None` when the buffer length does not match the
    /// dimensions, or when any dimension is zero.
    pub fn new_3d(
        data: Vec<u8>,
        width: usize,
        height: usize,
        depth: usize,
        components: Components,
    ) -> Option<Self> {
        if width == 0 || height == 0 || depth == 0 {
            return None;
        }
        if data.len() != width * height * depth * components.count() {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            depth,
            components,
        })
    }

    /// The image width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// The image height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// The image depth in pixels (1 for 2D images).
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether this is a volume image.
    #[inline]
    pub fn is_3d(&self) -> bool {
        self.depth > 1
    }

    /// The per-pixel component layout.
    #[inline]
    pub fn components(&self) -> Components {
        self.components
    }

    /// The raw pixel bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the image, returning its pixel bytes.
    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// The derived transparency classification of an image.
///
/// Computed by scanning every alpha byte exactly once per content change;
/// the owner caches the result keyed off its unique id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransparencyState {
    /// Whether any pixel is non-opaque (alpha != 255).
    pub has_transparency: bool,
    /// Whether alpha testing suffices: every non-opaque pixel is fully
    /// transparent (alpha == 0), with no partial values in between.
    pub use_alpha_test: bool,
}

impl TransparencyState {
    /// Scans the image's alpha channel.
    ///
    /// Layouts without an alpha channel classify as opaque. The alpha
    /// byte is the last component of each pixel.
    pub fn scan(image: &PixelImage) -> Self {
        if !image.components().has_alpha() {
            return Self::default();
        }
        let stride = image.components().count();
        let mut has_transparency = false;
        let mut partial = false;
        for alpha in image.bytes().iter().skip(stride - 1).step_by(stride) {
            match *alpha {
                255 => {}
                0 => has_transparency = true,
                _ => {
                    has_transparency = true;
                    partial = true;
                }
            }
        }
        Self {
            has_transparency,
            use_alpha_test: has_transparency && !partial,
        }
    }
}
