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

//! Wrap modes, filter overrides, and behavior flags for texture
//! resources.

/// Defines how texture coordinates are handled when sampling outside the
/// `[0, 1]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    /// Coordinates wrap around. `1.1` becomes `0.1`.
    Repeat,
    /// Legacy clamp: filtering may pick up the border color.
    Clamp,
    /// Coordinates are clamped to the edge texels.
    ClampToEdge,
    /// Coordinates outside the range are given a fixed border color.
    ClampToBorder,
}

/// An explicit texture filter choice, overriding quality-based selection.
///
/// The variants mirror the GL minification filters; for magnification the
/// mipmap part is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    /// Point sampling.
    Nearest,
    /// Bilinear interpolation.
    Linear,
    /// Point sampling within the nearest mipmap level.
    NearestMipmapNearest,
    /// Point sampling blended across the two nearest mipmap levels.
    NearestMipmapLinear,
    /// Bilinear sampling within the nearest mipmap level.
    LinearMipmapNearest,
    /// Full trilinear sampling.
    LinearMipmapLinear,
}

impl TextureFilter {
    /// Whether this filter samples from mipmap levels.
    #[inline]
    pub const fn needs_mipmaps(self) -> bool {
        !matches!(self, TextureFilter::Nearest | TextureFilter::Linear)
    }
}

/// Behavior flags for a texture resource.
///
/// Flags combine with bitwise operations. The default (empty) set selects
/// quality-driven filtering and automatic transparency classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureFlags {
    bits: u32,
}

impl TextureFlags {
    /// No flags set.
    pub const NONE: Self = Self { bits: 0 };
    /// Prefer scaling down (not up) when legalizing to a power of two.
    pub const SCALE_DOWN: Self = Self { bits: 1 << 0 };
    /// Never build or use mipmaps for this resource.
    pub const NO_MIPMAP: Self = Self { bits: 1 << 1 };
    /// Classify as transparent regardless of the alpha scan.
    pub const FORCE_TRANSPARENCY_TRUE: Self = Self { bits: 1 << 2 };
    /// Classify as opaque regardless of the alpha scan.
    pub const FORCE_TRANSPARENCY_FALSE: Self = Self { bits: 1 << 3 };
    /// Report alpha-test rendering regardless of the alpha scan.
    pub const FORCE_ALPHA_TEST_TRUE: Self = Self { bits: 1 << 4 };
    /// Never report alpha-test rendering regardless of the alpha scan.
    pub const FORCE_ALPHA_TEST_FALSE: Self = Self { bits: 1 << 5 };
    /// The image targets a rectangle (non-normalized, non-pow2) texture.
    pub const RECTANGLE: Self = Self { bits: 1 << 6 };
    /// Ask the driver to store the texture compressed.
    pub const COMPRESSED: Self = Self { bits: 1 << 7 };
    /// Explicit linear magnification filter.
    pub const LINEAR_MAG_FILTER: Self = Self { bits: 1 << 8 };
    /// Explicit linear minification filter.
    pub const LINEAR_MIN_FILTER: Self = Self { bits: 1 << 9 };
    /// Explicit linear blending between mipmap levels.
    pub const LINEAR_MIPMAP_FILTER: Self = Self { bits: 1 << 10 };
    /// Select filters from the quality value (the default behavior).
    pub const USE_QUALITY_VALUE: Self = Self { bits: 1 << 11 };

    /// Creates a flag set from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two flag sets.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks whether all flags in `other` are set.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks whether no flags are set.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Whether any explicit filter flag is set, bypassing quality-based
    /// selection.
    pub const fn has_explicit_filter(&self) -> bool {
        (self.bits
            & (Self::LINEAR_MAG_FILTER.bits
                | Self::LINEAR_MIN_FILTER.bits
                | Self::LINEAR_MIPMAP_FILTER.bits))
            != 0
    }
}

impl std::ops::BitOr for TextureFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for TextureFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_composition() {
        let f = TextureFlags::NO_MIPMAP | TextureFlags::SCALE_DOWN;
        assert!(f.contains(TextureFlags::NO_MIPMAP));
        assert!(f.contains(TextureFlags::SCALE_DOWN));
        assert!(!f.contains(TextureFlags::RECTANGLE));
    }

    #[test]
    fn test_explicit_filter_detection() {
        assert!(!TextureFlags::USE_QUALITY_VALUE.has_explicit_filter());
        assert!(TextureFlags::LINEAR_MIN_FILTER.has_explicit_filter());
        let combo = TextureFlags::LINEAR_MAG_FILTER | TextureFlags::NO_MIPMAP;
        assert!(combo.has_explicit_filter());
    }

    #[test]
    fn test_filter_mipmap_need() {
        assert!(!TextureFilter::Linear.needs_mipmaps());
        assert!(TextureFilter::LinearMipmapLinear.needs_mipmaps());
    }
}
