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

//! Translations between the core texture enums and GL constants.

use arbor_core::renderer::{MagFilter, MinFilter};
use arbor_core::texture::{Components, WrapMode};

/// Legacy clamp; absent from the core-profile registry, still what the
/// classic wrap semantics ask for.
pub(super) const GL_CLAMP: u32 = 0x2900;
/// Generic compressed internal formats (ARB_texture_compression).
pub(super) const COMPRESSED_LUMINANCE: u32 = 0x84EA;
pub(super) const COMPRESSED_LUMINANCE_ALPHA: u32 = 0x84EB;
pub(super) const COMPRESSED_RGB: u32 = 0x84ED;
pub(super) const COMPRESSED_RGBA: u32 = 0x84EE;

/// Maps a component layout to (internal format, upload format).
pub(super) fn texture_formats(components: Components, compressed: bool) -> (i32, u32) {
    let format = match components {
        Components::Luminance => glow::LUMINANCE,
        Components::LuminanceAlpha => glow::LUMINANCE_ALPHA,
        Components::Rgb => glow::RGB,
        Components::Rgba => glow::RGBA,
    };
    let internal = if compressed {
        match components {
            Components::Luminance => COMPRESSED_LUMINANCE,
            Components::LuminanceAlpha => COMPRESSED_LUMINANCE_ALPHA,
            Components::Rgb => COMPRESSED_RGB,
            Components::Rgba => COMPRESSED_RGBA,
        }
    } else {
        format
    };
    (internal as i32, format)
}

pub(super) fn wrap_mode(mode: WrapMode) -> u32 {
    match mode {
        WrapMode::Repeat => glow::REPEAT,
        WrapMode::Clamp => GL_CLAMP,
        WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE,
        WrapMode::ClampToBorder => glow::CLAMP_TO_BORDER,
    }
}

pub(super) fn mag_filter(filter: MagFilter) -> u32 {
    match filter {
        MagFilter::Nearest => glow::NEAREST,
        MagFilter::Linear => glow::LINEAR,
    }
}

pub(super) fn min_filter(filter: MinFilter) -> u32 {
    match filter {
        MinFilter::Nearest => glow::NEAREST,
        MinFilter::Linear => glow::LINEAR,
        MinFilter::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
        MinFilter::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
        MinFilter::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
        MinFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_translation() {
        assert_eq!(
            texture_formats(Components::Rgba, false),
            (glow::RGBA as i32, glow::RGBA)
        );
        let (internal, format) = texture_formats(Components::Rgb, true);
        assert_eq!(internal, COMPRESSED_RGB as i32);
        assert_eq!(format, glow::RGB);
    }

    #[test]
    fn test_wrap_translation() {
        assert_eq!(wrap_mode(WrapMode::Repeat), glow::REPEAT);
        assert_eq!(wrap_mode(WrapMode::Clamp), GL_CLAMP);
        assert_eq!(wrap_mode(WrapMode::ClampToEdge), glow::CLAMP_TO_EDGE);
    }
}
