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

//! The seam between texture resource lifecycle logic and the GL driver.
//!
//! A [`TextureBackend`] is provided by whoever owns the GL context (the
//! `arbor-infra` glow backend in production, mocks in tests). All of its
//! methods require that context to be current on the calling thread;
//! that guarantee is the context provider's contract, not this crate's.

use crate::renderer::error::TextureError;
use crate::texture::image::Components;
use crate::texture::types::WrapMode;
use std::fmt::Debug;

/// Identifies a group of GL contexts sharing one resource namespace.
///
/// Contexts that share GL object namespaces must present the same id, so
/// one native texture object serves all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheContextId(pub u32);

/// An opaque handle to a native texture object, valid only within the
/// context group it was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// A snapshot of the driver capabilities relevant to texture creation.
///
/// Queried once per context group and treated as immutable afterwards.
#[derive(Debug, Clone, Copy)]
pub struct GlCapabilities {
    /// Largest supported width/height of a 2D texture, in pixels.
    pub max_texture_size: u32,
    /// Largest supported axis of a 3D texture, in pixels.
    pub max_3d_texture_size: u32,
    /// Whether non-power-of-two texture dimensions are supported.
    pub non_power_of_two: bool,
    /// Whether rectangle (non-normalized coordinate) textures are
    /// supported.
    pub rectangle_textures: bool,
    /// Whether the driver can generate mipmap chains itself.
    pub hardware_mipmap: bool,
    /// Maximum anisotropic filtering ratio; `1.0` means unsupported.
    pub max_anisotropy: f32,
    /// Whether compressed internal formats are supported.
    pub compressed_textures: bool,
    /// Whether partial (sub-image) updates of live textures work
    /// reliably on this driver.
    pub sub_image_updates: bool,
}

impl Default for GlCapabilities {
    /// Conservative baseline capabilities (small pow2-only target).
    fn default() -> Self {
        Self {
            max_texture_size: 2048,
            max_3d_texture_size: 256,
            non_power_of_two: false,
            rectangle_textures: false,
            hardware_mipmap: false,
            max_anisotropy: 1.0,
            compressed_textures: false,
            sub_image_updates: true,
        }
    }
}

/// The shape and storage parameters of a texture object to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSpec {
    /// Width in pixels, including any border.
    pub width: usize,
    /// Height in pixels, including any border.
    pub height: usize,
    /// Depth in pixels (1 for 2D textures).
    pub depth: usize,
    /// Per-pixel component layout of the upload data.
    pub components: Components,
    /// Border width in pixels (0 or 1).
    pub border: usize,
    /// Whether to request a compressed internal format.
    pub compressed: bool,
    /// Whether to create a rectangle texture instead of a normalized one.
    pub rectangle: bool,
}

/// Magnification filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagFilter {
    /// Point sampling.
    Nearest,
    /// Bilinear interpolation.
    Linear,
}

/// Minification filters, including the mipmapped variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinFilter {
    /// Point sampling.
    Nearest,
    /// Bilinear interpolation.
    Linear,
    /// Point sampling within the nearest mipmap level.
    NearestMipmapNearest,
    /// Point sampling blended across the two nearest levels.
    NearestMipmapLinear,
    /// Bilinear sampling within the nearest mipmap level.
    LinearMipmapNearest,
    /// Full trilinear sampling.
    LinearMipmapLinear,
}

impl MinFilter {
    /// Whether this filter samples from mipmap levels.
    #[inline]
    pub const fn needs_mipmaps(self) -> bool {
        !matches!(self, MinFilter::Nearest | MinFilter::Linear)
    }
}

/// Driver-facing texture operations required by the resource manager.
///
/// Implementations issue GL calls and therefore require a current
/// context; they must be cheap to query repeatedly (capabilities are
/// expected to be cached on the implementation side).
pub trait TextureBackend: Debug {
    /// The context group this backend's GL context belongs to. Handles
    /// created through this backend are only valid within that group.
    fn cache_context(&self) -> CacheContextId;

    /// Returns the capability snapshot for the current context group.
    fn capabilities(&self) -> GlCapabilities;

    /// Asks the driver whether it would accept this texture shape
    /// (proxy-texture style query). Must not allocate storage.
    fn proxy_check(&self, spec: &TextureSpec, mipmapped: bool) -> bool;

    /// Creates a texture object and uploads the given mipmap levels
    /// (level 0 first). With a single level and `mipmapped` requested,
    /// the implementation may generate the chain in hardware.
    fn create_texture(
        &self,
        spec: &TextureSpec,
        levels: &[&[u8]],
    ) -> Result<TextureHandle, TextureError>;

    /// Replaces a sub-region of level `level`. Offsets and sizes are in
    /// pixels of that level.
    fn update_subimage(
        &self,
        handle: TextureHandle,
        level: u32,
        offset: [usize; 3],
        size: [usize; 3],
        pixels: &[u8],
    ) -> Result<(), TextureError>;

    /// Regenerates the mipmap chain from level 0 in hardware. Returns
    /// `false` when the driver cannot; the caller must then upload CPU
    /// levels instead.
    fn generate_mipmaps(&self, handle: TextureHandle) -> bool;

    /// Sets the magnification/minification filters.
    fn set_filters(&self, handle: TextureHandle, mag: MagFilter, min: MinFilter);

    /// Sets the per-axis wrap modes.
    fn set_wrap(&self, handle: TextureHandle, s: WrapMode, t: WrapMode, r: WrapMode);

    /// Sets the anisotropic filtering ratio, when supported.
    fn set_anisotropy(&self, handle: TextureHandle, ratio: f32);

    /// Releases the texture object.
    fn delete_texture(&self, handle: TextureHandle);
}
