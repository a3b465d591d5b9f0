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

//! [`TextureBackend`] over a live OpenGL context via glow.
//!
//! Every method issues raw GL calls and therefore requires the context
//! to be current on the calling thread; that is the context provider's
//! contract. One backend serves one cache-context group.

use super::conversions;
use arbor_core::renderer::{
    CacheContextId, GlCapabilities, MagFilter, MinFilter, TextureBackend, TextureError,
    TextureHandle, TextureSpec,
};
use arbor_core::texture::resize;
use arbor_core::texture::WrapMode;
use glow::{HasContext, PixelUnpackData};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

// Constants outside glow's core-profile registry.
const PROXY_TEXTURE_2D: u32 = 0x8064;
const PROXY_TEXTURE_3D: u32 = 0x8070;
const PROXY_TEXTURE_RECTANGLE: u32 = 0x84F7;
const TEXTURE_MAX_ANISOTROPY_EXT: u32 = 0x84FE;
const MAX_TEXTURE_MAX_ANISOTROPY_EXT: u32 = 0x84FF;

struct Record {
    texture: glow::Texture,
    target: u32,
}

/// The glow-backed texture backend for one cache-context group.
pub struct GlowTextureBackend {
    gl: Arc<glow::Context>,
    context: CacheContextId,
    caps: GlCapabilities,
    supports_proxy: bool,
    textures: Mutex<HashMap<u64, Record>>,
    next_handle: AtomicU64,
}

impl std::fmt::Debug for GlowTextureBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlowTextureBackend")
            .field("context", &self.context)
            .field("caps", &self.caps)
            .finish_non_exhaustive()
    }
}

impl GlowTextureBackend {
    /// Creates a backend for the given context group, querying driver
    /// capabilities once.
    ///
    /// # Safety
    ///
    /// The GL context behind `gl` must be current on this thread, here
    /// and for every later call into the backend.
    pub unsafe fn new(gl: Arc<glow::Context>, context: CacheContextId) -> Self {
        let version = gl.version();
        let extensions = gl.supported_extensions();
        let has_ext = |name: &str| extensions.contains(name);

        let max_anisotropy = if has_ext("GL_EXT_texture_filter_anisotropic") {
            gl.get_parameter_f32(MAX_TEXTURE_MAX_ANISOTROPY_EXT).max(1.0)
        } else {
            1.0
        };

        let caps = GlCapabilities {
            max_texture_size: gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE).max(1) as u32,
            max_3d_texture_size: gl.get_parameter_i32(glow::MAX_3D_TEXTURE_SIZE).max(1) as u32,
            non_power_of_two: version.major >= 2
                || has_ext("GL_ARB_texture_non_power_of_two"),
            rectangle_textures: (version.major >= 3 && !version.is_embedded)
                || has_ext("GL_ARB_texture_rectangle")
                || has_ext("GL_EXT_texture_rectangle"),
            hardware_mipmap: version.major >= 3
                || has_ext("GL_ARB_framebuffer_object")
                || has_ext("GL_SGIS_generate_mipmap"),
            max_anisotropy,
            compressed_textures: version.major >= 2 || has_ext("GL_ARB_texture_compression"),
            sub_image_updates: true,
        };
        // Proxy targets never made it into the embedded profiles.
        let supports_proxy = !version.is_embedded;

        Self {
            gl,
            context,
            caps,
            supports_proxy,
            textures: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    fn target_for(spec: &TextureSpec) -> u32 {
        if spec.rectangle {
            glow::TEXTURE_RECTANGLE
        } else if spec.depth > 1 {
            glow::TEXTURE_3D
        } else {
            glow::TEXTURE_2D
        }
    }

    fn record(&self, handle: TextureHandle) -> Option<(glow::Texture, u32)> {
        self.textures
            .lock()
            .unwrap()
            .get(&handle.0)
            .map(|r| (r.texture, r.target))
    }

    /// Size-arithmetic stand-in for drivers without proxy targets.
    fn arithmetic_check(&self, spec: &TextureSpec) -> bool {
        let max = if spec.depth > 1 {
            self.caps.max_3d_texture_size as usize
        } else {
            self.caps.max_texture_size as usize
        };
        spec.width <= max && spec.height <= max && spec.depth <= max
    }
}

impl TextureBackend for GlowTextureBackend {
    fn cache_context(&self) -> CacheContextId {
        self.context
    }

    fn capabilities(&self) -> GlCapabilities {
        self.caps
    }

    fn proxy_check(&self, spec: &TextureSpec, _mipmapped: bool) -> bool {
        if !self.supports_proxy {
            return self.arithmetic_check(spec);
        }
        let (internal, format) = conversions::texture_formats(spec.components, spec.compressed);
        let proxy_target = if spec.rectangle {
            PROXY_TEXTURE_RECTANGLE
        } else if spec.depth > 1 {
            PROXY_TEXTURE_3D
        } else {
            PROXY_TEXTURE_2D
        };
        // SAFETY: context current per the type's contract; proxy uploads
        // carry no data and allocate nothing.
        unsafe {
            while self.gl.get_error() != glow::NO_ERROR {}
            if spec.depth > 1 {
                self.gl.tex_image_3d(
                    proxy_target,
                    0,
                    internal,
                    spec.width as i32,
                    spec.height as i32,
                    spec.depth as i32,
                    spec.border as i32,
                    format,
                    glow::UNSIGNED_BYTE,
                    PixelUnpackData::Slice(None),
                );
            } else {
                self.gl.tex_image_2d(
                    proxy_target,
                    0,
                    internal,
                    spec.width as i32,
                    spec.height as i32,
                    spec.border as i32,
                    format,
                    glow::UNSIGNED_BYTE,
                    PixelUnpackData::Slice(None),
                );
            }
            if self.gl.get_error() != glow::NO_ERROR {
                return false;
            }
            self.gl
                .get_tex_level_parameter_i32(proxy_target, 0, glow::TEXTURE_WIDTH)
                != 0
        }
    }

    fn create_texture(
        &self,
        spec: &TextureSpec,
        levels: &[&[u8]],
    ) -> Result<TextureHandle, TextureError> {
        if levels.is_empty() {
            return Err(TextureError::NoPixelData);
        }
        let target = Self::target_for(spec);
        let (internal, format) = conversions::texture_formats(spec.components, spec.compressed);

        // SAFETY: context current per the type's contract; level buffers
        // match the dimensions passed alongside them.
        unsafe {
            let texture = self
                .gl
                .create_texture()
                .map_err(TextureError::BackendFailure)?;
            self.gl.bind_texture(target, Some(texture));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);

            let (mut w, mut h, mut d) = (spec.width, spec.height, spec.depth);
            for (level, pixels) in levels.iter().enumerate() {
                if spec.depth > 1 {
                    self.gl.tex_image_3d(
                        target,
                        level as i32,
                        internal,
                        w as i32,
                        h as i32,
                        d as i32,
                        spec.border as i32,
                        format,
                        glow::UNSIGNED_BYTE,
                        PixelUnpackData::Slice(Some(pixels)),
                    );
                } else {
                    self.gl.tex_image_2d(
                        target,
                        level as i32,
                        internal,
                        w as i32,
                        h as i32,
                        spec.border as i32,
                        format,
                        glow::UNSIGNED_BYTE,
                        PixelUnpackData::Slice(Some(pixels)),
                    );
                }
                (w, h, d) = resize::halved_dims(w, h, d);
            }
            if levels.len() > 1 {
                self.gl.tex_parameter_i32(
                    target,
                    glow::TEXTURE_MAX_LEVEL,
                    (levels.len() - 1) as i32,
                );
            }
            self.gl.bind_texture(target, None);

            let error = self.gl.get_error();
            if error != glow::NO_ERROR {
                self.gl.delete_texture(texture);
                return Err(TextureError::BackendFailure(format!(
                    "texture upload failed with GL error {error:#x}"
                )));
            }

            let handle = TextureHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
            self.textures
                .lock()
                .unwrap()
                .insert(handle.0, Record { texture, target });
            Ok(handle)
        }
    }

    fn update_subimage(
        &self,
        handle: TextureHandle,
        level: u32,
        offset: [usize; 3],
        size: [usize; 3],
        pixels: &[u8],
    ) -> Result<(), TextureError> {
        let (texture, target) = self
            .record(handle)
            .ok_or_else(|| TextureError::BackendFailure("unknown texture handle".into()))?;
        // Sub-image uploads re-derive the format from the pixel count;
        // the resource only takes this path for component-compatible
        // content.
        let texel_count = size[0] * size[1] * size[2];
        let components = (texel_count > 0)
            .then(|| arbor_core::texture::Components::from_count(pixels.len() / texel_count))
            .flatten()
            .ok_or_else(|| {
                TextureError::BackendFailure("sub-image byte count mismatch".into())
            })?;
        let format = conversions::texture_formats(components, false).1;
        // SAFETY: context current per the type's contract.
        unsafe {
            while self.gl.get_error() != glow::NO_ERROR {}
            self.gl.bind_texture(target, Some(texture));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            if target == glow::TEXTURE_3D {
                self.gl.tex_sub_image_3d(
                    target,
                    level as i32,
                    offset[0] as i32,
                    offset[1] as i32,
                    offset[2] as i32,
                    size[0] as i32,
                    size[1] as i32,
                    size[2] as i32,
                    format,
                    glow::UNSIGNED_BYTE,
                    PixelUnpackData::Slice(Some(pixels)),
                );
            } else {
                self.gl.tex_sub_image_2d(
                    target,
                    level as i32,
                    offset[0] as i32,
                    offset[1] as i32,
                    size[0] as i32,
                    size[1] as i32,
                    format,
                    glow::UNSIGNED_BYTE,
                    PixelUnpackData::Slice(Some(pixels)),
                );
            }
            self.gl.bind_texture(target, None);
            let error = self.gl.get_error();
            if error != glow::NO_ERROR {
                return Err(TextureError::BackendFailure(format!(
                    "sub-image update failed with GL error {error:#x}"
                )));
            }
        }
        Ok(())
    }

    fn generate_mipmaps(&self, handle: TextureHandle) -> bool {
        if !self.caps.hardware_mipmap {
            return false;
        }
        let Some((texture, target)) = self.record(handle) else {
            return false;
        };
        if target == glow::TEXTURE_RECTANGLE {
            return false;
        }
        // SAFETY: context current per the type's contract.
        unsafe {
            self.gl.bind_texture(target, Some(texture));
            self.gl.generate_mipmap(target);
            self.gl.bind_texture(target, None);
        }
        true
    }

    fn set_filters(&self, handle: TextureHandle, mag: MagFilter, min: MinFilter) {
        let Some((texture, target)) = self.record(handle) else {
            return;
        };
        // SAFETY: context current per the type's contract.
        unsafe {
            self.gl.bind_texture(target, Some(texture));
            self.gl.tex_parameter_i32(
                target,
                glow::TEXTURE_MAG_FILTER,
                conversions::mag_filter(mag) as i32,
            );
            self.gl.tex_parameter_i32(
                target,
                glow::TEXTURE_MIN_FILTER,
                conversions::min_filter(min) as i32,
            );
            self.gl.bind_texture(target, None);
        }
    }

    fn set_wrap(&self, handle: TextureHandle, s: WrapMode, t: WrapMode, r: WrapMode) {
        let Some((texture, target)) = self.record(handle) else {
            return;
        };
        // SAFETY: context current per the type's contract.
        unsafe {
            self.gl.bind_texture(target, Some(texture));
            self.gl.tex_parameter_i32(
                target,
                glow::TEXTURE_WRAP_S,
                conversions::wrap_mode(s) as i32,
            );
            self.gl.tex_parameter_i32(
                target,
                glow::TEXTURE_WRAP_T,
                conversions::wrap_mode(t) as i32,
            );
            if target == glow::TEXTURE_3D {
                self.gl.tex_parameter_i32(
                    target,
                    glow::TEXTURE_WRAP_R,
                    conversions::wrap_mode(r) as i32,
                );
            }
            self.gl.bind_texture(target, None);
        }
    }

    fn set_anisotropy(&self, handle: TextureHandle, ratio: f32) {
        if self.caps.max_anisotropy <= 1.0 {
            return;
        }
        let Some((texture, target)) = self.record(handle) else {
            return;
        };
        // SAFETY: context current per the type's contract.
        unsafe {
            self.gl.bind_texture(target, Some(texture));
            self.gl.tex_parameter_f32(
                target,
                TEXTURE_MAX_ANISOTROPY_EXT,
                ratio.clamp(1.0, self.caps.max_anisotropy),
            );
            self.gl.bind_texture(target, None);
        }
    }

    fn delete_texture(&self, handle: TextureHandle) {
        let record = self.textures.lock().unwrap().remove(&handle.0);
        if let Some(record) = record {
            // SAFETY: context current per the type's contract.
            unsafe {
                self.gl.delete_texture(record.texture);
            }
        } else {
            log::debug!("delete_texture on unknown handle {handle:?}");
        }
    }
}
