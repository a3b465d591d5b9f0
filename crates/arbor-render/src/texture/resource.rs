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

//! The texture resource object: one logical image bound to zero or more
//! GL context groups.
//!
//! A resource owns its CPU pixel data and, per context group it has been
//! rendered into, one native texture object with an age counter. Native
//! objects are created lazily on first use in a context and released
//! either explicitly, when their context dies, or by the eviction
//! registry once they go unused long enough.
//!
//! Alternatively a resource can wrap an externally managed GL object, in
//! which case it owns no pixel data and never creates or deletes native
//! objects itself.

use crate::scratch;
use crate::services::RenderServices;
use crate::texture::registry::RegistryInner;
use arbor_core::renderer::{
    CacheContextId, MagFilter, MinFilter, TextureBackend, TextureError, TextureHandle, TextureSpec,
};
use arbor_core::texture::resize;
use arbor_core::texture::{Components, PixelImage, TextureFlags, TransparencyState, WrapMode};
use arbor_core::RenderConfig;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// A caller-supplied resize hook, consulted before any native resize
/// path. Returning `None` passes the job on to the next candidate; a
/// returned image must have exactly the requested dimensions.
pub type ResizeCallback =
    Box<dyn Fn(&PixelImage, (usize, usize, usize)) -> Option<PixelImage> + Send>;

static NEXT_UNIQUE_ID: AtomicU32 = AtomicU32::new(1);

/// One native texture object in one context group.
#[derive(Debug)]
pub(crate) struct ContextEntry {
    pub(crate) context: CacheContextId,
    pub(crate) handle: TextureHandle,
    pub(crate) age: u32,
    pub(crate) tagged: bool,
    pub(crate) mipmapped: bool,
    spec: TextureSpec,
    wrap: [WrapMode; 3],
}

pub(crate) struct State {
    image: Option<PixelImage>,
    external: Option<(CacheContextId, TextureHandle)>,
    wrap: [WrapMode; 3],
    border: usize,
    quality: f32,
    flags: TextureFlags,
    unique_id: u32,
    transparency: TransparencyState,
    pub(crate) entries: Vec<ContextEntry>,
    resize_cb: Option<ResizeCallback>,
    registry: Option<Weak<RegistryInner>>,
    size_error_logged: bool,
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("unique_id", &self.unique_id)
            .field("has_image", &self.image.is_some())
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

pub(crate) struct Shared {
    pub(crate) state: Mutex<State>,
}

impl Drop for Shared {
    /// A resource dropped with live native objects parks them on the
    /// registry's deferred-release list; an untracked resource can only
    /// log the leak.
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap();
        if state.entries.is_empty() {
            return;
        }
        let registry = state.registry.as_ref().and_then(Weak::upgrade);
        for entry in state.entries.drain(..) {
            match &registry {
                Some(reg) => reg.defer_release(entry.context, entry.handle),
                None => log::debug!(
                    "Texture resource dropped with live handle {:?} in context {:?}",
                    entry.handle,
                    entry.context
                ),
            }
        }
    }
}

/// A logical image usable as a GPU texture, with per-context native
/// objects managed behind the scenes.
#[derive(Clone)]
pub struct TextureResource {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for TextureResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock().unwrap();
        write!(f, "TextureResource({:?})", *state)
    }
}

impl Default for TextureResource {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureResource {
    /// Creates an empty resource. Wrap modes default to repeat, quality
    /// to 0.5, and filtering to quality-driven selection.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    image: None,
                    external: None,
                    wrap: [WrapMode::Repeat; 3],
                    border: 0,
                    quality: 0.5,
                    flags: TextureFlags::USE_QUALITY_VALUE,
                    unique_id: 0,
                    transparency: TransparencyState::default(),
                    entries: Vec::new(),
                    resize_cb: None,
                    registry: None,
                    size_error_logged: false,
                }),
            }),
        }
    }

    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    pub(crate) fn attach_registry(&self, registry: &Arc<RegistryInner>) {
        self.shared.state.lock().unwrap().registry = Some(Arc::downgrade(registry));
    }

    /// Replaces the logical image.
    ///
    /// Every call assigns a fresh unique id (the id tracks the call,
    /// not content equality) and re-runs the transparency scan. Passing
    /// `None` resets the resource to the empty state and releases all
    /// per-context objects, even ones tagged in use this frame.
    ///
    /// When `immediate` is supplied and the new data is size-, format-
    /// and wrap-compatible with the native object already existing for
    /// that context, the object is updated in place with a sub-image
    /// write instead of being recreated. This path is purely a
    /// performance optimization, is gated off by default, and silently
    /// falls back to recreation.
    pub fn set_data(
        &self,
        image: Option<PixelImage>,
        wrap: [WrapMode; 3],
        quality: f32,
        border: usize,
        immediate: Option<&RenderServices<'_>>,
    ) {
        let mut state = self.shared.state.lock().unwrap();
        state.unique_id = NEXT_UNIQUE_ID.fetch_add(1, Ordering::Relaxed);
        state.external = None;

        let image = match image {
            Some(img) => img,
            None => {
                state.image = None;
                state.transparency = TransparencyState::default();
                state.size_error_logged = false;
                let entries = std::mem::take(&mut state.entries);
                Self::dispose_entries(&state, entries, immediate.map(|s| s.backend));
                return;
            }
        };

        let mut kept = Vec::new();
        if let Some(services) = immediate {
            if services.config.use_tex_sub_image
                && services.backend.capabilities().sub_image_updates
            {
                kept = Self::try_subimage_update(&mut state, &image, wrap, border, services);
            }
        }

        let stale = std::mem::take(&mut state.entries);
        Self::dispose_entries(&state, stale, immediate.map(|s| s.backend));
        state.entries = kept;

        state.transparency = TransparencyState::scan(&image);
        state.image = Some(image);
        state.wrap = wrap;
        state.quality = quality.clamp(0.0, 1.0);
        state.border = border;
        state.size_error_logged = false;
    }

    /// Attaches an externally managed GL object for one context group.
    ///
    /// The resource gives up its pixel data and never deletes the
    /// handle: lifetime stays with the caller.
    pub fn set_gl_object(&self, handle: TextureHandle, context: CacheContextId) {
        let mut state = self.shared.state.lock().unwrap();
        state.unique_id = NEXT_UNIQUE_ID.fetch_add(1, Ordering::Relaxed);
        state.image = None;
        state.transparency = TransparencyState::default();
        let entries = std::mem::take(&mut state.entries);
        Self::dispose_entries(&state, entries, None);
        state.external = Some((context, handle));
    }

    /// Installs a custom resize hook, consulted first in the resize
    /// preference chain.
    pub fn set_resize_callback(&self, cb: Option<ResizeCallback>) {
        self.shared.state.lock().unwrap().resize_cb = cb;
    }

    /// Replaces the behavior flags.
    pub fn set_flags(&self, flags: TextureFlags) {
        self.shared.state.lock().unwrap().flags = flags;
    }

    /// The current behavior flags.
    pub fn flags(&self) -> TextureFlags {
        self.shared.state.lock().unwrap().flags
    }

    /// Updates the quality scalar. Raising it past the mipmap threshold
    /// upgrades existing non-mipmapped native objects on next use.
    pub fn set_quality(&self, quality: f32) {
        self.shared.state.lock().unwrap().quality = quality.clamp(0.0, 1.0);
    }

    /// The unique id of the current content. Changes on every
    /// [`set_data`]/[`set_gl_object`] call and is stable across
    /// per-context object churn. Zero means "never set".
    ///
    /// [`set_data`]: TextureResource::set_data
    /// [`set_gl_object`]: TextureResource::set_gl_object
    pub fn unique_id(&self) -> u32 {
        self.shared.state.lock().unwrap().unique_id
    }

    /// Whether the resource currently holds pixel data.
    pub fn has_data(&self) -> bool {
        self.shared.state.lock().unwrap().image.is_some()
    }

    /// The transparency classification of the current content, with the
    /// force-override flags applied on top of the cached alpha scan.
    pub fn transparency(&self) -> TransparencyState {
        let state = self.shared.state.lock().unwrap();
        let mut t = state.transparency;
        if state.flags.contains(TextureFlags::FORCE_TRANSPARENCY_TRUE) {
            t.has_transparency = true;
        }
        if state.flags.contains(TextureFlags::FORCE_TRANSPARENCY_FALSE) {
            t.has_transparency = false;
        }
        if state.flags.contains(TextureFlags::FORCE_ALPHA_TEST_TRUE) {
            t.use_alpha_test = true;
        }
        if state.flags.contains(TextureFlags::FORCE_ALPHA_TEST_FALSE) {
            t.use_alpha_test = false;
        }
        t
    }

    /// Marks the resource as used this frame in the given context,
    /// protecting its native object from the next eviction sweep.
    pub fn tag_used(&self, context: CacheContextId) {
        let mut state = self.shared.state.lock().unwrap();
        for entry in state.entries.iter_mut().filter(|e| e.context == context) {
            entry.age = 0;
            entry.tagged = true;
        }
    }

    /// Drops all bookkeeping for a destroyed context group. The native
    /// objects died with the context, so no GL calls are made.
    pub fn context_destroyed(&self, context: CacheContextId) {
        let mut state = self.shared.state.lock().unwrap();
        state.entries.retain(|e| e.context != context);
        if state.external.is_some_and(|(c, _)| c == context) {
            state.external = None;
        }
    }

    /// Releases all per-context native objects.
    ///
    /// Objects in the backend's context group are deleted immediately;
    /// the rest are parked on the registry's deferred-release list (or
    /// dropped with a debug log when the resource is untracked).
    pub fn release(&self, backend: Option<&dyn TextureBackend>) {
        let mut state = self.shared.state.lock().unwrap();
        let entries = std::mem::take(&mut state.entries);
        Self::dispose_entries(&state, entries, backend);
        state.external = None;
    }

    /// Returns the native texture object for the backend's context
    /// group, creating it if needed.
    ///
    /// Re-creates the object when the quality has risen enough to
    /// require mipmaps the existing object was built without. Returns
    /// `None` for empty resources and for images no legal size could be
    /// found for (logged once per content).
    pub fn gl_object(&self, services: &RenderServices<'_>) -> Option<TextureHandle> {
        let context = services.backend.cache_context();
        let mut state = self.shared.state.lock().unwrap();

        if let Some((ext_context, handle)) = state.external {
            return (ext_context == context).then_some(handle);
        }

        let needs_mipmaps = needs_mipmaps(state.quality, state.flags, services.config);
        if let Some(idx) = state.entries.iter().position(|e| e.context == context) {
            if state.entries[idx].mipmapped || !needs_mipmaps {
                let entry = &mut state.entries[idx];
                entry.age = 0;
                entry.tagged = true;
                return Some(entry.handle);
            }
            // Mipmap upgrade: rebuild from scratch.
            let entry = state.entries.remove(idx);
            services.backend.delete_texture(entry.handle);
        }

        match Self::create_entry(&mut state, services, needs_mipmaps) {
            Ok(handle) => Some(handle),
            Err(TextureError::NoPixelData) => None,
            Err(err) => {
                if !state.size_error_logged {
                    log::error!("Failed to create texture object: {err}");
                    state.size_error_logged = true;
                }
                None
            }
        }
    }

    /// Computes the driver-legal dimensions the current image would be
    /// resized to for this backend, without creating anything.
    ///
    /// Deterministic for a given backend and configuration: legalizing
    /// an already-legal size returns it unchanged.
    pub fn legalized_size(&self, services: &RenderServices<'_>) -> Option<(usize, usize, usize)> {
        let state = self.shared.state.lock().unwrap();
        let image = state.image.as_ref()?;
        let needs_mipmaps = needs_mipmaps(state.quality, state.flags, services.config);
        legalize_size(
            (image.width(), image.height(), image.depth()),
            image.components(),
            state.border,
            state.quality,
            state.flags,
            needs_mipmaps,
            services.backend,
            services.config.tex_scaleup_limit,
        )
    }

    // Internal helpers ---------------------------------------------------

    fn dispose_entries(
        state: &State,
        entries: Vec<ContextEntry>,
        backend: Option<&dyn TextureBackend>,
    ) {
        if entries.is_empty() {
            return;
        }
        let registry = state.registry.as_ref().and_then(Weak::upgrade);
        for entry in entries {
            match backend {
                Some(b) if b.cache_context() == entry.context => b.delete_texture(entry.handle),
                _ => match &registry {
                    Some(reg) => reg.defer_release(entry.context, entry.handle),
                    None => log::debug!(
                        "Dropping handle {:?} for context {:?} without a GL release path",
                        entry.handle,
                        entry.context
                    ),
                },
            }
        }
    }

    /// Attempts the in-place sub-image replace for the immediate
    /// context. Returns the entries to keep (at most one).
    fn try_subimage_update(
        state: &mut State,
        image: &PixelImage,
        wrap: [WrapMode; 3],
        border: usize,
        services: &RenderServices<'_>,
    ) -> Vec<ContextEntry> {
        let context = services.backend.cache_context();
        let Some(idx) = state.entries.iter().position(|e| e.context == context) else {
            return Vec::new();
        };
        let entry = &state.entries[idx];
        let compatible = entry.spec.width == image.width()
            && entry.spec.height == image.height()
            && entry.spec.depth == image.depth()
            && entry.spec.components == image.components()
            && entry.spec.border == border
            && entry.wrap == wrap
            && border == state.border;
        if !compatible {
            return Vec::new();
        }

        let size = [image.width(), image.height(), image.depth()];
        if services
            .backend
            .update_subimage(entry.handle, 0, [0, 0, 0], size, image.bytes())
            .is_err()
        {
            return Vec::new();
        }
        if entry.mipmapped && !services.backend.generate_mipmaps(entry.handle) {
            // Level 0 changed but the chain cannot be refreshed in
            // hardware; recreating is the only correct option.
            return Vec::new();
        }
        let mut entry = state.entries.remove(idx);
        entry.age = 0;
        entry.tagged = true;
        vec![entry]
    }

    fn create_entry(
        state: &mut State,
        services: &RenderServices<'_>,
        needs_mipmaps: bool,
    ) -> Result<TextureHandle, TextureError> {
        let image = state.image.as_ref().ok_or(TextureError::NoPixelData)?;
        let caps = services.backend.capabilities();

        let (w, h, d) = legalize_size(
            (image.width(), image.height(), image.depth()),
            image.components(),
            state.border,
            state.quality,
            state.flags,
            needs_mipmaps,
            services.backend,
            services.config.tex_scaleup_limit,
        )
        .ok_or(TextureError::SizeNotSupported {
            width: image.width(),
            height: image.height(),
            depth: image.depth(),
        })?;

        let resized;
        let base: &PixelImage = if (w, h, d) == (image.width(), image.height(), image.depth()) {
            image
        } else {
            resized = resize_image(image, (w, h, d), state.resize_cb.as_ref(), services);
            &resized
        };

        let spec = TextureSpec {
            width: w,
            height: h,
            depth: d,
            components: base.components(),
            border: state.border,
            compressed: state.flags.contains(TextureFlags::COMPRESSED)
                && caps.compressed_textures,
            rectangle: state.flags.contains(TextureFlags::RECTANGLE),
        };

        let hw_mipmaps =
            needs_mipmaps && caps.hardware_mipmap && services.config.use_hw_mipmaps;
        let cpu_levels = if needs_mipmaps && !hw_mipmaps {
            build_mipmap_levels(base)
        } else {
            Vec::new()
        };

        let mut levels: Vec<&[u8]> = Vec::with_capacity(1 + cpu_levels.len());
        levels.push(base.bytes());
        levels.extend(cpu_levels.iter().map(|l| l.as_slice()));

        let handle = services.backend.create_texture(&spec, &levels)?;
        if hw_mipmaps && !services.backend.generate_mipmaps(handle) {
            // Driver refused after advertising support; fall back to CPU
            // levels on a fresh object.
            services.backend.delete_texture(handle);
            let cpu_levels = build_mipmap_levels(base);
            let mut levels: Vec<&[u8]> = Vec::with_capacity(1 + cpu_levels.len());
            levels.push(base.bytes());
            levels.extend(cpu_levels.iter().map(|l| l.as_slice()));
            let retry = services.backend.create_texture(&spec, &levels)?;
            Self::finish_entry(state, services, retry, spec, needs_mipmaps);
            return Ok(retry);
        }

        Self::finish_entry(state, services, handle, spec, needs_mipmaps);
        Ok(handle)
    }

    fn finish_entry(
        state: &mut State,
        services: &RenderServices<'_>,
        handle: TextureHandle,
        spec: TextureSpec,
        mipmapped: bool,
    ) {
        let caps = services.backend.capabilities();
        let config = services.config;

        let (mag, min) = select_filters(state.quality, state.flags, mipmapped, config);
        services.backend.set_filters(handle, mag, min);

        let wrap = apply_conformant_clamp(state.wrap, config);
        services.backend.set_wrap(handle, wrap[0], wrap[1], wrap[2]);

        if caps.max_anisotropy > 1.0 && state.quality >= config.tex_anisotropic_limit {
            services.backend.set_anisotropy(handle, caps.max_anisotropy);
        }

        state.entries.push(ContextEntry {
            context: services.backend.cache_context(),
            handle,
            age: 0,
            tagged: true,
            mipmapped,
            spec,
            wrap: state.wrap,
        });
    }
}

/// Whether the current quality/flag combination calls for mipmapping.
fn needs_mipmaps(quality: f32, flags: TextureFlags, config: &RenderConfig) -> bool {
    if flags.contains(TextureFlags::NO_MIPMAP) {
        return false;
    }
    if flags.has_explicit_filter() {
        return flags.contains(TextureFlags::LINEAR_MIPMAP_FILTER);
    }
    quality >= config.tex_mipmap_limit
}

/// Selects filters from the quality scalar, unless explicit filter
/// flags override the mapping.
fn select_filters(
    quality: f32,
    flags: TextureFlags,
    mipmapped: bool,
    config: &RenderConfig,
) -> (MagFilter, MinFilter) {
    if flags.has_explicit_filter() {
        let mag = if flags.contains(TextureFlags::LINEAR_MAG_FILTER) {
            MagFilter::Linear
        } else {
            MagFilter::Nearest
        };
        let linear_min = flags.contains(TextureFlags::LINEAR_MIN_FILTER);
        let min = if !mipmapped {
            if linear_min {
                MinFilter::Linear
            } else {
                MinFilter::Nearest
            }
        } else if flags.contains(TextureFlags::LINEAR_MIPMAP_FILTER) {
            if linear_min {
                MinFilter::LinearMipmapLinear
            } else {
                MinFilter::NearestMipmapLinear
            }
        } else if linear_min {
            MinFilter::LinearMipmapNearest
        } else {
            MinFilter::NearestMipmapNearest
        };
        return (mag, min);
    }

    if quality < config.tex_linear_limit {
        (MagFilter::Nearest, MinFilter::Nearest)
    } else if quality < config.tex_mipmap_limit || !mipmapped {
        (MagFilter::Linear, MinFilter::Linear)
    } else if quality < config.tex_linear_mipmap_limit {
        (MagFilter::Linear, MinFilter::LinearMipmapNearest)
    } else {
        (MagFilter::Linear, MinFilter::LinearMipmapLinear)
    }
}

/// Maps legacy clamp to the conformant clamp-to-edge behavior when the
/// toggle asks for it.
fn apply_conformant_clamp(wrap: [WrapMode; 3], config: &RenderConfig) -> [WrapMode; 3] {
    if !config.conformant_clamp {
        return wrap;
    }
    wrap.map(|w| match w {
        WrapMode::Clamp => WrapMode::ClampToEdge,
        other => other,
    })
}

/// Rounds `n` up to the next power of two.
fn next_pow2(n: usize) -> usize {
    n.next_power_of_two()
}

/// Legalizes one axis to a power of two, choosing between rounding up
/// and down.
///
/// The default is to round up; the resource scales down instead when
/// explicitly flagged to, or when the quality is low and the image fills
/// less than the scale-up fraction of the upper power of two (going up
/// would mostly buy wasted memory).
fn legalize_axis(dim: usize, quality: f32, flags: TextureFlags, scaleup_limit: f32) -> usize {
    let up = next_pow2(dim);
    if up == dim {
        return dim;
    }
    let down = (up / 2).max(1);
    let scale_down = flags.contains(TextureFlags::SCALE_DOWN)
        || (quality < 0.5 && (dim as f32) <= (up as f32) * scaleup_limit);
    if scale_down {
        down
    } else {
        up
    }
}

/// Computes the driver-legal upload dimensions for an image.
///
/// Power-of-two rounding happens on the dimensions inside the border;
/// the border is re-added before the proxy query. The proxy loop halves
/// all axes until the driver accepts the shape; ending at 1x1x1 without
/// acceptance reports failure.
#[allow(clippy::too_many_arguments)]
fn legalize_size(
    dims: (usize, usize, usize),
    components: Components,
    border: usize,
    quality: f32,
    flags: TextureFlags,
    needs_mipmaps: bool,
    backend: &dyn TextureBackend,
    scaleup_limit: f32,
) -> Option<(usize, usize, usize)> {
    let caps = backend.capabilities();
    let (full_w, full_h, full_d) = dims;
    let inner = |full: usize| full.saturating_sub(2 * border).max(1);
    let (mut w, mut h, mut d) = (inner(full_w), inner(full_h), inner(full_d));

    let rectangle = flags.contains(TextureFlags::RECTANGLE) && caps.rectangle_textures;
    // Arbitrary sizes are fine when the driver handles them natively and
    // any mipmap chain can be produced in hardware.
    let npot_ok = rectangle || (caps.non_power_of_two && (!needs_mipmaps || caps.hardware_mipmap));

    if !npot_ok {
        w = legalize_axis(w, quality, flags, scaleup_limit);
        h = legalize_axis(h, quality, flags, scaleup_limit);
        if full_d > 1 {
            d = legalize_axis(d, quality, flags, scaleup_limit);
        }
    }

    let max = if full_d > 1 {
        caps.max_3d_texture_size as usize
    } else {
        caps.max_texture_size as usize
    };
    let clamp_axis = |mut dim: usize| {
        while dim > max {
            dim = (dim / 2).max(1);
        }
        dim
    };
    w = clamp_axis(w);
    h = clamp_axis(h);
    d = clamp_axis(d);

    loop {
        let spec = TextureSpec {
            width: w + 2 * border,
            height: h + 2 * border,
            depth: if full_d > 1 { d + 2 * border } else { d },
            components,
            border,
            compressed: false,
            rectangle,
        };
        if backend.proxy_check(&spec, needs_mipmaps) {
            return Some((spec.width, spec.height, spec.depth));
        }
        if w <= 1 && h <= 1 && d <= 1 {
            return None;
        }
        w = (w / 2).max(1);
        h = (h / 2).max(1);
        d = (d / 2).max(1);
    }
}

/// Runs the resize preference chain: custom callback, native
/// high-quality resize, native scale primitive, built-in nearest.
fn resize_image(
    image: &PixelImage,
    target: (usize, usize, usize),
    custom: Option<&ResizeCallback>,
    services: &RenderServices<'_>,
) -> PixelImage {
    let (w, h, d) = target;

    if let Some(cb) = custom {
        if let Some(out) = cb(image, target) {
            if (out.width(), out.height(), out.depth()) == target {
                return out;
            }
            log::warn!("Custom resize callback produced wrong dimensions; ignoring result");
        }
    }

    for ops in [services.image_ops, services.scale_ops] {
        if !ops.is_available() {
            continue;
        }
        let resized = if d > 1 {
            ops.resize_3d(image, w, h, d)
        } else {
            ops.resize_2d(image, w, h)
        };
        if let Some(out) = resized {
            debug_assert_eq!((out.width(), out.height(), out.depth()), target);
            return out;
        }
    }

    scratch::with_byte_buffer(|buf| {
        resize::resize_nearest_3d(
            image.bytes(),
            image.width(),
            image.height(),
            image.depth(),
            image.components().count(),
            w,
            h,
            d,
            buf,
        );
        PixelImage::new_3d(std::mem::take(buf), w, h, d, image.components())
            .expect("nearest resize preserves the buffer contract")
    })
}

/// Builds the CPU mipmap chain below level 0, halving until 1x1x1.
fn build_mipmap_levels(base: &PixelImage) -> Vec<Vec<u8>> {
    let mut levels = Vec::new();
    let components = base.components().count();
    let (mut w, mut h, mut d) = (base.width(), base.height(), base.depth());
    let mut src: Vec<u8> = base.bytes().to_vec();

    while w > 1 || h > 1 || d > 1 {
        let mut dst = Vec::new();
        resize::halve_image_3d(w, h, d, components, &src, &mut dst);
        (w, h, d) = resize::halved_dims(w, h, d);
        levels.push(dst.clone());
        src = dst;
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::texture::Components;

    #[test]
    fn test_filter_selection_quality_breakpoints() {
        let config = RenderConfig::default();
        let flags = TextureFlags::USE_QUALITY_VALUE;
        assert_eq!(
            select_filters(0.1, flags, false, &config),
            (MagFilter::Nearest, MinFilter::Nearest)
        );
        assert_eq!(
            select_filters(0.4, flags, false, &config),
            (MagFilter::Linear, MinFilter::Linear)
        );
        assert_eq!(
            select_filters(0.6, flags, true, &config),
            (MagFilter::Linear, MinFilter::LinearMipmapNearest)
        );
        assert_eq!(
            select_filters(0.9, flags, true, &config),
            (MagFilter::Linear, MinFilter::LinearMipmapLinear)
        );
    }

    #[test]
    fn test_explicit_filter_flags_override_quality() {
        let config = RenderConfig::default();
        let flags = TextureFlags::LINEAR_MAG_FILTER;
        // Quality 0.0 would normally pick nearest across the board.
        assert_eq!(
            select_filters(0.0, flags, false, &config),
            (MagFilter::Linear, MinFilter::Nearest)
        );
        let trilinear = TextureFlags::LINEAR_MAG_FILTER
            | TextureFlags::LINEAR_MIN_FILTER
            | TextureFlags::LINEAR_MIPMAP_FILTER;
        assert_eq!(
            select_filters(0.0, trilinear, true, &config),
            (MagFilter::Linear, MinFilter::LinearMipmapLinear)
        );
    }

    #[test]
    fn test_needs_mipmaps_rules() {
        let config = RenderConfig::default();
        assert!(!needs_mipmaps(0.9, TextureFlags::NO_MIPMAP, &config));
        assert!(needs_mipmaps(0.9, TextureFlags::USE_QUALITY_VALUE, &config));
        assert!(!needs_mipmaps(0.3, TextureFlags::USE_QUALITY_VALUE, &config));
        assert!(needs_mipmaps(
            0.0,
            TextureFlags::LINEAR_MIPMAP_FILTER,
            &config
        ));
    }

    #[test]
    fn test_legalize_axis_rounding() {
        let flags = TextureFlags::NONE;
        assert_eq!(legalize_axis(256, 0.9, flags, 0.7), 256);
        assert_eq!(legalize_axis(200, 0.9, flags, 0.7), 256);
        // Low quality and far from the upper pow2: scale down.
        assert_eq!(legalize_axis(130, 0.2, flags, 0.7), 128);
        // Low quality but close to the upper pow2: still scale up.
        assert_eq!(legalize_axis(250, 0.2, flags, 0.7), 256);
        assert_eq!(legalize_axis(200, 0.9, TextureFlags::SCALE_DOWN, 0.7), 128);
    }

    #[test]
    fn test_conformant_clamp_mapping() {
        let mut config = RenderConfig::default();
        let wrap = [WrapMode::Clamp, WrapMode::Repeat, WrapMode::ClampToBorder];
        assert_eq!(apply_conformant_clamp(wrap, &config), wrap);
        config.conformant_clamp = true;
        assert_eq!(
            apply_conformant_clamp(wrap, &config),
            [WrapMode::ClampToEdge, WrapMode::Repeat, WrapMode::ClampToBorder]
        );
    }

    #[test]
    fn test_mipmap_chain_terminates_at_one_pixel() {
        let base = PixelImage::new_2d(vec![128; 8 * 4], 8, 4, Components::Luminance).unwrap();
        let levels = build_mipmap_levels(&base);
        // 8x4 -> 4x2 -> 2x1 -> 1x1
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].len(), 4 * 2);
        assert_eq!(levels[2].len(), 1);
    }
}
