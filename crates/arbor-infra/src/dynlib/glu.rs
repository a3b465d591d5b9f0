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

//! Runtime binding to the GLU library.
//!
//! GLU contributes two capabilities: the universal image-scale
//! primitive (present in every GLU version; backed by a built-in
//! fallback when the symbol is somehow missing) and the NURBS
//! tessellator (requires GLU 1.3 for the callback-data entry points).
//! Each symbol resolves independently; whatever is missing degrades to
//! a stub or an unavailable capability, never an error.

use super::{with_init_guard, RuntimeLibrary};
use arbor_core::renderer::{
    ImageOps, LibraryVersion, PrimitiveKind, PrimitiveSink, SamplingMethod, SurfaceDef,
    SurfaceTessellator, TessError, TrimCurve,
};
use arbor_core::texture::{resize, PixelImage};
use arbor_core::RenderConfig;
use std::cell::Cell;
use std::ffi::{c_void, CStr};
use std::path::Path;
use std::sync::OnceLock;

// GL/GLU constants, straight from the headers.
const GLU_VERSION: u32 = 100800;
const GLU_NURBS_MODE: u32 = 100160;
const GLU_NURBS_TESSELLATOR: f32 = 100161.0;
const GLU_NURBS_BEGIN_DATA: u32 = 100170;
const GLU_NURBS_VERTEX_DATA: u32 = 100171;
const GLU_NURBS_NORMAL_DATA: u32 = 100172;
const GLU_NURBS_TEXTURE_COORD_DATA: u32 = 100174;
const GLU_NURBS_END_DATA: u32 = 100175;
const GLU_NURBS_ERROR: u32 = 100103;
const GLU_AUTO_LOAD_MATRIX: u32 = 100200;
const GLU_SAMPLING_TOLERANCE: u32 = 100203;
const GLU_PARAMETRIC_TOLERANCE: u32 = 100202;
const GLU_DISPLAY_MODE: u32 = 100204;
const GLU_SAMPLING_METHOD: u32 = 100205;
const GLU_U_STEP: u32 = 100206;
const GLU_V_STEP: u32 = 100207;
const GLU_OBJECT_PARAMETRIC_ERROR: f32 = 100208.0;
const GLU_OBJECT_PATH_LENGTH: f32 = 100209.0;
const GLU_MAP1_TRIM_2: u32 = 100210;
const GLU_MAP1_TRIM_3: u32 = 100211;
const GLU_PATH_LENGTH: f32 = 100215.0;
const GLU_PARAMETRIC_ERROR: f32 = 100216.0;
const GLU_DOMAIN_DISTANCE: f32 = 100217.0;
const GLU_FILL: f32 = 100012.0;

const GL_TRUE: f32 = 1.0;
const GL_FALSE: f32 = 0.0;
const GL_POINTS: u32 = 0x0000;
const GL_LINE_LOOP: u32 = 0x0002;
const GL_LINE_STRIP: u32 = 0x0003;
const GL_TRIANGLES: u32 = 0x0004;
const GL_TRIANGLE_STRIP: u32 = 0x0005;
const GL_TRIANGLE_FAN: u32 = 0x0006;
const GL_QUADS: u32 = 0x0007;
const GL_QUAD_STRIP: u32 = 0x0008;
const GL_UNSIGNED_BYTE: u32 = 0x1401;
const GL_LUMINANCE: u32 = 0x1909;
const GL_LUMINANCE_ALPHA: u32 = 0x190A;
const GL_RGB: u32 = 0x1907;
const GL_RGBA: u32 = 0x1908;
const GL_MAP2_VERTEX_3: u32 = 0x0DB7;
const GL_MAP2_VERTEX_4: u32 = 0x0DB8;

type NurbsObj = *mut c_void;
type GluCallback = Option<unsafe extern "C" fn()>;

type GetStringFn = unsafe extern "C" fn(u32) -> *const u8;
type ScaleImageFn = unsafe extern "C" fn(
    u32,
    i32,
    i32,
    u32,
    *const c_void,
    i32,
    i32,
    u32,
    *mut c_void,
) -> i32;
type NewRendererFn = unsafe extern "C" fn() -> NurbsObj;
type DeleteRendererFn = unsafe extern "C" fn(NurbsObj);
type SurfaceBlockFn = unsafe extern "C" fn(NurbsObj);
type PropertyFn = unsafe extern "C" fn(NurbsObj, u32, f32);
type CallbackFn = unsafe extern "C" fn(NurbsObj, u32, GluCallback);
type CallbackDataFn = unsafe extern "C" fn(NurbsObj, *mut c_void);
type NurbsSurfaceFn = unsafe extern "C" fn(
    NurbsObj,
    i32,
    *mut f32,
    i32,
    *mut f32,
    i32,
    i32,
    *mut f32,
    i32,
    i32,
    u32,
);
type NurbsCurveFn = unsafe extern "C" fn(NurbsObj, i32, *mut f32, i32, *mut f32, i32, u32);
type PwlCurveFn = unsafe extern "C" fn(NurbsObj, i32, *mut f32, i32, u32);

/// The resolved NURBS entry points, populated all-or-nothing.
#[derive(Debug, Clone, Copy)]
struct NurbsApi {
    new_renderer: NewRendererFn,
    delete_renderer: DeleteRendererFn,
    begin_surface: SurfaceBlockFn,
    end_surface: SurfaceBlockFn,
    begin_trim: SurfaceBlockFn,
    end_trim: SurfaceBlockFn,
    property: PropertyFn,
    callback: CallbackFn,
    callback_data: CallbackDataFn,
    nurbs_surface: NurbsSurfaceFn,
    nurbs_curve: NurbsCurveFn,
    pwl_curve: PwlCurveFn,
}

/// The latched GLU capability table.
#[derive(Debug)]
pub struct GluBinding {
    library: RuntimeLibrary,
    version: LibraryVersion,
    scale_image: Option<ScaleImageFn>,
    nurbs: Option<NurbsApi>,
}

static INSTANCE: OnceLock<GluBinding> = OnceLock::new();

#[cfg(target_os = "windows")]
const CANDIDATES: &[&str] = &["glu32.dll"];
#[cfg(target_os = "macos")]
const CANDIDATES: &[&str] = &[
    "/System/Library/Frameworks/OpenGL.framework/Versions/A/Libraries/libGLU.dylib",
    "libGLU.dylib",
];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const CANDIDATES: &[&str] = &["libGLU.so.1", "libGLU.so", "libMesaGLU.so.1"];

impl GluBinding {
    /// The process-wide table, loading the library on first call.
    /// Success or failure, the outcome is latched and never retried.
    pub fn shared(config: &RenderConfig) -> &'static GluBinding {
        INSTANCE.get_or_init(|| with_init_guard(|| Self::load(config)))
    }

    /// Loads the library and resolves its symbols. Prefer [`shared`];
    /// direct construction exists for tests that need a fresh table.
    ///
    /// [`shared`]: GluBinding::shared
    pub fn load(config: &RenderConfig) -> Self {
        let debug = config.debug_glu;
        let library = RuntimeLibrary::load(CANDIDATES, config.glu_libname.as_deref(), debug);
        if !library.is_loaded() {
            if debug {
                log::debug!("GLU not found; image scaling and NURBS degrade to fallbacks");
            }
            return Self {
                library,
                version: LibraryVersion::default(),
                scale_image: None,
                nurbs: None,
            };
        }

        // SAFETY: the types match the GLU prototypes, and the binding
        // (living in a process-lifetime singleton) keeps the library
        // loaded as long as the pointers are reachable.
        let (version, scale_image, nurbs) = unsafe {
            let get_string = library.symbol::<GetStringFn>(b"gluGetString\0", debug);
            let version = match &config.glu_version_override {
                Some(s) => {
                    let v = LibraryVersion::parse(s);
                    log::warn!("GLU version overridden to {v} (from {s:?})");
                    v
                }
                None => get_string
                    .map(|f| {
                        let ptr = f(GLU_VERSION);
                        if ptr.is_null() {
                            LibraryVersion::default()
                        } else {
                            LibraryVersion::parse(
                                &CStr::from_ptr(ptr.cast()).to_string_lossy(),
                            )
                        }
                    })
                    .unwrap_or_default(),
            };

            let scale_image = library.symbol::<ScaleImageFn>(b"gluScaleImage\0", debug);

            // The tessellator needs the 1.3 callback-data entry points.
            let nurbs = if version.at_least(1, 3, 0) {
                Self::resolve_nurbs(&library, debug)
            } else {
                if debug {
                    log::debug!("GLU {version} predates the NURBS tessellator interface");
                }
                None
            };
            (version, scale_image, nurbs)
        };

        if debug {
            log::debug!(
                "GLU loaded from {:?}: version {version}, scale_image={}, nurbs={}",
                library.name(),
                scale_image.is_some(),
                nurbs.is_some()
            );
        }
        Self {
            library,
            version,
            scale_image,
            nurbs,
        }
    }

    unsafe fn resolve_nurbs(library: &RuntimeLibrary, debug: bool) -> Option<NurbsApi> {
        Some(NurbsApi {
            new_renderer: library.symbol(b"gluNewNurbsRenderer\0", debug)?,
            delete_renderer: library.symbol(b"gluDeleteNurbsRenderer\0", debug)?,
            begin_surface: library.symbol(b"gluBeginSurface\0", debug)?,
            end_surface: library.symbol(b"gluEndSurface\0", debug)?,
            begin_trim: library.symbol(b"gluBeginTrim\0", debug)?,
            end_trim: library.symbol(b"gluEndTrim\0", debug)?,
            property: library.symbol(b"gluNurbsProperty\0", debug)?,
            callback: library.symbol(b"gluNurbsCallback\0", debug)?,
            callback_data: library.symbol(b"gluNurbsCallbackData\0", debug)?,
            nurbs_surface: library.symbol(b"gluNurbsSurface\0", debug)?,
            nurbs_curve: library.symbol(b"gluNurbsCurve\0", debug)?,
            pwl_curve: library.symbol(b"gluPwlCurve\0", debug)?,
        })
    }

    /// Whether the library itself was found.
    pub fn library_loaded(&self) -> bool {
        self.library.is_loaded()
    }
}

fn gl_format(components: usize) -> Option<u32> {
    match components {
        1 => Some(GL_LUMINANCE),
        2 => Some(GL_LUMINANCE_ALPHA),
        3 => Some(GL_RGB),
        4 => Some(GL_RGBA),
        _ => None,
    }
}

impl ImageOps for GluBinding {
    fn is_available(&self) -> bool {
        self.library.is_loaded()
    }

    fn version(&self) -> LibraryVersion {
        self.version
    }

    /// Scales through `gluScaleImage`, or through the built-in
    /// nearest-neighbor kernel if that universal symbol is somehow
    /// missing; this capability never reports absent once the library
    /// is loaded.
    fn resize_2d(&self, src: &PixelImage, width: usize, height: usize) -> Option<PixelImage> {
        if !self.library.is_loaded() || src.is_3d() {
            return None;
        }
        let components = src.components().count();
        if let Some(scale) = self.scale_image {
            let format = gl_format(components)?;
            let mut dst = vec![0u8; width * height * components];
            // SAFETY: buffers match the dimensions passed; gluScaleImage
            // is a pure CPU routine for unsigned-byte data.
            let status = unsafe {
                scale(
                    format,
                    src.width() as i32,
                    src.height() as i32,
                    GL_UNSIGNED_BYTE,
                    src.bytes().as_ptr().cast(),
                    width as i32,
                    height as i32,
                    GL_UNSIGNED_BYTE,
                    dst.as_mut_ptr().cast(),
                )
            };
            if status == 0 {
                return PixelImage::new_2d(dst, width, height, src.components());
            }
            log::warn!("gluScaleImage failed with status {status}; using fallback");
        }
        let mut dst = Vec::new();
        resize::resize_nearest_2d(
            src.bytes(),
            src.width(),
            src.height(),
            components,
            width,
            height,
            &mut dst,
        );
        PixelImage::new_2d(dst, width, height, src.components())
    }

    fn resize_3d(
        &self,
        _src: &PixelImage,
        _width: usize,
        _height: usize,
        _depth: usize,
    ) -> Option<PixelImage> {
        // GLU has no volume scaling.
        None
    }

    fn read_file(&self, _path: &Path) -> Option<PixelImage> {
        None
    }
}

thread_local! {
    /// The NURBS error callback has no user-data variant, so the code
    /// travels through a thread-local instead.
    static NURBS_ERROR: Cell<Option<u32>> = const { Cell::new(None) };
}

/// The sink adapter handed to the C callbacks through the user-data
/// pointer.
struct CallbackState<'a> {
    sink: &'a mut dyn PrimitiveSink,
}

unsafe extern "C" fn begin_cb(kind: u32, user: *mut c_void) {
    let state = &mut *(user as *mut CallbackState<'_>);
    let kind = match kind {
        GL_POINTS => PrimitiveKind::Points,
        GL_LINE_STRIP | GL_LINE_LOOP => PrimitiveKind::LineStrip,
        GL_TRIANGLES => PrimitiveKind::Triangles,
        GL_TRIANGLE_STRIP => PrimitiveKind::TriangleStrip,
        GL_TRIANGLE_FAN => PrimitiveKind::TriangleFan,
        GL_QUADS => PrimitiveKind::Quads,
        GL_QUAD_STRIP => PrimitiveKind::QuadStrip,
        other => {
            log::warn!("Tessellator produced unknown primitive {other:#x}");
            PrimitiveKind::Triangles
        }
    };
    state.sink.begin(kind);
}

unsafe extern "C" fn vertex_cb(data: *mut f32, user: *mut c_void) {
    let state = &mut *(user as *mut CallbackState<'_>);
    let v = std::slice::from_raw_parts(data, 3);
    state
        .sink
        .vertex(arbor_core::math::Vec3::new(v[0], v[1], v[2]));
}

unsafe extern "C" fn normal_cb(data: *mut f32, user: *mut c_void) {
    let state = &mut *(user as *mut CallbackState<'_>);
    let n = std::slice::from_raw_parts(data, 3);
    state
        .sink
        .normal(arbor_core::math::Vec3::new(n[0], n[1], n[2]));
}

unsafe extern "C" fn tex_coord_cb(data: *mut f32, user: *mut c_void) {
    let state = &mut *(user as *mut CallbackState<'_>);
    let t = std::slice::from_raw_parts(data, 2);
    state.sink.tex_coord(arbor_core::math::Vec2::new(t[0], t[1]));
}

unsafe extern "C" fn end_cb(user: *mut c_void) {
    let state = &mut *(user as *mut CallbackState<'_>);
    state.sink.end();
}

unsafe extern "C" fn error_cb(code: u32) {
    NURBS_ERROR.with(|e| e.set(Some(code)));
}

impl SurfaceTessellator for GluBinding {
    fn is_available(&self) -> bool {
        self.nurbs.is_some()
    }

    fn version(&self) -> LibraryVersion {
        self.version
    }

    fn tessellate_surface(
        &self,
        surface: &SurfaceDef<'_>,
        trims: &[&[TrimCurve<'_>]],
        sampling: SamplingMethod,
        sink: &mut dyn PrimitiveSink,
    ) -> Result<(), TessError> {
        debug_assert!(
            SurfaceTessellator::is_available(self),
            "tessellate_surface called without an availability check"
        );
        let api = self
            .nurbs
            .as_ref()
            .ok_or_else(|| TessError::NativeError("NURBS tessellator unavailable".into()))?;
        surface.validate()?;

        let mut state = CallbackState { sink };
        NURBS_ERROR.with(|e| e.set(None));

        // SAFETY: the renderer object lives for exactly this scope, the
        // callback-data pointer outlives every callback invocation, and
        // all arrays are valid for the counts passed. GLU takes mutable
        // pointers for historical reasons but never writes through them.
        unsafe {
            let obj = (api.new_renderer)();
            if obj.is_null() {
                return Err(TessError::NativeError(
                    "gluNewNurbsRenderer returned null".into(),
                ));
            }

            let cb = api.callback;
            cb(obj, GLU_NURBS_BEGIN_DATA, Some(std::mem::transmute::<
                unsafe extern "C" fn(u32, *mut c_void),
                unsafe extern "C" fn(),
            >(begin_cb)));
            cb(obj, GLU_NURBS_VERTEX_DATA, Some(std::mem::transmute::<
                unsafe extern "C" fn(*mut f32, *mut c_void),
                unsafe extern "C" fn(),
            >(vertex_cb)));
            cb(obj, GLU_NURBS_NORMAL_DATA, Some(std::mem::transmute::<
                unsafe extern "C" fn(*mut f32, *mut c_void),
                unsafe extern "C" fn(),
            >(normal_cb)));
            cb(obj, GLU_NURBS_TEXTURE_COORD_DATA, Some(std::mem::transmute::<
                unsafe extern "C" fn(*mut f32, *mut c_void),
                unsafe extern "C" fn(),
            >(tex_coord_cb)));
            cb(obj, GLU_NURBS_END_DATA, Some(std::mem::transmute::<
                unsafe extern "C" fn(*mut c_void),
                unsafe extern "C" fn(),
            >(end_cb)));
            cb(obj, GLU_NURBS_ERROR, Some(std::mem::transmute::<
                unsafe extern "C" fn(u32),
                unsafe extern "C" fn(),
            >(error_cb)));
            (api.callback_data)(obj, (&mut state as *mut CallbackState<'_>).cast());

            (api.property)(obj, GLU_NURBS_MODE, GLU_NURBS_TESSELLATOR);
            (api.property)(obj, GLU_DISPLAY_MODE, GLU_FILL);
            match sampling {
                SamplingMethod::PathLength(tolerance) => {
                    (api.property)(obj, GLU_AUTO_LOAD_MATRIX, GL_TRUE);
                    (api.property)(obj, GLU_SAMPLING_METHOD, GLU_PATH_LENGTH);
                    (api.property)(obj, GLU_SAMPLING_TOLERANCE, tolerance);
                }
                SamplingMethod::ParametricError(tolerance) => {
                    (api.property)(obj, GLU_AUTO_LOAD_MATRIX, GL_TRUE);
                    (api.property)(obj, GLU_SAMPLING_METHOD, GLU_PARAMETRIC_ERROR);
                    (api.property)(obj, GLU_PARAMETRIC_TOLERANCE, tolerance);
                }
                SamplingMethod::ObjectPathLength(tolerance) => {
                    (api.property)(obj, GLU_AUTO_LOAD_MATRIX, GL_FALSE);
                    (api.property)(obj, GLU_SAMPLING_METHOD, GLU_OBJECT_PATH_LENGTH);
                    (api.property)(obj, GLU_SAMPLING_TOLERANCE, tolerance);
                }
                SamplingMethod::ObjectParametricError(tolerance) => {
                    (api.property)(obj, GLU_AUTO_LOAD_MATRIX, GL_FALSE);
                    (api.property)(obj, GLU_SAMPLING_METHOD, GLU_OBJECT_PARAMETRIC_ERROR);
                    (api.property)(obj, GLU_PARAMETRIC_TOLERANCE, tolerance);
                }
                SamplingMethod::DomainDistance { u_step, v_step } => {
                    (api.property)(obj, GLU_AUTO_LOAD_MATRIX, GL_FALSE);
                    (api.property)(obj, GLU_SAMPLING_METHOD, GLU_DOMAIN_DISTANCE);
                    (api.property)(obj, GLU_U_STEP, u_step);
                    (api.property)(obj, GLU_V_STEP, v_step);
                }
            }

            let surface_type = if surface.coords == 4 {
                GL_MAP2_VERTEX_4
            } else {
                GL_MAP2_VERTEX_3
            };

            (api.begin_surface)(obj);
            (api.nurbs_surface)(
                obj,
                surface.knots_u.len() as i32,
                surface.knots_u.as_ptr() as *mut f32,
                surface.knots_v.len() as i32,
                surface.knots_v.as_ptr() as *mut f32,
                surface.stride_u as i32,
                surface.stride_v as i32,
                surface.ctrl.as_ptr() as *mut f32,
                surface.order_u as i32,
                surface.order_v as i32,
                surface_type,
            );
            for trim_loop in trims {
                (api.begin_trim)(obj);
                for curve in *trim_loop {
                    match curve {
                        TrimCurve::Piecewise {
                            points,
                            stride,
                            dim,
                        } => {
                            let ty = if *dim == 3 {
                                GLU_MAP1_TRIM_3
                            } else {
                                GLU_MAP1_TRIM_2
                            };
                            (api.pwl_curve)(
                                obj,
                                (points.len() / stride) as i32,
                                points.as_ptr() as *mut f32,
                                *stride as i32,
                                ty,
                            );
                        }
                        TrimCurve::Nurbs {
                            order,
                            knots,
                            ctrl,
                            stride,
                            dim,
                        } => {
                            let ty = if *dim == 3 {
                                GLU_MAP1_TRIM_3
                            } else {
                                GLU_MAP1_TRIM_2
                            };
                            (api.nurbs_curve)(
                                obj,
                                knots.len() as i32,
                                knots.as_ptr() as *mut f32,
                                *stride as i32,
                                ctrl.as_ptr() as *mut f32,
                                *order as i32,
                                ty,
                            );
                        }
                    }
                }
                (api.end_trim)(obj);
            }
            (api.end_surface)(obj);
            (api.delete_renderer)(obj);
        }

        match NURBS_ERROR.with(|e| e.take()) {
            Some(code) => Err(TessError::NativeError(format!(
                "tessellator error {code}"
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_library_degrades_softly() {
        // The libname override replaces the candidate list, so a bogus
        // name guarantees a miss regardless of what the host has
        // installed.
        let config = RenderConfig {
            glu_libname: Some("arbor-no-such-glu".into()),
            ..Default::default()
        };
        let binding = GluBinding::load(&config);
        assert!(!binding.library_loaded());
        assert!(!ImageOps::is_available(&binding));
        assert!(!SurfaceTessellator::is_available(&binding));
        assert_eq!(ImageOps::version(&binding), LibraryVersion::default());
        let img = PixelImage::new_2d(vec![0; 4], 2, 2, arbor_core::texture::Components::Luminance)
            .unwrap();
        assert!(binding.resize_2d(&img, 1, 1).is_none());
    }

    #[test]
    fn test_tessellator_needs_the_nurbs_table() {
        // Even with a plausible version, no resolved entry points means
        // no tessellator capability.
        let binding = GluBinding {
            library: RuntimeLibrary::load(&["arbor-no-such-glu"], None, false),
            version: LibraryVersion::new(1, 3, 0),
            scale_image: None,
            nurbs: None,
        };
        assert!(!SurfaceTessellator::is_available(&binding));
        assert!(SurfaceTessellator::version(&binding).at_least(1, 3, 0));
    }
}
