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

//! Runtime binding to the simage library.
//!
//! simage provides the high-quality image paths: filtered 2D resizing,
//! volume resizing (1.3 and later), and file loading through its codec
//! plugins. All of it is optional: when the library is absent the
//! [`StubImageOps`](arbor_core::renderer::StubImageOps) null object
//! stands in and the resize preference chain moves on.

use super::{with_init_guard, RuntimeLibrary};
use arbor_core::renderer::{ImageOps, LibraryVersion};
use arbor_core::texture::{Components, PixelImage};
use arbor_core::RenderConfig;
use std::ffi::{c_char, c_int, CString};
use std::path::Path;
use std::sync::OnceLock;

type VersionFn = unsafe extern "C" fn(*mut c_int, *mut c_int, *mut c_int);
type ReadImageFn =
    unsafe extern "C" fn(*const c_char, *mut c_int, *mut c_int, *mut c_int) -> *mut u8;
type FreeImageFn = unsafe extern "C" fn(*mut u8);
type ResizeFn = unsafe extern "C" fn(*mut u8, c_int, c_int, c_int, c_int, c_int) -> *mut u8;
type Resize3dFn =
    unsafe extern "C" fn(*mut u8, c_int, c_int, c_int, c_int, c_int, c_int, c_int) -> *mut u8;

/// The latched simage capability table.
#[derive(Debug)]
pub struct SimageBinding {
    library: RuntimeLibrary,
    version: LibraryVersion,
    read_image: Option<ReadImageFn>,
    free_image: Option<FreeImageFn>,
    resize: Option<ResizeFn>,
    resize3d: Option<Resize3dFn>,
}

static INSTANCE: OnceLock<SimageBinding> = OnceLock::new();

#[cfg(target_os = "windows")]
const CANDIDATES: &[&str] = &["simage1.dll", "simage.dll"];
#[cfg(target_os = "macos")]
const CANDIDATES: &[&str] = &["libsimage.dylib", "libsimage.20.dylib"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const CANDIDATES: &[&str] = &["libsimage.so.20", "libsimage.so"];

impl SimageBinding {
    /// The process-wide table, loading the library on first call.
    /// Success or failure, the outcome is latched and never retried.
    pub fn shared(config: &RenderConfig) -> &'static SimageBinding {
        INSTANCE.get_or_init(|| with_init_guard(|| Self::load(config)))
    }

    /// Loads the library and resolves its symbols. Prefer [`shared`];
    /// direct construction exists for tests that need a fresh table.
    ///
    /// [`shared`]: SimageBinding::shared
    pub fn load(config: &RenderConfig) -> Self {
        let debug = config.debug_simage;
        let library = RuntimeLibrary::load(CANDIDATES, config.simage_libname.as_deref(), debug);
        if !library.is_loaded() {
            if debug {
                log::debug!("simage not found; image services degrade to stubs");
            }
            return Self {
                library,
                version: LibraryVersion::default(),
                read_image: None,
                free_image: None,
                resize: None,
                resize3d: None,
            };
        }

        // SAFETY: the types match the simage prototypes, and the
        // binding's singleton keeps the library loaded for as long as
        // the pointers are reachable.
        let (version, read_image, free_image, resize, resize3d) = unsafe {
            let version = match library.symbol::<VersionFn>(b"simage_version\0", debug) {
                Some(f) => {
                    let (mut major, mut minor, mut micro) = (0, 0, 0);
                    f(&mut major, &mut minor, &mut micro);
                    LibraryVersion::new(major.max(0) as u32, minor.max(0) as u32, micro.max(0) as u32)
                }
                None => LibraryVersion::default(),
            };
            (
                version,
                library.symbol::<ReadImageFn>(b"simage_read_image\0", debug),
                library.symbol::<FreeImageFn>(b"simage_free_image\0", debug),
                library.symbol::<ResizeFn>(b"simage_resize\0", debug),
                // Volume resizing only exists from 1.3 on; don't trust a
                // resolvable symbol in an older library.
                if version.at_least(1, 3, 0) {
                    library.symbol::<Resize3dFn>(b"simage_resize3d\0", debug)
                } else {
                    None
                },
            )
        };

        if debug {
            log::debug!(
                "simage loaded from {:?}: version {version}, read={}, resize={}, resize3d={}",
                library.name(),
                read_image.is_some(),
                resize.is_some(),
                resize3d.is_some()
            );
        }
        Self {
            library,
            version,
            read_image,
            free_image,
            resize,
            resize3d,
        }
    }

    /// Whether the library itself was found.
    pub fn library_loaded(&self) -> bool {
        self.library.is_loaded()
    }

    /// Copies a simage-allocated buffer into an owned image and frees
    /// the original.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live allocation of `len` bytes returned by
    /// simage.
    unsafe fn take_native_buffer(
        &self,
        ptr: *mut u8,
        len: usize,
    ) -> Vec<u8> {
        let data = std::slice::from_raw_parts(ptr, len).to_vec();
        if let Some(free) = self.free_image {
            free(ptr);
        }
        data
    }
}

impl ImageOps for SimageBinding {
    fn is_available(&self) -> bool {
        self.library.is_loaded()
    }

    fn version(&self) -> LibraryVersion {
        self.version
    }

    fn resize_2d(&self, src: &PixelImage, width: usize, height: usize) -> Option<PixelImage> {
        let resize = self.resize?;
        if src.is_3d() || width == 0 || height == 0 {
            return None;
        }
        let components = src.components().count();
        // SAFETY: simage_resize reads w*h*c bytes and returns a fresh
        // allocation of the requested size (null on failure).
        let out = unsafe {
            let ptr = resize(
                src.bytes().as_ptr() as *mut u8,
                src.width() as c_int,
                src.height() as c_int,
                components as c_int,
                width as c_int,
                height as c_int,
            );
            if ptr.is_null() {
                return None;
            }
            self.take_native_buffer(ptr, width * height * components)
        };
        PixelImage::new_2d(out, width, height, src.components())
    }

    fn resize_3d(
        &self,
        src: &PixelImage,
        width: usize,
        height: usize,
        depth: usize,
    ) -> Option<PixelImage> {
        let resize3d = self.resize3d?;
        if width == 0 || height == 0 || depth == 0 {
            return None;
        }
        let components = src.components().count();
        // SAFETY: as for resize_2d, with the volume variant.
        let out = unsafe {
            let ptr = resize3d(
                src.bytes().as_ptr() as *mut u8,
                src.width() as c_int,
                src.height() as c_int,
                components as c_int,
                src.depth() as c_int,
                width as c_int,
                height as c_int,
                depth as c_int,
            );
            if ptr.is_null() {
                return None;
            }
            self.take_native_buffer(ptr, width * height * depth * components)
        };
        PixelImage::new_3d(out, width, height, depth, src.components())
    }

    fn read_file(&self, path: &Path) -> Option<PixelImage> {
        let read = self.read_image?;
        let c_path = CString::new(path.to_str()?).ok()?;
        let (mut w, mut h, mut c): (c_int, c_int, c_int) = (0, 0, 0);
        // SAFETY: out-parameters are valid; a non-null return is a
        // w*h*c byte allocation owned by simage until freed.
        let (data, w, h, c) = unsafe {
            let ptr = read(c_path.as_ptr(), &mut w, &mut h, &mut c);
            if ptr.is_null() || w <= 0 || h <= 0 {
                return None;
            }
            let len = w as usize * h as usize * c as usize;
            (self.take_native_buffer(ptr, len), w, h, c)
        };
        let components = Components::from_count(c as usize)?;
        PixelImage::new_2d(data, w as usize, h as usize, components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_library_degrades_softly() {
        let config = RenderConfig {
            simage_libname: Some("arbor-no-such-simage".into()),
            ..Default::default()
        };
        let binding = SimageBinding::load(&config);
        assert!(!binding.library_loaded());
        assert!(!binding.is_available());
        assert_eq!(binding.version(), LibraryVersion::default());
        let img =
            PixelImage::new_2d(vec![0; 4], 2, 2, Components::Luminance).unwrap();
        assert!(binding.resize_2d(&img, 1, 1).is_none());
        assert!(binding.resize_3d(&img, 1, 1, 1).is_none());
        assert!(binding.read_file(Path::new("/no/such/file.png")).is_none());
    }

    #[test]
    fn test_old_versions_get_no_volume_resize() {
        // A synthetic table at 1.2: even a resolvable resize3d symbol
        // would be left unbound.
        let binding = SimageBinding {
            library: RuntimeLibrary::load(&["arbor-no-such-simage"], None, false),
            version: LibraryVersion::new(1, 2, 0),
            read_image: None,
            free_image: None,
            resize: None,
            resize3d: None,
        };
        assert!(!binding.version().at_least(1, 3, 0));
        let img = PixelImage::new_3d(vec![0; 8], 2, 2, 2, Components::Luminance).unwrap();
        assert!(binding.resize_3d(&img, 1, 1, 1).is_none());
    }

    #[test]
    fn test_callable_unsafe_helpers_unused_without_library() {
        // free_image is only consulted when a native buffer exists; a
        // missing symbol must not be an error path by itself.
        let binding = SimageBinding {
            library: RuntimeLibrary::load(&["arbor-no-such-simage"], None, false),
            version: LibraryVersion::default(),
            read_image: None,
            free_image: None,
            resize: None,
            resize3d: None,
        };
        assert!(binding.read_file(Path::new("x.png")).is_none());
    }
}
