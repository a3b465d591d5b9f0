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

//! A scriptable in-memory texture backend shared by the integration
//! tests.

use arbor_core::renderer::{
    CacheContextId, GlCapabilities, MagFilter, MinFilter, TextureBackend, TextureError,
    TextureHandle, TextureSpec,
};
use arbor_core::texture::WrapMode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// One recorded texture creation.
#[derive(Debug, Clone)]
pub struct CreateCall {
    pub spec: TextureSpec,
    pub level_count: usize,
}

#[derive(Debug, Default)]
pub struct Calls {
    pub creates: Vec<CreateCall>,
    pub deletes: Vec<TextureHandle>,
    pub subimages: Vec<TextureHandle>,
    pub filters: Vec<(TextureHandle, MagFilter, MinFilter)>,
}

/// A scriptable stand-in for a GL driver.
#[derive(Debug)]
pub struct MockBackend {
    pub context: CacheContextId,
    pub caps: GlCapabilities,
    /// Proxy queries accept any shape with every axis at or below this.
    pub accept_max: usize,
    pub calls: Mutex<Calls>,
    next: AtomicU64,
}

impl MockBackend {
    pub fn new(context: u32) -> Self {
        Self {
            context: CacheContextId(context),
            caps: GlCapabilities::default(),
            accept_max: 2048,
            calls: Mutex::new(Calls::default()),
            next: AtomicU64::new(1),
        }
    }

    pub fn created_count(&self) -> usize {
        self.calls.lock().unwrap().creates.len()
    }

    pub fn deleted_count(&self) -> usize {
        self.calls.lock().unwrap().deletes.len()
    }

    pub fn subimage_count(&self) -> usize {
        self.calls.lock().unwrap().subimages.len()
    }

    pub fn last_create(&self) -> CreateCall {
        self.calls
            .lock()
            .unwrap()
            .creates
            .last()
            .expect("no texture was created")
            .clone()
    }
}

impl TextureBackend for MockBackend {
    fn cache_context(&self) -> CacheContextId {
        self.context
    }

    fn capabilities(&self) -> GlCapabilities {
        self.caps
    }

    fn proxy_check(&self, spec: &TextureSpec, _mipmapped: bool) -> bool {
        spec.width <= self.accept_max
            && spec.height <= self.accept_max
            && spec.depth <= self.accept_max
    }

    fn create_texture(
        &self,
        spec: &TextureSpec,
        levels: &[&[u8]],
    ) -> Result<TextureHandle, TextureError> {
        let handle = TextureHandle(self.next.fetch_add(1, Ordering::Relaxed));
        self.calls.lock().unwrap().creates.push(CreateCall {
            spec: *spec,
            level_count: levels.len(),
        });
        Ok(handle)
    }

    fn update_subimage(
        &self,
        handle: TextureHandle,
        _level: u32,
        _offset: [usize; 3],
        _size: [usize; 3],
        _pixels: &[u8],
    ) -> Result<(), TextureError> {
        self.calls.lock().unwrap().subimages.push(handle);
        Ok(())
    }

    fn generate_mipmaps(&self, _handle: TextureHandle) -> bool {
        self.caps.hardware_mipmap
    }

    fn set_filters(&self, handle: TextureHandle, mag: MagFilter, min: MinFilter) {
        self.calls.lock().unwrap().filters.push((handle, mag, min));
    }

    fn set_wrap(&self, _handle: TextureHandle, _s: WrapMode, _t: WrapMode, _r: WrapMode) {}

    fn set_anisotropy(&self, _handle: TextureHandle, _ratio: f32) {}

    fn delete_texture(&self, handle: TextureHandle) {
        self.calls.lock().unwrap().deletes.push(handle);
    }
}
