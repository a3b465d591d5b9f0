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

//! The process-wide table of texture resources opted into age-based
//! eviction.
//!
//! Per rendering frame: [`begin_frame`] is a no-op hook, resources used
//! during traversal call [`TextureResource::tag_used`], and
//! [`end_frame`] ages every per-context entry that was not tagged,
//! releasing those whose age reached the threshold. Tagging must happen
//! before the frame's `end_frame` sweep or the object may be evicted
//! while still in use.
//!
//! Registry bookkeeping is guarded by a single lock; per-resource
//! eviction callbacks are always invoked outside it so they may
//! re-enter the registry freely.
//!
//! [`begin_frame`]: TextureRegistry::begin_frame
//! [`end_frame`]: TextureRegistry::end_frame
//! [`TextureResource::tag_used`]: crate::TextureResource::tag_used

use crate::texture::resource::{Shared, TextureResource};
use arbor_core::renderer::{CacheContextId, TextureBackend, TextureHandle};
use std::sync::{Arc, Mutex, Weak};

/// The default number of unused frames before a native object is freed.
pub const DEFAULT_MAX_AGE: u32 = 60;

type EvictionCallback = Arc<dyn Fn(usize) + Send + Sync>;

struct Tracked {
    resource: Weak<Shared>,
    callback: Option<EvictionCallback>,
}

struct Book {
    tracked: Vec<Tracked>,
    /// Handles waiting for a backend of their context group to show up.
    deferred: Vec<(CacheContextId, TextureHandle)>,
    max_age: u32,
}

pub(crate) struct RegistryInner {
    book: Mutex<Book>,
}

impl RegistryInner {
    pub(crate) fn defer_release(&self, context: CacheContextId, handle: TextureHandle) {
        self.book.lock().unwrap().deferred.push((context, handle));
    }
}

/// Tracks texture resources for automatic reclamation of GPU memory,
/// independent of application-level ownership.
#[derive(Clone)]
pub struct TextureRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for TextureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextureRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let book = self.inner.book.lock().unwrap();
        f.debug_struct("TextureRegistry")
            .field("tracked", &book.tracked.len())
            .field("deferred", &book.deferred.len())
            .field("max_age", &book.max_age)
            .finish()
    }
}

impl TextureRegistry {
    /// Creates an empty registry with the default eviction threshold.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                book: Mutex::new(Book {
                    tracked: Vec::new(),
                    deferred: Vec::new(),
                    max_age: DEFAULT_MAX_AGE,
                }),
            }),
        }
    }

    /// Opts a resource into automatic eviction.
    pub fn track(&self, resource: &TextureResource) {
        self.track_impl(resource, None);
    }

    /// Opts a resource in and registers a callback invoked (outside all
    /// registry locks) with the number of native objects evicted from
    /// it in a frame.
    pub fn track_with_callback(
        &self,
        resource: &TextureResource,
        callback: impl Fn(usize) + Send + Sync + 'static,
    ) {
        self.track_impl(resource, Some(Arc::new(callback)));
    }

    fn track_impl(&self, resource: &TextureResource, callback: Option<EvictionCallback>) {
        resource.attach_registry(&self.inner);
        let weak = Arc::downgrade(resource.shared());
        let mut book = self.inner.book.lock().unwrap();
        if book
            .tracked
            .iter()
            .any(|t| t.resource.ptr_eq(&weak))
        {
            return;
        }
        book.tracked.push(Tracked {
            resource: weak,
            callback,
        });
    }

    /// Removes a resource from tracking. Its native objects are left
    /// alone; the owner is responsible for releasing them.
    pub fn untrack(&self, resource: &TextureResource) {
        let weak = Arc::downgrade(resource.shared());
        let mut book = self.inner.book.lock().unwrap();
        book.tracked.retain(|t| !t.resource.ptr_eq(&weak));
    }

    /// The current eviction threshold in frames.
    pub fn max_age(&self) -> u32 {
        self.inner.book.lock().unwrap().max_age
    }

    /// Changes the eviction threshold.
    pub fn set_max_age(&self, max_age: u32) {
        self.inner.book.lock().unwrap().max_age = max_age;
    }

    /// Start-of-frame hook. Currently a no-op, kept so hosts can pair it
    /// with [`end_frame`] unconditionally.
    ///
    /// [`end_frame`]: TextureRegistry::end_frame
    pub fn begin_frame(&self) {}

    /// End-of-frame sweep: ages untagged per-context entries, releases
    /// the ones whose age reached the threshold, and drains deferred
    /// releases for the backend's context group.
    pub fn end_frame(&self, backend: &dyn TextureBackend) {
        let context = backend.cache_context();

        let (snapshot, due_now, max_age) = {
            let mut book = self.inner.book.lock().unwrap();
            book.tracked.retain(|t| t.resource.strong_count() > 0);
            let snapshot: Vec<_> = book
                .tracked
                .iter()
                .map(|t| (t.resource.clone(), t.callback.clone()))
                .collect();
            let mut due_now = Vec::new();
            book.deferred.retain(|(ctx, handle)| {
                if *ctx == context {
                    due_now.push(*handle);
                    false
                } else {
                    true
                }
            });
            (snapshot, due_now, book.max_age)
        };

        for handle in due_now {
            backend.delete_texture(handle);
        }

        let mut newly_deferred = Vec::new();
        for (weak, callback) in snapshot {
            let Some(shared) = weak.upgrade() else {
                continue;
            };
            let mut evicted = 0usize;
            {
                let mut state = shared.state.lock().unwrap();
                for entry in state.entries.iter_mut() {
                    if entry.tagged {
                        entry.tagged = false;
                    } else {
                        entry.age += 1;
                    }
                }
                let entries = std::mem::take(&mut state.entries);
                for entry in entries {
                    if entry.age >= max_age {
                        evicted += 1;
                        if entry.context == context {
                            backend.delete_texture(entry.handle);
                        } else {
                            newly_deferred.push((entry.context, entry.handle));
                        }
                    } else {
                        state.entries.push(entry);
                    }
                }
            }
            if evicted > 0 {
                if let Some(cb) = callback {
                    cb(evicted);
                }
            }
        }

        if !newly_deferred.is_empty() {
            self.inner
                .book
                .lock()
                .unwrap()
                .deferred
                .append(&mut newly_deferred);
        }
    }

    /// Immediately releases every tracked native object by running one
    /// frame cycle with the threshold forced to zero; the previous
    /// threshold is restored afterwards.
    pub fn free_all(&self, backend: &dyn TextureBackend) {
        let previous = {
            let mut book = self.inner.book.lock().unwrap();
            let prev = book.max_age;
            book.max_age = 0;
            prev
        };
        self.begin_frame();
        self.end_frame(backend);
        self.inner.book.lock().unwrap().max_age = previous;
    }

    /// The number of handles parked for context groups no backend has
    /// shown up for yet.
    pub fn pending_releases(&self) -> usize {
        self.inner.book.lock().unwrap().deferred.len()
    }

    /// The number of live tracked resources.
    pub fn tracked_count(&self) -> usize {
        let mut book = self.inner.book.lock().unwrap();
        book.tracked.retain(|t| t.resource.strong_count() > 0);
        book.tracked.len()
    }
}
