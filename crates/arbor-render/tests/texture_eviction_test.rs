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

mod common;

use arbor_core::texture::{Components, PixelImage, WrapMode};
use arbor_core::RenderConfig;
use arbor_render::{RenderServices, TextureRegistry, TextureResource};
use common::MockBackend;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn test_image(size: usize) -> PixelImage {
    PixelImage::new_2d(
        vec![200u8; size * size * 4],
        size,
        size,
        Components::Rgba,
    )
    .unwrap()
}

fn make_resource(registry: &TextureRegistry, services: &RenderServices<'_>) -> TextureResource {
    let resource = TextureResource::new();
    registry.track(&resource);
    resource.set_data(
        Some(test_image(32)),
        [WrapMode::Repeat; 3],
        0.4,
        0,
        None,
    );
    assert!(resource.gl_object(services).is_some());
    resource
}

#[test]
fn test_entry_is_evicted_exactly_at_the_threshold() {
    // --- 1. ARRANGE ---
    let backend = MockBackend::new(1);
    let config = RenderConfig::default();
    let services = RenderServices::without_native_libs(&backend, &config);
    let registry = TextureRegistry::new();
    registry.set_max_age(3);

    // Used (and therefore tagged) during frame 0.
    let resource = make_resource(&registry, &services);

    // --- 2. ACT / ASSERT ---
    // End of the frame the resource was used in: protected by its tag.
    registry.end_frame(&backend);
    assert_eq!(backend.deleted_count(), 0);

    // Three unused frames. The entry must go exactly on the third, not
    // the second, not the fourth.
    registry.end_frame(&backend);
    assert_eq!(backend.deleted_count(), 0, "evicted one frame early");
    registry.end_frame(&backend);
    assert_eq!(backend.deleted_count(), 0, "evicted one frame early");
    registry.end_frame(&backend);
    assert_eq!(backend.deleted_count(), 1, "not evicted at the threshold");
    registry.end_frame(&backend);
    assert_eq!(backend.deleted_count(), 1, "evicted twice");

    // The resource recovers transparently on next use.
    assert!(resource.gl_object(&services).is_some());
    assert_eq!(backend.created_count(), 2);
}

#[test]
fn test_tagging_every_frame_prevents_eviction() {
    let backend = MockBackend::new(1);
    let config = RenderConfig::default();
    let services = RenderServices::without_native_libs(&backend, &config);
    let registry = TextureRegistry::new();
    registry.set_max_age(2);

    let resource = make_resource(&registry, &services);
    for _ in 0..10 {
        registry.begin_frame();
        resource.tag_used(backend.context);
        registry.end_frame(&backend);
    }
    assert_eq!(backend.deleted_count(), 0);
}

#[test]
fn test_free_all_releases_tagged_entries_and_restores_threshold() {
    let backend = MockBackend::new(1);
    let config = RenderConfig::default();
    let services = RenderServices::without_native_libs(&backend, &config);
    let registry = TextureRegistry::new();
    registry.set_max_age(60);

    let resource = make_resource(&registry, &services);
    resource.tag_used(backend.context);

    registry.free_all(&backend);
    assert_eq!(backend.deleted_count(), 1);
    assert_eq!(registry.max_age(), 60, "threshold not restored");
}

#[test]
fn test_reset_while_tagged_still_releases() {
    // Age-based protection applies to the sweep, never to an explicit
    // reset.
    let backend = MockBackend::new(1);
    let config = RenderConfig::default();
    let services = RenderServices::without_native_libs(&backend, &config);
    let registry = TextureRegistry::new();

    let resource = make_resource(&registry, &services);
    resource.tag_used(backend.context);

    resource.set_data(None, [WrapMode::Repeat; 3], 0.4, 0, Some(&services));
    assert_eq!(backend.deleted_count(), 1);
    assert!(!resource.has_data());
    assert!(resource.gl_object(&services).is_none());
}

#[test]
fn test_foreign_context_entries_are_deferred() {
    let backend_a = MockBackend::new(1);
    let backend_b = MockBackend::new(2);
    let config = RenderConfig::default();
    let services_a = RenderServices::without_native_libs(&backend_a, &config);
    let services_b = RenderServices::without_native_libs(&backend_b, &config);
    let registry = TextureRegistry::new();

    let resource = TextureResource::new();
    registry.track(&resource);
    resource.set_data(Some(test_image(16)), [WrapMode::Repeat; 3], 0.4, 0, None);
    assert!(resource.gl_object(&services_a).is_some());
    assert!(resource.gl_object(&services_b).is_some());

    // Releasing without any backend parks both handles on the registry.
    resource.release(None);
    assert_eq!(registry.pending_releases(), 2);

    // Each context's end-of-frame drains its own handles only.
    registry.end_frame(&backend_a);
    assert_eq!(backend_a.deleted_count(), 1);
    assert_eq!(registry.pending_releases(), 1);
    registry.end_frame(&backend_b);
    assert_eq!(backend_b.deleted_count(), 1);
    assert_eq!(registry.pending_releases(), 0);
}

#[test]
fn test_context_destruction_prunes_without_gl_calls() {
    let backend_a = MockBackend::new(1);
    let backend_b = MockBackend::new(2);
    let config = RenderConfig::default();
    let services_a = RenderServices::without_native_libs(&backend_a, &config);
    let services_b = RenderServices::without_native_libs(&backend_b, &config);
    let registry = TextureRegistry::new();

    let resource = TextureResource::new();
    registry.track(&resource);
    resource.set_data(Some(test_image(16)), [WrapMode::Repeat; 3], 0.4, 0, None);
    let handle_a = resource.gl_object(&services_a).unwrap();
    assert!(resource.gl_object(&services_b).is_some());

    resource.context_destroyed(backend_b.context);
    assert_eq!(backend_b.deleted_count(), 0, "destroyed context still freed");

    // The surviving context keeps its object.
    assert_eq!(resource.gl_object(&services_a), Some(handle_a));
    assert_eq!(backend_a.created_count(), 1);
}

#[test]
fn test_eviction_callback_runs_outside_the_lock() {
    let backend = MockBackend::new(1);
    let config = RenderConfig::default();
    let services = RenderServices::without_native_libs(&backend, &config);
    let registry = TextureRegistry::new();
    registry.set_max_age(1);

    let resource = TextureResource::new();
    let hits = Arc::new(AtomicUsize::new(0));
    {
        let hits = Arc::clone(&hits);
        let registry_again = registry.clone();
        registry.track_with_callback(&resource, move |count| {
            // Re-entering the registry from the callback must not
            // deadlock; that is the point of invoking it outside the
            // bookkeeping lock.
            let _ = registry_again.pending_releases();
            hits.fetch_add(count, Ordering::SeqCst);
        });
    }
    resource.set_data(Some(test_image(8)), [WrapMode::Repeat; 3], 0.4, 0, None);
    assert!(resource.gl_object(&services).is_some());

    registry.end_frame(&backend); // clears the creation tag
    registry.end_frame(&backend); // ages to 1 and evicts
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(backend.deleted_count(), 1);
}

#[test]
fn test_dropped_resources_park_their_handles() {
    let backend = MockBackend::new(1);
    let registry = TextureRegistry::new();
    {
        let config = RenderConfig::default();
        let services = RenderServices::without_native_libs(&backend, &config);
        let _resource = make_resource(&registry, &services);
        assert_eq!(registry.tracked_count(), 1);
    }
    // The dropped resource left its native object on the deferred list;
    // the next frame of its context group reclaims it.
    assert_eq!(registry.tracked_count(), 0);
    assert_eq!(registry.pending_releases(), 1);
    registry.end_frame(&backend);
    assert_eq!(backend.deleted_count(), 1);
    assert_eq!(registry.pending_releases(), 0);
}
