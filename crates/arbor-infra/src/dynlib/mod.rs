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

//! Runtime loading of the optional native libraries.
//!
//! Neither GLU nor simage is a build-time link dependency: each binding
//! probes a prioritized list of candidate filenames at first use,
//! resolves its symbols individually, and degrades to stubs for
//! whatever is missing. A load attempt happens at most once per
//! process: success and failure are both latched.
//!
//! Library handles are retained for the lifetime of the process. Rust
//! has no portable process-exit hook with useful ordering guarantees,
//! and unloading at exit is observationally equivalent to not
//! unloading, so the handles simply live in the latched singletons.

pub mod glu;
pub mod simage;

use std::cell::Cell;

pub use glu::GluBinding;
pub use simage::SimageBinding;

thread_local! {
    /// Guards against a capability table's initializer re-entering
    /// itself (a programmer error, not a runtime condition).
    static INITIALIZING: Cell<bool> = const { Cell::new(false) };
}

/// Runs a binding initializer with the re-entrancy guard held.
pub(crate) fn with_init_guard<T>(f: impl FnOnce() -> T) -> T {
    INITIALIZING.with(|flag| {
        assert!(
            !flag.get(),
            "recursive initialization of a dynamic library binding"
        );
        flag.set(true);
        let result = f();
        flag.set(false);
        result
    })
}

/// A runtime-loaded shared library.
pub(crate) struct RuntimeLibrary {
    library: Option<libloading::Library>,
    name: Option<String>,
}

impl std::fmt::Debug for RuntimeLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeLibrary")
            .field("name", &self.name)
            .finish()
    }
}

impl RuntimeLibrary {
    /// Probes each candidate in order until one loads. An override name
    /// replaces the built-in candidate list entirely. Failure to load
    /// anything is not an error; the result simply reports not-loaded.
    pub(crate) fn load(candidates: &[&str], override_name: Option<&str>, debug: bool) -> Self {
        let names: &[&str] = match &override_name {
            Some(name) => std::slice::from_ref(name),
            None => candidates,
        };

        for &name in names {
            // SAFETY: loading an arbitrary shared library runs its
            // initializers; the candidate lists name well-known system
            // libraries, and the override is an explicit user request.
            match unsafe { libloading::Library::new(name) } {
                Ok(library) => {
                    if debug {
                        log::debug!("Loaded native library {name:?}");
                    }
                    return Self {
                        library: Some(library),
                        name: Some(name.to_string()),
                    };
                }
                Err(err) => {
                    if debug {
                        log::debug!("Candidate {name:?} failed to load: {err}");
                    }
                }
            }
        }
        Self {
            library: None,
            name: None,
        }
    }

    /// Whether a library was loaded.
    pub(crate) fn is_loaded(&self) -> bool {
        self.library.is_some()
    }

    /// The filename the library was loaded under.
    pub(crate) fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Resolves a symbol to a raw value, tolerating absence.
    ///
    /// # Safety
    ///
    /// `T` must match the native symbol's actual type. The returned
    /// value must not outlive the library; bindings uphold this by
    /// living in process-lifetime singletons alongside their library.
    pub(crate) unsafe fn symbol<T: Copy>(&self, name: &[u8], debug: bool) -> Option<T> {
        let library = self.library.as_ref()?;
        match library.get::<T>(name) {
            Ok(sym) => Some(*sym),
            Err(_) => {
                if debug {
                    log::debug!(
                        "Symbol {:?} not found in {:?}",
                        String::from_utf8_lossy(name),
                        self.name
                    );
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_nothing_reports_unloaded() {
        let lib = RuntimeLibrary::load(&["arbor-no-such-library-xyz"], None, false);
        assert!(!lib.is_loaded());
        assert!(lib.name().is_none());
    }

    #[test]
    fn test_init_guard_allows_sequential_use() {
        let a = with_init_guard(|| 1);
        let b = with_init_guard(|| 2);
        assert_eq!(a + b, 3);
    }

    #[test]
    #[should_panic(expected = "recursive initialization")]
    fn test_init_guard_catches_reentrancy() {
        with_init_guard(|| {
            with_init_guard(|| ());
        });
    }
}
