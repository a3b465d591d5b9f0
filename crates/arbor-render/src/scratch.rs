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

//! Per-thread scratch buffers for the resize and surface-evaluation hot
//! paths.
//!
//! Each calling thread gets its own arena, so concurrent rendering into
//! distinct GL contexts never contends on scratch storage. Buffers are
//! handed out cleared and returned to the pool when the closure exits.

use std::cell::RefCell;

thread_local! {
    static BYTE_POOL: RefCell<Vec<Vec<u8>>> = const { RefCell::new(Vec::new()) };
    static FLOAT_POOL: RefCell<Vec<Vec<f32>>> = const { RefCell::new(Vec::new()) };
}

/// Runs `f` with a pooled byte buffer (cleared, capacity retained).
pub fn with_byte_buffer<R>(f: impl FnOnce(&mut Vec<u8>) -> R) -> R {
    let mut buf = BYTE_POOL.with(|p| p.borrow_mut().pop()).unwrap_or_default();
    buf.clear();
    let result = f(&mut buf);
    BYTE_POOL.with(|p| p.borrow_mut().push(buf));
    result
}

/// Runs `f` with a pooled float buffer (cleared, capacity retained).
pub fn with_float_buffer<R>(f: impl FnOnce(&mut Vec<f32>) -> R) -> R {
    let mut buf = FLOAT_POOL.with(|p| p.borrow_mut().pop()).unwrap_or_default();
    buf.clear();
    let result = f(&mut buf);
    FLOAT_POOL.with(|p| p.borrow_mut().push(buf));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffers_are_handed_out_empty() {
        with_byte_buffer(|b| {
            b.extend_from_slice(&[1, 2, 3]);
        });
        with_byte_buffer(|b| {
            assert!(b.is_empty());
        });
    }

    #[test]
    fn test_nested_buffers_are_distinct() {
        with_float_buffer(|a| {
            a.push(1.0);
            with_float_buffer(|b| {
                assert!(b.is_empty());
                b.push(2.0);
            });
            assert_eq!(a.len(), 1);
        });
    }
}
