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

//! Trait seams between the resource/geometry pipelines and their
//! external collaborators: the GL driver and the optional native
//! libraries.

pub mod image_ops;
pub mod tessellator;
pub mod texture_backend;

/// A parsed semantic version of an optional native library.
///
/// Once a capability table is initialized its version never changes, so
/// values of this type are freely shared across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LibraryVersion {
    /// Major version component.
    pub major: u32,
    /// Minor version component.
    pub minor: u32,
    /// Micro (patch/release) version component.
    pub micro: u32,
}

impl LibraryVersion {
    /// Creates a version from its components.
    pub const fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
        }
    }

    /// Parses a free-form version string as reported by a native library.
    ///
    /// Missing minor/micro components default to zero, and trailing text
    /// after the numeric prefix (vendor tags, whitespace) is ignored:
    /// `"1.2.3 NVIDIA"` parses as `1.2.3` and `"2.0"` as `2.0.0`. Input
    /// with no leading number yields `0.0.0` with a logged warning,
    /// never a failure.
    pub fn parse(s: &str) -> Self {
        let mut parts = [0u32; 3];
        let mut idx = 0;
        let mut cur: Option<u32> = None;
        for ch in s.trim().chars() {
            if let Some(d) = ch.to_digit(10) {
                cur = Some(cur.unwrap_or(0).saturating_mul(10).saturating_add(d));
            } else if ch == '.' && cur.is_some() {
                parts[idx] = cur.take().unwrap_or(0);
                idx += 1;
                if idx == 3 {
                    break;
                }
            } else {
                break;
            }
        }
        if idx < 3 {
            if let Some(v) = cur {
                parts[idx] = v;
                idx += 1;
            }
        }
        if idx == 0 {
            log::warn!("Unparsable library version string: {s:?}");
        }
        Self {
            major: parts[0],
            minor: parts[1],
            micro: parts[2],
        }
    }

    /// Lexicographic at-least comparison with early exit.
    pub fn at_least(&self, major: u32, minor: u32, micro: u32) -> bool {
        if self.major != major {
            return self.major > major;
        }
        if self.minor != minor {
            return self.minor > minor;
        }
        self.micro >= micro
    }
}

impl std::fmt::Display for LibraryVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_vendor_suffix() {
        assert_eq!(
            LibraryVersion::parse("1.2.3 NVIDIA"),
            LibraryVersion::new(1, 2, 3)
        );
    }

    #[test]
    fn test_parse_missing_components() {
        assert_eq!(LibraryVersion::parse("2.0"), LibraryVersion::new(2, 0, 0));
        assert_eq!(LibraryVersion::parse("3"), LibraryVersion::new(3, 0, 0));
    }

    #[test]
    fn test_parse_garbage_yields_zero() {
        assert_eq!(LibraryVersion::parse("bogus"), LibraryVersion::default());
        assert_eq!(LibraryVersion::parse(""), LibraryVersion::default());
    }

    #[test]
    fn test_at_least_comparison() {
        let v = LibraryVersion::new(1, 3, 2);
        assert!(v.at_least(1, 3, 2));
        assert!(v.at_least(1, 2, 9));
        assert!(v.at_least(0, 9, 9));
        assert!(!v.at_least(1, 3, 3));
        assert!(!v.at_least(1, 4, 0));
        assert!(!v.at_least(2, 0, 0));
    }
}
