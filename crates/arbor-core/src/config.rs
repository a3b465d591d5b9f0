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

//! Runtime configuration for the texture and NURBS pipelines.
//!
//! The configuration is an explicit struct constructed once (normally
//! from the environment at startup) and passed by reference into the
//! pipelines. There is no hidden global state; tests construct values
//! directly or inject a custom lookup.
//!
//! Boolean variables are truthy for any positive integer string. Float
//! thresholds must lie in `[0, 1]`; out-of-range or unparsable values
//! silently keep the documented default.

/// Tuning and diagnostic configuration, normally read from the
/// environment once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Verbose diagnostics for the GLU binding (`ARBOR_DEBUG_GLU_INFO`).
    pub debug_glu: bool,
    /// Verbose diagnostics for the simage binding
    /// (`ARBOR_DEBUG_SIMAGE`).
    pub debug_simage: bool,
    /// Verbose diagnostics for NURBS sampling decisions
    /// (`ARBOR_DEBUG_NURBS_COMPLEXITY`).
    pub debug_nurbs_complexity: bool,

    /// Override for the GLU candidate library filename
    /// (`ARBOR_GLU_LIBNAME`).
    pub glu_libname: Option<String>,
    /// Override for the simage candidate library filename
    /// (`ARBOR_SIMAGE_LIBNAME`).
    pub simage_libname: Option<String>,
    /// Override for the detected GLU version string, for testing
    /// fallback behavior (`ARBOR_DEBUG_GLU_VERSION`).
    pub glu_version_override: Option<String>,

    /// Quality threshold above which magnification uses linear
    /// filtering (`ARBOR_TEX2_LINEAR_LIMIT`, default 0.2).
    pub tex_linear_limit: f32,
    /// Quality threshold above which mipmaps are used at all
    /// (`ARBOR_TEX2_MIPMAP_LIMIT`, default 0.5).
    pub tex_mipmap_limit: f32,
    /// Quality threshold above which mipmap levels are blended
    /// (`ARBOR_TEX2_LINEAR_MIPMAP_LIMIT`, default 0.8).
    pub tex_linear_mipmap_limit: f32,
    /// Quality threshold below which legalization prefers the smaller
    /// power of two for near-pow2 images
    /// (`ARBOR_TEX2_SCALEUP_LIMIT`, default 0.7).
    pub tex_scaleup_limit: f32,
    /// Quality threshold above which anisotropic filtering is enabled
    /// (`ARBOR_TEX2_ANISOTROPIC_LIMIT`, default 0.85).
    pub tex_anisotropic_limit: f32,

    /// Enables the in-place sub-image update fast path
    /// (`ARBOR_TEX2_USE_GLTEXSUBIMAGE`). Off by default: a performance
    /// path only, historically unreliable on some drivers.
    pub use_tex_sub_image: bool,
    /// Enables hardware mipmap generation when the driver offers it
    /// (`ARBOR_TEX2_USE_SGIS_GENERATE_MIPMAP`).
    pub use_hw_mipmaps: bool,
    /// Maps legacy clamp wrapping to the conformant clamp-to-edge enum
    /// (`ARBOR_ENABLE_CONFORMANT_GL_CLAMP`).
    pub conformant_clamp: bool,
    /// Collapses sampling along linear parametric axes
    /// (`ARBOR_REDUCE_LINEAR_NURBS_STEPS`).
    pub reduce_linear_nurbs_steps: bool,
    /// Selects the earlier generation of the complexity-to-steps
    /// formulas (`ARBOR_OLD_NURBS_COMPLEXITY`).
    pub old_nurbs_complexity: bool,
    /// Forces tiled offscreen rendering even when the target fits in
    /// one pass (`ARBOR_FORCE_TILED_OFFSCREENRENDERING`).
    pub force_tiled_offscreen: bool,
    /// Computes analytic NURBS normals
    /// (`ARBOR_CALCULATE_NURBS_NORMALS`, default on).
    pub calculate_nurbs_normals: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            debug_glu: false,
            debug_simage: false,
            debug_nurbs_complexity: false,
            glu_libname: None,
            simage_libname: None,
            glu_version_override: None,
            tex_linear_limit: 0.2,
            tex_mipmap_limit: 0.5,
            tex_linear_mipmap_limit: 0.8,
            tex_scaleup_limit: 0.7,
            tex_anisotropic_limit: 0.85,
            use_tex_sub_image: false,
            use_hw_mipmaps: false,
            conformant_clamp: false,
            reduce_linear_nurbs_steps: false,
            old_nurbs_complexity: false,
            force_tiled_offscreen: false,
            calculate_nurbs_normals: true,
        }
    }
}

impl RenderConfig {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Exposed so tests can inject variables without touching the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        cfg.debug_glu = flag(&lookup, "ARBOR_DEBUG_GLU_INFO", cfg.debug_glu);
        cfg.debug_simage = flag(&lookup, "ARBOR_DEBUG_SIMAGE", cfg.debug_simage);
        cfg.debug_nurbs_complexity = flag(
            &lookup,
            "ARBOR_DEBUG_NURBS_COMPLEXITY",
            cfg.debug_nurbs_complexity,
        );

        cfg.glu_libname = lookup("ARBOR_GLU_LIBNAME").filter(|s| !s.is_empty());
        cfg.simage_libname = lookup("ARBOR_SIMAGE_LIBNAME").filter(|s| !s.is_empty());
        cfg.glu_version_override = lookup("ARBOR_DEBUG_GLU_VERSION").filter(|s| !s.is_empty());

        cfg.tex_linear_limit = limit(&lookup, "ARBOR_TEX2_LINEAR_LIMIT", cfg.tex_linear_limit);
        cfg.tex_mipmap_limit = limit(&lookup, "ARBOR_TEX2_MIPMAP_LIMIT", cfg.tex_mipmap_limit);
        cfg.tex_linear_mipmap_limit = limit(
            &lookup,
            "ARBOR_TEX2_LINEAR_MIPMAP_LIMIT",
            cfg.tex_linear_mipmap_limit,
        );
        cfg.tex_scaleup_limit = limit(&lookup, "ARBOR_TEX2_SCALEUP_LIMIT", cfg.tex_scaleup_limit);
        cfg.tex_anisotropic_limit = limit(
            &lookup,
            "ARBOR_TEX2_ANISOTROPIC_LIMIT",
            cfg.tex_anisotropic_limit,
        );

        cfg.use_tex_sub_image = flag(&lookup, "ARBOR_TEX2_USE_GLTEXSUBIMAGE", cfg.use_tex_sub_image);
        cfg.use_hw_mipmaps = flag(
            &lookup,
            "ARBOR_TEX2_USE_SGIS_GENERATE_MIPMAP",
            cfg.use_hw_mipmaps,
        );
        cfg.conformant_clamp = flag(
            &lookup,
            "ARBOR_ENABLE_CONFORMANT_GL_CLAMP",
            cfg.conformant_clamp,
        );
        cfg.reduce_linear_nurbs_steps = flag(
            &lookup,
            "ARBOR_REDUCE_LINEAR_NURBS_STEPS",
            cfg.reduce_linear_nurbs_steps,
        );
        cfg.old_nurbs_complexity = flag(
            &lookup,
            "ARBOR_OLD_NURBS_COMPLEXITY",
            cfg.old_nurbs_complexity,
        );
        cfg.force_tiled_offscreen = flag(
            &lookup,
            "ARBOR_FORCE_TILED_OFFSCREENRENDERING",
            cfg.force_tiled_offscreen,
        );
        cfg.calculate_nurbs_normals = flag(
            &lookup,
            "ARBOR_CALCULATE_NURBS_NORMALS",
            cfg.calculate_nurbs_normals,
        );

        cfg
    }
}

/// Truthy = any positive integer string.
fn flag<F>(lookup: &F, name: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(v) => match v.trim().parse::<i64>() {
            Ok(n) => n > 0,
            Err(_) => default,
        },
        None => default,
    }
}

/// Float threshold restricted to `[0, 1]`; anything else keeps the
/// default.
fn limit<F>(lookup: &F, name: &str, default: f32) -> f32
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(v) => match v.trim().parse::<f32>() {
            Ok(x) if (0.0..=1.0).contains(&x) => x,
            _ => default,
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documentation() {
        let cfg = RenderConfig::default();
        assert_eq!(cfg.tex_linear_limit, 0.2);
        assert_eq!(cfg.tex_mipmap_limit, 0.5);
        assert_eq!(cfg.tex_linear_mipmap_limit, 0.8);
        assert_eq!(cfg.tex_scaleup_limit, 0.7);
        assert_eq!(cfg.tex_anisotropic_limit, 0.85);
        assert!(!cfg.use_tex_sub_image);
        assert!(cfg.calculate_nurbs_normals);
    }

    #[test]
    fn test_truthy_flags_are_positive_integers() {
        let cfg = RenderConfig::from_lookup(|name| match name {
            "ARBOR_TEX2_USE_GLTEXSUBIMAGE" => Some("1".into()),
            "ARBOR_TEX2_USE_SGIS_GENERATE_MIPMAP" => Some("0".into()),
            "ARBOR_ENABLE_CONFORMANT_GL_CLAMP" => Some("yes".into()),
            "ARBOR_CALCULATE_NURBS_NORMALS" => Some("-3".into()),
            _ => None,
        });
        assert!(cfg.use_tex_sub_image);
        assert!(!cfg.use_hw_mipmaps);
        // Non-numeric keeps the default.
        assert!(!cfg.conformant_clamp);
        assert!(!cfg.calculate_nurbs_normals);
    }

    #[test]
    fn test_out_of_range_limits_fall_back() {
        let cfg = RenderConfig::from_lookup(|name| match name {
            "ARBOR_TEX2_LINEAR_LIMIT" => Some("0.35".into()),
            "ARBOR_TEX2_MIPMAP_LIMIT" => Some("1.5".into()),
            "ARBOR_TEX2_SCALEUP_LIMIT" => Some("nan".into()),
            _ => None,
        });
        assert_eq!(cfg.tex_linear_limit, 0.35);
        assert_eq!(cfg.tex_mipmap_limit, 0.5);
        assert_eq!(cfg.tex_scaleup_limit, 0.7);
    }

    #[test]
    fn test_library_name_overrides() {
        let cfg = RenderConfig::from_lookup(|name| match name {
            "ARBOR_GLU_LIBNAME" => Some("libGLU.so.1.alt".into()),
            "ARBOR_DEBUG_GLU_VERSION" => Some("1.1".into()),
            _ => None,
        });
        assert_eq!(cfg.glu_libname.as_deref(), Some("libGLU.so.1.alt"));
        assert_eq!(cfg.glu_version_override.as_deref(), Some("1.1"));
        assert!(cfg.simage_libname.is_none());
    }
}
