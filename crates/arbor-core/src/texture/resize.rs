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

//! Pure CPU resize kernels: box-filter halving for mipmap chains and
//! nearest-neighbor resampling as the last-resort general resize.
//!
//! All channels are 8-bit. Averaging uses integer arithmetic with a
//! rounding constant followed by a truncating shift (`+1 >> 1`,
//! `+2 >> 2`, `+4 >> 3`); the exact pixel values are part of the
//! contract and covered by tests. The functions are deterministic, have
//! no side effects, and are safe to run concurrently on independent
//! buffers; scratch reuse is the caller's concern.

/// Returns the dimensions of the next mipmap level:
/// each axis is `max(dim / 2, 1)`.
#[inline]
pub fn halved_dims(width: usize, height: usize, depth: usize) -> (usize, usize, usize) {
    ((width / 2).max(1), (height / 2).max(1), (depth / 2).max(1))
}

/// Halves a 2D image with a box filter.
///
/// Requires `width > 1 || height > 1`. Each output pixel averages the
/// 2x2 source block (2x1 or 1x2 along a degenerate one-pixel axis). The
/// result replaces the contents of `dst`.
pub fn halve_image_2d(width: usize, height: usize, components: usize, src: &[u8], dst: &mut Vec<u8>) {
    halve_image_3d(width, height, 1, components, src, dst);
}

/// Halves a 2D or 3D image with a box filter.
///
/// Requires at least one axis larger than one pixel. Degenerate axes
/// contribute a single sample, so the average runs over 2, 4, or 8
/// samples depending on how many axes are non-degenerate. Odd axes clamp
/// the trailing sample to the last texel.
pub fn halve_image_3d(
    width: usize,
    height: usize,
    depth: usize,
    components: usize,
    src: &[u8],
    dst: &mut Vec<u8>,
) {
    assert!(
        width > 1 || height > 1 || depth > 1,
        "halving a 1x1x1 image is a contract violation"
    );
    debug_assert_eq!(src.len(), width * height * depth * components);

    let (out_w, out_h, out_d) = halved_dims(width, height, depth);

    // Per-axis sample offsets: two along live axes, one along degenerate
    // ones.
    let xs: &[usize] = if width > 1 { &[0, 1] } else { &[0] };
    let ys: &[usize] = if height > 1 { &[0, 1] } else { &[0] };
    let zs: &[usize] = if depth > 1 { &[0, 1] } else { &[0] };
    let samples = xs.len() * ys.len() * zs.len();
    let bias = (samples / 2) as u32;
    let shift = samples.trailing_zeros();

    dst.clear();
    dst.reserve(out_w * out_h * out_d * components);

    for oz in 0..out_d {
        for oy in 0..out_h {
            for ox in 0..out_w {
                for c in 0..components {
                    let mut sum = 0u32;
                    for dz in zs {
                        let z = (2 * oz + dz).min(depth - 1);
                        for dy in ys {
                            let y = (2 * oy + dy).min(height - 1);
                            for dx in xs {
                                let x = (2 * ox + dx).min(width - 1);
                                sum += src[((z * height + y) * width + x) * components + c]
                                    as u32;
                            }
                        }
                    }
                    dst.push(((sum + bias) >> shift) as u8);
                }
            }
        }
    }
}

/// Resamples a 2D image to arbitrary target dimensions with
/// nearest-neighbor lookup.
///
/// Each destination pixel maps to a source pixel through an accumulated
/// floating-point step of `src_dim / dst_dim` per axis. This is the
/// low-quality fallback used when no better resize path is available.
pub fn resize_nearest_2d(
    src: &[u8],
    src_w: usize,
    src_h: usize,
    components: usize,
    dst_w: usize,
    dst_h: usize,
    dst: &mut Vec<u8>,
) {
    resize_nearest_3d(src, src_w, src_h, 1, components, dst_w, dst_h, 1, dst);
}

/// Resamples a 2D or 3D image to arbitrary target dimensions with
/// nearest-neighbor lookup.
#[allow(clippy::too_many_arguments)]
pub fn resize_nearest_3d(
    src: &[u8],
    src_w: usize,
    src_h: usize,
    src_d: usize,
    components: usize,
    dst_w: usize,
    dst_h: usize,
    dst_d: usize,
    dst: &mut Vec<u8>,
) {
    debug_assert_eq!(src.len(), src_w * src_h * src_d * components);
    assert!(dst_w > 0 && dst_h > 0 && dst_d > 0);

    let step_x = src_w as f32 / dst_w as f32;
    let step_y = src_h as f32 / dst_h as f32;
    let step_z = src_d as f32 / dst_d as f32;

    dst.clear();
    dst.reserve(dst_w * dst_h * dst_d * components);

    let mut fz = 0.0f32;
    for _ in 0..dst_d {
        let z = (fz as usize).min(src_d - 1);
        let mut fy = 0.0f32;
        for _ in 0..dst_h {
            let y = (fy as usize).min(src_h - 1);
            let mut fx = 0.0f32;
            for _ in 0..dst_w {
                let x = (fx as usize).min(src_w - 1);
                let offset = ((z * src_h + y) * src_w + x) * components;
                dst.extend_from_slice(&src[offset..offset + components]);
                fx += step_x;
            }
            fy += step_y;
        }
        fz += step_z;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkerboard_halving_rounds_to_128() {
        // 4x4 single-channel checkerboard of 0/255: every 2x2 block sums
        // to 510, and (510 + 2) >> 2 == 128.
        let mut src = vec![0u8; 16];
        for y in 0..4 {
            for x in 0..4 {
                if (x + y) % 2 == 0 {
                    src[y * 4 + x] = 255;
                }
            }
        }
        let mut dst = Vec::new();
        halve_image_2d(4, 4, 1, &src, &mut dst);
        assert_eq!(dst, vec![128u8; 4]);
    }

    #[test]
    fn test_uniform_image_is_preserved() {
        let src = vec![77u8; 8 * 8 * 3];
        let mut dst = Vec::new();
        halve_image_2d(8, 8, 3, &src, &mut dst);
        assert_eq!(dst, vec![77u8; 4 * 4 * 3]);
    }

    #[test]
    fn test_one_pixel_axis_averages_in_1d() {
        // A 4x1 row halves to 2x1 with two-sample rounding: (a+b+1) >> 1.
        let src = [10u8, 11, 200, 201];
        let mut dst = Vec::new();
        halve_image_2d(4, 1, 1, &src, &mut dst);
        assert_eq!(
            dst,
            vec![
                ((10u16 + 11 + 1) >> 1) as u8,
                ((200u16 + 201 + 1) >> 1) as u8
            ]
        );
    }

    #[test]
    fn test_volume_halving_eight_samples() {
        // 2x2x2 all-ones volume halves to a single voxel of 1:
        // (8 * 1 + 4) >> 3 == 1.
        let src = vec![1u8; 8];
        let mut dst = Vec::new();
        halve_image_3d(2, 2, 2, 1, &src, &mut dst);
        assert_eq!(dst, vec![1u8]);
    }

    #[test]
    fn test_volume_with_degenerate_depth_matches_2d() {
        let src: Vec<u8> = (0..16).collect();
        let mut flat = Vec::new();
        halve_image_2d(4, 4, 1, &src, &mut flat);
        let mut vol = Vec::new();
        halve_image_3d(4, 4, 1, 1, &src, &mut vol);
        assert_eq!(flat, vol);
    }

    #[test]
    fn test_odd_dimension_clamps_last_sample() {
        // Width 3 halves to 1; the second sample column is clamped.
        let src = [0u8, 100, 200];
        let mut dst = Vec::new();
        halve_image_2d(3, 1, 1, &src, &mut dst);
        assert_eq!(dst, vec![(0 + 100 + 1) >> 1]);
    }

    #[test]
    fn test_nearest_identity() {
        let src: Vec<u8> = (0..27).collect();
        let mut dst = Vec::new();
        resize_nearest_2d(&src, 3, 3, 3, 3, 3, &mut dst);
        assert_eq!(dst, src);
    }

    #[test]
    fn test_nearest_upscale_replicates_pixels() {
        let src = [1u8, 2, 3, 9, 8, 7]; // 1x2 RGB column
        let mut dst = Vec::new();
        resize_nearest_2d(&src, 1, 2, 3, 2, 4, &mut dst);
        assert_eq!(
            dst,
            vec![1, 2, 3, 1, 2, 3, 1, 2, 3, 1, 2, 3, 9, 8, 7, 9, 8, 7, 9, 8, 7, 9, 8, 7]
        );
    }

    #[test]
    fn test_nearest_downscale_picks_stepped_samples() {
        let src: Vec<u8> = (0..8).collect(); // 8x1 single channel
        let mut dst = Vec::new();
        resize_nearest_2d(&src, 8, 1, 1, 4, 1, &mut dst);
        assert_eq!(dst, vec![0, 2, 4, 6]);
    }

    #[test]
    fn test_components_round_trip_losslessly() {
        // Upscale then downscale by the same factor returns the original
        // for nearest-neighbor sampling.
        let src = [5u8, 6, 7, 8, 50, 60, 70, 80]; // 2x1 RGBA
        let mut up = Vec::new();
        resize_nearest_2d(&src, 2, 1, 4, 4, 2, &mut up);
        let mut back = Vec::new();
        resize_nearest_2d(&up, 4, 2, 4, 2, 1, &mut back);
        assert_eq!(back, src);
    }
}
