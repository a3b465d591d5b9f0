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

//! Tiled offscreen readback: renders an oversized target in canvas-size
//! tiles and stitches the per-tile pixel reads into one contiguous
//! row-major buffer.

use arbor_core::RenderConfig;
use thiserror::Error;

/// A failure while stitching a tiled readback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OffscreenError {
    /// The tile source reported a render failure.
    #[error("tile source aborted at {0:?}")]
    TileAborted(TileRegion),
    /// The tile source produced a buffer of the wrong size.
    #[error("tile {region:?} produced {got} bytes, expected {expected}")]
    TileSizeMismatch {
        /// The offending tile.
        region: TileRegion,
        /// Bytes received.
        got: usize,
        /// Bytes the tile's dimensions call for.
        expected: usize,
    },
}

/// One tile of the full target, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRegion {
    /// Left edge within the full image.
    pub x: usize,
    /// Top edge within the full image.
    pub y: usize,
    /// Tile width; edge tiles may be smaller than the canvas.
    pub width: usize,
    /// Tile height; edge tiles may be smaller than the canvas.
    pub height: usize,
}

/// Renders one tile at a time into a caller-provided buffer.
///
/// Implementations set up a sub-frustum covering `region`, render, and
/// read the pixels back row-major into `pixels` (exactly
/// `region.width * region.height * components` bytes). Returning `false`
/// aborts the stitch.
pub trait TileSource {
    /// Renders `region` and reads its pixels into `pixels`.
    fn render_tile(&mut self, region: TileRegion, pixels: &mut Vec<u8>) -> bool;
}

/// Coordinates tiled rendering of a target that may exceed the largest
/// single-pass canvas.
#[derive(Debug, Clone)]
pub struct TiledReadback {
    width: usize,
    height: usize,
    components: usize,
    canvas_w: usize,
    canvas_h: usize,
    forced: bool,
}

impl TiledReadback {
    /// Creates a readback plan for a `width x height` target given the
    /// largest canvas the context can render in one pass.
    pub fn new(
        width: usize,
        height: usize,
        components: usize,
        max_canvas: (usize, usize),
        config: &RenderConfig,
    ) -> Self {
        Self {
            width,
            height,
            components,
            canvas_w: max_canvas.0.max(1),
            canvas_h: max_canvas.1.max(1),
            forced: config.force_tiled_offscreen,
        }
    }

    /// Whether the target actually needs (or is forced into) tiling.
    pub fn is_tiled(&self) -> bool {
        self.forced || self.width > self.canvas_w || self.height > self.canvas_h
    }

    /// The tile grid in row-major order. A single full-size tile when
    /// tiling is not needed.
    pub fn tiles(&self) -> Vec<TileRegion> {
        if !self.is_tiled() {
            return vec![TileRegion {
                x: 0,
                y: 0,
                width: self.width,
                height: self.height,
            }];
        }
        let mut tiles = Vec::new();
        let mut y = 0;
        while y < self.height {
            let h = self.canvas_h.min(self.height - y);
            let mut x = 0;
            while x < self.width {
                let w = self.canvas_w.min(self.width - x);
                tiles.push(TileRegion {
                    x,
                    y,
                    width: w,
                    height: h,
                });
                x += w;
            }
            y += h;
        }
        tiles
    }

    /// Renders every tile through `source` and stitches the results.
    pub fn render(&self, source: &mut dyn TileSource) -> Result<Vec<u8>, OffscreenError> {
        let row_bytes = self.width * self.components;
        let mut out = vec![0u8; row_bytes * self.height];
        let mut tile_pixels = Vec::new();

        for tile in self.tiles() {
            tile_pixels.clear();
            if !source.render_tile(tile, &mut tile_pixels) {
                log::warn!("Tile source aborted at {tile:?}");
                return Err(OffscreenError::TileAborted(tile));
            }
            let expected = tile.width * tile.height * self.components;
            if tile_pixels.len() != expected {
                return Err(OffscreenError::TileSizeMismatch {
                    region: tile,
                    got: tile_pixels.len(),
                    expected,
                });
            }
            let tile_row = tile.width * self.components;
            for row in 0..tile.height {
                let src = &tile_pixels[row * tile_row..(row + 1) * tile_row];
                let dst_offset = (tile.y + row) * row_bytes + tile.x * self.components;
                out[dst_offset..dst_offset + tile_row].copy_from_slice(src);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fills each pixel with its global coordinates so stitching
    /// mistakes are visible.
    struct CoordinateSource;

    impl TileSource for CoordinateSource {
        fn render_tile(&mut self, region: TileRegion, pixels: &mut Vec<u8>) -> bool {
            for y in 0..region.height {
                for x in 0..region.width {
                    pixels.push((region.x + x) as u8);
                    pixels.push((region.y + y) as u8);
                }
            }
            true
        }
    }

    #[test]
    fn test_single_pass_when_target_fits() {
        let config = RenderConfig::default();
        let plan = TiledReadback::new(100, 60, 2, (128, 128), &config);
        assert!(!plan.is_tiled());
        assert_eq!(plan.tiles().len(), 1);
    }

    #[test]
    fn test_forced_tiling_toggle() {
        let mut config = RenderConfig::default();
        config.force_tiled_offscreen = true;
        let plan = TiledReadback::new(100, 60, 2, (64, 64), &config);
        assert!(plan.is_tiled());
    }

    #[test]
    fn test_edge_tiles_cover_remainders() {
        let config = RenderConfig::default();
        let plan = TiledReadback::new(100, 70, 1, (64, 64), &config);
        let tiles = plan.tiles();
        assert_eq!(tiles.len(), 4);
        let area: usize = tiles.iter().map(|t| t.width * t.height).sum();
        assert_eq!(area, 100 * 70);
        assert_eq!(tiles[1], TileRegion { x: 64, y: 0, width: 36, height: 64 });
        assert_eq!(tiles[3], TileRegion { x: 64, y: 64, width: 36, height: 6 });
    }

    #[test]
    fn test_stitched_pixels_keep_global_coordinates() {
        let config = RenderConfig::default();
        let plan = TiledReadback::new(150, 90, 2, (64, 64), &config);
        let out = plan.render(&mut CoordinateSource).unwrap();
        for y in (0..90).step_by(7) {
            for x in (0..150).step_by(11) {
                let off = (y * 150 + x) * 2;
                assert_eq!(out[off], x as u8, "x at ({x},{y})");
                assert_eq!(out[off + 1], y as u8, "y at ({x},{y})");
            }
        }
    }

    #[test]
    fn test_wrong_tile_size_is_an_error() {
        struct ShortSource;
        impl TileSource for ShortSource {
            fn render_tile(&mut self, _region: TileRegion, pixels: &mut Vec<u8>) -> bool {
                pixels.push(0);
                true
            }
        }
        let config = RenderConfig::default();
        let plan = TiledReadback::new(10, 10, 1, (4, 4), &config);
        match plan.render(&mut ShortSource) {
            Err(OffscreenError::TileSizeMismatch { got, expected, .. }) => {
                assert_eq!(got, 1);
                assert_eq!(expected, 16);
            }
            other => panic!("expected a size mismatch, got {other:?}"),
        }
    }
}
