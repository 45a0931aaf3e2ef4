//! Tile de-interleaving.
//!
//! Tiled cubes store each band as a row-major grid of `TileLines x
//! TileSamples` blocks, each block row-major inside. Tiles on the right and
//! bottom edges are padded to full size when the image extent is not a
//! multiple of the tile size, so the stored value count is
//! `bands * tiles_down * tiles_across * tile_lines * tile_samples`.
//!
//! For band `b`, line `l` and sample `s` (all 0-based) the stored index is
//!
//! ```text
//! ((b * tiles_down + l / TL) * tiles_across + s / TS) * TL * TS
//!     + (l % TL) * TS
//!     + s % TS
//! ```

use isis_common::{IsisError, IsisResult};

use crate::reader::checked_size;

/// Tile geometry of a cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub bands: usize,
    pub lines: usize,
    pub samples: usize,
    pub tile_lines: usize,
    pub tile_samples: usize,
}

impl TileGrid {
    pub fn new(
        bands: usize,
        lines: usize,
        samples: usize,
        tile_lines: usize,
        tile_samples: usize,
    ) -> IsisResult<Self> {
        if tile_lines == 0 || tile_samples == 0 {
            return Err(IsisError::invalid_format(format!(
                "tile size {}x{} must be positive",
                tile_lines, tile_samples
            )));
        }
        let grid = Self {
            bands,
            lines,
            samples,
            tile_lines,
            tile_samples,
        };
        checked_size(&[
            bands,
            grid.tiles_down(),
            grid.tiles_across(),
            tile_lines,
            tile_samples,
        ])?;
        Ok(grid)
    }

    pub fn tiles_across(&self) -> usize {
        self.samples.div_ceil(self.tile_samples)
    }

    pub fn tiles_down(&self) -> usize {
        self.lines.div_ceil(self.tile_lines)
    }

    /// True when a single tile covers each band.
    pub fn is_trivial(&self) -> bool {
        self.tile_lines == self.lines && self.tile_samples == self.samples
    }

    /// Number of values stored on disk, padding included. Checked on
    /// construction.
    pub fn stored_len(&self) -> usize {
        self.bands * self.tiles_down() * self.tiles_across() * self.tile_lines * self.tile_samples
    }

    /// Stored index of (band, line, sample).
    pub fn stored_index(&self, band: usize, line: usize, sample: usize) -> usize {
        let tile = (band * self.tiles_down() + line / self.tile_lines) * self.tiles_across()
            + sample / self.tile_samples;
        tile * self.tile_lines * self.tile_samples
            + (line % self.tile_lines) * self.tile_samples
            + sample % self.tile_samples
    }
}

/// Reorder stored tile values into (band, line, sample) order.
pub fn untile<T: Copy>(raw: &[T], grid: &TileGrid) -> IsisResult<Vec<T>> {
    if raw.len() < grid.stored_len() {
        return Err(IsisError::ShortRead {
            expected: grid.stored_len(),
            actual: raw.len(),
        });
    }

    let mut out = Vec::with_capacity(grid.bands * grid.lines * grid.samples);

    for band in 0..grid.bands {
        for line in 0..grid.lines {
            for tile_col in 0..grid.tiles_across() {
                let first = tile_col * grid.tile_samples;
                let width = grid.tile_samples.min(grid.samples - first);
                let start = grid.stored_index(band, line, first);
                out.extend_from_slice(&raw[start..start + width]);
            }
        }
    }

    Ok(out)
}

/// Pack (band, line, sample) values into stored tile order, padding with
/// `fill`.
pub fn tile<T: Copy>(data: &[T], grid: &TileGrid, fill: T) -> IsisResult<Vec<T>> {
    let expected = grid.bands * grid.lines * grid.samples;
    if data.len() != expected {
        return Err(IsisError::invalid_argument(format!(
            "expected {} values, got {}",
            expected,
            data.len()
        )));
    }

    let mut out = vec![fill; grid.stored_len()];
    for band in 0..grid.bands {
        for line in 0..grid.lines {
            let row = (band * grid.lines + line) * grid.samples;
            for sample in 0..grid.samples {
                out[grid.stored_index(band, line, sample)] = data[row + sample];
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let grid = TileGrid::new(2, 5, 7, 2, 3).unwrap();
        assert_eq!(grid.tiles_across(), 3);
        assert_eq!(grid.tiles_down(), 3);
        assert_eq!(grid.stored_len(), 2 * 3 * 3 * 2 * 3);
        assert!(!grid.is_trivial());
        assert!(TileGrid::new(1, 1, 1, 0, 1).is_err());
    }

    #[test]
    fn test_untile_by_hand() {
        // One band, 2 lines x 4 samples, 2x2 tiles.
        // Tile 0 holds samples 0-1, tile 1 holds samples 2-3.
        let grid = TileGrid::new(1, 2, 4, 2, 2).unwrap();
        let raw = [0, 1, 4, 5, 2, 3, 6, 7];
        assert_eq!(untile(&raw, &grid).unwrap(), vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_untile_padded_edges() {
        // 3 lines x 3 samples in 2x2 tiles, padding marked with -1.
        let grid = TileGrid::new(1, 3, 3, 2, 2).unwrap();
        let raw = [
            0, 1, 3, 4, // tile (0, 0)
            2, -1, 5, -1, // tile (0, 1)
            6, 7, -1, -1, // tile (1, 0)
            8, -1, -1, -1, // tile (1, 1)
        ];
        assert_eq!(
            untile(&raw, &grid).unwrap(),
            vec![0, 1, 2, 3, 4, 5, 6, 7, 8]
        );
    }

    #[test]
    fn test_tile_inverts_untile() {
        let grid = TileGrid::new(3, 7, 5, 4, 2).unwrap();
        let data: Vec<i32> = (0..(3 * 7 * 5)).collect();
        let stored = tile(&data, &grid, -1).unwrap();
        assert_eq!(stored.len(), grid.stored_len());
        assert_eq!(untile(&stored, &grid).unwrap(), data);
    }

    #[test]
    fn test_oversized_grid() {
        assert!(matches!(
            TileGrid::new(2, 1 << 32, 1 << 32, 128, 128),
            Err(IsisError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_short_input() {
        let grid = TileGrid::new(1, 4, 4, 2, 2).unwrap();
        assert!(matches!(
            untile(&[0u8; 10], &grid),
            Err(IsisError::ShortRead { expected: 16, actual: 10 })
        ));
    }
}
