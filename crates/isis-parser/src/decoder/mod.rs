//! Raster decoding.
//!
//! Reads the raster body addressed by `IsisCube.Core`, reorders tiled
//! storage into (band, line, sample) order, applies `Base`/`Multiplier`
//! and replaces special float values:
//!
//! - values equal to the type minimum mark saturated pixels and take the
//!   largest valid value of the cube;
//! - values whose magnitude is within `tolerance` of the type range are
//!   NULL and become NaN.

pub mod tiles;

use std::path::Path;

use tracing::{debug, instrument, warn};

use isis_common::{Grid, IsisError, IsisResult};

use crate::encoding::{ByteOrder, NumericType};
use crate::pvl::PvlBlock;
use crate::reader::{checked_size, label_size, read_at, start_offset};

pub use tiles::{tile, untile, TileGrid};

/// Default relative tolerance for NULL detection.
pub const DEFAULT_NULL_TOLERANCE: f64 = 1e-6;

/// Storage order of the raster body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tiling {
    BandSequential,
    Tile {
        tile_samples: usize,
        tile_lines: usize,
    },
}

/// Everything needed to locate and decode the raster.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterLayout {
    pub bands: usize,
    pub lines: usize,
    pub samples: usize,
    pub pixel_type: NumericType,
    pub byte_order: ByteOrder,
    pub base: f64,
    pub multiplier: f64,
    /// 0-based offset of the first raster byte.
    pub offset: u64,
    pub tiling: Tiling,
}

impl RasterLayout {
    /// Build the layout from the `IsisCube.Core` object.
    pub fn from_core(core: &PvlBlock) -> IsisResult<Self> {
        let dims = core
            .block("Dimensions")
            .ok_or_else(|| IsisError::key_not_found("Core.Dimensions"))?;
        let pixels = core
            .block("Pixels")
            .ok_or_else(|| IsisError::key_not_found("Core.Pixels"))?;

        let bands = positive(dims, "Bands")?;
        let lines = positive(dims, "Lines")?;
        let samples = positive(dims, "Samples")?;

        let tiling = match core.get("Format").and_then(|v| v.as_str()) {
            Some("BandSequential") => Tiling::BandSequential,
            Some("Tile") | None => Tiling::Tile {
                tile_samples: positive(core, "TileSamples")?,
                tile_lines: positive(core, "TileLines")?,
            },
            Some(other) => {
                return Err(IsisError::unsupported(format!("cube format `{}`", other)));
            }
        };

        let layout = Self {
            bands,
            lines,
            samples,
            pixel_type: NumericType::from_label(pixels.require_str("Type")?)?,
            byte_order: ByteOrder::from_label(pixels.require_str("ByteOrder")?)?,
            base: pixels.get("Base").and_then(|v| v.as_f64()).unwrap_or(0.0),
            multiplier: pixels
                .get("Multiplier")
                .and_then(|v| v.as_f64())
                .unwrap_or(1.0),
            offset: start_offset(core.require_i64("StartByte")?)?,
            tiling,
        };
        layout.stored_bytes()?;
        Ok(layout)
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.bands, self.lines, self.samples)
    }

    /// Tile geometry, `None` when the body is a plain (band, line, sample)
    /// array.
    pub fn tile_grid(&self) -> IsisResult<Option<TileGrid>> {
        match self.tiling {
            Tiling::BandSequential => Ok(None),
            Tiling::Tile {
                tile_samples,
                tile_lines,
            } => {
                let grid =
                    TileGrid::new(self.bands, self.lines, self.samples, tile_lines, tile_samples)?;
                Ok((!grid.is_trivial()).then_some(grid))
            }
        }
    }

    /// Number of values stored on disk.
    pub fn stored_len(&self) -> IsisResult<usize> {
        Ok(match self.tile_grid()? {
            Some(grid) => grid.stored_len(),
            None => checked_size(&[self.bands, self.lines, self.samples])?,
        })
    }

    pub fn stored_bytes(&self) -> IsisResult<usize> {
        checked_size(&[self.stored_len()?, self.pixel_type.item_size()])
    }
}

fn positive(block: &PvlBlock, key: &str) -> IsisResult<usize> {
    let value = block.require_i64(key)?;
    if value < 1 {
        return Err(IsisError::invalid_format(format!(
            "`{}` must be positive, got {}",
            key, value
        )));
    }
    label_size(key, value)
}

/// Decoded cube values, NaN marks invalid samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    bands: usize,
    lines: usize,
    samples: usize,
    data: Vec<f32>,
}

impl Cube {
    pub fn new(bands: usize, lines: usize, samples: usize, data: Vec<f32>) -> IsisResult<Self> {
        let expected = checked_size(&[bands, lines, samples])?;
        if data.len() != expected {
            return Err(IsisError::invalid_argument(format!(
                "cube of shape ({}, {}, {}) needs {} values, got {}",
                bands,
                lines,
                samples,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            bands,
            lines,
            samples,
            data,
        })
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.bands, self.lines, self.samples)
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Values of a band (0-based).
    pub fn band(&self, index: usize) -> IsisResult<&[f32]> {
        if index >= self.bands {
            return Err(IsisError::invalid_argument(format!(
                "band index {} out of {} bands",
                index, self.bands
            )));
        }
        let size = self.lines * self.samples;
        Ok(&self.data[index * size..(index + 1) * size])
    }

    /// Owned copy of a band as a grid.
    pub fn band_grid(&self, index: usize) -> IsisResult<Grid> {
        Grid::new(self.lines, self.samples, self.band(index)?.to_vec())
    }
}

/// Read and decode the raster of `path`.
#[instrument(skip(path, layout), fields(path = %path.display()))]
pub fn decode(path: &Path, layout: &RasterLayout, tolerance: f64) -> IsisResult<Cube> {
    let bytes = read_at(path, layout.offset, layout.stored_bytes()?)?;
    decode_bytes(&bytes, layout, tolerance)
}

/// Decode a raw raster body.
pub fn decode_bytes(bytes: &[u8], layout: &RasterLayout, tolerance: f64) -> IsisResult<Cube> {
    let expected = layout.stored_bytes()?;
    if bytes.len() < expected {
        return Err(IsisError::ShortRead {
            expected,
            actual: bytes.len(),
        });
    }

    let raw = layout
        .pixel_type
        .read_all(&bytes[..expected], layout.byte_order);

    let mut values = match layout.tile_grid()? {
        Some(grid) => {
            debug!(
                tile_lines = grid.tile_lines,
                tile_samples = grid.tile_samples,
                tiles_across = grid.tiles_across(),
                tiles_down = grid.tiles_down(),
                "Untiling raster"
            );
            untile(&raw, &grid)?
        }
        None => raw,
    };

    for v in values.iter_mut() {
        *v = *v * layout.multiplier + layout.base;
    }

    if layout.pixel_type.is_float() {
        sanitize(&mut values, layout.pixel_type, tolerance);
    }

    Cube::new(
        layout.bands,
        layout.lines,
        layout.samples,
        values.into_iter().map(|v| v as f32).collect(),
    )
}

/// Replace saturated and NULL float values in place.
pub fn sanitize(values: &mut [f64], pixel_type: NumericType, tolerance: f64) {
    let min = pixel_type.min_value();
    let max = pixel_type.max_value();
    let is_null = |v: f64| (v / min).abs() >= tolerance || (v / max).abs() >= tolerance;

    let dmax = values
        .iter()
        .copied()
        .filter(|v| v.is_finite() && !is_null(*v))
        .fold(f64::NAN, f64::max);

    let mut saturated = 0usize;
    let mut nulls = 0usize;
    for v in values.iter_mut() {
        if *v == min {
            *v = dmax;
            saturated += 1;
        } else if is_null(*v) {
            *v = f64::NAN;
            nulls += 1;
        }
    }

    if saturated > 0 {
        warn!(saturated, dmax, "Replaced saturated pixels with cube maximum");
    }
    debug!(nulls, "NULL pixels set to NaN");
}
