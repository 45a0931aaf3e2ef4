//! Alignment of an image with its navigation backplanes.
//!
//! The planetary disk seen in the data band rarely sits exactly where the
//! navigation says it should. The offset between the two is estimated
//! independently on each axis: the data is summed across lines (resp.
//! samples) into a profile, the navigation mask is reduced the same way,
//! and the lag maximising their cross-correlation gives the shift.
//!
//! Offsets follow a single convention: if the data is displaced by `+d`
//! pixels relative to the navigation, the computed offset is `-d`.
//! [`apply_offset`] with [`AlignTarget::Data`] moves the data back onto
//! the navigation frame, and with [`AlignTarget::Navigation`] moves the
//! navigation onto the data frame.
//!
//! The navigation profile counts valid mask pixels per line (resp. sample)
//! rather than flagging each line with 0 or 1. On limb-clipped disks the
//! peak can therefore land a pixel or two away from a 0/1 profile.

use isis_common::{Grid, IsisError, IsisResult, Mask};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Pixel offset between the data and navigation frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset {
    pub samples: i64,
    pub lines: i64,
}

impl Offset {
    pub const ZERO: Offset = Offset {
        samples: 0,
        lines: 0,
    };

    pub fn new(samples: i64, lines: i64) -> Self {
        Self { samples, lines }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Which frame [`apply_offset`] moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignTarget {
    /// Shift the data band onto the navigation frame.
    Data,
    /// Shift the navigation backplanes onto the data frame.
    Navigation,
}

/// Cross-correlation of `a` with `v`, centred and truncated to `a.len()`.
///
/// `out[i] = sum_n a[n + i - v.len() / 2] * v[n]`, with out-of-range terms
/// dropped.
pub fn correlate_same(a: &[f64], v: &[f64]) -> Vec<f64> {
    let half = (v.len() / 2) as isize;
    (0..a.len() as isize)
        .map(|i| {
            v.iter()
                .enumerate()
                .filter_map(|(n, &vn)| {
                    let k = n as isize + i - half;
                    (k >= 0 && (k as usize) < a.len()).then(|| a[k as usize] * vn)
                })
                .sum()
        })
        .collect()
}

/// Index of the first maximum.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Lag between a data profile and a mask profile of the same length.
fn profile_offset(data: &[f64], mask: &[f64]) -> i64 {
    let corr = correlate_same(data, mask);
    (data.len() / 2) as i64 - argmax(&corr) as i64
}

fn has_signal(profile: &[f64]) -> bool {
    profile.iter().any(|&v| v != 0.0)
}

/// Estimate the offset between a data band and a navigation mask.
///
/// Non-finite data values count as zero. When either input carries no
/// signal the offset is zero.
pub fn compute_offset(data: &Grid, mask: &Mask) -> IsisResult<Offset> {
    if data.shape() != mask.shape() {
        return Err(IsisError::invalid_argument(format!(
            "cannot align data of shape {:?} with mask of shape {:?}",
            data.shape(),
            mask.shape()
        )));
    }

    let counts = mask.to_grid();
    let (data_s, mask_s) = (data.sample_profile(), counts.sample_profile());
    let (data_l, mask_l) = (data.line_profile(), counts.line_profile());

    if !has_signal(&data_s) || !has_signal(&mask_s) {
        warn!(
            shape = ?data.shape(),
            "No signal to correlate, assuming aligned frames"
        );
        return Ok(Offset::ZERO);
    }

    let offset = Offset {
        samples: profile_offset(&data_s, &mask_s),
        lines: profile_offset(&data_l, &mask_l),
    };
    info!(
        samples = offset.samples,
        lines = offset.lines,
        "Computed navigation offset"
    );
    Ok(offset)
}

/// Shift a grid by `offset`, filling exposed pixels with NaN.
///
/// - `Data`: `out[l][s] = grid[l - lines][s - samples]`
/// - `Navigation`: `out[l][s] = grid[l + lines][s + samples]`
pub fn apply_offset(grid: &Grid, offset: Offset, target: AlignTarget) -> Grid {
    if offset.is_zero() {
        return grid.clone();
    }
    let (dl, ds) = match target {
        AlignTarget::Data => (-offset.lines, -offset.samples),
        AlignTarget::Navigation => (offset.lines, offset.samples),
    };
    debug!(dl, ds, ?target, "Shifting grid");

    let (lines, samples) = (grid.lines() as i64, grid.samples() as i64);
    Grid::from_fn(grid.lines(), grid.samples(), |l, s| {
        let (src_l, src_s) = (l as i64 + dl, s as i64 + ds);
        if (0..lines).contains(&src_l) && (0..samples).contains(&src_s) {
            grid.get(src_l as usize, src_s as usize).unwrap_or(f32::NAN)
        } else {
            f32::NAN
        }
    })
}
