//! Two-dimensional raster containers.
//!
//! A [`Grid`] stores one band of a cube as `f32` values in row-major
//! (line, sample) order. Invalid samples are `NaN`; every reduction on a
//! grid skips non-finite values explicitly instead of letting them propagate.
//!
//! A [`Mask`] is the boolean counterpart used for valid/limb pixels and
//! contour edges.

use crate::error::{IsisError, IsisResult};

/// Dense 2-D float raster of shape (lines, samples).
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    lines: usize,
    samples: usize,
    data: Vec<f32>,
}

impl Grid {
    /// Wrap row-major data, checking that its length matches the shape.
    pub fn new(lines: usize, samples: usize, data: Vec<f32>) -> IsisResult<Self> {
        if data.len() != lines * samples {
            return Err(IsisError::invalid_argument(format!(
                "grid data has {} values, expected {} x {} = {}",
                data.len(),
                lines,
                samples,
                lines * samples
            )));
        }
        Ok(Self {
            lines,
            samples,
            data,
        })
    }

    /// Grid with every value set to `value`.
    pub fn filled(lines: usize, samples: usize, value: f32) -> Self {
        Self {
            lines,
            samples,
            data: vec![value; lines * samples],
        }
    }

    /// Build a grid from a function of the 0-based (line, sample) position.
    pub fn from_fn(lines: usize, samples: usize, f: impl Fn(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(lines * samples);
        for line in 0..lines {
            for sample in 0..samples {
                data.push(f(line, sample));
            }
        }
        Self {
            lines,
            samples,
            data,
        }
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Shape as (lines, samples).
    pub fn shape(&self) -> (usize, usize) {
        (self.lines, self.samples)
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Value at a 0-based (line, sample) position.
    pub fn get(&self, line: usize, sample: usize) -> Option<f32> {
        if line < self.lines && sample < self.samples {
            Some(self.data[line * self.samples + sample])
        } else {
            None
        }
    }

    /// Value at a 1-based (sample, line) image position.
    pub fn at(&self, sample: i64, line: i64) -> IsisResult<f32> {
        let s = check_index("Sample", sample, self.samples)?;
        let l = check_index("Line", line, self.lines)?;
        Ok(self.data[l * self.samples + s])
    }

    /// One line of samples.
    pub fn row(&self, line: usize) -> &[f32] {
        let start = line * self.samples;
        &self.data[start..start + self.samples]
    }

    /// Apply a function to every value.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Grid {
        Grid {
            lines: self.lines,
            samples: self.samples,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combine two grids of the same shape value by value.
    pub fn zip_map(&self, other: &Grid, f: impl Fn(f32, f32) -> f32) -> IsisResult<Grid> {
        if self.shape() != other.shape() {
            return Err(IsisError::invalid_argument(format!(
                "grid shapes differ: {:?} vs {:?}",
                self.shape(),
                other.shape()
            )));
        }
        Ok(Grid {
            lines: self.lines,
            samples: self.samples,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Mask of finite values.
    pub fn finite_mask(&self) -> Mask {
        Mask {
            lines: self.lines,
            samples: self.samples,
            data: self.data.iter().map(|v| v.is_finite()).collect(),
        }
    }

    fn finite(&self) -> impl Iterator<Item = f32> + '_ {
        self.data.iter().copied().filter(|v| v.is_finite())
    }

    /// Sum of finite values (0 when there are none).
    pub fn nan_sum(&self) -> f64 {
        self.finite().map(f64::from).sum()
    }

    /// Minimum finite value.
    pub fn nan_min(&self) -> Option<f32> {
        self.finite().reduce(f32::min)
    }

    /// Maximum finite value.
    pub fn nan_max(&self) -> Option<f32> {
        self.finite().reduce(f32::max)
    }

    /// Mean of finite values.
    pub fn nan_mean(&self) -> Option<f64> {
        let (sum, count) = self
            .finite()
            .fold((0.0_f64, 0_usize), |(s, n), v| (s + f64::from(v), n + 1));
        (count > 0).then(|| sum / count as f64)
    }

    /// Per-sample sums over all lines, non-finite values counted as 0.
    pub fn sample_profile(&self) -> Vec<f64> {
        let mut profile = vec![0.0; self.samples];
        for line in 0..self.lines {
            for (acc, &v) in profile.iter_mut().zip(self.row(line)) {
                if v.is_finite() {
                    *acc += f64::from(v);
                }
            }
        }
        profile
    }

    /// Per-line sums over all samples, non-finite values counted as 0.
    pub fn line_profile(&self) -> Vec<f64> {
        (0..self.lines)
            .map(|line| {
                self.row(line)
                    .iter()
                    .filter(|v| v.is_finite())
                    .map(|&v| f64::from(v))
                    .sum()
            })
            .collect()
    }

    /// Values selected by a mask, in row-major order.
    pub fn select(&self, mask: &Mask) -> IsisResult<Vec<f32>> {
        if self.shape() != mask.shape() {
            return Err(IsisError::invalid_argument(format!(
                "mask shape {:?} does not match grid shape {:?}",
                mask.shape(),
                self.shape()
            )));
        }
        Ok(self
            .data
            .iter()
            .zip(&mask.data)
            .filter(|(_, &m)| m)
            .map(|(&v, _)| v)
            .collect())
    }
}

/// Boolean raster of shape (lines, samples).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    lines: usize,
    samples: usize,
    data: Vec<bool>,
}

impl Mask {
    pub fn new(lines: usize, samples: usize, data: Vec<bool>) -> IsisResult<Self> {
        if data.len() != lines * samples {
            return Err(IsisError::invalid_argument(format!(
                "mask data has {} values, expected {}",
                data.len(),
                lines * samples
            )));
        }
        Ok(Self {
            lines,
            samples,
            data,
        })
    }

    pub fn filled(lines: usize, samples: usize, value: bool) -> Self {
        Self {
            lines,
            samples,
            data: vec![value; lines * samples],
        }
    }

    pub fn from_fn(lines: usize, samples: usize, f: impl Fn(usize, usize) -> bool) -> Self {
        let mut data = Vec::with_capacity(lines * samples);
        for line in 0..lines {
            for sample in 0..samples {
                data.push(f(line, sample));
            }
        }
        Self {
            lines,
            samples,
            data,
        }
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.lines, self.samples)
    }

    pub fn data(&self) -> &[bool] {
        &self.data
    }

    /// Value at a 0-based position; out of bounds reads as `false`.
    pub fn get(&self, line: isize, sample: isize) -> bool {
        if line < 0 || sample < 0 {
            return false;
        }
        let (line, sample) = (line as usize, sample as usize);
        line < self.lines && sample < self.samples && self.data[line * self.samples + sample]
    }

    pub fn set(&mut self, line: usize, sample: usize, value: bool) {
        if line < self.lines && sample < self.samples {
            self.data[line * self.samples + sample] = value;
        }
    }

    /// Number of `true` pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn any(&self) -> bool {
        self.data.iter().any(|&v| v)
    }

    /// First `true` pixel in row-major scan order, as (line, sample).
    pub fn first(&self) -> Option<(usize, usize)> {
        self.data
            .iter()
            .position(|&v| v)
            .map(|i| (i / self.samples, i % self.samples))
    }

    /// Logical negation.
    pub fn not(&self) -> Mask {
        Mask {
            lines: self.lines,
            samples: self.samples,
            data: self.data.iter().map(|&v| !v).collect(),
        }
    }

    /// Logical conjunction with a mask of the same shape.
    pub fn and(&self, other: &Mask) -> IsisResult<Mask> {
        if self.shape() != other.shape() {
            return Err(IsisError::invalid_argument(format!(
                "mask shapes differ: {:?} vs {:?}",
                self.shape(),
                other.shape()
            )));
        }
        Ok(Mask {
            lines: self.lines,
            samples: self.samples,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| a && b)
                .collect(),
        })
    }

    /// 0/1 float grid.
    pub fn to_grid(&self) -> Grid {
        Grid {
            lines: self.lines,
            samples: self.samples,
            data: self.data.iter().map(|&v| if v { 1.0 } else { 0.0 }).collect(),
        }
    }
}

/// Convert a 1-based image index into a 0-based offset.
pub fn check_index(axis: &'static str, index: i64, max: usize) -> IsisResult<usize> {
    if index < 1 || index as u64 > max as u64 {
        return Err(IsisError::OutOfRange { axis, index, max });
    }
    Ok((index - 1) as usize)
}
