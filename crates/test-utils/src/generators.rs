//! Synthetic camera grids.
//!
//! All generators return row-major `Vec`s (line 0 first) so they can be fed
//! to the cube builder or wrapped in grids directly.

/// Mask of a disk of `radius` pixels centred on (`line`, `sample`).
pub fn create_disk_mask(
    samples: usize,
    lines: usize,
    center: (f64, f64),
    radius: f64,
) -> Vec<bool> {
    let (cl, cs) = center;
    let mut mask = Vec::with_capacity(samples * lines);
    for line in 0..lines {
        for sample in 0..samples {
            let dl = line as f64 - cl;
            let ds = sample as f64 - cs;
            mask.push(dl * dl + ds * ds <= radius * radius);
        }
    }
    mask
}

/// Mask with a filled rectangle covering lines `l0..l1` and samples
/// `s0..s1` (half-open).
pub fn create_rectangle_mask(
    samples: usize,
    lines: usize,
    l0: usize,
    l1: usize,
    s0: usize,
    s1: usize,
) -> Vec<bool> {
    let mut mask = vec![false; samples * lines];
    for line in l0..l1.min(lines) {
        for sample in s0..s1.min(samples) {
            mask[line * samples + sample] = true;
        }
    }
    mask
}

/// Brightness grid of a lit disk: `value` inside, NaN outside.
pub fn create_disk_grid(
    samples: usize,
    lines: usize,
    center: (f64, f64),
    radius: f64,
    value: f32,
) -> Vec<f32> {
    create_disk_mask(samples, lines, center, radius)
        .into_iter()
        .map(|inside| if inside { value } else { f32::NAN })
        .collect()
}

/// Shift a row-major grid by (`dl`, `ds`) pixels, filling with `fill`.
pub fn shift_grid<T: Copy>(
    data: &[T],
    samples: usize,
    lines: usize,
    dl: isize,
    ds: isize,
    fill: T,
) -> Vec<T> {
    let mut out = vec![fill; samples * lines];
    for line in 0..lines as isize {
        for sample in 0..samples as isize {
            let (src_l, src_s) = (line - dl, sample - ds);
            if src_l >= 0 && src_l < lines as isize && src_s >= 0 && src_s < samples as isize {
                out[(line as usize) * samples + sample as usize] =
                    data[(src_l as usize) * samples + src_s as usize];
            }
        }
    }
    out
}
