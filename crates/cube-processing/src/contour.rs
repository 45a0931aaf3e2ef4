//! Closed outline tracing on boolean masks.
//!
//! Outlines are followed one pixel at a time over the 8-neighbourhood of
//! an edge mask. After each move the neighbour search restarts three
//! directions clockwise of the reverse heading, which keeps the tracer
//! hugging the outside of the shape.

use isis_common::{IsisError, IsisResult, Mask};
use tracing::debug;

/// Neighbour offsets (line, sample), clockwise from the upper-left.
const COMPASS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
];

/// A traced outline as 0-based (line, sample) pixels.
///
/// A closed contour ends on its starting pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    points: Vec<(usize, usize)>,
}

impl Contour {
    pub fn points(&self) -> &[(usize, usize)] {
        &self.points
    }

    pub fn lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.points.iter().map(|&(l, _)| l)
    }

    pub fn samples(&self) -> impl Iterator<Item = usize> + '_ {
        self.points.iter().map(|&(_, s)| s)
    }

    /// Number of points, closing point included.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of distinct pixels on the outline.
    pub fn vertex_count(&self) -> usize {
        if self.is_closed() && self.points.len() > 1 {
            self.points.len() - 1
        } else {
            self.points.len()
        }
    }

    pub fn is_closed(&self) -> bool {
        !self.points.is_empty() && self.points.first() == self.points.last()
    }
}

/// Pixels of `mask` with at least one 4-neighbour outside the mask.
///
/// The image border counts as outside.
pub fn edges(mask: &Mask) -> Mask {
    Mask::from_fn(mask.lines(), mask.samples(), |l, s| {
        let (l, s) = (l as isize, s as isize);
        mask.get(l, s)
            && !(mask.get(l - 1, s)
                && mask.get(l, s + 1)
                && mask.get(l + 1, s)
                && mask.get(l, s - 1))
    })
}

/// Trace the outline starting at the first set pixel and clear it.
fn trace_in_place(mask: &mut Mask) -> IsisResult<Contour> {
    let (l0, s0) = mask
        .first()
        .ok_or_else(|| IsisError::invalid_argument("cannot trace an empty mask"))?;

    let max_steps = 2 * mask.count();
    let start = (l0 as isize, s0 as isize);
    let (mut l, mut s) = start;
    let mut points = vec![(l0, s0)];
    let mut first_dir = 0;
    let mut closed = false;

    for _ in 0..max_steps {
        for k in 0..COMPASS.len() {
            let dir = (first_dir + k) % COMPASS.len();
            let (dl, ds) = COMPASS[dir];
            if mask.get(l + dl, s + ds) {
                l += dl;
                s += ds;
                points.push((l as usize, s as usize));
                first_dir = (dir + 5) % COMPASS.len();
                break;
            }
        }
        if (l, s) == start {
            closed = true;
            break;
        }
    }

    if !closed {
        return Err(IsisError::UnclosablePath {
            line: l0,
            sample: s0,
            steps: max_steps,
        });
    }

    for &(l, s) in &points {
        mask.set(l, s, false);
    }
    Ok(Contour { points })
}

/// Trace one closed outline of an edge mask.
///
/// Returns the contour and the mask with the contour's pixels cleared.
pub fn trace_one(mask: &Mask) -> IsisResult<(Contour, Mask)> {
    let mut remaining = mask.clone();
    let contour = trace_in_place(&mut remaining)?;
    Ok((contour, remaining))
}

/// Trace every outline of an edge mask, keeping those longer than
/// `min_length` points.
///
/// Tracing stops once fewer than `min_length` pixels remain.
pub fn trace_all(mask: &Mask, min_length: usize) -> IsisResult<Vec<Contour>> {
    let total = mask.count();
    if total == 0 {
        return Ok(Vec::new());
    }

    let mut remaining = mask.clone();
    let mut contours = Vec::new();
    for _ in 0..total {
        let contour = trace_in_place(&mut remaining)?;
        if contour.len() > min_length {
            contours.push(contour);
        }
        let left = remaining.count();
        if left == 0 || left < min_length {
            debug!(
                contours = contours.len(),
                skipped_pixels = left,
                "Contour tracing finished"
            );
            return Ok(contours);
        }
    }
    Err(IsisError::TooManyPolygons(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(lines: usize, samples: usize, l: (usize, usize), s: (usize, usize)) -> Mask {
        Mask::from_fn(lines, samples, |li, si| {
            (l.0..l.1).contains(&li) && (s.0..s.1).contains(&si)
        })
    }

    #[test]
    fn test_edges_of_rectangle() {
        let mask = rect(6, 7, (1, 5), (1, 6));
        let e = edges(&mask);
        assert_eq!(e.count(), 2 * (4 + 5) - 4);
        assert!(e.get(1, 1));
        assert!(!e.get(2, 2));
        assert!(!e.get(0, 0));
    }

    #[test]
    fn test_edges_touch_border() {
        let e = edges(&Mask::filled(3, 3, true));
        assert_eq!(e.count(), 8);
        assert!(!e.get(1, 1));
    }

    #[test]
    fn test_single_pixel() {
        let mut mask = Mask::filled(3, 3, false);
        mask.set(1, 1, true);
        let (contour, rest) = trace_one(&mask).unwrap();
        assert_eq!(contour.points(), &[(1, 1)]);
        assert!(contour.is_closed());
        assert_eq!(contour.vertex_count(), 1);
        assert!(!rest.any());
    }

    #[test]
    fn test_rectangle_walks_clockwise() {
        let e = edges(&rect(5, 5, (1, 4), (1, 4)));
        let (contour, rest) = trace_one(&e).unwrap();
        assert_eq!(
            contour.points(),
            &[
                (1, 1),
                (1, 2),
                (1, 3),
                (2, 3),
                (3, 3),
                (3, 2),
                (3, 1),
                (2, 1),
                (1, 1)
            ]
        );
        assert!(!rest.any());
    }

    #[test]
    fn test_stroke_walks_back() {
        let mut mask = Mask::filled(2, 3, false);
        mask.set(0, 0, true);
        mask.set(0, 1, true);
        let (contour, _) = trace_one(&mask).unwrap();
        assert_eq!(contour.points(), &[(0, 0), (0, 1), (0, 0)]);
        assert_eq!(contour.vertex_count(), 2);
    }

    #[test]
    fn test_empty_mask() {
        let mask = Mask::filled(4, 4, false);
        assert!(trace_one(&mask).is_err());
        assert!(trace_all(&mask, 0).unwrap().is_empty());
    }
}
