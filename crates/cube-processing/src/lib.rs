//! Raster processing on decoded camera bands.
//!
//! - [`align`]: offset between an image and its navigation backplanes,
//!   found by cross-correlating their line and sample profiles.
//! - [`contour`]: 8-connected tracing of the closed outlines of a mask.

pub mod align;
pub mod contour;

pub use align::{apply_offset, compute_offset, correlate_same, AlignTarget, Offset};
pub use contour::{edges, trace_all, trace_one, Contour};
