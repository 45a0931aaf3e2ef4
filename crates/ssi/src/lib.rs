//! Galileo SSI and New Horizons LORRI camera cubes.
//!
//! [`InstrumentView`] is the entry point: it opens an ISIS cube, names its
//! bands and derives the products downstream tools consume (pixel records,
//! valid-region contours, GeoJSON footprints). Photometric fits and
//! geological unit lookups work on top of a view.

pub mod config;
pub mod geojson;
pub mod geol;
pub mod lorri;
pub mod photometry;
pub mod pixel;
pub mod view;

pub use config::{AlignmentMode, ViewConfig};
pub use geojson::{Coordinates, Feature, Geometry, GeometryKind};
pub use geol::{color_of, lookup_unit, lookup_value, map_index, units_of, ReferenceMap};
pub use lorri::{Calibration, FitsHeader, FitsValue};
pub use photometry::{fit, fit_hapke, fit_minnaert, FitDebug, PhotometricModel};
pub use pixel::PixelRecord;
pub use view::{Instrument, InstrumentView};

pub use cube_processing::{AlignTarget, Contour, Offset};
