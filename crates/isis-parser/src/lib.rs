//! ISIS cube parser.
//!
//! Reads the PVL label, binary tables, embedded original label and the
//! (possibly tiled) raster body of ISIS camera cubes.
//!
//! ```ignore
//! let cube = isis_parser::IsisCube::open("C0349632000R.cub")?;
//! let (bands, lines, samples) = cube.shape();
//! let data = cube.cube()?.band_grid(0)?;
//! ```

pub mod cube;
pub mod decoder;
pub mod encoding;
pub mod labels;
pub mod original_labels;
pub mod pvl;
pub mod reader;
pub mod tables;

pub use cube::{is_isis, Exposure, IsisCube, SIGNATURE};
pub use decoder::{decode, decode_bytes, Cube, RasterLayout, Tiling, DEFAULT_NULL_TOLERANCE};
pub use encoding::{ByteOrder, NumericType};
pub use labels::Labels;
pub use original_labels::OriginalLabels;
pub use pvl::{parse_label, BlockKind, PvlBlock, PvlValue};
pub use tables::{Column, FieldType, Table, TableField, Tables};
