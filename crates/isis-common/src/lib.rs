//! Common types and utilities shared across the ISIS cube crates.

pub mod error;
pub mod grid;
pub mod time;

pub use error::{IsisError, IsisResult};
pub use grid::{Grid, Mask};
pub use time::{hex_to_f64, parse_isis_time};
