//! Single pixel records.

use std::fmt;

use serde::Serialize;

/// Values of every layer at one pixel.
///
/// Two records are equal when they point at the same pixel of the same
/// image.
#[derive(Debug, Clone, Serialize)]
pub struct PixelRecord {
    pub img_id: String,
    /// 1-based sample.
    pub sample: i64,
    /// 1-based line.
    pub line: i64,
    /// I/F.
    pub data: f32,
    /// West longitude (degrees).
    pub lon: f32,
    /// East longitude (degrees).
    pub lon_e: f32,
    pub lat: f32,
    pub inc: f32,
    pub emi: f32,
    pub phase: f32,
    /// Ground resolution (km/pixel).
    pub res: f32,
}

impl PixelRecord {
    /// Multi-line summary.
    pub fn describe(&self) -> String {
        [
            format!("<PixelRecord> {}", self),
            format!("Sample: {}", self.sample),
            format!("Line: {}", self.line),
            format!("I/F: {:.2e}", self.data),
            format!("Lon: {:.1}°W", self.lon),
            format!("Lat: {:.1}°N", self.lat),
            format!("Inc: {:.1}°", self.inc),
            format!("Emi: {:.1}°", self.emi),
            format!("Phase: {:.1}°", self.phase),
            format!("Res: {:.1} km/pix", self.res),
        ]
        .join("\n - ")
    }
}

impl PartialEq for PixelRecord {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl fmt::Display for PixelRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-S{}_L{}", self.img_id, self.sample, self.line)
    }
}
