//! New Horizons LORRI specifics: FITS cards kept in the original label and
//! the radiometric conversion to I/F.

use std::f64::consts::PI;

use isis_common::{Grid, IsisError, IsisResult};
use tracing::debug;

/// 1 AU in km.
pub const AU_KM: f64 = 1.49598e8;

/// Solar flux at 1 km (erg/cm²/s/Å × km²).
pub const F_SOLAR: f64 = 176.0 * AU_KM * AU_KM;

/// A parsed FITS card value.
#[derive(Debug, Clone, PartialEq)]
pub enum FitsValue {
    Logical(bool),
    Integer(i64),
    Real(f64),
    /// Several numbers on one card.
    List(Vec<f64>),
    Text(String),
}

impl FitsValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FitsValue::Integer(i) => Some(*i as f64),
            FitsValue::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FitsValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Parse the value part of a card (everything after ` = `).
fn parse_value(raw: &str) -> FitsValue {
    let raw = raw.trim();

    // Quoted strings may contain '/'.
    for quote in ['\'', '"'] {
        if let Some(rest) = raw.strip_prefix(quote) {
            if let Some(end) = rest.find(quote) {
                return FitsValue::Text(rest[..end].trim().to_string());
            }
        }
    }

    let value = match raw.find('/') {
        Some(idx) => raw[..idx].trim(),
        None => raw,
    };

    match value {
        "T" => return FitsValue::Logical(true),
        "F" => return FitsValue::Logical(false),
        _ => {}
    }

    if let Ok(i) = value.parse::<i64>() {
        return FitsValue::Integer(i);
    }

    let numbers: Option<Vec<f64>> = value
        .split_whitespace()
        .map(|token| token.replace(['D', 'd'], "E").parse::<f64>().ok())
        .collect();
    match numbers {
        Some(numbers) if numbers.len() == 1 => FitsValue::Real(numbers[0]),
        Some(numbers) if numbers.len() > 1 => FitsValue::List(numbers),
        _ => FitsValue::Text(value.replace('"', "")),
    }
}

/// FITS header cards stored in a LORRI cube's original label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitsHeader {
    cards: Vec<(String, FitsValue)>,
}

impl FitsHeader {
    /// Parse `KEY = value` lines.
    ///
    /// Comment lines (`#`, `COMMENT`) and lines without ` = ` are skipped.
    /// A key defined twice is an error.
    pub fn parse<'a>(lines: impl IntoIterator<Item = &'a str>) -> IsisResult<Self> {
        let mut cards: Vec<(String, FitsValue)> = Vec::new();

        for line in lines {
            let line = line.trim();
            if line.starts_with('#') || line.starts_with("COMMENT") {
                continue;
            }
            let Some((key, value)) = line.split_once(" = ") else {
                continue;
            };
            let key = key.trim();
            if cards.iter().any(|(k, _)| k == key) {
                return Err(IsisError::invalid_format(format!(
                    "key `{}` is already defined in FITS header",
                    key
                )));
            }
            cards.push((key.to_string(), parse_value(value)));
        }

        debug!(cards = cards.len(), "Parsed FITS header");
        Ok(Self { cards })
    }

    pub fn get(&self, key: &str) -> Option<&FitsValue> {
        self.cards.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cards.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Numeric card value.
    pub fn require_f64(&self, key: &str) -> IsisResult<f64> {
        self.get(key)
            .ok_or_else(|| IsisError::key_not_found(key))?
            .as_f64()
            .ok_or_else(|| IsisError::invalid_format(format!("FITS key `{}` is not a number", key)))
    }
}

/// Solar flux at `sun_distance` km from the sun (erg/cm²/s/Å).
pub fn solar_flux(sun_distance: f64) -> f64 {
    F_SOLAR / PI / (sun_distance * sun_distance)
}

/// Conversion from raw counts to I/F.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Exposure (s).
    pub exposure: f64,
    /// Radiance conversion factor of the selected spectral source.
    pub radiance: f64,
    /// Target distance to the sun (km).
    pub sun_distance: f64,
}

impl Calibration {
    /// Read the radiance factor `source` and `SPCTSORN` from a FITS header.
    pub fn from_header(header: &FitsHeader, source: &str, exposure: f64) -> IsisResult<Self> {
        Ok(Self {
            exposure,
            radiance: header.require_f64(source)?,
            sun_distance: header.require_f64("SPCTSORN")?,
        })
    }

    /// Multiplicative factor from counts to I/F.
    pub fn factor(&self) -> f64 {
        1.0 / self.exposure / self.radiance / solar_flux(self.sun_distance)
    }

    pub fn apply(&self, counts: &Grid) -> Grid {
        let factor = self.factor();
        counts.map(|v| (f64::from(v) * factor) as f32)
    }
}
