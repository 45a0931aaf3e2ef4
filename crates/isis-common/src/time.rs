//! Time handling for ISIS labels.
//!
//! Instrument times are written either as calendar dates
//! (`1997-06-27T12:00:00.123`) or as day-of-year dates
//! (`1997-178T12:00:00.123`), always UTC and without a zone suffix.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::{IsisError, IsisResult};

const FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%jT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%jT%H:%M:%S",
];

/// Parse an ISIS UTC time string.
pub fn parse_isis_time(s: &str) -> IsisResult<DateTime<Utc>> {
    let trimmed = s.trim().trim_matches('"').trim_end_matches('Z');

    for format in FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(IsisError::InvalidTime(s.to_string()))
}

/// Decode an ephemeris time stored as a hex dump of a native double.
pub fn hex_to_f64(s: &str) -> IsisResult<f64> {
    let s = s.trim();
    if s.len() != 16 {
        return Err(IsisError::invalid_argument(format!(
            "hex double `{}` must have 16 digits",
            s
        )));
    }

    let mut bytes = [0u8; 8];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&s[2 * i..2 * i + 2], 16)
            .map_err(|_| IsisError::invalid_argument(format!("invalid hex double `{}`", s)))?;
    }

    Ok(f64::from_ne_bytes(bytes))
}
