//! Runtime configuration for instrument views.

use cube_processing::AlignTarget;
use isis_common::{IsisError, IsisResult};
use isis_parser::DEFAULT_NULL_TOLERANCE;
use serde::{Deserialize, Serialize};

/// Which frame, if any, is moved to register data and navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentMode {
    #[default]
    None,
    Data,
    Navigation,
}

impl AlignmentMode {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" => Some(Self::None),
            "data" => Some(Self::Data),
            "navigation" | "nav" => Some(Self::Navigation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Data => "data",
            Self::Navigation => "navigation",
        }
    }

    pub fn target(&self) -> Option<AlignTarget> {
        match self {
            Self::None => None,
            Self::Data => Some(AlignTarget::Data),
            Self::Navigation => Some(AlignTarget::Navigation),
        }
    }
}

impl std::fmt::Display for AlignmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration shared by SSI and LORRI views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Contours with this many points or fewer are dropped.
    pub contour_min_length: usize,

    /// Decimal places kept in exported GeoJSON.
    pub geojson_precision: u32,

    /// Relative tolerance of the float NULL detection.
    pub null_tolerance: f64,

    /// Alignment applied on band access.
    pub alignment: AlignmentMode,

    /// Original-label keyword holding the LORRI radiance conversion factor.
    pub lorri_source: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            contour_min_length: 250,
            geojson_precision: 2,
            null_tolerance: DEFAULT_NULL_TOLERANCE,
            alignment: AlignmentMode::None,
            lorri_source: "RSOLAR".to_string(),
        }
    }
}

impl ViewConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SSI_CONTOUR_MIN_LENGTH") {
            if let Ok(length) = val.parse() {
                config.contour_min_length = length;
            }
        }

        if let Ok(val) = std::env::var("SSI_GEOJSON_PRECISION") {
            if let Ok(precision) = val.parse() {
                config.geojson_precision = precision;
            }
        }

        if let Ok(val) = std::env::var("SSI_NULL_TOLERANCE") {
            if let Ok(tolerance) = val.parse() {
                config.null_tolerance = tolerance;
            }
        }

        if let Ok(val) = std::env::var("SSI_ALIGNMENT") {
            if let Some(mode) = AlignmentMode::parse(&val) {
                config.alignment = mode;
            }
        }

        if let Ok(val) = std::env::var("LORRI_SOURCE") {
            if !val.trim().is_empty() {
                config.lorri_source = val.trim().to_uppercase();
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> IsisResult<()> {
        if self.null_tolerance.is_nan() || self.null_tolerance <= 0.0 {
            return Err(IsisError::invalid_argument("null_tolerance must be > 0"));
        }

        if self.geojson_precision > 15 {
            return Err(IsisError::invalid_argument("geojson_precision must be 0-15"));
        }

        if self.lorri_source.is_empty() {
            return Err(IsisError::invalid_argument("lorri_source is empty"));
        }

        Ok(())
    }
}
