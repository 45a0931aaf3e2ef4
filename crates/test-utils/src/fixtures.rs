//! Common fixtures for camera cube tests.

/// Band layouts of the cubes produced by the SSI pipeline.
pub mod bands {
    /// Seven-band Galileo SSI cube, data band named after the filter.
    pub const SSI_CLEAR: [&str; 7] = [
        "CLEAR",
        "Phase Angle",
        "Incidence Angle",
        "Emission Angle",
        "Latitude",
        "Longitude",
        "Pixel Resolution",
    ];

    /// Seven-band LORRI cube.
    pub const LORRI: [&str; 7] = [
        "Data",
        "Phase Angle",
        "Incidence Angle",
        "Emission Angle",
        "Latitude",
        "Longitude",
        "Pixel Resolution",
    ];
}

/// Instrument times.
pub mod time {
    pub const SSI_START: &str = "1997-06-27T12:00:00.000";
    pub const SSI_STOP: &str = "1997-06-27T12:00:00.500";
    pub const LORRI_START: &str = "2015-07-14T11:49:57.018";
}

/// Target shapes (km).
pub mod targets {
    pub const EUROPA_RADII: [f64; 3] = [1562.6, 1560.3, 1559.5];
}

/// Original label of a LORRI cube (FITS-like card text).
pub const LORRI_ORIGINAL_LABEL: &str = "\
Object = OriginalLabel
SIMPLE   = T
EXPTIME  = 0.15 / exposure (sec)
SPCTSORN = 4.9e+09 / S/C to sun (km)
RSOLAR   = 2.5e+05 / solar source conversion
RPLUTO   = 2.6e+05 / Pluto source conversion
TARGET   = 'PLUTO' / intended target
# comment line
COMMENT  processed by pipeline
QUAT     = -0.25 0.5 0.5 0.75
NAXIS    = 2
END
End_Object
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_layouts() {
        assert_eq!(bands::SSI_CLEAR.len(), bands::LORRI.len());
        assert!(bands::SSI_CLEAR.contains(&"Pixel Resolution"));
    }

    #[test]
    fn test_original_label_envelope() {
        let lines: Vec<_> = LORRI_ORIGINAL_LABEL.lines().collect();
        assert!(lines[0].starts_with("Object"));
        assert_eq!(lines[lines.len() - 2], "END");
    }
}
