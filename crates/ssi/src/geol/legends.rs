//! Built-in legends.

use super::{Colors, Legend};

/// Europa geological units.
pub fn europa_legend() -> Legend {
    vec![
        (0, "Unknown"),
        (25, "Bands"),
        (50, "Crater"),
        (75, "Continuous crater ejecta"),
        (100, "Discontinuous crater ejecta"),
        (125, "Low albedo chaos"),
        (150, "Knobby albedo chaos"),
        (175, "Mottled albedo chaos"),
        (200, "High albedo chaos"),
        (255, "Ridged plains"),
    ]
}

pub fn europa_colors() -> Colors {
    vec![
        (0, "#9c9c9c"),
        (25, "#8400a8"),
        (50, "#ffaa00"),
        (75, "#ffd37f"),
        (100, "#ffebaf"),
        (125, "#267300"),
        (150, "#70a800"),
        (175, "#89cd66"),
        (200, "#d3ffbe"),
        (255, "#bee8ff"),
    ]
}

/// Pluto geological units.
pub fn pluto_legend() -> Legend {
    vec![
        (0, "No data"),
        (128, "Sputnik Planitia"),
        (255, "Bladed units"),
    ]
}

pub fn pluto_colors() -> Colors {
    vec![(0, "#00000000"), (128, "#0000ff"), (255, "#ff0000")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_unit_has_a_color() {
        for (legend, colors) in [
            (europa_legend(), europa_colors()),
            (pluto_legend(), pluto_colors()),
        ] {
            assert_eq!(legend.len(), colors.len());
            for ((value, _), (color_value, color)) in legend.iter().zip(&colors) {
                assert_eq!(value, color_value);
                assert!(color.starts_with('#'));
            }
        }
    }
}
