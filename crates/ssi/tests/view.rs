//! Instrument views over synthetic SSI and LORRI cubes.

use std::ops::Range;
use std::path::PathBuf;

use image::{GrayImage, Luma};
use isis_common::IsisError;
use ssi::geol::{europa_colors, europa_legend};
use ssi::lorri::{solar_flux, AU_KM};
use ssi::{
    fit, units_of, AlignmentMode, Geometry, Instrument, InstrumentView, Offset, ReferenceMap,
    ViewConfig,
};
use tempfile::TempDir;
use test_utils::{assert_approx_eq, fixtures, temp_test_dir, CubeBuilder};

const SAMPLES: usize = 20;
const LINES: usize = 16;

/// Region covered by the navigation backplanes.
const NAV_LINES: Range<usize> = 4..12;
const NAV_SAMPLES: Range<usize> = 5..15;

fn on_disk(l: usize, s: usize) -> bool {
    NAV_LINES.contains(&l) && NAV_SAMPLES.contains(&s)
}

fn band(f: impl Fn(usize, usize) -> f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(SAMPLES * LINES);
    for l in 0..LINES {
        for s in 0..SAMPLES {
            out.push(f(l, s));
        }
    }
    out
}

fn nav(f: impl Fn(usize, usize) -> f32) -> Vec<f32> {
    band(|l, s| if on_disk(l, s) { f(l, s) } else { f32::NAN })
}

fn inc(l: usize, s: usize) -> f32 {
    let _ = l;
    10.0 + 3.0 * s as f32
}

fn emi(l: usize, s: usize) -> f32 {
    let _ = s;
    5.0 + 4.0 * l as f32
}

/// Seven-band cube with the given data band and synthetic backplanes.
fn builder(names: &[&str], data: Vec<f32>) -> CubeBuilder {
    CubeBuilder::new(SAMPLES, LINES, 7)
        .band(0, &data)
        .band(1, &nav(|_, _| 45.0))
        .band(2, &nav(inc))
        .band(3, &nav(emi))
        .band(4, &nav(|l, _| 10.0 - l as f32))
        .band(5, &nav(|_, s| 270.0 - s as f32))
        .band(6, &nav(|l, _| 2.0 + 0.5 * l as f32))
        .band_names(names)
}

fn ssi_cube(dir: &TempDir, data: Vec<f32>) -> PathBuf {
    builder(&fixtures::bands::SSI_CLEAR, data)
        .filter_name("CLEAR")
        .instrument("SpacecraftName", "\"Galileo Orbiter\"")
        .instrument("TargetName", "Europa")
        .instrument("StartTime", fixtures::time::SSI_START)
        .instrument("StopTime", fixtures::time::SSI_STOP)
        .instrument("ExposureDuration", "0.0625 <seconds>")
        .write_in(dir.path(), "C0349632000R.cal.cub")
        .unwrap()
}

/// Data band lit where the navigation is, shifted by (`dl`, `ds`).
fn lit_data(dl: isize, ds: isize) -> Vec<f32> {
    band(|l, s| {
        let (l, s) = (l as isize - dl, s as isize - ds);
        if l >= 0 && s >= 0 && on_disk(l as usize, s as usize) {
            0.3
        } else {
            0.0
        }
    })
}

fn config(min_length: usize) -> ViewConfig {
    ViewConfig {
        contour_min_length: min_length,
        ..ViewConfig::default()
    }
}

#[test]
fn test_identification() {
    let dir = temp_test_dir();
    let view = InstrumentView::ssi(ssi_cube(&dir, lit_data(0, 0))).unwrap();

    assert_eq!(view.img_id(), "C0349632000R");
    assert_eq!(view.to_string(), "C0349632000R");
    assert_eq!(view.size(), (LINES, SAMPLES));
    assert_eq!(view.extent(), [0.5, 20.5, 16.5, 0.5]);
    assert_eq!(view.sample_ticks(), [1, 5, 10, 15, 20]);
    assert_eq!(view.filter_name().unwrap(), "CLEAR");
    assert_eq!(view.data_layer().unwrap(), "CLEAR");
    assert_eq!(view.layers().len(), 7);
    assert_eq!(view.target_name().unwrap(), "Europa");
    assert!(view.stop().unwrap().is_some());
    assert!(view.describe().contains("Filter name: CLEAR"));
}

#[test]
fn test_unknown_layer() {
    let dir = temp_test_dir();
    let view = InstrumentView::ssi(ssi_cube(&dir, lit_data(0, 0))).unwrap();
    assert!(matches!(
        view.get("Surface Temperature"),
        Err(IsisError::UnknownLayer(_))
    ));
}

#[test]
fn test_geometry_layers() {
    let dir = temp_test_dir();
    let view = InstrumentView::ssi(ssi_cube(&dir, lit_data(0, 0))).unwrap();

    let lon_e = view.lon_e().unwrap();
    assert_eq!(lon_e.get(4, 5), Some(95.0));
    assert!(lon_e.get(0, 0).unwrap().is_nan());

    let mu0 = view.mu0().unwrap();
    assert_approx_eq!(mu0.get(4, 5).unwrap() as f64, 25f64.to_radians().cos(), 1e-6);

    let valid = view.valid().unwrap();
    assert_eq!(valid.count(), NAV_LINES.len() * NAV_SAMPLES.len());
    assert_eq!(view.limb().unwrap().count(), SAMPLES * LINES - valid.count());
}

#[test]
fn test_pixel_bounds() {
    let dir = temp_test_dir();
    let view = InstrumentView::ssi(ssi_cube(&dir, lit_data(0, 0))).unwrap();

    assert!(view.pixel(1, 1).is_ok());
    assert!(view.pixel(SAMPLES as i64, LINES as i64).is_ok());
    assert!(matches!(
        view.pixel(0, 1),
        Err(IsisError::OutOfRange { axis: "sample", .. })
    ));
    assert!(matches!(
        view.pixel(SAMPLES as i64 + 1, 1),
        Err(IsisError::OutOfRange { axis: "sample", .. })
    ));
    assert!(matches!(
        view.pixel(1, LINES as i64 + 1),
        Err(IsisError::OutOfRange { axis: "line", .. })
    ));
}

#[test]
fn test_pixel_values() {
    let dir = temp_test_dir();
    let view = InstrumentView::ssi(ssi_cube(&dir, lit_data(0, 0))).unwrap();

    let pixel = view.pixel(6, 5).unwrap();
    assert_eq!(pixel.to_string(), "C0349632000R-S6_L5");
    assert_approx_eq!(pixel.data as f64, 0.3, 1e-6);
    assert_eq!(pixel.lat, 6.0);
    assert_eq!(pixel.lon, 265.0);
    assert_eq!(pixel.lon_e, 95.0);
    assert_eq!(pixel.inc, 25.0);
    assert_eq!(pixel.emi, 21.0);
    assert_eq!(pixel.phase, 45.0);
    assert_eq!(pixel.res, 4.0);

    let limb = view.pixel(1, 1).unwrap();
    assert!(limb.lat.is_nan());
}

#[test]
fn test_contours_and_footprint() {
    let dir = temp_test_dir();
    let path = ssi_cube(&dir, lit_data(0, 0));
    let view = InstrumentView::open(&path, Instrument::Ssi, config(10)).unwrap();

    let contours = view.contours().unwrap();
    assert_eq!(contours.len(), 1);
    assert_eq!(contours[0].len(), 2 * (8 + 10) - 4 + 1);
    assert!(view.contours_with(100).unwrap().is_empty());

    let feature = view.footprint().unwrap();
    let json = serde_json::to_value(&feature).unwrap();
    assert_eq!(json["type"], "Feature");
    assert_eq!(json["geometry"]["type"], "Polygon");

    let ring = &json["geometry"]["coordinates"][0];
    assert_eq!(ring[0], serde_json::json!([95.0, 6.0]));
    assert_eq!(ring[0], ring[ring.as_array().unwrap().len() - 1]);

    let props = &json["properties"];
    assert_eq!(props["image"], "C0349632000R");
    assert_eq!(props["target"], "Europa");
    assert_eq!(props["start"], "1997-06-27T12:00:00.000");
    assert_eq!(props["time"], "1997-06-27T12:00:00.250");
    assert_eq!(props["inc_min"], 25.0);
    assert_eq!(props["inc_max"], 52.0);
    assert_eq!(props["res_min"], 4.0);
    assert!(props.get("offset_samples").is_none());
}

#[test]
fn test_empty_footprint_is_multipolygon() {
    let dir = temp_test_dir();
    let path = ssi_cube(&dir, lit_data(0, 0));
    let view = InstrumentView::ssi(&path).unwrap();

    match view.footprint().unwrap().geometry {
        Geometry::MultiPolygon { coordinates } => assert!(coordinates.is_empty()),
        other => panic!("unexpected geometry {:?}", other),
    }
}

#[test]
fn test_data_alignment() {
    let dir = temp_test_dir();
    let path = ssi_cube(&dir, lit_data(2, -3));

    let plain = InstrumentView::ssi(&path).unwrap();
    assert_eq!(plain.offset().unwrap(), None);
    assert_eq!(plain.data().unwrap().get(4, 5), Some(0.0));

    let view = InstrumentView::ssi(&path)
        .unwrap()
        .with_alignment(AlignmentMode::Data);
    assert_eq!(view.offset().unwrap(), Some(Offset::new(3, -2)));

    let data = view.data().unwrap();
    for l in NAV_LINES {
        for s in NAV_SAMPLES {
            assert_approx_eq!(data.get(l, s).unwrap() as f64, 0.3, 1e-6);
        }
    }
    // Navigation stays in place.
    assert_eq!(view.valid().unwrap(), plain.valid().unwrap());
}

#[test]
fn test_navigation_alignment() {
    let dir = temp_test_dir();
    let path = ssi_cube(&dir, lit_data(2, -3));

    let view = InstrumentView::open(&path, Instrument::Ssi, config(10))
        .unwrap()
        .with_alignment(AlignmentMode::Navigation);

    let valid = view.valid().unwrap();
    assert_eq!(valid.count(), NAV_LINES.len() * NAV_SAMPLES.len());
    assert!(valid.get(6, 2));
    assert!(!valid.get(4, 14));

    let lit = view.data().unwrap();
    assert_eq!(lit.get(6, 2), Some(0.3));

    let json = serde_json::to_value(view.footprint().unwrap()).unwrap();
    assert_eq!(json["properties"]["offset_samples"], 3);
    assert_eq!(json["properties"]["offset_lines"], -2);
}

#[test]
fn test_manual_offset() {
    let dir = temp_test_dir();
    let path = ssi_cube(&dir, lit_data(2, -3));

    let view = InstrumentView::ssi(&path)
        .unwrap()
        .with_offset(Offset::new(3, -2), AlignmentMode::Data);
    assert_eq!(view.offset().unwrap(), Some(Offset::new(3, -2)));
    assert_eq!(view.data().unwrap().get(4, 5), Some(0.3));
}

#[test]
fn test_photometric_fit() {
    let (b0, k) = (0.8_f64, 0.7_f64);
    let data = band(|l, s| {
        if !on_disk(l, s) {
            return 0.0;
        }
        let mu0 = f64::from(inc(l, s)).to_radians().cos();
        let mu1 = f64::from(emi(l, s)).to_radians().cos();
        (b0 * mu0.powf(k) * mu1.powf(k - 1.0)) as f32
    });

    let dir = temp_test_dir();
    let view = InstrumentView::ssi(ssi_cube(&dir, data)).unwrap();
    let valid = view.valid().unwrap();

    let (fb0, fk) = fit(&view, &valid, "Minnaert").unwrap();
    assert_approx_eq!(fb0, b0, 1e-3);
    assert_approx_eq!(fk, k, 1e-3);

    assert!(matches!(
        fit(&view, &valid, "lommel-seeliger"),
        Err(IsisError::InvalidArgument(_))
    ));
}

#[test]
fn test_geological_units() {
    let dir = temp_test_dir();
    let view = InstrumentView::ssi(ssi_cube(&dir, lit_data(0, 0))).unwrap();

    let image = GrayImage::from_pixel(36, 18, Luma([50]));
    let map = ReferenceMap::new("Europa", image, europa_legend(), europa_colors()).unwrap();

    let units = units_of(&view, &map).unwrap();
    assert_eq!(units.len(), SAMPLES * LINES);
    assert_eq!(units[4 * SAMPLES + 5], Some("Crater"));
    assert_eq!(units[0], None);
}

fn lorri_cube(dir: &TempDir) -> PathBuf {
    builder(&fixtures::bands::LORRI, band(|l, s| if on_disk(l, s) { 100.0 } else { 0.0 }))
        .instrument("SpacecraftName", "\"NEW HORIZONS\"")
        .instrument("TargetName", "Pluto")
        .instrument("StartTime", fixtures::time::LORRI_START)
        .instrument("ExposureDuration", "0.15")
        .original_label(fixtures::LORRI_ORIGINAL_LABEL)
        .write_in(dir.path(), "lor_0299174809_0x630_sci.cub")
        .unwrap()
}

#[test]
fn test_lorri_calibration() {
    let dir = temp_test_dir();
    let view = InstrumentView::lorri(lorri_cube(&dir)).unwrap();

    assert_eq!(view.filter_name().unwrap(), "None");
    assert_eq!(view.data_layer().unwrap(), "Data");
    assert_eq!(view.stop().unwrap(), None);
    assert_eq!(view.exposure().unwrap().unit.as_deref(), Some("sec"));
    assert_eq!(view.sun_distance().unwrap(), 4.9e9);

    let header = view.fits_header().unwrap();
    assert_eq!(header.get("TARGET").and_then(|v| v.as_str()), Some("PLUTO"));

    let expected = 100.0 / 0.15 / 2.5e5 / solar_flux(4.9e9);
    let data = view.data().unwrap();
    assert_approx_eq!(data.get(4, 5).unwrap() as f64 / expected, 1.0, 1e-5);
    assert_eq!(data.get(0, 0), Some(0.0));

    // Raw counts stay available by name.
    assert_eq!(view.get("Data").unwrap().get(4, 5), Some(100.0));
    assert!(solar_flux(AU_KM) > solar_flux(4.9e9));
}

#[test]
fn test_lorri_source() {
    let dir = temp_test_dir();
    let path = lorri_cube(&dir);

    let solar = InstrumentView::lorri(&path).unwrap();
    let pluto = InstrumentView::open(
        &path,
        Instrument::Lorri,
        ViewConfig {
            lorri_source: "RPLUTO".to_string(),
            ..ViewConfig::default()
        },
    )
    .unwrap();

    let ratio = solar.data().unwrap().get(4, 5).unwrap() / pluto.data().unwrap().get(4, 5).unwrap();
    assert_approx_eq!(ratio as f64, 2.6 / 2.5, 1e-5);

    let missing = InstrumentView::open(
        &path,
        Instrument::Lorri,
        ViewConfig {
            lorri_source: "RJUPITER".to_string(),
            ..ViewConfig::default()
        },
    )
    .unwrap();
    assert!(matches!(missing.data(), Err(IsisError::KeyNotFound(_))));
}

#[test]
fn test_invalid_config() {
    let dir = temp_test_dir();
    let path = ssi_cube(&dir, lit_data(0, 0));
    let result = InstrumentView::open(
        &path,
        Instrument::Ssi,
        ViewConfig {
            geojson_precision: 40,
            ..ViewConfig::default()
        },
    );
    assert!(matches!(result, Err(IsisError::InvalidArgument(_))));
}
