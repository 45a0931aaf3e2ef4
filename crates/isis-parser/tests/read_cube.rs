//! End-to-end reads of synthetic cubes.

use isis_common::IsisError;
use isis_parser::{ByteOrder, IsisCube, NumericType, Tiling};
use test_utils::{
    assert_approx_eq, fixtures, require_test_file, temp_test_dir, CubeBuilder, FieldSpec,
    TableSpec, ISIS_NULL_REAL, ISIS_SATURATED_REAL,
};

fn ramp(len: usize) -> Vec<f64> {
    (0..len).map(|v| v as f64).collect()
}

#[test]
fn test_missing_file() {
    let err = IsisCube::open("/nonexistent/C0000000000R.cub").unwrap_err();
    assert!(matches!(err, IsisError::NotFound(_)));
}

#[test]
fn test_wrong_signature() {
    let dir = temp_test_dir();
    let path = dir.path().join("image.png");
    std::fs::write(&path, b"\x89PNG\r\n\x1a\n definitely not a cube").unwrap();

    let err = IsisCube::open(&path).unwrap_err();
    assert!(matches!(err, IsisError::InvalidFormat(_)));
}

#[test]
fn test_shape_and_pixels() {
    let dir = temp_test_dir();
    let path = CubeBuilder::new(5, 4, 3)
        .pixel_type("SignedWord")
        .byte_order("Msb")
        .scaling(10.0, 0.5)
        .data(ramp(60))
        .write_in(dir.path(), "words.cub")
        .unwrap();

    let cube = IsisCube::open(&path).unwrap();
    assert_eq!(cube.shape(), (3, 4, 5));
    assert_eq!(cube.pixel_type(), NumericType::SignedWord);
    assert_eq!(cube.byte_order(), ByteOrder::Msb);
    assert_eq!(cube.format(), Tiling::BandSequential);
    assert_eq!(cube.start_byte(), 1024);

    let decoded = cube.cube().unwrap();
    assert_eq!(decoded.shape(), (3, 4, 5));
    assert_eq!(decoded.data()[0], 10.0);
    assert_eq!(decoded.data()[59], 59.0 * 0.5 + 10.0);
}

#[test]
fn test_tiled_matches_band_sequential() {
    let dir = temp_test_dir();
    let data = ramp(3 * 7 * 10);

    let plain = CubeBuilder::new(10, 7, 3)
        .data(data.clone())
        .write_in(dir.path(), "plain.cub")
        .unwrap();
    let tiled = CubeBuilder::new(10, 7, 3)
        .tiled(4, 3)
        .data(data)
        .write_in(dir.path(), "tiled.cub")
        .unwrap();

    let plain = IsisCube::open(&plain).unwrap();
    let tiled = IsisCube::open(&tiled).unwrap();
    assert_eq!(tiled.tile_samples(), Some(4));
    assert_eq!(tiled.tile_lines(), Some(3));

    assert_eq!(tiled.cube().unwrap().shape(), (3, 7, 10));
    assert_eq!(tiled.cube().unwrap(), plain.cube().unwrap());
}

#[test]
fn test_exact_tiles() {
    let dir = temp_test_dir();
    let data = ramp(2 * 8 * 8);
    let path = CubeBuilder::new(8, 8, 2)
        .tiled(4, 2)
        .data(data.clone())
        .write_in(dir.path(), "exact.cub")
        .unwrap();

    let cube = IsisCube::open(&path).unwrap();
    let values: Vec<f64> = cube
        .cube()
        .unwrap()
        .data()
        .iter()
        .map(|&v| v as f64)
        .collect();
    assert_eq!(values, data);
}

#[test]
fn test_float_sanitization() {
    let dir = temp_test_dir();
    let mut data = ramp(12);
    data[3] = ISIS_NULL_REAL;
    data[7] = ISIS_SATURATED_REAL;

    let path = CubeBuilder::new(4, 3, 1)
        .tiled(3, 2)
        .data(data)
        .write_in(dir.path(), "special.cub")
        .unwrap();

    let cube = IsisCube::open(&path).unwrap();
    let grid = cube.cube().unwrap().band_grid(0).unwrap();

    assert!(grid.get(0, 3).unwrap().is_nan());
    assert_eq!(grid.get(1, 3), Some(11.0));
    assert_eq!(grid.get(2, 3), Some(11.0));
    assert_eq!(grid.get(0, 0), Some(0.0));
}

#[test]
fn test_instrument_metadata() {
    let dir = temp_test_dir();
    let path = CubeBuilder::new(2, 2, 1)
        .instrument("SpacecraftName", "\"Galileo Orbiter\"")
        .instrument("TargetName", "Europa")
        .instrument("StartTime", fixtures::time::SSI_START)
        .instrument("StopTime", fixtures::time::SSI_STOP)
        .instrument("ExposureDuration", "0.0625 <seconds>")
        .band_names(&["CLEAR"])
        .filter_name("CLEAR")
        .kernel("TargetPosition", "(Table, $galileo/kernels/spk/s970311a.bsp)")
        .kernel("LeapSecond", "$base/kernels/lsk/naif0012.tls")
        .kernel("CameraVersion", "1")
        .naif_keyword("BODY502_RADII", "(1562.6, 1560.3, 1559.5)")
        .naif_keyword("INS-77036_FOCAL_LENGTH", "1500.46655964")
        .naif_keyword("FRAME_-77036_NAME", "'GLL_SSI_PLATFORM'")
        .write_in(dir.path(), "meta.cub")
        .unwrap();

    let cube = IsisCube::open(&path).unwrap();
    assert_eq!(cube.target_name().unwrap(), "Europa");
    assert_eq!(cube.duration().unwrap().num_milliseconds(), 500);
    assert_eq!(
        cube.mid_time().unwrap().to_rfc3339(),
        "1997-06-27T12:00:00.250+00:00"
    );

    let exposure = cube.exposure().unwrap();
    assert_eq!(exposure.value, 0.0625);
    assert_eq!(exposure.unit.as_deref(), Some("seconds"));

    assert_eq!(cube.band_names().unwrap(), vec!["CLEAR"]);
    assert_eq!(cube.original_bands().unwrap(), vec![1]);
    assert_eq!(
        cube.kernels().unwrap(),
        vec![
            "$galileo/kernels/spk/s970311a.bsp",
            "$base/kernels/lsk/naif0012.tls"
        ]
    );

    let radii = cube.target_radii().unwrap();
    assert_eq!(radii, fixtures::targets::EUROPA_RADII.to_vec());
    assert_approx_eq!(cube.target_radius().unwrap(), 1560.8, 0.1);

    assert!(cube.contains("TargetName"));
    assert!(matches!(
        cube.labels().get("FilterWheel"),
        Err(IsisError::KeyNotFound(_))
    ));
}

#[test]
fn test_tables_and_geometry() {
    let dir = temp_test_dir();
    // Identity rotation, spacecraft above 90W on the equator, sun above 0.
    let path = CubeBuilder::new(2, 2, 1)
        .ephemeris([2.0, 0.0, 0.0, 0.0], [0.0, 1.0e6, 0.0], [7.0e8, 0.0, 0.0])
        .table(TableSpec::new(
            "Camera",
            vec![
                FieldSpec::new("Pointing", "Real", 3),
                FieldSpec::new("Frame", "Integer", 1),
            ],
            vec![vec![0.5, 1.5, 2.5, -7.0]],
        ))
        .write_in(dir.path(), "ephemeris.cub")
        .unwrap();

    let cube = IsisCube::open(&path).unwrap();
    assert_eq!(
        cube.tables().names(),
        vec!["BodyRotation", "InstrumentPosition", "SunPosition", "Camera"]
    );

    assert_eq!(cube.body_rotation().unwrap(), [1.0, 0.0, 0.0, 0.0]);

    let (lon, lat) = cube.sub_spacecraft().unwrap();
    assert_approx_eq!(lon, 270.0, 1e-9);
    assert_approx_eq!(lat, 0.0, 1e-9);

    let (lon, lat) = cube.sub_solar().unwrap();
    assert_approx_eq!(lon, 0.0, 1e-9);
    assert_approx_eq!(lat, 0.0, 1e-9);

    let camera = cube.tables().get("Camera").unwrap();
    assert_eq!(camera.column("Pointing_3").unwrap(), &[2.5]);
    assert_eq!(camera.column("Frame").unwrap(), &[-7.0]);
    assert!(cube.contains("Camera"));
}

#[test]
fn test_original_labels() {
    let dir = temp_test_dir();
    let path = CubeBuilder::new(2, 2, 1)
        .original_label(fixtures::LORRI_ORIGINAL_LABEL)
        .write_in(dir.path(), "lorri.cub")
        .unwrap();

    let cube = IsisCube::open(&path).unwrap();
    let lines = cube.original_labels().unwrap().lines();
    assert_eq!(lines.first().map(String::as_str), Some("SIMPLE   = T"));
    assert_eq!(lines.last().map(String::as_str), Some("NAXIS    = 2"));
}

#[test]
fn test_missing_original_labels() {
    let dir = temp_test_dir();
    let path = CubeBuilder::new(2, 2, 1)
        .write_in(dir.path(), "bare.cub")
        .unwrap();

    let cube = IsisCube::open(&path).unwrap();
    assert!(matches!(
        cube.original_labels(),
        Err(IsisError::KeyNotFound(_))
    ));
}

#[test]
fn test_truncated_raster() {
    let dir = temp_test_dir();
    let path = dir.path().join("truncated.cub");
    let mut bytes = CubeBuilder::new(8, 8, 1).build();
    bytes.truncate(bytes.len() - 10);
    std::fs::write(&path, bytes).unwrap();

    let cube = IsisCube::open(&path).unwrap();
    assert!(cube.cube().unwrap_err().is_io());
}

#[test]
fn test_real_ssi_cube() {
    let path = require_test_file!("C0349632000R.cal.cub");
    let cube = IsisCube::open(&path).unwrap();

    let (bands, lines, samples) = cube.shape();
    assert_eq!(cube.band_names().unwrap().len(), bands);
    assert_eq!(cube.cube().unwrap().shape(), (bands, lines, samples));
    assert!(cube.start_time().unwrap() < cube.stop_time().unwrap());
}
