//! ISIS cube file handle.

use std::cell::OnceCell;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use geometry::{hat, lonlat, q_rot, Vector3};
use tracing::{debug, info, instrument};

use isis_common::{parse_isis_time, IsisError, IsisResult};

use crate::decoder::{decode, Cube, RasterLayout, Tiling, DEFAULT_NULL_TOLERANCE};
use crate::encoding::{ByteOrder, NumericType};
use crate::labels::Labels;
use crate::original_labels::OriginalLabels;
use crate::pvl::{parse_label, PvlBlock, PvlValue};
use crate::tables::Tables;

/// Leading bytes of every ISIS cube.
pub const SIGNATURE: &[u8; 17] = b"Object = IsisCube";

/// Exposure duration with its unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Exposure {
    pub value: f64,
    pub unit: Option<String>,
}

/// An opened ISIS cube.
///
/// The label is parsed on open; the raster, table payloads and original
/// label are read on first use and kept for the lifetime of the handle.
#[derive(Debug)]
pub struct IsisCube {
    path: PathBuf,
    root: PvlBlock,
    labels: Labels,
    layout: RasterLayout,
    tables: Tables,
    null_tolerance: f64,
    cube: OnceCell<Cube>,
    original_labels: OnceCell<OriginalLabels>,
}

impl IsisCube {
    pub fn open(path: impl AsRef<Path>) -> IsisResult<Self> {
        Self::open_with_tolerance(path, DEFAULT_NULL_TOLERANCE)
    }

    /// Open with a custom relative tolerance for NULL float detection.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open_with_tolerance(path: impl AsRef<Path>, null_tolerance: f64) -> IsisResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(IsisError::NotFound(path));
        }
        if !is_isis(&path)? {
            return Err(IsisError::invalid_format(format!(
                "file `{}` is not in ISIS format",
                path.display()
            )));
        }

        let text = read_label_text(&path)?;
        let root = parse_label(&text)?;
        let labels = Labels::new(&root);

        let core = labels.block("IsisCube.Core")?;
        let layout = RasterLayout::from_core(&core)?;
        let tables = Tables::from_label(&path, &root)?;

        info!(
            bands = layout.bands,
            lines = layout.lines,
            samples = layout.samples,
            pixel_type = layout.pixel_type.label(),
            tables = tables.len(),
            "Opened ISIS cube"
        );

        Ok(Self {
            path,
            root,
            labels,
            layout,
            tables,
            null_tolerance,
            cube: OnceCell::new(),
            original_labels: OnceCell::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parsed label, binary objects included.
    pub fn pvl(&self) -> &PvlBlock {
        &self.root
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn layout(&self) -> &RasterLayout {
        &self.layout
    }

    /// Label keys followed by table names.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = self.labels.keys();
        keys.extend(self.tables.names().into_iter().map(String::from));
        keys
    }

    pub fn contains(&self, key: &str) -> bool {
        self.labels.contains(key) || self.tables.contains(key)
    }

    // ===== Raster =====

    pub fn samples(&self) -> usize {
        self.layout.samples
    }

    pub fn lines(&self) -> usize {
        self.layout.lines
    }

    pub fn bands(&self) -> usize {
        self.layout.bands
    }

    /// (bands, lines, samples)
    pub fn shape(&self) -> (usize, usize, usize) {
        self.layout.shape()
    }

    pub fn pixel_type(&self) -> NumericType {
        self.layout.pixel_type
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.layout.byte_order
    }

    pub fn base(&self) -> f64 {
        self.layout.base
    }

    pub fn multiplier(&self) -> f64 {
        self.layout.multiplier
    }

    /// 0-based offset of the raster body.
    pub fn start_byte(&self) -> u64 {
        self.layout.offset
    }

    pub fn format(&self) -> Tiling {
        self.layout.tiling
    }

    pub fn tile_samples(&self) -> Option<usize> {
        match self.layout.tiling {
            Tiling::Tile { tile_samples, .. } => Some(tile_samples),
            Tiling::BandSequential => None,
        }
    }

    pub fn tile_lines(&self) -> Option<usize> {
        match self.layout.tiling {
            Tiling::Tile { tile_lines, .. } => Some(tile_lines),
            Tiling::BandSequential => None,
        }
    }

    /// Decoded raster, read on first call.
    pub fn cube(&self) -> IsisResult<&Cube> {
        if let Some(cube) = self.cube.get() {
            return Ok(cube);
        }
        let cube = decode(&self.path, &self.layout, self.null_tolerance)?;
        Ok(self.cube.get_or_init(|| cube))
    }

    // ===== Bands =====

    fn band_bin(&self) -> IsisResult<PvlBlock> {
        self.labels.block("IsisCube.BandBin")
    }

    /// `BandBin.Name` values, one per band.
    pub fn band_names(&self) -> IsisResult<Vec<String>> {
        let value = self.labels.get("IsisCube.BandBin.Name")?;
        Ok(value.items().iter().map(|v| v.to_text()).collect())
    }

    pub fn original_bands(&self) -> IsisResult<Vec<i64>> {
        self.band_bin()?
            .require("OriginalBand")?
            .items()
            .iter()
            .map(|v| {
                v.as_i64()
                    .ok_or_else(|| IsisError::invalid_format("non integer OriginalBand"))
            })
            .collect()
    }

    /// Band centers (micrometers).
    pub fn wavelengths(&self) -> IsisResult<Vec<f64>> {
        self.band_bin()?
            .require("Center")?
            .items()
            .iter()
            .map(|v| {
                v.as_f64()
                    .ok_or_else(|| IsisError::invalid_format("non numeric band Center"))
            })
            .collect()
    }

    // ===== Instrument =====

    fn instrument(&self) -> IsisResult<PvlBlock> {
        self.labels.block("IsisCube.Instrument")
    }

    pub fn start_time(&self) -> IsisResult<DateTime<Utc>> {
        parse_isis_time(&self.instrument()?.require("StartTime")?.to_text())
    }

    pub fn stop_time(&self) -> IsisResult<DateTime<Utc>> {
        parse_isis_time(&self.instrument()?.require("StopTime")?.to_text())
    }

    pub fn duration(&self) -> IsisResult<Duration> {
        Ok(self.stop_time()? - self.start_time()?)
    }

    /// Middle of the acquisition.
    pub fn mid_time(&self) -> IsisResult<DateTime<Utc>> {
        Ok(self.start_time()? + self.duration()? / 2)
    }

    pub fn exposure(&self) -> IsisResult<Exposure> {
        let value = self.instrument()?.require("ExposureDuration")?.clone();
        Ok(Exposure {
            value: value.as_f64().ok_or_else(|| {
                IsisError::invalid_format("ExposureDuration is not a number")
            })?,
            unit: value.unit().map(String::from),
        })
    }

    pub fn target_name(&self) -> IsisResult<String> {
        Ok(self.instrument()?.require_str("TargetName")?.to_string())
    }

    /// Kernel paths cached in the label (`$`-prefixed entries only).
    pub fn kernels(&self) -> Option<Vec<String>> {
        let kernels = self.labels.block("IsisCube.Kernels").ok()?;
        Some(
            kernels
                .iter()
                .flat_map(|(_, value)| value.items())
                .filter_map(PvlValue::as_str)
                .filter(|k| k.contains('$'))
                .map(String::from)
                .collect(),
        )
    }

    /// Target radii (km) from the first `NaifKeywords` key containing
    /// `RADII`.
    pub fn target_radii(&self) -> IsisResult<Vec<f64>> {
        let naif = self.labels.block("NaifKeywords")?;
        let (_, radii) = naif
            .iter()
            .find(|(key, _)| key.contains("RADII"))
            .ok_or_else(|| IsisError::key_not_found("NaifKeywords.*RADII"))?;

        radii
            .items()
            .iter()
            .map(|v| {
                v.as_f64()
                    .ok_or_else(|| IsisError::invalid_format("non numeric target radii"))
            })
            .collect()
    }

    /// Geometric mean of the target radii (km).
    pub fn target_radius(&self) -> IsisResult<f64> {
        let radii = self.target_radii()?;
        if radii.is_empty() {
            return Err(IsisError::invalid_format("empty target radii"));
        }
        let product: f64 = radii.iter().product();
        Ok(product.powf(1.0 / radii.len() as f64))
    }

    // ===== Original label =====

    pub fn original_labels(&self) -> IsisResult<&OriginalLabels> {
        if let Some(labels) = self.original_labels.get() {
            return Ok(labels);
        }
        let labels = OriginalLabels::read(&self.path, &self.root)?;
        Ok(self.original_labels.get_or_init(|| labels))
    }

    // ===== Geometry =====

    /// Body rotation quaternion (scalar first, normalized).
    pub fn body_rotation(&self) -> IsisResult<[f64; 4]> {
        let table = self.tables.get("BodyRotation")?;
        let raw = [
            table.middle("J2000Q0")?,
            table.middle("J2000Q1")?,
            table.middle("J2000Q2")?,
            table.middle("J2000Q3")?,
        ];
        let norm = raw.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 {
            return Ok(raw);
        }
        Ok(raw.map(|v| v / norm))
    }

    fn body_frame_position(&self, table: &str) -> IsisResult<Vector3<f64>> {
        let table = self.tables.get(table)?;
        let j2000 = Vector3::new(
            table.middle("J2000X")?,
            table.middle("J2000Y")?,
            table.middle("J2000Z")?,
        );
        Ok(q_rot(self.body_rotation()?, &j2000))
    }

    /// Spacecraft position in the target body frame (km).
    pub fn spacecraft_position(&self) -> IsisResult<Vector3<f64>> {
        self.body_frame_position("InstrumentPosition")
    }

    /// Sun position in the target body frame (km).
    pub fn sun_position(&self) -> IsisResult<Vector3<f64>> {
        self.body_frame_position("SunPosition")
    }

    /// Sub-spacecraft point (west longitude, latitude).
    pub fn sub_spacecraft(&self) -> IsisResult<(f64, f64)> {
        Ok(lonlat(&self.spacecraft_position()?))
    }

    /// Sub-solar point (west longitude, latitude).
    pub fn sub_solar(&self) -> IsisResult<(f64, f64)> {
        Ok(lonlat(&self.sun_position()?))
    }

    /// Unit vector toward the spacecraft in the body frame.
    pub fn spacecraft_direction(&self) -> IsisResult<Vector3<f64>> {
        Ok(hat(&self.spacecraft_position()?))
    }
}

/// Check the container signature.
pub fn is_isis(path: &Path) -> IsisResult<bool> {
    let mut file = File::open(path)?;
    let mut head = [0u8; 17];
    match file.read_exact(&mut head) {
        Ok(()) => Ok(&head == SIGNATURE),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Read the label text up to and including the top-level `End` line.
fn read_label_text(path: &Path) -> IsisResult<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut text = String::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let decoded = String::from_utf8_lossy(&line);
        text.push_str(&decoded);
        if decoded.trim() == "End" {
            break;
        }
    }

    debug!(bytes = text.len(), "Read label text");
    Ok(text)
}
