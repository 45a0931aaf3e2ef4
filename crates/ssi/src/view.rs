//! Instrument views over ISIS cubes.
//!
//! An [`InstrumentView`] wraps a Galileo SSI or New Horizons LORRI cube
//! and exposes its bands by name: the calibrated data layer and the
//! navigation backplanes computed by the ISIS pipeline. Alignment between
//! data and navigation is computed on first use and cached.

use std::cell::OnceCell;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use cube_processing::{
    apply_offset, compute_offset, edges, trace_all, AlignTarget, Contour, Offset,
};
use geometry::deg180;
use isis_common::grid::check_index;
use isis_common::{Grid, IsisError, IsisResult, Mask};
use isis_parser::{Exposure, IsisCube};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::{AlignmentMode, ViewConfig};
use crate::geojson::{Coordinates, Feature, Geometry, GeometryKind, Position};
use crate::lorri::{Calibration, FitsHeader};
use crate::pixel::PixelRecord;

pub const PHASE: &str = "Phase Angle";
pub const INCIDENCE: &str = "Incidence Angle";
pub const EMISSION: &str = "Emission Angle";
pub const LONGITUDE: &str = "Longitude";
pub const LATITUDE: &str = "Latitude";
pub const RESOLUTION: &str = "Pixel Resolution";

/// Data layer name of LORRI cubes.
pub const LORRI_DATA: &str = "Data";

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Camera that produced the cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    /// Galileo Solid State Imager.
    Ssi,
    /// New Horizons Long Range Reconnaissance Imager.
    Lorri,
}

impl Instrument {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ssi" | "galileo" => Some(Self::Ssi),
            "lorri" | "new-horizons" => Some(Self::Lorri),
            _ => None,
        }
    }
}

/// Band-level access to a camera cube.
#[derive(Debug)]
pub struct InstrumentView {
    cube: IsisCube,
    instrument: Instrument,
    config: ViewConfig,
    layers: Vec<String>,
    manual_offset: Option<Offset>,
    offset: OnceCell<Offset>,
    data: OnceCell<Grid>,
    fits: OnceCell<FitsHeader>,
}

impl InstrumentView {
    #[instrument(skip(path, config), fields(path = %path.as_ref().display()))]
    pub fn open(
        path: impl AsRef<Path>,
        instrument: Instrument,
        config: ViewConfig,
    ) -> IsisResult<Self> {
        config.validate()?;
        let cube = IsisCube::open_with_tolerance(path.as_ref(), config.null_tolerance)?;
        let layers = cube.band_names()?;

        info!(
            ?instrument,
            layers = layers.len(),
            alignment = %config.alignment,
            "Opened instrument view"
        );

        Ok(Self {
            cube,
            instrument,
            config,
            layers,
            manual_offset: None,
            offset: OnceCell::new(),
            data: OnceCell::new(),
            fits: OnceCell::new(),
        })
    }

    /// Galileo SSI view with the default configuration.
    pub fn ssi(path: impl AsRef<Path>) -> IsisResult<Self> {
        Self::open(path, Instrument::Ssi, ViewConfig::default())
    }

    /// LORRI view with the default configuration.
    pub fn lorri(path: impl AsRef<Path>) -> IsisResult<Self> {
        Self::open(path, Instrument::Lorri, ViewConfig::default())
    }

    /// Change the alignment mode, dropping cached products.
    pub fn with_alignment(mut self, mode: AlignmentMode) -> Self {
        self.config.alignment = mode;
        self.reset();
        self
    }

    /// Use a known offset instead of computing one.
    pub fn with_offset(mut self, offset: Offset, mode: AlignmentMode) -> Self {
        self.config.alignment = mode;
        self.manual_offset = Some(offset);
        self.reset();
        self
    }

    fn reset(&mut self) {
        self.offset = OnceCell::new();
        self.data = OnceCell::new();
    }

    pub fn cube(&self) -> &IsisCube {
        &self.cube
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    // ===== Identification =====

    /// File name up to its first dot.
    pub fn img_id(&self) -> String {
        self.cube
            .path()
            .file_name()
            .map(|name| name.to_string_lossy())
            .and_then(|name| name.split('.').next().map(String::from))
            .unwrap_or_default()
    }

    /// (lines, samples).
    pub fn size(&self) -> (usize, usize) {
        (self.cube.lines(), self.cube.samples())
    }

    /// Image extent `[left, right, bottom, top]` in pixel-edge coordinates.
    pub fn extent(&self) -> [f64; 4] {
        let (lines, samples) = self.size();
        [0.5, samples as f64 + 0.5, lines as f64 + 0.5, 0.5]
    }

    pub fn sample_ticks(&self) -> [usize; 5] {
        ticks(self.cube.samples())
    }

    pub fn line_ticks(&self) -> [usize; 5] {
        ticks(self.cube.lines())
    }

    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn filter_name(&self) -> IsisResult<String> {
        match self.instrument {
            Instrument::Ssi => Ok(self.cube.labels().get("IsisCube.BandBin.FilterName")?.to_text()),
            Instrument::Lorri => Ok("None".to_string()),
        }
    }

    /// Name of the band holding the image data.
    pub fn data_layer(&self) -> IsisResult<String> {
        match self.instrument {
            Instrument::Ssi => self.filter_name(),
            Instrument::Lorri => Ok(LORRI_DATA.to_string()),
        }
    }

    pub fn target_name(&self) -> IsisResult<String> {
        self.cube.target_name()
    }

    pub fn start(&self) -> IsisResult<DateTime<Utc>> {
        self.cube.start_time()
    }

    /// Acquisition end, unknown for LORRI.
    pub fn stop(&self) -> IsisResult<Option<DateTime<Utc>>> {
        match self.instrument {
            Instrument::Ssi => self.cube.stop_time().map(Some),
            Instrument::Lorri => Ok(None),
        }
    }

    pub fn mid_time(&self) -> IsisResult<DateTime<Utc>> {
        match self.instrument {
            Instrument::Ssi => self.cube.mid_time(),
            Instrument::Lorri => self.start(),
        }
    }

    pub fn exposure(&self) -> IsisResult<Exposure> {
        let exposure = self.cube.exposure()?;
        match self.instrument {
            Instrument::Ssi => Ok(exposure),
            Instrument::Lorri => Ok(Exposure {
                value: exposure.value,
                unit: Some("sec".to_string()),
            }),
        }
    }

    /// FITS cards of a LORRI original label.
    pub fn fits_header(&self) -> IsisResult<&FitsHeader> {
        if let Some(header) = self.fits.get() {
            return Ok(header);
        }
        let header = FitsHeader::parse(self.cube.original_labels()?.iter())?;
        Ok(self.fits.get_or_init(|| header))
    }

    /// Target distance to the sun (km), from the LORRI FITS header.
    pub fn sun_distance(&self) -> IsisResult<f64> {
        self.fits_header()?.require_f64("SPCTSORN")
    }

    // ===== Bands =====

    fn layer_index(&self, name: &str) -> IsisResult<usize> {
        self.layers
            .iter()
            .position(|layer| layer == name)
            .ok_or_else(|| IsisError::UnknownLayer(name.to_string()))
    }

    /// Band as stored, before alignment.
    pub fn raw(&self, name: &str) -> IsisResult<Grid> {
        let index = self.layer_index(name)?;
        self.cube.cube()?.band_grid(index)
    }

    fn raw_valid(&self) -> IsisResult<Mask> {
        let lat = self.raw(LATITUDE)?.finite_mask();
        lat.and(&self.raw(LONGITUDE)?.finite_mask())
    }

    /// Offset between data and navigation, `None` when alignment is off.
    pub fn offset(&self) -> IsisResult<Option<Offset>> {
        if self.config.alignment == AlignmentMode::None {
            return Ok(None);
        }
        if let Some(offset) = self.manual_offset {
            return Ok(Some(offset));
        }
        if let Some(offset) = self.offset.get() {
            return Ok(Some(*offset));
        }
        let data = self.raw(&self.data_layer()?)?;
        let offset = compute_offset(&data, &self.raw_valid()?)?;
        Ok(Some(*self.offset.get_or_init(|| offset)))
    }

    fn aligned(&self, grid: Grid, frame: AlignTarget) -> IsisResult<Grid> {
        if self.config.alignment.target() != Some(frame) {
            return Ok(grid);
        }
        match self.offset()? {
            Some(offset) => Ok(apply_offset(&grid, offset, frame)),
            None => Ok(grid),
        }
    }

    /// Band by name, aligned according to the configured mode.
    pub fn get(&self, name: &str) -> IsisResult<Grid> {
        let grid = self.raw(name)?;
        let frame = if name == self.data_layer()? {
            AlignTarget::Data
        } else {
            AlignTarget::Navigation
        };
        self.aligned(grid, frame)
    }

    /// Image data as I/F.
    pub fn data(&self) -> IsisResult<&Grid> {
        if let Some(data) = self.data.get() {
            return Ok(data);
        }

        let mut data = self.raw(&self.data_layer()?)?;
        if self.instrument == Instrument::Lorri {
            let calibration = Calibration::from_header(
                self.fits_header()?,
                &self.config.lorri_source,
                self.exposure()?.value,
            )?;
            debug!(factor = calibration.factor(), "LORRI I/F calibration");
            data = calibration.apply(&data);
        }
        let data = self.aligned(data, AlignTarget::Data)?;
        Ok(self.data.get_or_init(|| data))
    }

    /// Phase angle (degrees).
    pub fn phase(&self) -> IsisResult<Grid> {
        self.get(PHASE)
    }

    /// Incidence angle (degrees).
    pub fn inc(&self) -> IsisResult<Grid> {
        self.get(INCIDENCE)
    }

    /// Emission angle (degrees).
    pub fn emi(&self) -> IsisResult<Grid> {
        self.get(EMISSION)
    }

    /// West longitude (degrees).
    pub fn lon(&self) -> IsisResult<Grid> {
        self.get(LONGITUDE)
    }

    /// East longitude in [-180, 180) degrees.
    pub fn lon_e(&self) -> IsisResult<Grid> {
        Ok(self.lon()?.map(|lon_w| deg180(-lon_w)))
    }

    /// North latitude (degrees).
    pub fn lat(&self) -> IsisResult<Grid> {
        self.get(LATITUDE)
    }

    /// Ground resolution (km/pixel).
    pub fn res(&self) -> IsisResult<Grid> {
        self.get(RESOLUTION)
    }

    /// Cosine of the incidence angle.
    pub fn mu0(&self) -> IsisResult<Grid> {
        Ok(self.inc()?.map(|v| v.to_radians().cos()))
    }

    /// Cosine of the emission angle.
    pub fn mu1(&self) -> IsisResult<Grid> {
        Ok(self.emi()?.map(|v| v.to_radians().cos()))
    }

    /// Pixels with finite ground coordinates.
    pub fn valid(&self) -> IsisResult<Mask> {
        self.lat()?.finite_mask().and(&self.lon()?.finite_mask())
    }

    /// Pixels off the target.
    pub fn limb(&self) -> IsisResult<Mask> {
        Ok(self.valid()?.not())
    }

    /// Values of one pixel (1-based sample and line).
    pub fn pixel(&self, sample: i64, line: i64) -> IsisResult<PixelRecord> {
        let (lines, samples) = self.size();
        check_index("sample", sample, samples)?;
        check_index("line", line, lines)?;

        Ok(PixelRecord {
            img_id: self.img_id(),
            sample,
            line,
            data: self.data()?.at(sample, line)?,
            lon: self.lon()?.at(sample, line)?,
            lon_e: self.lon_e()?.at(sample, line)?,
            lat: self.lat()?.at(sample, line)?,
            inc: self.inc()?.at(sample, line)?,
            emi: self.emi()?.at(sample, line)?,
            phase: self.phase()?.at(sample, line)?,
            res: self.res()?.at(sample, line)?,
        })
    }

    // ===== Contours =====

    /// Outlines of the valid region, using the configured minimum length.
    pub fn contours(&self) -> IsisResult<Vec<Contour>> {
        self.contours_with(self.config.contour_min_length)
    }

    pub fn contours_with(&self, min_length: usize) -> IsisResult<Vec<Contour>> {
        let contours = trace_all(&edges(&self.valid()?), min_length)?;
        debug!(contours = contours.len(), min_length, "Traced valid region");
        Ok(contours)
    }

    /// Contours in (east longitude, latitude).
    pub fn contours_lonlat(&self, min_length: usize) -> IsisResult<Vec<Vec<Position>>> {
        let lon_e = self.lon_e()?;
        let lat = self.lat()?;
        let position = |(l, s): (usize, usize)| -> Position {
            let lon = lon_e.get(l, s).map(f64::from).unwrap_or(f64::NAN);
            let lat = lat.get(l, s).map(f64::from).unwrap_or(f64::NAN);
            [lon, lat]
        };
        Ok(self
            .contours_with(min_length)?
            .iter()
            .map(|c| c.points().iter().copied().map(position).collect())
            .collect())
    }

    /// GeoJSON footprint of the valid region with image metadata.
    ///
    /// A single contour gives a Polygon, otherwise a MultiPolygon.
    pub fn footprint(&self) -> IsisResult<Feature> {
        let precision = self.config.geojson_precision;
        let mut rings = self.contours_lonlat(self.config.contour_min_length)?;

        let geometry = if rings.len() == 1 {
            Geometry::build(
                GeometryKind::Polygon,
                Coordinates::Rings(vec![rings.remove(0)]),
                precision,
            )?
        } else {
            Geometry::build(
                GeometryKind::MultiPolygon,
                Coordinates::Polygons(rings.into_iter().map(|ring| vec![ring]).collect()),
                precision,
            )?
        };

        let valid = self.valid()?;
        let extrema = |grid: Grid| -> IsisResult<(Option<f64>, Option<f64>)> {
            let values = grid.select(&valid)?;
            let finite = values.iter().copied().filter(|v| v.is_finite());
            Ok((
                finite.clone().reduce(f32::min).map(f64::from),
                finite.reduce(f32::max).map(f64::from),
            ))
        };
        let (res_min, res_max) = extrema(self.res()?)?;
        let (inc_min, inc_max) = extrema(self.inc()?)?;
        let (emi_min, emi_max) = extrema(self.emi()?)?;
        let (phase_min, phase_max) = extrema(self.phase()?)?;

        let mut feature = Feature::new(geometry, precision)
            .with_property("image", self.img_id())
            .with_property("target", self.target_name()?)
            .with_property("start", self.start()?.format(TIME_FORMAT).to_string())
            .with_property("time", self.mid_time()?.format(TIME_FORMAT).to_string())
            .with_optional("res_min", res_min)
            .with_optional("res_max", res_max)
            .with_optional("inc_min", inc_min)
            .with_optional("inc_max", inc_max)
            .with_optional("emi_min", emi_min)
            .with_optional("emi_max", emi_max)
            .with_optional("phase_min", phase_min)
            .with_optional("phase_max", phase_max);

        if let Some(stop) = self.stop()? {
            feature = feature.with_property("stop", stop.format(TIME_FORMAT).to_string());
        }
        if let Some(offset) = self.offset()? {
            feature = feature
                .with_property("offset_samples", offset.samples)
                .with_property("offset_lines", offset.lines);
        }
        Ok(feature)
    }

    /// Multi-line summary.
    pub fn describe(&self) -> String {
        let mut lines = vec![
            format!("<{:?}> Cube: {}", self.instrument, self),
            format!("Size: {:?}", (self.cube.samples(), self.cube.lines())),
        ];
        if let Ok(start) = self.start() {
            lines.push(format!("Start time: {}", start.format(TIME_FORMAT)));
        }
        if let Ok(filter) = self.filter_name() {
            lines.push(format!("Filter name: {}", filter));
        }
        if let Ok(exposure) = self.exposure() {
            lines.push(format!(
                "Exposure: {} {}",
                exposure.value,
                exposure.unit.unwrap_or_default()
            ));
        }
        if let Ok(target) = self.target_name() {
            lines.push(format!("Main target: {}", target));
        }
        lines.join("\n - ")
    }
}

impl fmt::Display for InstrumentView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.img_id())
    }
}

/// Axis ticks at 1, quarters and the last pixel.
fn ticks(n: usize) -> [usize; 5] {
    [1, n / 4, n / 2, n / 4 + n / 2, n]
}
