//! Geological unit lookup on equirectangular reference maps.
//!
//! A reference map is an 8-bit image centred on 180° (west longitude
//! increasing to the left) whose pixel values index a legend of unit
//! names and colors.

mod legends;

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageError};
use isis_common::{IsisError, IsisResult};
use tracing::{debug, instrument};

use crate::view::InstrumentView;

pub use legends::{europa_colors, europa_legend, pluto_colors, pluto_legend};

/// `(pixel value, name)` pairs.
pub type Legend = Vec<(u8, &'static str)>;

/// `(pixel value, #RRGGBB[AA])` pairs.
pub type Colors = Vec<(u8, &'static str)>;

/// A geological map with its legend.
#[derive(Debug)]
pub struct ReferenceMap {
    name: String,
    source: Option<PathBuf>,
    image: OnceCell<GrayImage>,
    legend: Legend,
    colors: Colors,
}

impl ReferenceMap {
    /// Map backed by an image already in memory.
    pub fn new(name: &str, image: GrayImage, legend: Legend, colors: Colors) -> IsisResult<Self> {
        check_image(&image)?;
        Ok(Self {
            name: name.to_string(),
            source: None,
            image: OnceCell::from(image),
            legend,
            colors,
        })
    }

    /// Map read from `path` on first lookup.
    pub fn from_path(name: &str, path: impl AsRef<Path>, legend: Legend, colors: Colors) -> Self {
        Self {
            name: name.to_string(),
            source: Some(path.as_ref().to_path_buf()),
            image: OnceCell::new(),
            legend,
            colors,
        }
    }

    pub fn europa(path: impl AsRef<Path>) -> Self {
        Self::from_path("Europa", path, europa_legend(), europa_colors())
    }

    pub fn pluto(path: impl AsRef<Path>) -> Self {
        Self::from_path("Pluto", path, pluto_legend(), pluto_colors())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn legend(&self) -> &[(u8, &'static str)] {
        &self.legend
    }

    pub fn colors(&self) -> &[(u8, &'static str)] {
        &self.colors
    }

    /// Unit names in legend order.
    pub fn units(&self) -> Vec<&'static str> {
        self.legend.iter().map(|&(_, name)| name).collect()
    }

    /// The map image, decoded on first call.
    pub fn image(&self) -> IsisResult<&GrayImage> {
        if let Some(image) = self.image.get() {
            return Ok(image);
        }
        let path = self.source.as_deref().ok_or_else(|| {
            IsisError::invalid_argument(format!("map `{}` has no image", self.name))
        })?;
        let image = load_image(path)?;
        Ok(self.image.get_or_init(|| image))
    }
}

fn check_image(image: &GrayImage) -> IsisResult<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(IsisError::invalid_argument("reference map image is empty"));
    }
    Ok(())
}

#[instrument(skip(path), fields(path = %path.display()))]
fn load_image(path: &Path) -> IsisResult<GrayImage> {
    if !path.exists() {
        return Err(IsisError::NotFound(path.to_path_buf()));
    }
    let image = image::open(path)
        .map_err(|e| match e {
            ImageError::IoError(io) => IsisError::Io(io),
            other => IsisError::unsupported(other.to_string()),
        })?
        .to_luma8();
    check_image(&image)?;
    debug!(
        width = image.width(),
        height = image.height(),
        "Loaded reference map"
    );
    Ok(image)
}

/// Image (column, row) closest to a west longitude and latitude.
///
/// NaN coordinates map to the last column or row.
pub fn map_index(map: &ReferenceMap, lon_w: f64, lat: f64) -> IsisResult<(u32, u32)> {
    let image = map.image()?;
    Ok(index_in(image.width(), image.height(), lon_w, lat))
}

fn index_in(width: u32, height: u32, lon_w: f64, lat: f64) -> (u32, u32) {
    let (w, h) = (f64::from(width), f64::from(height));

    let i = if lon_w.is_nan() {
        width - 1
    } else {
        let i = ((-lon_w).rem_euclid(360.0) * w / 360.0).round_ties_even();
        if i >= w {
            width - 1
        } else {
            i as u32
        }
    };

    let j = if lat.is_nan() {
        height - 1
    } else {
        ((90.0 - lat) * h / 180.0)
            .round_ties_even()
            .clamp(0.0, h - 1.0) as u32
    };
    (i, j)
}

/// Raw map value at a location.
pub fn lookup_value(map: &ReferenceMap, lon_w: f64, lat: f64) -> IsisResult<u8> {
    let image = map.image()?;
    let (i, j) = index_in(image.width(), image.height(), lon_w, lat);
    Ok(image.get_pixel(i, j).0[0])
}

/// Unit name at a location, `None` when the value is not in the legend.
pub fn lookup_unit(map: &ReferenceMap, lon_w: f64, lat: f64) -> IsisResult<Option<&'static str>> {
    let value = lookup_value(map, lon_w, lat)?;
    Ok(map
        .legend
        .iter()
        .find(|&&(v, _)| v == value)
        .map(|&(_, name)| name))
}

/// Colors of every legend entry named `unit`.
pub fn color_of(map: &ReferenceMap, unit: &str) -> IsisResult<Vec<&'static str>> {
    let colors: Vec<&'static str> = map
        .legend
        .iter()
        .filter(|&&(_, name)| name == unit)
        .filter_map(|&(value, _)| {
            map.colors
                .iter()
                .find(|&&(v, _)| v == value)
                .map(|&(_, color)| color)
        })
        .collect();

    if colors.is_empty() {
        return Err(IsisError::invalid_argument(format!(
            "unit unknown: `{}`",
            unit
        )));
    }
    Ok(colors)
}

/// Unit of every pixel of a view in row-major order, `None` on the limb.
pub fn units_of(view: &InstrumentView, map: &ReferenceMap) -> IsisResult<Vec<Option<&'static str>>> {
    let lon = view.lon()?;
    let lat = view.lat()?;
    let valid = view.valid()?;

    lon.data()
        .iter()
        .zip(lat.data())
        .zip(valid.data())
        .map(|((&lon_w, &lat), &valid)| {
            if valid {
                lookup_unit(map, f64::from(lon_w), f64::from(lat))
            } else {
                Ok(None)
            }
        })
        .collect()
}
