//! Synthetic ISIS cube files.
//!
//! [`CubeBuilder`] writes a complete cube: PVL label, tiled or
//! band-sequential raster, binary tables and an original label block. The
//! encoder is written independently of the parser crates so decoding tests
//! compare two implementations of the layout.

use std::io;
use std::path::{Path, PathBuf};

/// Raw value of the ISIS `Null` special pixel for 32-bit reals.
pub const ISIS_NULL_REAL: f64 = -3.4028226550889045e38;

/// Smallest 32-bit real, written for saturated pixels.
pub const ISIS_SATURATED_REAL: f64 = f32::MIN as f64;

/// A numeric table field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub kind: &'static str,
    pub size: usize,
}

impl FieldSpec {
    pub fn new(name: &str, kind: &'static str, size: usize) -> Self {
        Self {
            name: name.to_string(),
            kind,
            size,
        }
    }
}

/// A binary table written after the raster.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub name: String,
    pub fields: Vec<FieldSpec>,
    /// One entry per record, holding every expanded column value.
    pub records: Vec<Vec<f64>>,
}

impl TableSpec {
    pub fn new(name: &str, fields: Vec<FieldSpec>, records: Vec<Vec<f64>>) -> Self {
        Self {
            name: name.to_string(),
            fields,
            records,
        }
    }

    /// Table of `Double` columns.
    pub fn doubles(name: &str, columns: &[&str], records: Vec<Vec<f64>>) -> Self {
        let fields = columns
            .iter()
            .map(|c| FieldSpec::new(c, "Double", 1))
            .collect();
        Self::new(name, fields, records)
    }

    fn payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for record in &self.records {
            let mut values = record.iter();
            for field in &self.fields {
                for _ in 0..field.size {
                    let v = values.next().copied().unwrap_or(0.0);
                    encode_value(field.kind, "Lsb", v, &mut out);
                }
            }
        }
        out
    }
}

/// Builder for a synthetic cube file.
#[derive(Debug, Clone)]
pub struct CubeBuilder {
    samples: usize,
    lines: usize,
    bands: usize,
    pixel_type: &'static str,
    byte_order: &'static str,
    base: f64,
    multiplier: f64,
    /// (tile_samples, tile_lines), `None` for band sequential storage.
    tile: Option<(usize, usize)>,
    data: Vec<f64>,
    band_names: Vec<String>,
    filter_name: Option<String>,
    instrument: Vec<(String, String)>,
    kernels: Vec<(String, String)>,
    naif: Vec<(String, String)>,
    tables: Vec<TableSpec>,
    original_label: Option<String>,
}

impl CubeBuilder {
    /// Real-valued, little-endian, band sequential cube of zeros.
    pub fn new(samples: usize, lines: usize, bands: usize) -> Self {
        Self {
            samples,
            lines,
            bands,
            pixel_type: "Real",
            byte_order: "Lsb",
            base: 0.0,
            multiplier: 1.0,
            tile: None,
            data: vec![0.0; samples * lines * bands],
            band_names: Vec::new(),
            filter_name: None,
            instrument: Vec::new(),
            kernels: Vec::new(),
            naif: Vec::new(),
            tables: Vec::new(),
            original_label: None,
        }
    }

    pub fn pixel_type(mut self, kind: &'static str) -> Self {
        self.pixel_type = kind;
        self
    }

    pub fn byte_order(mut self, order: &'static str) -> Self {
        self.byte_order = order;
        self
    }

    pub fn scaling(mut self, base: f64, multiplier: f64) -> Self {
        self.base = base;
        self.multiplier = multiplier;
        self
    }

    pub fn tiled(mut self, tile_samples: usize, tile_lines: usize) -> Self {
        self.tile = Some((tile_samples, tile_lines));
        self
    }

    /// Raw (stored) values in (band, line, sample) order.
    pub fn data(mut self, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            self.samples * self.lines * self.bands,
            "data length does not match cube shape"
        );
        self.data = data;
        self
    }

    /// Set the raw values of one band (0-based), NaN written as ISIS Null.
    pub fn band(mut self, index: usize, values: &[f32]) -> Self {
        let size = self.samples * self.lines;
        assert_eq!(values.len(), size, "band length does not match cube shape");
        for (dst, &v) in self.data[index * size..(index + 1) * size]
            .iter_mut()
            .zip(values)
        {
            *dst = if v.is_nan() { ISIS_NULL_REAL } else { v as f64 };
        }
        self
    }

    pub fn band_names(mut self, names: &[&str]) -> Self {
        self.band_names = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn filter_name(mut self, name: &str) -> Self {
        self.filter_name = Some(name.to_string());
        self
    }

    /// Add an `Instrument` keyword; `value` is written verbatim.
    pub fn instrument(mut self, key: &str, value: &str) -> Self {
        self.instrument.push((key.to_string(), value.to_string()));
        self
    }

    pub fn kernel(mut self, key: &str, value: &str) -> Self {
        self.kernels.push((key.to_string(), value.to_string()));
        self
    }

    pub fn naif_keyword(mut self, key: &str, value: &str) -> Self {
        self.naif.push((key.to_string(), value.to_string()));
        self
    }

    pub fn table(mut self, table: TableSpec) -> Self {
        self.tables.push(table);
        self
    }

    pub fn original_label(mut self, text: &str) -> Self {
        self.original_label = Some(text.to_string());
        self
    }

    /// Body rotation, spacecraft and sun tables for a single epoch.
    pub fn ephemeris(self, quaternion: [f64; 4], spacecraft: [f64; 3], sun: [f64; 3]) -> Self {
        self.table(TableSpec::doubles(
            "BodyRotation",
            &["J2000Q0", "J2000Q1", "J2000Q2", "J2000Q3"],
            vec![quaternion.to_vec()],
        ))
        .table(TableSpec::doubles(
            "InstrumentPosition",
            &["J2000X", "J2000Y", "J2000Z"],
            vec![spacecraft.to_vec()],
        ))
        .table(TableSpec::doubles(
            "SunPosition",
            &["J2000X", "J2000Y", "J2000Z"],
            vec![sun.to_vec()],
        ))
    }

    /// Render the complete file.
    pub fn build(&self) -> Vec<u8> {
        let raster = self.raster_payload();
        let tables: Vec<Vec<u8>> = self.tables.iter().map(TableSpec::payload).collect();
        let original = self.original_label.clone().unwrap_or_default().into_bytes();

        let mut label_size = 1024;
        let label = loop {
            let text = self.render_label(label_size, raster.len(), &tables, original.len());
            if text.len() <= label_size {
                break text;
            }
            label_size *= 2;
        };

        let mut out = label.into_bytes();
        out.resize(label_size, 0);
        out.extend_from_slice(&raster);
        for table in &tables {
            out.extend_from_slice(table);
        }
        out.extend_from_slice(&original);
        out
    }

    pub fn write(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.build())
    }

    /// Write `name` inside `dir` and return its path.
    pub fn write_in(&self, dir: &Path, name: &str) -> io::Result<PathBuf> {
        let path = dir.join(name);
        self.write(&path)?;
        Ok(path)
    }

    fn raster_payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let (s, l, b) = (self.samples, self.lines, self.bands);

        match self.tile {
            None => {
                for &v in &self.data {
                    encode_value(self.pixel_type, self.byte_order, v, &mut out);
                }
            }
            Some((ts, tl)) => {
                let across = s.div_ceil(ts);
                let down = l.div_ceil(tl);
                for band in 0..b {
                    for tile_row in 0..down {
                        for tile_col in 0..across {
                            for tile_line in 0..tl {
                                for tile_sample in 0..ts {
                                    let line = tile_row * tl + tile_line;
                                    let sample = tile_col * ts + tile_sample;
                                    let v = if line < l && sample < s {
                                        self.data[(band * l + line) * s + sample]
                                    } else {
                                        0.0
                                    };
                                    encode_value(self.pixel_type, self.byte_order, v, &mut out);
                                }
                            }
                        }
                    }
                }
            }
        }
        out
    }

    fn render_label(
        &self,
        label_size: usize,
        raster_bytes: usize,
        tables: &[Vec<u8>],
        original_bytes: usize,
    ) -> String {
        let mut text = String::new();
        let mut next = label_size;

        text.push_str("Object = IsisCube\n  Object = Core\n");
        text.push_str(&format!("    StartByte   = {}\n", next + 1));
        match self.tile {
            Some((ts, tl)) => {
                text.push_str("    Format      = Tile\n");
                text.push_str(&format!("    TileSamples = {}\n", ts));
                text.push_str(&format!("    TileLines   = {}\n", tl));
            }
            None => text.push_str("    Format      = BandSequential\n"),
        }
        text.push_str(&format!(
            "\n    Group = Dimensions\n      Samples = {}\n      Lines   = {}\n      Bands   = {}\n    End_Group\n",
            self.samples, self.lines, self.bands
        ));
        text.push_str(&format!(
            "\n    Group = Pixels\n      Type       = {}\n      ByteOrder  = {}\n      Base       = {:?}\n      Multiplier = {:?}\n    End_Group\n  End_Object\n",
            self.pixel_type, self.byte_order, self.base, self.multiplier
        ));
        next += raster_bytes;

        if !self.instrument.is_empty() {
            text.push_str("\n  Group = Instrument\n");
            for (key, value) in &self.instrument {
                text.push_str(&format!("    {} = {}\n", key, value));
            }
            text.push_str("  End_Group\n");
        }

        if !self.band_names.is_empty() || self.filter_name.is_some() {
            text.push_str("\n  Group = BandBin\n");
            if let Some(filter) = &self.filter_name {
                text.push_str(&format!("    FilterName   = {}\n", filter));
            }
            if !self.band_names.is_empty() {
                let names: Vec<String> =
                    self.band_names.iter().map(|n| format!("\"{}\"", n)).collect();
                text.push_str(&format!("    Name         = ({})\n", names.join(", ")));
                let bands: Vec<String> =
                    (1..=self.band_names.len()).map(|i| i.to_string()).collect();
                text.push_str(&format!("    OriginalBand = ({})\n", bands.join(", ")));
            }
            text.push_str("  End_Group\n");
        }

        if !self.kernels.is_empty() {
            text.push_str("\n  Group = Kernels\n");
            for (key, value) in &self.kernels {
                text.push_str(&format!("    {} = {}\n", key, value));
            }
            text.push_str("  End_Group\n");
        }
        text.push_str("End_Object\n");

        for (spec, payload) in self.tables.iter().zip(tables) {
            text.push_str(&format!(
                "\nObject = Table\n  Name      = {}\n  StartByte = {}\n  Bytes     = {}\n  Records   = {}\n  ByteOrder = Lsb\n",
                spec.name,
                next + 1,
                payload.len(),
                spec.records.len()
            ));
            for field in &spec.fields {
                text.push_str(&format!(
                    "\n  Group = Field\n    Name = {}\n    Type = {}\n    Size = {}\n  End_Group\n",
                    field.name, field.kind, field.size
                ));
            }
            text.push_str("End_Object\n");
            next += payload.len();
        }

        if !self.naif.is_empty() {
            text.push_str("\nObject = NaifKeywords\n");
            for (key, value) in &self.naif {
                text.push_str(&format!("  {} = {}\n", key, value));
            }
            text.push_str("End_Object\n");
        }

        if self.original_label.is_some() {
            text.push_str(&format!(
                "\nObject = OriginalLabel\n  Name      = IsisCube\n  StartByte = {}\n  Bytes     = {}\nEnd_Object\n",
                next + 1,
                original_bytes
            ));
        }

        text.push_str("End\n");
        text
    }
}

/// Append `v` encoded as an ISIS `Type` keyword.
pub fn encode_value(kind: &str, order: &str, v: f64, out: &mut Vec<u8>) {
    let little = match order {
        "Msb" => false,
        "Lsb" => true,
        _ => cfg!(target_endian = "little"),
    };

    macro_rules! push {
        ($t:ty) => {{
            let x = v as $t;
            if little {
                out.extend_from_slice(&x.to_le_bytes());
            } else {
                out.extend_from_slice(&x.to_be_bytes());
            }
        }};
    }

    match kind {
        "UnsignedByte" => push!(u8),
        "SignedByte" => push!(i8),
        "UnsignedWord" => push!(u16),
        "SignedWord" => push!(i16),
        "UnsignedInteger" => push!(u32),
        "SignedInteger" | "Integer" => push!(i32),
        "Real" => push!(f32),
        "Double" => push!(f64),
        other => panic!("unsupported test pixel type `{}`", other),
    }
}
