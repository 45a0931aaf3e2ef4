//! Binary tables.
//!
//! Each `Object = Table` in the label describes a block of fixed-size
//! records. Fields with `Size > 1` are expanded into `Name_1 .. Name_n`
//! columns. Table payloads are read on first access and kept.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use tracing::debug;

use isis_common::{IsisError, IsisResult};

use crate::encoding::{ByteOrder, NumericType};
use crate::pvl::{PvlBlock, PvlValue};
use crate::reader::{checked_size, label_size, read_at, start_offset};

/// Storage type of a table field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Numeric(NumericType),
    /// Fixed width character field, `Size` bytes long.
    Text,
}

/// A `Group = Field` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TableField {
    pub name: String,
    pub kind: FieldType,
    pub size: usize,
}

impl TableField {
    fn from_pvl(block: &PvlBlock) -> IsisResult<Self> {
        let name = block.require_str("Name")?.to_string();
        let kind = match block.require_str("Type")? {
            "Text" => FieldType::Text,
            other => FieldType::Numeric(NumericType::from_label(other)?),
        };
        let size = block.get("Size").and_then(PvlValue::as_i64).unwrap_or(1);
        if size < 1 {
            return Err(IsisError::invalid_format(format!(
                "field `{}` has size {}",
                name, size
            )));
        }

        let field = Self {
            name,
            kind,
            size: label_size("Size", size)?,
        };
        if let FieldType::Numeric(t) = field.kind {
            checked_size(&[t.item_size(), field.size])?;
        }
        Ok(field)
    }

    /// Bytes used by this field in one record. Checked on construction.
    pub fn byte_size(&self) -> usize {
        match self.kind {
            FieldType::Numeric(t) => t.item_size() * self.size,
            FieldType::Text => self.size,
        }
    }

    /// Column names produced by this field.
    pub fn column_names(&self) -> Vec<String> {
        if self.size == 1 || self.kind == FieldType::Text {
            vec![self.name.clone()]
        } else {
            (1..=self.size)
                .map(|i| format!("{}_{}", self.name, i))
                .collect()
        }
    }
}

/// Decoded values of one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One binary table.
#[derive(Debug)]
pub struct Table {
    path: PathBuf,
    name: String,
    offset: u64,
    bytes: usize,
    records: usize,
    order: ByteOrder,
    fields: Vec<TableField>,
    /// Non-field keywords of the table object.
    labels: Vec<(String, PvlValue)>,
    columns: OnceCell<Vec<(String, Column)>>,
}

impl Table {
    pub fn from_pvl(path: &Path, block: &PvlBlock) -> IsisResult<Self> {
        let name = block.require_str("Name")?.to_string();
        let offset = start_offset(block.require_i64("StartByte")?)?;
        let bytes = label_size("Bytes", block.require_i64("Bytes")?)?;
        let order = ByteOrder::from_label(block.require_str("ByteOrder")?)?;

        let mut fields = Vec::new();
        let mut labels = Vec::new();
        for (key, value) in block.iter() {
            match (key, value) {
                ("Field", PvlValue::Block(field)) => fields.push(TableField::from_pvl(field)?),
                _ => labels.push((key.to_string(), value.clone())),
            }
        }

        let record_size = fields
            .iter()
            .try_fold(0usize, |acc, f| acc.checked_add(f.byte_size()))
            .ok_or_else(|| {
                IsisError::invalid_format(format!("table `{}` record size overflows", name))
            })?;
        let records = match block.get("Records").and_then(PvlValue::as_i64) {
            Some(n) => label_size("Records", n)?,
            None if record_size > 0 => bytes / record_size,
            None => 0,
        };

        if checked_size(&[record_size, records])? > bytes {
            return Err(IsisError::invalid_format(format!(
                "table `{}` declares {} records of {} bytes in {} bytes",
                name, records, record_size, bytes
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            name,
            offset,
            bytes,
            records,
            order,
            fields,
            labels,
            columns: OnceCell::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    pub fn fields(&self) -> &[TableField] {
        &self.fields
    }

    /// Non-field keyword of the table object (e.g. `CacheType`).
    pub fn label(&self, key: &str) -> Option<&PvlValue> {
        self.labels.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Expanded column names, in record order.
    pub fn column_names(&self) -> Vec<String> {
        self.fields.iter().flat_map(TableField::column_names).collect()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.column_names().iter().any(|c| c == column)
    }

    /// Numeric column by name.
    pub fn column(&self, name: &str) -> IsisResult<&[f64]> {
        match self.find(name)? {
            Column::Numeric(values) => Ok(values),
            Column::Text(_) => Err(IsisError::invalid_argument(format!(
                "column `{}` of table `{}` is text",
                name, self.name
            ))),
        }
    }

    /// Text column by name.
    pub fn text_column(&self, name: &str) -> IsisResult<&[String]> {
        match self.find(name)? {
            Column::Text(values) => Ok(values),
            Column::Numeric(_) => Err(IsisError::invalid_argument(format!(
                "column `{}` of table `{}` is numeric",
                name, self.name
            ))),
        }
    }

    /// Value of the middle record of a numeric column.
    pub fn middle(&self, name: &str) -> IsisResult<f64> {
        let values = self.column(name)?;
        values.get(values.len() / 2).copied().ok_or_else(|| {
            IsisError::invalid_format(format!("table `{}` has no records", self.name))
        })
    }

    fn find(&self, name: &str) -> IsisResult<&Column> {
        self.columns()?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| IsisError::key_not_found(format!("{}.{}", self.name, name)))
    }

    fn columns(&self) -> IsisResult<&Vec<(String, Column)>> {
        if let Some(columns) = self.columns.get() {
            return Ok(columns);
        }
        let loaded = self.load()?;
        Ok(self.columns.get_or_init(|| loaded))
    }

    fn load(&self) -> IsisResult<Vec<(String, Column)>> {
        let record_size: usize = self.fields.iter().map(TableField::byte_size).sum();
        let raw = read_at(&self.path, self.offset, record_size * self.records)?;

        debug!(
            table = %self.name,
            records = self.records,
            record_size,
            "Loading table"
        );

        let mut columns: Vec<(String, Column)> = Vec::new();
        let mut field_offset = 0;
        for field in &self.fields {
            match field.kind {
                FieldType::Text => {
                    let values = (0..self.records)
                        .map(|r| {
                            let start = r * record_size + field_offset;
                            let text = &raw[start..start + field.size];
                            String::from_utf8_lossy(text)
                                .trim_end_matches('\0')
                                .trim()
                                .to_string()
                        })
                        .collect();
                    columns.push((field.name.clone(), Column::Text(values)));
                }
                FieldType::Numeric(t) => {
                    for (i, name) in field.column_names().into_iter().enumerate() {
                        let values = (0..self.records)
                            .map(|r| {
                                let start = r * record_size + field_offset + i * t.item_size();
                                t.read(&raw[start..], self.order)
                            })
                            .collect();
                        columns.push((name, Column::Numeric(values)));
                    }
                }
            }
            field_offset += field.byte_size();
        }

        Ok(columns)
    }
}

/// All tables of a cube, keyed by name.
#[derive(Debug, Default)]
pub struct Tables {
    tables: Vec<Table>,
}

impl Tables {
    /// Collect the top-level `Object = Table` blocks.
    pub fn from_label(path: &Path, root: &PvlBlock) -> IsisResult<Self> {
        let tables = root
            .get_all("Table")
            .filter_map(PvlValue::as_block)
            .map(|block| Table::from_pvl(path, block))
            .collect::<IsisResult<Vec<_>>>()?;
        Ok(Self { tables })
    }

    pub fn get(&self, name: &str) -> IsisResult<&Table> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| IsisError::key_not_found(format!("table `{}`", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode;
    use crate::pvl::parse_label;
    use std::io::Write;

    fn table_label(start: usize, bytes: usize) -> String {
        format!(
            "Object = Table
  Name      = InstrumentPosition
  StartByte = {start}
  Bytes     = {bytes}
  Records   = 3
  ByteOrder = Lsb
  CacheType = Linear
  Group = Field
    Name = J2000
    Type = Double
    Size = 2
  End_Group
  Group = Field
    Name = Code
    Type = Integer
    Size = 1
  End_Group
End_Object
End
"
        )
    }

    fn write_table() -> (tempfile::NamedTempFile, Tables) {
        let mut payload = Vec::new();
        for r in 0..3 {
            let r = r as f64;
            payload.extend(encode(&[r, 10.0 * r], NumericType::Double, ByteOrder::Lsb));
            payload.extend(encode(&[-r], NumericType::SignedInteger, ByteOrder::Lsb));
        }

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"PADDING!").unwrap();
        file.write_all(&payload).unwrap();

        let root = parse_label(&table_label(9, payload.len())).unwrap();
        let tables = Tables::from_label(file.path(), &root).unwrap();
        (file, tables)
    }

    #[test]
    fn test_columns_expanded() {
        let (_file, tables) = write_table();
        let table = tables.get("InstrumentPosition").unwrap();
        assert_eq!(table.column_names(), vec!["J2000_1", "J2000_2", "Code"]);
        assert_eq!(table.records(), 3);
        assert_eq!(table.label("CacheType").and_then(|v| v.as_str()), Some("Linear"));
    }

    #[test]
    fn test_column_values() {
        let (_file, tables) = write_table();
        let table = tables.get("InstrumentPosition").unwrap();
        assert_eq!(table.column("J2000_1").unwrap(), &[0.0, 1.0, 2.0]);
        assert_eq!(table.column("J2000_2").unwrap(), &[0.0, 10.0, 20.0]);
        assert_eq!(table.column("Code").unwrap(), &[0.0, -1.0, -2.0]);
        assert_eq!(table.middle("J2000_2").unwrap(), 10.0);
    }

    #[test]
    fn test_missing_names() {
        let (_file, tables) = write_table();
        assert!(matches!(tables.get("SunPosition"), Err(IsisError::KeyNotFound(_))));
        let table = tables.get("InstrumentPosition").unwrap();
        assert!(matches!(table.column("J2000"), Err(IsisError::KeyNotFound(_))));
    }

    #[test]
    fn test_oversized_records_rejected() {
        let root = parse_label(&table_label(1, 10)).unwrap();
        let err = Tables::from_label(Path::new("unused.cub"), &root).unwrap_err();
        assert!(matches!(err, IsisError::InvalidFormat(_)));
    }

    #[test]
    fn test_invalid_sizes_rejected() {
        let negative = table_label(1, 60).replace("Bytes     = 60", "Bytes     = -60");
        let huge = table_label(1, 60).replace("Records   = 3", "Records   = 9223372036854775807");
        let wide = table_label(1, 60).replace("Size = 2", "Size = 4611686018427387904");
        for text in [negative, huge, wide] {
            let root = parse_label(&text).unwrap();
            let err = Tables::from_label(Path::new("unused.cub"), &root).unwrap_err();
            assert!(matches!(err, IsisError::InvalidFormat(_)), "{}", text);
        }
    }
}
