//! Embedded original label text.

use std::path::Path;

use isis_common::{IsisError, IsisResult};

use crate::pvl::{PvlBlock, PvlValue};
use crate::reader::{label_size, read_at, start_offset};

/// Lines of the `OriginalLabel` block, without the first line and the
/// closing `END` lines.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginalLabels {
    lines: Vec<String>,
}

impl OriginalLabels {
    /// Read the block addressed by the top-level `Object = OriginalLabel`.
    pub fn read(path: &Path, root: &PvlBlock) -> IsisResult<Self> {
        let block = root
            .get("OriginalLabel")
            .and_then(PvlValue::as_block)
            .ok_or_else(|| IsisError::key_not_found("OriginalLabel"))?;

        let offset = start_offset(block.require_i64("StartByte")?)?;
        let bytes = label_size("Bytes", block.require_i64("Bytes")?)?;
        let raw = read_at(path, offset, bytes)?;

        Ok(Self::from_text(&String::from_utf8_lossy(&raw)))
    }

    pub fn from_text(text: &str) -> Self {
        let all: Vec<&str> = text.lines().collect();
        let lines = if all.len() > 3 {
            all[1..all.len() - 2].iter().map(|s| s.to_string()).collect()
        } else {
            Vec::new()
        };
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}
