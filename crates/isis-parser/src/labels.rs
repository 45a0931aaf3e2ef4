//! Label tree lookup.
//!
//! `Labels` wraps the parsed PVL root and hides the binary-addressing
//! objects (`Table`, `Label`, `History`, `OriginalLabel`) so that keys can be
//! found either by dotted path or by name anywhere in the tree.

use isis_common::{IsisError, IsisResult};

use crate::pvl::{PvlBlock, PvlValue};

/// Objects describing binary payloads rather than metadata.
const HIDDEN: [&str; 4] = ["Table", "Label", "History", "OriginalLabel"];

/// Searchable view over the metadata part of a label.
#[derive(Debug, Clone)]
pub struct Labels {
    root: PvlBlock,
}

impl Labels {
    pub fn new(root: &PvlBlock) -> Self {
        Self {
            root: filter(root),
        }
    }

    pub fn root(&self) -> &PvlBlock {
        &self.root
    }

    /// Look up a key.
    ///
    /// `IsisCube.Core.Dimensions.Samples` walks the tree. A bare key is first
    /// matched at the top level, then searched recursively; when it occurs in
    /// several blocks the matches are returned as a list.
    pub fn get(&self, key: &str) -> IsisResult<PvlValue> {
        if key.contains('.') {
            return lookup_path(&self.root, key)
                .cloned()
                .ok_or_else(|| IsisError::key_not_found(key));
        }

        search(&self.root, key).ok_or_else(|| IsisError::key_not_found(key))
    }

    /// A block found by name (or dotted path).
    pub fn block(&self, key: &str) -> IsisResult<PvlBlock> {
        match self.get(key)? {
            PvlValue::Block(block) => Ok(block),
            _ => Err(IsisError::invalid_format(format!("`{}` is not a group", key))),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    /// All keys in the tree, depth first.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        collect_keys(&self.root, &mut keys);
        keys
    }
}

fn filter(block: &PvlBlock) -> PvlBlock {
    PvlBlock {
        kind: block.kind,
        name: block.name.clone(),
        entries: block
            .entries
            .iter()
            .filter(|(key, _)| !HIDDEN.contains(&key.as_str()))
            .map(|(key, value)| {
                let value = match value {
                    PvlValue::Block(inner) => PvlValue::Block(filter(inner)),
                    other => other.clone(),
                };
                (key.clone(), value)
            })
            .collect(),
    }
}

fn lookup_path<'a>(root: &'a PvlBlock, path: &str) -> Option<&'a PvlValue> {
    let mut parts = path.split('.').peekable();
    let mut block = root;

    while let Some(part) = parts.next() {
        let value = block.get(part)?;
        if parts.peek().is_none() {
            return Some(value);
        }
        block = value.as_block()?;
    }

    None
}

fn search(block: &PvlBlock, key: &str) -> Option<PvlValue> {
    if let Some(value) = block.get(key) {
        return Some(value.clone());
    }

    let mut matches: Vec<PvlValue> = block
        .entries
        .iter()
        .filter_map(|(_, value)| value.as_block())
        .filter_map(|inner| search(inner, key))
        .collect();

    match matches.len() {
        0 => None,
        1 => matches.pop(),
        _ => Some(PvlValue::List(matches)),
    }
}

fn collect_keys(block: &PvlBlock, keys: &mut Vec<String>) {
    for (key, value) in &block.entries {
        keys.push(key.clone());
        if let PvlValue::Block(inner) = value {
            collect_keys(inner, keys);
        }
    }
}
