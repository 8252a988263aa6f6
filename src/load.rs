use crate::table::MatchEntry;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Reads a JSON array of `{"name": ..., "preferences": [...]}` objects.
pub fn from_reader<R: Read>(reader: R) -> Result<Vec<MatchEntry>> {
    let entries: Vec<MatchEntry> =
        serde_json::from_reader(reader).context("failed to parse preference table")?;
    debug!("loaded {} entries", entries.len());
    Ok(entries)
}

pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Vec<MatchEntry>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open preference table {}", path.display()))?;
    from_reader(BufReader::new(file))
        .with_context(|| format!("failed to load preference table {}", path.display()))
}
