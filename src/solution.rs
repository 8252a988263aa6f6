use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

///
/// Solution of a stable matching problem
///
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// every member name maps to the name of its partner
    ///
    /// The mapping is symmetric: `mapping[mapping[x]] == x` for every member x
    pub mapping: BTreeMap<String, String>,
}

impl MatchResult {
    pub fn new() -> MatchResult {
        MatchResult {
            mapping: BTreeMap::new(),
        }
    }

    /// Partner of the named member, if it was matched.
    pub fn partner_of(&self, name: &str) -> Option<&str> {
        self.mapping.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// One `name,partner` line per member, ordered by name.
    pub fn to_csv(&self) -> String {
        self.mapping
            .iter()
            .map(|(a, b)| format!("{},{}\n", a, b))
            .collect()
    }

    /// `{"mapping": {...}}`
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to serialize match result")
    }

    pub fn write<W: Write>(&self, format: OutputFormat, writer: &mut W) -> Result<()> {
        match format {
            OutputFormat::Csv => writer.write_all(self.to_csv().as_bytes())?,
            OutputFormat::Json => writeln!(writer, "{}", self.to_json()?)?,
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(anyhow!("Unknown format '{}'", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
