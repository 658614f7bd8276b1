//! Readers for the output of upstream fusion-finding tools.
//!
//! Every parser yields one entry per data line, so callers can skip bad
//! records and keep going. A file that lacks a required column cannot be
//! parsed at all and fails as a whole.

pub mod arriba;
pub mod fusioncatcher;
pub mod star_fusion;

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{MalformedUpstreamRecord, RunError};

/// One fusion call, as reported upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FusionRecord {
    /// Line of the upstream file, counting the header as line 1.
    pub line: u64,
    /// Gene identifier used for lookup, the stable ID when the tool reports one.
    pub gene5: String,
    /// Gene name as the tool prints it.
    pub name5: String,
    pub junction5: u64,
    pub gene3: String,
    pub name3: String,
    pub junction3: u64,
}

pub type ParsedRecord = Result<FusionRecord, MalformedUpstreamRecord>;

pub trait UpstreamParser {
    fn name(&self) -> &'static str;

    fn parse(&self, path: &Path) -> Result<Vec<ParsedRecord>, RunError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    FusionCatcher,
    StarFusion,
    Arriba,
}

impl FromStr for Algorithm {
    type Err = RunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fusioncatcher" => Ok(Algorithm::FusionCatcher),
            "starfusion" | "star-fusion" => Ok(Algorithm::StarFusion),
            "arriba" => Ok(Algorithm::Arriba),
            _ => Err(RunError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Look up the parser registered under `name`.
pub fn parser_for(name: &str) -> Result<Box<dyn UpstreamParser>, RunError> {
    let parser: Box<dyn UpstreamParser> = match name.parse::<Algorithm>()? {
        Algorithm::FusionCatcher => Box::new(fusioncatcher::FusionCatcherParser),
        Algorithm::StarFusion => Box::new(star_fusion::StarFusionParser),
        Algorithm::Arriba => Box::new(arriba::ArribaParser),
    };
    Ok(parser)
}

/// A tab-separated file with a header line, read record by record.
pub(crate) struct TsvTable {
    path: std::path::PathBuf,
    columns: HashMap<String, usize>,
    reader: csv::Reader<File>,
}

impl TsvTable {
    pub(crate) fn open(path: &Path) -> Result<Self, RunError> {
        let unreadable = |source| RunError::UnreadableUpstream { path: path.to_path_buf(), source };
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .quoting(false)
            .from_path(path)
            .map_err(unreadable)?;
        let columns = reader
            .headers()
            .map_err(unreadable)?
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();
        Ok(Self { path: path.to_path_buf(), columns, reader })
    }

    /// Index of a required column.
    pub(crate) fn column(&self, name: &str) -> Result<usize, RunError> {
        self.columns.get(name).copied().ok_or_else(|| RunError::MissingColumn {
            path: self.path.clone(),
            column: name.to_string(),
        })
    }

    pub(crate) fn optional_column(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    /// Apply `convert` to every data line. Lines are numbered from the header.
    pub(crate) fn map_records<F>(mut self, mut convert: F) -> Vec<ParsedRecord>
    where
        F: FnMut(&Fields) -> Result<FusionRecord, String>,
    {
        let mut parsed = Vec::new();
        for (i, record) in self.reader.records().enumerate() {
            let line = i as u64 + 2;
            let result = match record {
                Ok(record) => convert(&Fields { record: &record, line }),
                Err(e) => Err(e.to_string()),
            };
            parsed.push(result.map_err(|reason| MalformedUpstreamRecord { line, reason }));
        }
        parsed
    }
}

pub(crate) struct Fields<'r> {
    record: &'r csv::StringRecord,
    line: u64,
}

impl Fields<'_> {
    pub(crate) fn line(&self) -> u64 {
        self.line
    }

    pub(crate) fn get(&self, index: usize) -> Result<&str, String> {
        match self.record.get(index).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(format!("missing value in column {}", index + 1)),
        }
    }

    pub(crate) fn get_optional(&self, index: Option<usize>) -> Option<&str> {
        index
            .and_then(|i| self.record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty() && *v != ".")
    }
}

fn breakpoint_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:chr)?([^:]+):(\d+)(?::([+-]))?$").ok())
        .as_ref()
}

/// Genomic position from `chr:pos[:strand]`, with or without a `chr` prefix.
pub(crate) fn parse_breakpoint(value: &str) -> Result<u64, String> {
    let re = breakpoint_re().ok_or_else(|| "breakpoint pattern failed to compile".to_string())?;
    let captures = re
        .captures(value.trim())
        .ok_or_else(|| format!("malformed breakpoint '{}'", value))?;
    let position: u64 = captures[2]
        .parse()
        .map_err(|_| format!("breakpoint position out of range in '{}'", value))?;
    if position == 0 {
        return Err(format!("breakpoint '{}' is not 1-based", value));
    }
    Ok(position)
}
