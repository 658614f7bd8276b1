//! Error types for fusion annotation
//!
//! Errors are split by blast radius:
//! - [`RunError`] means the run configuration is unusable and the whole run stops
//! - [`FusionError`] only concerns one fusion event, which is skipped and reported
//! - [`FusionWarning`] marks a degraded but still usable result
//! - [`MalformedUpstreamRecord`] is one bad line in a fusion-finder output file

use std::path::PathBuf;

use thiserror::Error;

use crate::models::{GenomeBuild, Side};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid genome build '{0}': use one of GRCh38, GRCh37 or GRCm38")]
    InvalidGenomeBuild(String),

    #[error("annotation store holds {available}, but {requested} was requested")]
    BuildMismatch {
        available: GenomeBuild,
        requested: GenomeBuild,
    },

    #[error("failed to read annotation store {path:?}: {source}")]
    UnreadableStore {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse annotation store {path:?}: {source}")]
    MalformedStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid annotation record: {0}")]
    InvalidAnnotation(String),

    #[error("malformed --{flag} value '{value}': expected 'original;replacement'")]
    MalformedMapping { flag: &'static str, value: String },

    #[error("invalid colour '{0}': use a colour name or #RRGGBB")]
    InvalidColor(String),

    #[error("image of {rows} row(s) at {width_in}x{height_in} inches and {dpi} dpi is too large")]
    ImageTooLarge {
        width_in: u32,
        height_in: u32,
        dpi: u32,
        rows: usize,
    },

    #[error("unknown fusion-finding algorithm '{0}'")]
    UnknownAlgorithm(String),

    #[error("{path:?} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("failed to read fusion-finder output {path:?}: {source}")]
    UnreadableUpstream {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write batch summary: {0}")]
    Summary(#[from] polars::prelude::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum FusionError {
    #[error("gene '{0}' not found in the annotation store")]
    GeneNotFound(String),

    #[error("gene '{query}' is ambiguous, it matches {candidates:?}")]
    AmbiguousGene {
        query: String,
        candidates: Vec<String>,
    },

    #[error("annotation store holds {available}, not {requested}")]
    BuildUnavailable {
        available: GenomeBuild,
        requested: GenomeBuild,
    },

    #[error("no {side} transcript of {gene} is compatible with junction {position}")]
    NoCompatibleTranscript {
        gene: String,
        side: Side,
        position: u64,
    },

    #[error("output directory {0:?} already exists")]
    DuplicateOutputDirectory(PathBuf),

    #[error("failed to render diagram: {0}")]
    Render(String),

    #[error("failed to write table: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Conditions that degrade a fusion product without failing it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FusionWarning {
    #[error("{side} junction lies outside the CDS, that side contributes no coding sequence")]
    JunctionOutOfCdsRange { side: Side },

    #[error("no in-frame stop codon, the protein is open-ended")]
    NoStopCodonFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed record at line {line}: {reason}")]
pub struct MalformedUpstreamRecord {
    pub line: u64,
    pub reason: String,
}
