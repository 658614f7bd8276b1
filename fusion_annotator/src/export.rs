// src/export.rs

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::FusionError;
use crate::fusion::{AnnotatedFusion, AssembledSequences};

const FASTA_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Cdna,
    Cds,
    Protein,
}

impl SequenceKind {
    pub const ALL: [SequenceKind; 3] = [SequenceKind::Cdna, SequenceKind::Cds, SequenceKind::Protein];

    fn suffix(&self) -> &'static str {
        match self {
            SequenceKind::Cdna => "cdna",
            SequenceKind::Cds => "cds",
            SequenceKind::Protein => "protein",
        }
    }

    fn sequence(&self, seqs: &AssembledSequences, marker: bool) -> String {
        match (self, marker) {
            (SequenceKind::Cdna, false) => seqs.cdna.clone(),
            (SequenceKind::Cdna, true) => seqs.cdna_with_marker(),
            (SequenceKind::Cds, false) => seqs.cds.clone(),
            (SequenceKind::Cds, true) => seqs.cds_with_marker(),
            (SequenceKind::Protein, false) => seqs.protein.clone(),
            (SequenceKind::Protein, true) => seqs.protein_with_marker(),
        }
    }

    fn junction(&self, seqs: &AssembledSequences) -> Option<u64> {
        match self {
            SequenceKind::Cdna => Some(seqs.cdna_junction as u64),
            SequenceKind::Cds => Some(seqs.cds_junction as u64).filter(|j| *j > 0),
            SequenceKind::Protein => seqs.protein_junction(),
        }
    }
}

/// FASTA header for one candidate.
pub fn fasta_header(fusion: &AnnotatedFusion, kind: SequenceKind) -> String {
    let seqs = &fusion.sequences;
    let junction = kind
        .junction(seqs)
        .map(|j| j.to_string())
        .unwrap_or_else(|| "NA".to_string());
    let mut header = format!(">{} effect={} junction={}", fusion.candidate.name(), seqs.effect, junction);
    if kind == SequenceKind::Protein && !seqs.protein.is_empty() && !seqs.stop_found {
        header.push_str(" open_ended");
    }
    header
}

/// Write one FASTA record per candidate that has a non-empty sequence of `kind`.
pub fn write_fasta(
    dir: &Path,
    event_name: &str,
    fusions: &[AnnotatedFusion],
    kind: SequenceKind,
    junction_marker: bool,
) -> Result<PathBuf, FusionError> {
    let path = dir.join(format!("{}.{}.fa", event_name, kind.suffix()));
    let mut out = BufWriter::new(File::create(&path)?);
    let mut written = 0;

    for fusion in fusions {
        let sequence = kind.sequence(&fusion.sequences, junction_marker);
        if sequence.is_empty() {
            continue;
        }
        writeln!(out, "{}", fasta_header(fusion, kind))?;
        for line in sequence.as_bytes().chunks(FASTA_WIDTH) {
            out.write_all(line)?;
            out.write_all(b"\n")?;
        }
        written += 1;
    }
    out.flush()?;
    debug!("{} record(s) written to {:?}", written, path);
    Ok(path)
}

/// Tab-separated table of every mapped domain of every candidate.
pub fn write_domain_table(dir: &Path, event_name: &str, fusions: &[AnnotatedFusion]) -> Result<PathBuf, FusionError> {
    let path = dir.join(format!("{}.domains.tsv", event_name));
    let mut wtr = csv::WriterBuilder::new().delimiter(b'\t').from_path(&path)?;
    wtr.write_record([
        "candidate",
        "side",
        "database",
        "label",
        "description",
        "parent_start",
        "parent_end",
        "fusion_start",
        "fusion_end",
        "partial",
    ])?;

    for fusion in fusions {
        let name = fusion.candidate.name();
        for mapped in &fusion.domains {
            let domain = &mapped.domain;
            wtr.write_record([
                name.clone(),
                mapped.side.to_string(),
                domain.database.clone(),
                domain.label.clone(),
                domain.description.clone().unwrap_or_default(),
                domain.start.to_string(),
                domain.end.to_string(),
                mapped.fusion_start.to_string(),
                mapped.fusion_end.to_string(),
                mapped.partial.to_string(),
            ])?;
        }
    }
    wtr.flush()?;
    Ok(path)
}
