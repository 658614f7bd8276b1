use tracing::debug;

use crate::error::FusionWarning;
use crate::fusion::{FusionEffect, FusionTranscript};
use crate::models::Side;

/// Marker placed at the junction in exported sequences.
pub const JUNCTION_MARKER: char = '*';

// Codon order: AAA, AAC, AAG, AAT, ACA, ... TTT (A=0, C=1, G=2, T=3)
const STANDARD_CODE: &[u8; 64] =
    b"KNKNTTTTRSRSIIMIQHQHPPPPRRRRLLLLEDEDAAAAGGGGVVVV*Y*YSSSS*CWCLFLF";

fn base_index(b: u8) -> Option<usize> {
    match b.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' | b'U' => Some(3),
        _ => None,
    }
}

fn translate_codon(codon: &[u8]) -> u8 {
    match (base_index(codon[0]), base_index(codon[1]), base_index(codon[2])) {
        (Some(b1), Some(b2), Some(b3)) => STANDARD_CODE[b1 * 16 + b2 * 4 + b3],
        _ => b'X',
    }
}

/// Translate from the first base until the first stop codon.
///
/// Returns the residues (stop excluded) and whether a stop codon was reached.
/// A trailing partial codon is ignored.
pub fn translate(cds: &str) -> (String, bool) {
    let mut protein = String::with_capacity(cds.len() / 3);
    for codon in cds.as_bytes().chunks_exact(3) {
        let residue = translate_codon(codon);
        if residue == b'*' {
            return (protein, true);
        }
        protein.push(residue as char);
    }
    (protein, false)
}

/// Spliced sequences of one candidate fusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledSequences {
    pub cdna: String,
    pub cds: String,
    pub protein: String,
    /// Bases contributed by the 5' transcript to `cdna`.
    pub cdna_junction: usize,
    /// Bases contributed by the 5' transcript to `cds`.
    pub cds_junction: usize,
    /// 1-based CDS position of the 3' junction base in the 3' transcript.
    pub three_prime_cds_position: Option<u64>,
    pub effect: FusionEffect,
    pub stop_found: bool,
    pub warnings: Vec<FusionWarning>,
}

impl AssembledSequences {
    /// Residue of the 5' parent holding the last retained 5' coding base.
    pub fn five_prime_junction_residue(&self) -> Option<u64> {
        if self.cds_junction == 0 {
            return None;
        }
        Some((self.cds_junction as u64 + 2) / 3)
    }

    /// Residue of the 3' parent holding the first retained 3' coding base.
    pub fn three_prime_junction_residue(&self) -> Option<u64> {
        self.three_prime_cds_position.map(|p| (p + 2) / 3)
    }

    /// Junction position in the fusion protein, capped at its length.
    pub fn protein_junction(&self) -> Option<u64> {
        let residue = self.five_prime_junction_residue()?;
        Some(residue.min(self.protein.len() as u64))
    }

    pub fn cdna_with_marker(&self) -> String {
        insert_marker(&self.cdna, self.cdna_junction)
    }

    pub fn cds_with_marker(&self) -> String {
        insert_marker(&self.cds, self.cds_junction)
    }

    /// The marker goes after the junction residue; a protein that stops
    /// before the junction gets none.
    pub fn protein_with_marker(&self) -> String {
        match self.five_prime_junction_residue() {
            Some(residue) if residue as usize <= self.protein.len() => {
                insert_marker(&self.protein, residue as usize)
            }
            _ => self.protein.clone(),
        }
    }
}

fn insert_marker(sequence: &str, at: usize) -> String {
    let mut marked = String::with_capacity(sequence.len() + 1);
    marked.push_str(&sequence[..at]);
    marked.push(JUNCTION_MARKER);
    marked.push_str(&sequence[at..]);
    marked
}

/// Splice cDNA and CDS at the junctions and translate the fusion CDS.
pub fn assemble(candidate: &FusionTranscript) -> AssembledSequences {
    let five = &candidate.five_prime;
    let three = &candidate.three_prime;
    let mut warnings = Vec::new();

    let five_offset = five.cdna_offset as usize;
    let three_offset = three.cdna_offset as usize;
    let cdna5 = &five.transcript.sequence[..five_offset];
    let cdna3 = &three.transcript.sequence[three_offset - 1..];

    let cds5 = match five.cds_offsets() {
        Some((first, last)) if first <= five.cdna_offset && five.cdna_offset <= last => {
            &five.transcript.sequence[first as usize - 1..five_offset]
        }
        _ => {
            warnings.push(FusionWarning::JunctionOutOfCdsRange { side: Side::FivePrime });
            ""
        }
    };

    let (cds3, three_prime_cds_position) = match three.cds_offsets() {
        Some((first, last)) if first <= three.cdna_offset && three.cdna_offset <= last => (
            &three.transcript.sequence[three_offset - 1..last as usize],
            Some(three.cdna_offset - first + 1),
        ),
        _ => {
            warnings.push(FusionWarning::JunctionOutOfCdsRange { side: Side::ThreePrime });
            ("", None)
        }
    };

    let effect = match three_prime_cds_position {
        Some(p3) if !cds5.is_empty() => {
            if cds5.len() as u64 % 3 == (p3 - 1) % 3 {
                FusionEffect::InFrame
            } else {
                FusionEffect::OutOfFrame
            }
        }
        _ => FusionEffect::UtrFusion,
    };

    let cds = format!("{}{}", cds5, cds3);
    let (protein, stop_found) = if cds5.is_empty() {
        (String::new(), false)
    } else {
        let (protein, stop_found) = translate(&cds);
        if !stop_found {
            warnings.push(FusionWarning::NoStopCodonFound);
        }
        (protein, stop_found)
    };

    debug!(
        "{}: {} nt cDNA, {} nt CDS, {} aa, {}",
        candidate.name(),
        cdna5.len() + cdna3.len(),
        cds.len(),
        protein.len(),
        effect
    );

    AssembledSequences {
        cdna: format!("{}{}", cdna5, cdna3),
        cds,
        protein,
        cdna_junction: cdna5.len(),
        cds_junction: cds5.len(),
        three_prime_cds_position,
        effect,
        stop_found,
        warnings,
    }
}
