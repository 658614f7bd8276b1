// src/models.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::RunError;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "i8")]
pub enum Strand {
    Forward,
    Reverse,
}

impl TryFrom<i8> for Strand {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Strand::Forward),
            -1 => Ok(Strand::Reverse),
            other => Err(format!("invalid strand {}, expected 1 or -1", other)),
        }
    }
}

impl Strand {
    pub fn symbol(&self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

/// Reference genome builds with a bundled annotation release.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub enum GenomeBuild {
    GRCh38,
    GRCh37,
    GRCm38,
}

impl GenomeBuild {
    /// Ensembl core database the build's annotation was taken from.
    pub fn ensembl_name(&self) -> &'static str {
        match self {
            GenomeBuild::GRCh38 => "homo_sapiens_core_84_38",
            GenomeBuild::GRCh37 => "homo_sapiens_core_75_37",
            GenomeBuild::GRCm38 => "mus_musculus_core_84_38",
        }
    }

    pub fn ensembl_release(&self) -> u32 {
        match self {
            GenomeBuild::GRCh38 | GenomeBuild::GRCm38 => 84,
            GenomeBuild::GRCh37 => 75,
        }
    }
}

impl FromStr for GenomeBuild {
    type Err = RunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "GRCh38" | "hg38" | "homo_sapiens_core_84_38" => Ok(GenomeBuild::GRCh38),
            "GRCh37" | "hg19" | "homo_sapiens_core_75_37" => Ok(GenomeBuild::GRCh37),
            "GRCm38" | "mm10" | "mus_musculus_core_84_38" => Ok(GenomeBuild::GRCm38),
            other => Err(RunError::InvalidGenomeBuild(other.to_string())),
        }
    }
}

impl TryFrom<String> for GenomeBuild {
    type Error = RunError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for GenomeBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GenomeBuild::GRCh38 => "GRCh38",
            GenomeBuild::GRCh37 => "GRCh37",
            GenomeBuild::GRCm38 => "GRCm38",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    FivePrime,
    ThreePrime,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::FivePrime => write!(f, "5'"),
            Side::ThreePrime => write!(f, "3'"),
        }
    }
}

/// Breakpoint on one partner gene.
///
/// On the 5' side `position` is the last genomic base kept before the break,
/// on the 3' side it is the first genomic base kept after it (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Junction {
    pub position: u64,
    pub side: Side,
}

impl Junction {
    pub fn five_prime(position: u64) -> Self {
        Self { position, side: Side::FivePrime }
    }

    pub fn three_prime(position: u64) -> Self {
        Self { position, side: Side::ThreePrime }
    }
}

/// Where a junction lands inside a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JunctionRegion {
    FivePrimeUtr,
    Cds,
    ThreePrimeUtr,
    NonCoding,
}

impl fmt::Display for JunctionRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JunctionRegion::FivePrimeUtr => "5UTR",
            JunctionRegion::Cds => "CDS",
            JunctionRegion::ThreePrimeUtr => "3UTR",
            JunctionRegion::NonCoding => "noncoding",
        };
        write!(f, "{}", label)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Exon {
    pub start: u64,
    pub end: u64,
}

impl Exon {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn contains(&self, position: u64) -> bool {
        self.start <= position && position <= self.end
    }
}

/// Genomic span of the coding region, stop codon included.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CdsSpan {
    pub start: u64,
    pub end: u64,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    pub database: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start: u64,
    pub end: u64,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Protein {
    pub id: String,
    pub sequence: String,
    #[serde(default)]
    pub domains: Vec<Domain>,
}

impl Protein {
    pub fn len(&self) -> u64 {
        self.sequence.len() as u64
    }
}

fn default_biotype() -> String {
    "protein_coding".to_string()
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub id: String,
    #[serde(default)]
    pub is_canonical: bool,
    #[serde(default = "default_biotype")]
    pub biotype: String,
    /// Exons in transcript order.
    pub exons: Vec<Exon>,
    #[serde(default)]
    pub cds: Option<CdsSpan>,
    /// Spliced cDNA, 5' to 3' in transcript orientation.
    pub sequence: String,
    #[serde(default)]
    pub protein: Option<Protein>,
}

impl Transcript {
    /// Spliced length in nucleotides.
    pub fn length(&self) -> u64 {
        self.exons.iter().map(Exon::len).sum()
    }

    /// 1-based offset of a genomic position in the spliced cDNA, or `None`
    /// when the position is intronic or outside the transcript.
    pub fn cdna_offset(&self, strand: Strand, position: u64) -> Option<u64> {
        let mut consumed = 0;
        for exon in &self.exons {
            if exon.contains(position) {
                let into_exon = match strand {
                    Strand::Forward => position - exon.start,
                    Strand::Reverse => exon.end - position,
                };
                return Some(consumed + into_exon + 1);
            }
            consumed += exon.len();
        }
        None
    }

    /// cDNA offsets of the first and last coding bases.
    pub fn cds_offsets(&self, strand: Strand) -> Option<(u64, u64)> {
        let cds = self.cds?;
        let (first, last) = match strand {
            Strand::Forward => (cds.start, cds.end),
            Strand::Reverse => (cds.end, cds.start),
        };
        Some((self.cdna_offset(strand, first)?, self.cdna_offset(strand, last)?))
    }

    pub fn region_of(&self, strand: Strand, cdna_offset: u64) -> JunctionRegion {
        match self.cds_offsets(strand) {
            None => JunctionRegion::NonCoding,
            Some((first, _)) if cdna_offset < first => JunctionRegion::FivePrimeUtr,
            Some((_, last)) if cdna_offset > last => JunctionRegion::ThreePrimeUtr,
            Some(_) => JunctionRegion::Cds,
        }
    }

    pub fn validate(&self, strand: Strand) -> Result<(), String> {
        if self.exons.is_empty() {
            return Err(format!("transcript {} has no exons", self.id));
        }
        for exon in &self.exons {
            if exon.start == 0 || exon.start > exon.end {
                return Err(format!(
                    "transcript {} has an invalid exon {}-{}",
                    self.id, exon.start, exon.end
                ));
            }
        }
        for pair in self.exons.windows(2) {
            let ordered = match strand {
                Strand::Forward => pair[0].end < pair[1].start,
                Strand::Reverse => pair[1].end < pair[0].start,
            };
            if !ordered {
                return Err(format!(
                    "transcript {} has overlapping or unordered exons {}-{} and {}-{} on the {} strand",
                    self.id, pair[0].start, pair[0].end, pair[1].start, pair[1].end, strand.symbol()
                ));
            }
        }
        if !self.sequence.is_ascii() || self.sequence.len() as u64 != self.length() {
            return Err(format!(
                "transcript {} sequence has {} bases but its exons span {}",
                self.id,
                self.sequence.len(),
                self.length()
            ));
        }
        if let Some(cds) = self.cds {
            if cds.start > cds.end || self.cds_offsets(strand).is_none() {
                return Err(format!(
                    "transcript {} has a CDS {}-{} outside its exons",
                    self.id, cds.start, cds.end
                ));
            }
        }
        if let Some(protein) = &self.protein {
            for domain in &protein.domains {
                if domain.start == 0 || domain.start > domain.end || domain.end > protein.len() {
                    return Err(format!(
                        "domain {} ({}-{}) does not fit protein {} of length {}",
                        domain.label,
                        domain.start,
                        domain.end,
                        protein.id,
                        protein.len()
                    ));
                }
            }
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Gene {
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    pub chromosome: String,
    pub strand: Strand,
    pub start: u64,
    pub end: u64,
    pub transcripts: Vec<Transcript>,
}

impl Gene {
    pub fn canonical_transcripts(&self) -> impl Iterator<Item = &Transcript> {
        self.transcripts.iter().filter(|t| t.is_canonical)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.start > self.end {
            return Err(format!("gene {} has an empty span {}-{}", self.id, self.start, self.end));
        }
        for transcript in &self.transcripts {
            transcript.validate(self.strand)?;
        }
        Ok(())
    }
}
