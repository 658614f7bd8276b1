//! Fusion resolution: candidate isoform pairs, spliced sequences and the
//! projection of parent-protein domains onto the fusion protein.

pub mod assembler;
pub mod domain_mapper;
pub mod resolver;

use std::fmt;

use crate::models::{Domain, Gene, Junction, JunctionRegion, Transcript};

pub use assembler::{assemble, translate, AssembledSequences};
pub use domain_mapper::{map_domains, MappedDomain};
pub use resolver::resolve;

/// One partner of a candidate fusion: a transcript and where the junction
/// falls on it.
#[derive(Debug, Clone)]
pub struct FusionSide<'a> {
    pub gene: &'a Gene,
    pub transcript: &'a Transcript,
    pub junction: Junction,
    /// 1-based offset of the junction base in the transcript's cDNA.
    pub cdna_offset: u64,
    pub region: JunctionRegion,
}

impl FusionSide<'_> {
    /// cDNA offsets of the transcript's first and last coding bases.
    pub fn cds_offsets(&self) -> Option<(u64, u64)> {
        self.transcript.cds_offsets(self.gene.strand)
    }
}

/// A 5' and 3' isoform combination compatible with both junctions.
#[derive(Debug, Clone)]
pub struct FusionTranscript<'a> {
    pub five_prime: FusionSide<'a>,
    pub three_prime: FusionSide<'a>,
}

impl FusionTranscript<'_> {
    /// `GENEA-GENEB_ENST1-ENST2`, unique within one fusion event.
    pub fn name(&self) -> String {
        format!(
            "{}-{}_{}-{}",
            self.five_prime.gene.symbol,
            self.three_prime.gene.symbol,
            self.five_prime.transcript.id,
            self.three_prime.transcript.id
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionEffect {
    InFrame,
    OutOfFrame,
    /// At least one junction is outside its CDS.
    UtrFusion,
}

impl fmt::Display for FusionEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FusionEffect::InFrame => "in-frame",
            FusionEffect::OutOfFrame => "out-of-frame",
            FusionEffect::UtrFusion => "UTR",
        };
        write!(f, "{}", label)
    }
}

/// A fully computed candidate: sequences, mapped domains and the parent
/// domain sets they came from.
#[derive(Debug, Clone)]
pub struct AnnotatedFusion<'a> {
    pub candidate: FusionTranscript<'a>,
    pub sequences: AssembledSequences,
    pub domains: Vec<MappedDomain>,
    pub five_prime_domains: Vec<Domain>,
    pub three_prime_domains: Vec<Domain>,
}
