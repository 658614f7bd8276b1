use tracing::{debug, warn};

use crate::error::FusionError;
use crate::fusion::{FusionSide, FusionTranscript};
use crate::models::{Gene, Junction};

/// Enumerate every 5' x 3' transcript pair whose exons contain the junctions.
///
/// Only canonical transcripts are considered unless `include_noncanonical` is
/// set. Pairs come out 5'-major, each side in annotation order.
pub fn resolve<'a>(
    gene5: &'a Gene,
    junction5: u64,
    gene3: &'a Gene,
    junction3: u64,
    include_noncanonical: bool,
) -> Result<Vec<FusionTranscript<'a>>, FusionError> {
    let five = compatible_sides(gene5, Junction::five_prime(junction5), include_noncanonical)?;
    let three = compatible_sides(gene3, Junction::three_prime(junction3), include_noncanonical)?;

    let mut candidates = Vec::with_capacity(five.len() * three.len());
    for five_prime in &five {
        for three_prime in &three {
            candidates.push(FusionTranscript {
                five_prime: five_prime.clone(),
                three_prime: three_prime.clone(),
            });
        }
    }
    debug!(
        "{}:{} x {}:{} -> {} candidate(s)",
        gene5.symbol,
        junction5,
        gene3.symbol,
        junction3,
        candidates.len()
    );
    Ok(candidates)
}

fn compatible_sides(
    gene: &Gene,
    junction: Junction,
    include_noncanonical: bool,
) -> Result<Vec<FusionSide<'_>>, FusionError> {
    let considered: Vec<_> = if include_noncanonical {
        gene.transcripts.iter().collect()
    } else {
        gene.canonical_transcripts().collect()
    };
    if considered.is_empty() {
        warn!("{} has no transcript to consider on the {} side", gene.symbol, junction.side);
    }

    let sides: Vec<FusionSide<'_>> = considered
        .into_iter()
        .filter_map(|transcript| {
            let offset = transcript.cdna_offset(gene.strand, junction.position)?;
            Some(FusionSide {
                gene,
                transcript,
                junction,
                cdna_offset: offset,
                region: transcript.region_of(gene.strand, offset),
            })
        })
        .collect();

    if sides.is_empty() {
        return Err(no_compatible(gene, junction));
    }
    Ok(sides)
}

fn no_compatible(gene: &Gene, junction: Junction) -> FusionError {
    FusionError::NoCompatibleTranscript {
        gene: gene.symbol.clone(),
        side: junction.side,
        position: junction.position,
    }
}
