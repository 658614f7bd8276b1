use tracing::debug;

use crate::fusion::{AssembledSequences, FusionEffect, FusionTranscript};
use crate::models::{Domain, Side};

/// A parent-protein domain placed on the fusion protein.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedDomain {
    /// The untouched parent record.
    pub domain: Domain,
    pub side: Side,
    pub fusion_start: u64,
    pub fusion_end: u64,
    /// Cut by the junction or by the end of the fusion protein.
    pub partial: bool,
}

fn clip(mut mapped: MappedDomain, protein_len: u64) -> Option<MappedDomain> {
    if mapped.fusion_start > protein_len {
        return None;
    }
    if mapped.fusion_end > protein_len {
        mapped.fusion_end = protein_len;
        mapped.partial = true;
    }
    Some(mapped)
}

/// Project parent domains onto the fusion protein.
///
/// 5' domains keep their coordinates up to the 5' junction residue; 3'
/// domains from the 3' junction residue on are shifted by what the 5' half
/// contributes, and only for in-frame products. The result is ordered by the
/// position of each domain's database in `databases`, then by fusion start.
pub fn map_domains(
    candidate: &FusionTranscript,
    assembled: &AssembledSequences,
    five_prime_domains: &[Domain],
    three_prime_domains: &[Domain],
    databases: &[String],
) -> Vec<MappedDomain> {
    let protein_len = assembled.protein.len() as u64;
    let Some(junction5) = assembled.five_prime_junction_residue() else {
        return Vec::new();
    };
    if protein_len == 0 {
        return Vec::new();
    }

    let mut mapped = Vec::new();

    for domain in five_prime_domains {
        if domain.start > junction5 {
            continue;
        }
        let candidate_domain = MappedDomain {
            domain: domain.clone(),
            side: Side::FivePrime,
            fusion_start: domain.start,
            fusion_end: domain.end.min(junction5),
            partial: domain.end > junction5,
        };
        mapped.extend(clip(candidate_domain, protein_len));
    }

    match (assembled.effect, assembled.three_prime_cds_position) {
        (FusionEffect::InFrame, Some(p3)) => {
            let junction3 = (p3 + 2) / 3;
            // in frame: cds_junction == p3 - 1 (mod 3), so this is exact
            let shift = (assembled.cds_junction as i64 - (p3 as i64 - 1)) / 3;
            for domain in three_prime_domains {
                if domain.end < junction3 {
                    continue;
                }
                let start = domain.start.max(junction3);
                let candidate_domain = MappedDomain {
                    domain: domain.clone(),
                    side: Side::ThreePrime,
                    fusion_start: (start as i64 + shift) as u64,
                    fusion_end: (domain.end as i64 + shift) as u64,
                    partial: domain.start < junction3,
                };
                mapped.extend(clip(candidate_domain, protein_len));
            }
        }
        _ => debug!(
            "{}: {} product, 3' domains not projected",
            candidate.name(),
            assembled.effect
        ),
    }

    let rank = |database: &str| {
        databases
            .iter()
            .position(|d| d.eq_ignore_ascii_case(database))
            .unwrap_or(databases.len())
    };
    mapped.sort_by_key(|m| (rank(&m.domain.database), m.fusion_start, m.fusion_end));
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation_store::AnnotationStore;
    use crate::fusion::{assemble, resolve};
    use crate::models::GenomeBuild;
    use crate::test_fixtures::{default_databases, domain, gene_a, gene_b, store};

    fn labels(mapped: &[MappedDomain]) -> Vec<(&str, u64, u64, bool)> {
        mapped
            .iter()
            .map(|m| (m.domain.label.as_str(), m.fusion_start, m.fusion_end, m.partial))
            .collect()
    }

    #[test]
    fn in_frame_fusion_keeps_both_halves() {
        let store = store();
        let a = store.get_gene("GENEA", GenomeBuild::GRCh38).unwrap();
        let b = store.get_gene("GENEB", GenomeBuild::GRCh38).unwrap();
        let dbs = default_databases();
        let candidates = resolve(a, 350, b, 580, false).unwrap();
        let seqs = assemble(&candidates[0]);
        let d5 = store.get_domains("ENSP_A1", &dbs).unwrap();
        let d3 = store.get_domains("ENSP_B1", &dbs).unwrap();

        let mapped = map_domains(&candidates[0], &seqs, &d5, &d3, &dbs);
        assert_eq!(
            labels(&mapped),
            vec![
                ("DomA1", 5, 20, false),
                ("DomA2", 35, 41, true),
                ("DomB2", 41, 52, true),
                ("DomB3", 55, 62, false),
                ("TM_A", 10, 18, false),
            ]
        );
        // parent record is not rewritten
        assert_eq!(mapped[1].domain.end, 50);
        assert_eq!(mapped[2].domain.start, 30);
    }

    #[test]
    fn straddling_domains_are_partial_on_one_side_only() {
        let a = gene_a();
        let b = gene_b();
        let candidates = resolve(&a, 350, &b, 580, false).unwrap();
        let seqs = assemble(&candidates[0]);
        let d5 = vec![domain("Pfam", "Across5", 30, 53)];
        let d3 = vec![domain("Pfam", "Across3", 20, 40)];
        let mapped = map_domains(&candidates[0], &seqs, &d5, &d3, &default_databases());

        let partial5: Vec<_> = mapped.iter().filter(|m| m.partial && m.side == Side::FivePrime).collect();
        let partial3: Vec<_> = mapped.iter().filter(|m| m.partial && m.side == Side::ThreePrime).collect();
        assert_eq!(partial5.len(), 1);
        assert_eq!(partial5[0].domain.label, "Across5");
        assert_eq!(partial3.len(), 1);
        assert_eq!(partial3[0].domain.label, "Across3");
    }

    #[test]
    fn mapping_is_monotonic_per_side() {
        let a = gene_a();
        let b = gene_b();
        let candidates = resolve(&a, 350, &b, 580, false).unwrap();
        let seqs = assemble(&candidates[0]);
        let d5 = vec![domain("Pfam", "P1", 1, 10), domain("Pfam", "P2", 12, 30), domain("Pfam", "P3", 31, 45)];
        let d3 = vec![domain("Pfam", "Q1", 35, 40), domain("Pfam", "Q2", 41, 50), domain("Pfam", "Q3", 52, 56)];
        let mapped = map_domains(&candidates[0], &seqs, &d5, &d3, &default_databases());

        for side in [Side::FivePrime, Side::ThreePrime] {
            let on_side: Vec<_> = mapped.iter().filter(|m| m.side == side).collect();
            for pair in on_side.windows(2) {
                if pair[0].domain.end < pair[1].domain.start {
                    assert!(pair[0].fusion_end < pair[1].fusion_start);
                }
            }
        }
    }

    #[test]
    fn overlapping_domains_follow_database_order() {
        let a = gene_a();
        let b = gene_b();
        let candidates = resolve(&a, 350, &b, 580, false).unwrap();
        let seqs = assemble(&candidates[0]);
        let d5 = vec![domain("Pfam", "Kinase", 5, 20), domain("Smart", "S_TKc", 4, 22)];
        let dbs = vec!["Smart".to_string(), "Pfam".to_string()];

        let mapped = map_domains(&candidates[0], &seqs, &d5, &[], &dbs);
        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped[0].domain.label, "S_TKc");
        assert_eq!(mapped[1].domain.label, "Kinase");
    }

    #[test]
    fn excised_domains_are_dropped() {
        let a = gene_a();
        let b = gene_b();
        let candidates = resolve(&a, 350, &b, 580, false).unwrap();
        let seqs = assemble(&candidates[0]);
        let d5 = vec![domain("Pfam", "After5", 45, 50)];
        let d3 = vec![domain("Pfam", "Before3", 5, 15)];
        assert!(map_domains(&candidates[0], &seqs, &d5, &d3, &default_databases()).is_empty());
    }

    #[test]
    fn out_of_frame_drops_three_prime_domains() {
        let a = gene_a();
        let b = gene_b();
        let candidates = resolve(&a, 350, &b, 579, false).unwrap();
        let seqs = assemble(&candidates[0]);
        let d5 = vec![domain("Pfam", "Early", 2, 9)];
        let d3 = vec![domain("Pfam", "Late", 48, 55)];
        let mapped = map_domains(&candidates[0], &seqs, &d5, &d3, &default_databases());
        assert!(mapped.iter().all(|m| m.side == Side::FivePrime));
        assert!(mapped.iter().all(|m| m.fusion_end <= seqs.protein.len() as u64));
    }

    #[test]
    fn utr_fusion_has_no_domains() {
        let a = gene_a();
        let b = gene_b();
        let candidates = resolve(&a, 110, &b, 580, false).unwrap();
        let seqs = assemble(&candidates[0]);
        let d3 = vec![domain("Pfam", "Late", 48, 55)];
        assert!(map_domains(&candidates[0], &seqs, &[], &d3, &default_databases()).is_empty());
    }
}
