//! Small hand-built annotation shared by the unit tests.
//!
//! GENEA (+ strand): ENST_A1 canonical, exons 100-200 and 300-400, 30 nt 5'UTR,
//! CDS 130..390 (53 aa + stop), 10 nt 3'UTR. ENST_A2 is a non-coding isoform
//! with exons 100-200 and 300-360.
//!
//! GENEB (- strand): ENST_B1 canonical, exons 900-1000 then 500-600, 20 nt
//! 5'UTR, CDS 511..980 (56 aa + stop), 11 nt 3'UTR.

use crate::annotation_store::JsonAnnotationStore;
use crate::models::{CdsSpan, Domain, Exon, Gene, GenomeBuild, Protein, Strand, Transcript};

const CODONS_A: [&str; 12] = [
    "GCT", "CGT", "AAT", "GAT", "TGT", "CAA", "GAA", "GGT", "CAT", "ATT", "CTT", "AAA",
];
const CODONS_B: [&str; 6] = ["GAA", "TTA", "CCA", "AGA", "TCA", "GTA"];

fn coding(codons: &[&str], sense: usize, stop: &str) -> String {
    let mut cds = String::from("ATG");
    for i in 0..sense {
        cds.push_str(codons[i % codons.len()]);
    }
    cds.push_str(stop);
    cds
}

pub fn domain(database: &str, label: &str, start: u64, end: u64) -> Domain {
    Domain {
        database: database.to_string(),
        label: label.to_string(),
        description: None,
        start,
        end,
    }
}

pub fn cds_a() -> String {
    coding(&CODONS_A, 52, "TAA")
}

pub fn cds_b() -> String {
    coding(&CODONS_B, 55, "TGA")
}

pub fn gene_a() -> Gene {
    let cds = cds_a();
    let sequence = format!("{}{}{}", "C".repeat(30), cds, "G".repeat(10));
    let protein = Protein {
        id: "ENSP_A1".to_string(),
        sequence: crate::fusion::assembler::translate(&cds).0,
        domains: vec![
            domain("Smart", "SmartA", 2, 8),
            domain("Pfam", "DomA1", 5, 20),
            domain("transmembrane", "TM_A", 10, 18),
            domain("Pfam", "DomA2", 35, 50),
        ],
    };
    Gene {
        id: "ENSG_A".to_string(),
        symbol: "GENEA".to_string(),
        synonyms: vec!["ALIASA".to_string()],
        chromosome: "1".to_string(),
        strand: Strand::Forward,
        start: 100,
        end: 400,
        transcripts: vec![
            Transcript {
                id: "ENST_A1".to_string(),
                is_canonical: true,
                biotype: "protein_coding".to_string(),
                exons: vec![
                    Exon { start: 100, end: 200 },
                    Exon { start: 300, end: 400 },
                ],
                cds: Some(CdsSpan { start: 130, end: 390 }),
                sequence,
                protein: Some(protein),
            },
            Transcript {
                id: "ENST_A2".to_string(),
                is_canonical: false,
                biotype: "retained_intron".to_string(),
                exons: vec![
                    Exon { start: 100, end: 200 },
                    Exon { start: 300, end: 360 },
                ],
                cds: None,
                sequence: "T".repeat(162),
                protein: None,
            },
        ],
    }
}

pub fn gene_b() -> Gene {
    let cds = cds_b();
    let sequence = format!("{}{}{}", "A".repeat(20), cds, "C".repeat(11));
    let protein = Protein {
        id: "ENSP_B1".to_string(),
        sequence: crate::fusion::assembler::translate(&cds).0,
        domains: vec![
            domain("Pfam", "DomB1", 5, 15),
            domain("Pfam", "DomB2", 30, 45),
            domain("Pfam", "DomB3", 48, 55),
        ],
    };
    Gene {
        id: "ENSG_B".to_string(),
        symbol: "GENEB".to_string(),
        synonyms: vec![],
        chromosome: "2".to_string(),
        strand: Strand::Reverse,
        start: 500,
        end: 1000,
        transcripts: vec![Transcript {
            id: "ENST_B1".to_string(),
            is_canonical: true,
            biotype: "protein_coding".to_string(),
            exons: vec![
                Exon { start: 900, end: 1000 },
                Exon { start: 500, end: 600 },
            ],
            cds: Some(CdsSpan { start: 511, end: 980 }),
            sequence,
            protein: Some(protein),
        }],
    }
}

pub fn store() -> JsonAnnotationStore {
    JsonAnnotationStore::from_parts(GenomeBuild::GRCh38, vec![gene_a(), gene_b()])
        .expect("fixture annotation is valid")
}

pub fn default_databases() -> Vec<String> {
    vec!["Pfam".to_string(), "transmembrane".to_string()]
}
