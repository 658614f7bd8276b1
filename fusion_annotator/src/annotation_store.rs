// src/annotation_store.rs

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{FusionError, RunError};
use crate::models::{Domain, Gene, GenomeBuild};

/// Read-only gene, transcript and protein-feature lookups for one genome build.
pub trait AnnotationStore {
    /// Look a gene up by stable ID (with or without version), symbol or synonym.
    fn get_gene(&self, id_or_symbol: &str, build: GenomeBuild) -> Result<&Gene, FusionError>;

    /// Domains of a protein restricted to `databases`, ordered by the position of
    /// their database in `databases` and then by start. An empty filter keeps all.
    fn get_domains(&self, protein_id: &str, databases: &[String]) -> Result<Vec<Domain>, FusionError>;
}

#[derive(Deserialize, Debug)]
struct AnnotationFile {
    build: GenomeBuild,
    genes: Vec<Gene>,
}

/// Annotation exported to a single JSON document and held in memory.
pub struct JsonAnnotationStore {
    build: GenomeBuild,
    genes: Vec<Gene>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, Vec<usize>>,
    proteins: HashMap<String, (usize, usize)>,
}

impl JsonAnnotationStore {
    pub fn open(path: &Path) -> Result<Self, RunError> {
        info!("Opening annotation store {}", path.display());
        let file = File::open(path).map_err(|source| RunError::UnreadableStore {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: AnnotationFile =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| RunError::MalformedStore {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_parts(parsed.build, parsed.genes)
    }

    /// Open a store and make sure it was built for `build`.
    pub fn open_for_build(path: &Path, build: GenomeBuild) -> Result<Self, RunError> {
        let store = Self::open(path)?;
        if store.build != build {
            return Err(RunError::BuildMismatch {
                available: store.build,
                requested: build,
            });
        }
        Ok(store)
    }

    pub fn from_parts(build: GenomeBuild, genes: Vec<Gene>) -> Result<Self, RunError> {
        let mut by_id = HashMap::new();
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        let mut proteins = HashMap::new();

        for (gene_idx, gene) in genes.iter().enumerate() {
            gene.validate().map_err(RunError::InvalidAnnotation)?;

            if by_id.insert(gene.id.clone(), gene_idx).is_some() {
                return Err(RunError::InvalidAnnotation(format!("duplicate gene id {}", gene.id)));
            }
            for name in std::iter::once(&gene.symbol).chain(gene.synonyms.iter()) {
                let slot = by_name.entry(name.to_uppercase()).or_default();
                if !slot.contains(&gene_idx) {
                    slot.push(gene_idx);
                }
            }
            for (tx_idx, transcript) in gene.transcripts.iter().enumerate() {
                if let Some(protein) = &transcript.protein {
                    proteins.insert(protein.id.clone(), (gene_idx, tx_idx));
                }
            }
        }

        info!(
            "Loaded {} genes and {} proteins for {} ({}, Ensembl {})",
            genes.len(),
            proteins.len(),
            build,
            build.ensembl_name(),
            build.ensembl_release()
        );

        Ok(Self {
            build,
            genes,
            by_id,
            by_name,
            proteins,
        })
    }
}

fn strip_version(id: &str) -> &str {
    match id.rsplit_once('.') {
        Some((base, version)) if version.chars().all(|c| c.is_ascii_digit()) => base,
        _ => id,
    }
}

fn database_rank(database: &str, databases: &[String]) -> Option<usize> {
    databases.iter().position(|d| d.eq_ignore_ascii_case(database))
}

impl AnnotationStore for JsonAnnotationStore {
    fn get_gene(&self, id_or_symbol: &str, build: GenomeBuild) -> Result<&Gene, FusionError> {
        if build != self.build {
            return Err(FusionError::BuildUnavailable {
                available: self.build,
                requested: build,
            });
        }
        let query = id_or_symbol.trim();
        if let Some(&idx) = self
            .by_id
            .get(query)
            .or_else(|| self.by_id.get(strip_version(query)))
        {
            return Ok(&self.genes[idx]);
        }
        match self.by_name.get(&query.to_uppercase()).map(Vec::as_slice) {
            Some([idx]) => Ok(&self.genes[*idx]),
            Some(many) if many.len() > 1 => Err(FusionError::AmbiguousGene {
                query: query.to_string(),
                candidates: many.iter().map(|&i| self.genes[i].id.clone()).collect(),
            }),
            _ => Err(FusionError::GeneNotFound(query.to_string())),
        }
    }

    fn get_domains(&self, protein_id: &str, databases: &[String]) -> Result<Vec<Domain>, FusionError> {
        let Some(&(gene_idx, tx_idx)) = self.proteins.get(protein_id) else {
            debug!("No protein features for {}", protein_id);
            return Ok(Vec::new());
        };
        let protein = match &self.genes[gene_idx].transcripts[tx_idx].protein {
            Some(protein) => protein,
            None => return Ok(Vec::new()),
        };

        let mut ranked: Vec<(usize, &Domain)> = protein
            .domains
            .iter()
            .filter_map(|d| {
                if databases.is_empty() {
                    Some((0, d))
                } else {
                    database_rank(&d.database, databases).map(|rank| (rank, d))
                }
            })
            .collect();
        ranked.sort_by_key(|(rank, d)| (*rank, d.start, d.end));

        Ok(ranked.into_iter().map(|(_, d)| d.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{default_databases, store};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn lookup_by_id_symbol_and_synonym() {
        let store = store();
        let build = GenomeBuild::GRCh38;
        assert_eq!(store.get_gene("ENSG_A", build).unwrap().symbol, "GENEA");
        assert_eq!(store.get_gene("ENSG_A.7", build).unwrap().symbol, "GENEA");
        assert_eq!(store.get_gene("geneb", build).unwrap().id, "ENSG_B");
        assert_eq!(store.get_gene("ALIASA", build).unwrap().id, "ENSG_A");
        assert!(matches!(
            store.get_gene("NOPE", build),
            Err(FusionError::GeneNotFound(_))
        ));
        assert!(matches!(
            store.get_gene("GENEA", GenomeBuild::GRCh37),
            Err(FusionError::BuildUnavailable { .. })
        ));
    }

    #[test]
    fn shared_synonym_is_ambiguous() {
        let mut a = crate::test_fixtures::gene_a();
        let mut b = crate::test_fixtures::gene_b();
        a.synonyms.push("SHARED".to_string());
        b.synonyms.push("shared".to_string());
        let store = JsonAnnotationStore::from_parts(GenomeBuild::GRCh38, vec![a, b]).unwrap();
        match store.get_gene("Shared", GenomeBuild::GRCh38) {
            Err(FusionError::AmbiguousGene { candidates, .. }) => assert_eq!(candidates.len(), 2),
            other => panic!("expected ambiguity, got {:?}", other.map(|g| &g.id)),
        }
    }

    #[test]
    fn domains_follow_filter_order() {
        let store = store();
        let domains = store.get_domains("ENSP_A1", &default_databases()).unwrap();
        let labels: Vec<&str> = domains.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["DomA1", "DomA2", "TM_A"]);

        let reversed = vec!["transmembrane".to_string(), "pfam".to_string()];
        let domains = store.get_domains("ENSP_A1", &reversed).unwrap();
        assert_eq!(domains[0].label, "TM_A");

        assert_eq!(store.get_domains("ENSP_A1", &[]).unwrap().len(), 4);
        assert!(store.get_domains("ENSP_MISSING", &[]).unwrap().is_empty());
    }

    #[test]
    fn open_json_and_check_build() {
        let json = r#"{
            "build": "homo_sapiens_core_84_38",
            "genes": [{
                "id": "ENSG1", "symbol": "ONE", "chromosome": "3", "strand": -1,
                "start": 10, "end": 19,
                "transcripts": [{
                    "id": "ENST1", "is_canonical": true,
                    "exons": [{"start": 15, "end": 19, "rank": 1}, {"start": 10, "end": 13, "rank": 2}],
                    "cds": {"start": 10, "end": 19},
                    "sequence": "ATGAAATAA",
                    "protein": {"id": "ENSP1", "sequence": "MK",
                                "domains": [{"database": "Pfam", "label": "X", "start": 1, "end": 2}]}
                }]
            }]
        }"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let store = JsonAnnotationStore::open_for_build(file.path(), GenomeBuild::GRCh38).unwrap();
        // exon ranks in the file are tolerated and ignored
        assert_eq!(store.get_gene("one", GenomeBuild::GRCh38).unwrap().transcripts[0].exons.len(), 2);
        assert!(matches!(
            JsonAnnotationStore::open_for_build(file.path(), GenomeBuild::GRCm38),
            Err(RunError::BuildMismatch { .. })
        ));
    }

    #[test]
    fn open_rejects_bad_build_and_missing_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"build": "hg18", "genes": []}"#).unwrap();
        assert!(matches!(
            JsonAnnotationStore::open(file.path()),
            Err(RunError::MalformedStore { .. })
        ));
        assert!(matches!(
            JsonAnnotationStore::open(Path::new("/definitely/not/here.json")),
            Err(RunError::UnreadableStore { .. })
        ));
    }
}
