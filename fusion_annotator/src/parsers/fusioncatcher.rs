use std::path::Path;

use tracing::debug;

use crate::error::RunError;
use crate::parsers::{parse_breakpoint, FusionRecord, ParsedRecord, TsvTable, UpstreamParser};

const SYMBOL_5: &str = "Gene_1_symbol(5end_fusion_partner)";
const SYMBOL_3: &str = "Gene_2_symbol(3end_fusion_partner)";
const ID_5: &str = "Gene_1_id(5end_fusion_partner)";
const ID_3: &str = "Gene_2_id(3end_fusion_partner)";
const POINT_5: &str = "Fusion_point_for_gene_1(5end_fusion_partner)";
const POINT_3: &str = "Fusion_point_for_gene_2(3end_fusion_partner)";

/// `final-list_candidate-fusion-genes.txt` from FusionCatcher.
pub struct FusionCatcherParser;

impl UpstreamParser for FusionCatcherParser {
    fn name(&self) -> &'static str {
        "fusioncatcher"
    }

    fn parse(&self, path: &Path) -> Result<Vec<ParsedRecord>, RunError> {
        let table = TsvTable::open(path)?;
        let symbol5 = table.column(SYMBOL_5)?;
        let symbol3 = table.column(SYMBOL_3)?;
        let id5 = table.column(ID_5)?;
        let id3 = table.column(ID_3)?;
        let point5 = table.column(POINT_5)?;
        let point3 = table.column(POINT_3)?;

        let records = table.map_records(|fields| {
            Ok(FusionRecord {
                line: fields.line(),
                gene5: fields.get(id5)?.to_string(),
                name5: fields.get(symbol5)?.to_string(),
                junction5: parse_breakpoint(fields.get(point5)?)?,
                gene3: fields.get(id3)?.to_string(),
                name3: fields.get(symbol3)?.to_string(),
                junction3: parse_breakpoint(fields.get(point3)?)?,
            })
        });
        debug!("{} record(s) in {:?}", records.len(), path);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Gene_1_symbol(5end_fusion_partner)\tGene_2_symbol(3end_fusion_partner)\tFusion_description\tSpanning_unique_reads\tFusion_point_for_gene_1(5end_fusion_partner)\tFusion_point_for_gene_2(3end_fusion_partner)\tGene_1_id(5end_fusion_partner)\tGene_2_id(3end_fusion_partner)";

    #[test]
    fn reads_good_rows_and_flags_bad_ones() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        writeln!(file, "ETV6\tNTRK3\tknown\t12\t12:11869969:+\t15:87940753:-\tENSG00000139083\tENSG00000140538").unwrap();
        writeln!(file, "TMPRSS2\tERG\tknown\t8\t21:41508081\t21:38445621:-\tENSG00000184012\tENSG00000157554").unwrap();
        writeln!(file, "BCR\tABL1\tknown\t3\tnot-a-point\t9:130714455:+\tENSG00000186716\tENSG00000097007").unwrap();

        let records = FusionCatcherParser.parse(file.path()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0],
            Ok(FusionRecord {
                line: 2,
                gene5: "ENSG00000139083".to_string(),
                name5: "ETV6".to_string(),
                junction5: 11869969,
                gene3: "ENSG00000140538".to_string(),
                name3: "NTRK3".to_string(),
                junction3: 87940753,
            })
        );
        assert_eq!(records[1].as_ref().unwrap().junction5, 41508081);
        assert_eq!(records[1].as_ref().unwrap().line, 3);
        let bad = records[2].as_ref().unwrap_err();
        assert_eq!(bad.line, 4);
        assert!(bad.reason.contains("not-a-point"));
    }

    #[test]
    fn missing_column_fails_the_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Gene_1_symbol(5end_fusion_partner)\tGene_2_symbol(3end_fusion_partner)").unwrap();
        writeln!(file, "ETV6\tNTRK3").unwrap();
        match FusionCatcherParser.parse(file.path()) {
            Err(RunError::MissingColumn { column, .. }) => assert_eq!(column, ID_5),
            other => panic!("expected MissingColumn, got {:?}", other.map(|r| r.len())),
        }
    }
}
