use std::path::Path;

use tracing::debug;

use crate::error::RunError;
use crate::parsers::{parse_breakpoint, FusionRecord, ParsedRecord, TsvTable, UpstreamParser};

/// `star-fusion.fusion_predictions.tsv` from STAR-Fusion.
pub struct StarFusionParser;

/// Split `SYMBOL^ENSG00000139083.10` into the symbol and the stable ID.
fn split_gene(value: &str) -> Result<(String, String), String> {
    match value.split_once('^') {
        Some((symbol, id)) if !symbol.is_empty() && !id.is_empty() => Ok((symbol.to_string(), id.to_string())),
        _ => Err(format!("expected SYMBOL^ID, got '{}'", value)),
    }
}

impl UpstreamParser for StarFusionParser {
    fn name(&self) -> &'static str {
        "starfusion"
    }

    fn parse(&self, path: &Path) -> Result<Vec<ParsedRecord>, RunError> {
        let table = TsvTable::open(path)?;
        table.column("#FusionName")?;
        let left_gene = table.column("LeftGene")?;
        let left_point = table.column("LeftBreakpoint")?;
        let right_gene = table.column("RightGene")?;
        let right_point = table.column("RightBreakpoint")?;

        let records = table.map_records(|fields| {
            let (name5, gene5) = split_gene(fields.get(left_gene)?)?;
            let (name3, gene3) = split_gene(fields.get(right_gene)?)?;
            Ok(FusionRecord {
                line: fields.line(),
                gene5,
                name5,
                junction5: parse_breakpoint(fields.get(left_point)?)?,
                gene3,
                name3,
                junction3: parse_breakpoint(fields.get(right_point)?)?,
            })
        });
        debug!("{} record(s) in {:?}", records.len(), path);
        Ok(records)
    }
}
