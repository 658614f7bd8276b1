use std::path::Path;

use tracing::debug;

use crate::error::RunError;
use crate::parsers::{parse_breakpoint, FusionRecord, ParsedRecord, TsvTable, UpstreamParser};

/// `fusions.tsv` from Arriba.
pub struct ArribaParser;

/// Intergenic breakpoints list neighbouring genes as `A(123),B(456)`.
fn genic(name: &str) -> Result<&str, String> {
    if name == "." || name.contains(',') || name.contains('(') {
        return Err(format!("breakpoint is not inside a gene: '{}'", name));
    }
    Ok(name)
}

impl UpstreamParser for ArribaParser {
    fn name(&self) -> &'static str {
        "arriba"
    }

    fn parse(&self, path: &Path) -> Result<Vec<ParsedRecord>, RunError> {
        let table = TsvTable::open(path)?;
        let gene1 = table.column("#gene1")?;
        let gene2 = table.column("gene2")?;
        let breakpoint1 = table.column("breakpoint1")?;
        let breakpoint2 = table.column("breakpoint2")?;
        // only written by newer Arriba releases
        let gene_id1 = table.optional_column("gene_id1");
        let gene_id2 = table.optional_column("gene_id2");

        let records = table.map_records(|fields| {
            let name5 = genic(fields.get(gene1)?)?;
            let name3 = genic(fields.get(gene2)?)?;
            Ok(FusionRecord {
                line: fields.line(),
                gene5: fields.get_optional(gene_id1).unwrap_or(name5).to_string(),
                name5: name5.to_string(),
                junction5: parse_breakpoint(fields.get(breakpoint1)?)?,
                gene3: fields.get_optional(gene_id2).unwrap_or(name3).to_string(),
                name3: name3.to_string(),
                junction3: parse_breakpoint(fields.get(breakpoint2)?)?,
            })
        });
        debug!("{} record(s) in {:?}", records.len(), path);
        Ok(records)
    }
}
