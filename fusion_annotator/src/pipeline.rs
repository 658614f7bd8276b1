// src/pipeline.rs

//! Drives fusion events from lookup to files on disk.
//!
//! Each event is resolved, assembled, mapped, exported and rendered before the
//! next one starts. Errors raised while handling one event are caught here and
//! recorded, so a batch always runs to the end.

use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::df;
use polars::prelude::*;
use tracing::{debug, error, info, warn};

use crate::annotation_store::AnnotationStore;
use crate::config::{AnnotateOptions, DuplicatePolicy, RenderConfig};
use crate::error::{FusionError, RunError};
use crate::export::{write_domain_table, write_fasta, SequenceKind};
use crate::fusion::{assemble, map_domains, resolve, AnnotatedFusion, FusionEffect, FusionSide};
use crate::models::Domain;
use crate::parsers::UpstreamParser;
use crate::render::{layout, render};

pub const SUMMARY_FILE: &str = "batch_summary.csv";

/// Two junctions on two genes, as given by the user or an upstream tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FusionEvent {
    pub gene5: String,
    pub junction5: u64,
    pub gene3: String,
    pub junction3: u64,
    /// Names used in the event name instead of the store's gene symbols.
    pub names: Option<(String, String)>,
}

/// All candidates of one event.
#[derive(Debug)]
pub struct EventAnnotation<'s> {
    /// `{name5}-{junction5}_{name3}-{junction3}`, also the output directory name.
    pub name: String,
    pub fusions: Vec<AnnotatedFusion<'s>>,
}

impl EventAnnotation<'_> {
    pub fn in_frame_count(&self) -> usize {
        self.fusions
            .iter()
            .filter(|f| f.sequences.effect == FusionEffect::InFrame)
            .count()
    }
}

fn parent_domains(
    store: &dyn AnnotationStore,
    side: &FusionSide,
    databases: &[String],
) -> Result<Vec<Domain>, FusionError> {
    match &side.transcript.protein {
        Some(protein) => store.get_domains(&protein.id, databases),
        None => Ok(Vec::new()),
    }
}

/// Resolve, assemble and map every candidate of `event`.
pub fn annotate_event<'s>(
    store: &'s dyn AnnotationStore,
    event: &FusionEvent,
    options: &AnnotateOptions,
) -> Result<EventAnnotation<'s>, FusionError> {
    let gene5 = store.get_gene(&event.gene5, options.build)?;
    let gene3 = store.get_gene(&event.gene3, options.build)?;
    let (name5, name3) = match &event.names {
        Some((name5, name3)) => (name5.as_str(), name3.as_str()),
        None => (gene5.symbol.as_str(), gene3.symbol.as_str()),
    };
    let name = format!("{}-{}_{}-{}", name5, event.junction5, name3, event.junction3);

    let candidates = resolve(
        gene5,
        event.junction5,
        gene3,
        event.junction3,
        options.include_noncanonical,
    )?;

    let mut fusions = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        debug!(
            "{}: {} junction in {}, {} junction in {}",
            candidate.name(),
            candidate.five_prime.junction.side,
            candidate.five_prime.region,
            candidate.three_prime.junction.side,
            candidate.three_prime.region
        );
        let sequences = assemble(&candidate);
        for warning in &sequences.warnings {
            warn!("{}: {}: {}", name, candidate.name(), warning);
        }
        let five_prime_domains = parent_domains(store, &candidate.five_prime, &options.protein_databases)?;
        let three_prime_domains = parent_domains(store, &candidate.three_prime, &options.protein_databases)?;
        let domains = map_domains(
            &candidate,
            &sequences,
            &five_prime_domains,
            &three_prime_domains,
            &options.protein_databases,
        );
        fusions.push(AnnotatedFusion {
            candidate,
            sequences,
            domains,
            five_prime_domains,
            three_prime_domains,
        });
    }

    info!("{}: {} candidate transcript(s)", name, fusions.len());
    Ok(EventAnnotation { name, fusions })
}

/// Create the directory for one event, applying the duplicate policy.
///
/// `seen` holds every directory handed out in this run, so two events that map
/// to the same name are caught even before anything has been written.
pub fn prepare_output_dir(
    root: &Path,
    event_name: &str,
    policy: DuplicatePolicy,
    seen: &mut HashSet<PathBuf>,
) -> Result<PathBuf, FusionError> {
    let dir = root.join(event_name);
    let duplicate = !seen.insert(dir.clone()) || dir.exists();
    if duplicate {
        match policy {
            DuplicatePolicy::Skip => {
                warn!("Output directory {:?} already exists, skipping", dir);
                return Err(FusionError::DuplicateOutputDirectory(dir));
            }
            DuplicatePolicy::Overwrite => {
                warn!("Output directory {:?} already exists, overwriting", dir);
                if dir.exists() {
                    fs::remove_dir_all(&dir)?;
                }
            }
        }
    }
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Write the FASTA files, the domain table and the diagram of one event.
pub fn write_event(
    annotation: &EventAnnotation,
    dir: &Path,
    options: &AnnotateOptions,
    render_config: &RenderConfig,
) -> Result<(), FusionError> {
    for kind in SequenceKind::ALL {
        write_fasta(dir, &annotation.name, &annotation.fusions, kind, options.junction_marker)?;
    }
    write_domain_table(dir, &annotation.name, &annotation.fusions)?;

    let figure = layout(&annotation.name, &annotation.fusions, render_config);
    let image = dir.join(format!("{}.{}", annotation.name, render_config.format.extension()));
    render(&figure, render_config, &image)?;
    debug!("{}: outputs written to {:?}", annotation.name, dir);
    Ok(())
}

/// What happened to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Annotated,
    /// Output directory already taken and the policy is `skip`.
    Skipped,
    Failed,
    /// The upstream line could not be parsed.
    Malformed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Annotated => "annotated",
            EventStatus::Skipped => "skipped",
            EventStatus::Failed => "failed",
            EventStatus::Malformed => "malformed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSummary {
    pub line: Option<u64>,
    pub gene5: String,
    pub junction5: Option<u64>,
    pub gene3: String,
    pub junction3: Option<u64>,
    pub status: EventStatus,
    pub candidates: u32,
    pub in_frame: u32,
    pub output: Option<PathBuf>,
    pub message: String,
}

impl EventSummary {
    fn for_event(line: Option<u64>, event: &FusionEvent) -> Self {
        Self {
            line,
            gene5: event.gene5.clone(),
            junction5: Some(event.junction5),
            gene3: event.gene3.clone(),
            junction3: Some(event.junction3),
            status: EventStatus::Failed,
            candidates: 0,
            in_frame: 0,
            output: None,
            message: String::new(),
        }
    }
}

/// Annotate one event and write its outputs under `out_root`.
pub fn process_event<'s>(
    store: &'s dyn AnnotationStore,
    event: &FusionEvent,
    out_root: &Path,
    options: &AnnotateOptions,
    render_config: &RenderConfig,
    policy: DuplicatePolicy,
    seen: &mut HashSet<PathBuf>,
) -> Result<(EventAnnotation<'s>, PathBuf), FusionError> {
    let annotation = annotate_event(store, event, options)?;
    let dir = prepare_output_dir(out_root, &annotation.name, policy, seen)?;
    write_event(&annotation, &dir, options, render_config)?;
    Ok((annotation, dir))
}

fn summarize(
    line: Option<u64>,
    event: &FusionEvent,
    outcome: Result<(EventAnnotation, PathBuf), FusionError>,
) -> EventSummary {
    let mut summary = EventSummary::for_event(line, event);
    match outcome {
        Ok((annotation, dir)) => {
            summary.status = EventStatus::Annotated;
            summary.candidates = annotation.fusions.len() as u32;
            summary.in_frame = annotation.in_frame_count() as u32;
            summary.output = Some(dir);
        }
        Err(e @ FusionError::DuplicateOutputDirectory(_)) => {
            summary.status = EventStatus::Skipped;
            summary.message = e.to_string();
        }
        Err(e) => {
            error!("{}:{} x {}:{} failed: {}", event.gene5, event.junction5, event.gene3, event.junction3, e);
            summary.message = e.to_string();
        }
    }
    summary
}

/// Outcome of a batch run, one entry per upstream record.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub events: Vec<EventSummary>,
}

impl BatchReport {
    pub fn count(&self, status: EventStatus) -> usize {
        self.events.iter().filter(|e| e.status == status).count()
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let line: Vec<Option<u64>> = self.events.iter().map(|e| e.line).collect();
        let gene5: Vec<&str> = self.events.iter().map(|e| e.gene5.as_str()).collect();
        let junction5: Vec<Option<u64>> = self.events.iter().map(|e| e.junction5).collect();
        let gene3: Vec<&str> = self.events.iter().map(|e| e.gene3.as_str()).collect();
        let junction3: Vec<Option<u64>> = self.events.iter().map(|e| e.junction3).collect();
        let status: Vec<&str> = self.events.iter().map(|e| e.status.as_str()).collect();
        let candidates: Vec<u32> = self.events.iter().map(|e| e.candidates).collect();
        let in_frame: Vec<u32> = self.events.iter().map(|e| e.in_frame).collect();
        let output: Vec<Option<String>> = self
            .events
            .iter()
            .map(|e| e.output.as_ref().map(|p| p.display().to_string()))
            .collect();
        let message: Vec<&str> = self.events.iter().map(|e| e.message.as_str()).collect();

        df![
            "line" => line,
            "gene5" => gene5,
            "junction5" => junction5,
            "gene3" => gene3,
            "junction3" => junction3,
            "status" => status,
            "candidates" => candidates,
            "in_frame" => in_frame,
            "output" => output,
            "message" => message,
        ]
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), RunError> {
        let mut df = self.to_dataframe()?;
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
        Ok(())
    }
}

/// Annotate every record of an upstream fusion-finder output.
///
/// Only configuration problems (unreadable input, missing columns, an
/// unwritable output root) end the run; everything else is logged and lands in
/// `batch_summary.csv`.
pub fn run_batch(
    store: &dyn AnnotationStore,
    parser: &dyn UpstreamParser,
    input: &Path,
    out_root: &Path,
    options: &AnnotateOptions,
    render_config: &RenderConfig,
    policy: DuplicatePolicy,
) -> Result<BatchReport, RunError> {
    fs::create_dir_all(out_root)?;
    let records = parser.parse(input)?;
    info!("Read {} {} record(s) from {:?}", records.len(), parser.name(), input);

    let mut seen = HashSet::new();
    let mut report = BatchReport::default();
    for record in records {
        let summary = match record {
            Ok(record) => {
                let event = FusionEvent {
                    gene5: record.gene5,
                    junction5: record.junction5,
                    gene3: record.gene3,
                    junction3: record.junction3,
                    names: Some((record.name5, record.name3)),
                };
                let outcome = process_event(store, &event, out_root, options, render_config, policy, &mut seen);
                summarize(Some(record.line), &event, outcome)
            }
            Err(malformed) => {
                warn!("Skipping {}", malformed);
                EventSummary {
                    line: Some(malformed.line),
                    gene5: String::new(),
                    junction5: None,
                    gene3: String::new(),
                    junction3: None,
                    status: EventStatus::Malformed,
                    candidates: 0,
                    in_frame: 0,
                    output: None,
                    message: malformed.reason,
                }
            }
        };
        report.events.push(summary);
    }

    let summary_path = out_root.join(SUMMARY_FILE);
    report.write_csv(&summary_path)?;
    info!(
        "Batch finished: {} annotated, {} skipped, {} failed, {} malformed ({:?})",
        report.count(EventStatus::Annotated),
        report.count(EventStatus::Skipped),
        report.count(EventStatus::Failed),
        report.count(EventStatus::Malformed),
        summary_path
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageFormat;
    use crate::models::GenomeBuild;
    use crate::parsers::parser_for;
    use crate::test_fixtures::store;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn svg_config() -> RenderConfig {
        RenderConfig { format: ImageFormat::Svg, ..RenderConfig::default() }
    }

    fn event(gene5: &str, junction5: u64, gene3: &str, junction3: u64) -> FusionEvent {
        FusionEvent {
            gene5: gene5.to_string(),
            junction5,
            gene3: gene3.to_string(),
            junction3,
            names: None,
        }
    }

    #[test]
    fn event_name_uses_symbols() {
        let store = store();
        let options = AnnotateOptions::new(GenomeBuild::GRCh38);
        let annotation = annotate_event(&store, &event("ENSG_A.3", 350, "geneb", 580), &options).unwrap();
        assert_eq!(annotation.name, "GENEA-350_GENEB-580");
        assert_eq!(annotation.fusions.len(), 1);
        assert_eq!(annotation.in_frame_count(), 1);
        assert_eq!(annotation.fusions[0].domains.len(), 5);
    }

    #[test]
    fn upstream_names_take_precedence_over_symbols() {
        let store = store();
        let options = AnnotateOptions::new(GenomeBuild::GRCh38);
        let mut renamed = event("ENSG_A", 350, "ENSG_B", 580);
        renamed.names = Some(("alphaA".to_string(), "betaB".to_string()));
        let annotation = annotate_event(&store, &renamed, &options).unwrap();
        assert_eq!(annotation.name, "alphaA-350_betaB-580");
    }

    #[test]
    fn wrong_build_is_an_event_error() {
        let store = store();
        let options = AnnotateOptions::new(GenomeBuild::GRCh37);
        assert!(matches!(
            annotate_event(&store, &event("GENEA", 350, "GENEB", 580), &options),
            Err(FusionError::BuildUnavailable { .. })
        ));
    }

    #[test]
    fn writes_every_output_of_an_event() {
        let store = store();
        let options = AnnotateOptions::new(GenomeBuild::GRCh38);
        let out = tempdir().unwrap();
        let mut seen = HashSet::new();
        let (_, dir) = process_event(
            &store,
            &event("GENEA", 350, "GENEB", 580),
            out.path(),
            &options,
            &svg_config(),
            DuplicatePolicy::Overwrite,
            &mut seen,
        )
        .unwrap();

        assert_eq!(dir, out.path().join("GENEA-350_GENEB-580"));
        for file in ["cdna.fa", "cds.fa", "protein.fa", "domains.tsv", "svg"] {
            assert!(dir.join(format!("GENEA-350_GENEB-580.{}", file)).is_file(), "missing {}", file);
        }
    }

    #[test]
    fn duplicate_directories_follow_the_policy() {
        let root = tempdir().unwrap();
        let mut seen = HashSet::new();
        let dir = prepare_output_dir(root.path(), "E", DuplicatePolicy::Skip, &mut seen).unwrap();
        fs::write(dir.join("marker"), "x").unwrap();

        assert!(matches!(
            prepare_output_dir(root.path(), "E", DuplicatePolicy::Skip, &mut seen),
            Err(FusionError::DuplicateOutputDirectory(_))
        ));
        assert!(dir.join("marker").exists());

        prepare_output_dir(root.path(), "E", DuplicatePolicy::Overwrite, &mut seen).unwrap();
        assert!(dir.is_dir());
        assert!(!dir.join("marker").exists());

        // left over from an earlier run
        fs::create_dir(root.path().join("F")).unwrap();
        assert!(prepare_output_dir(root.path(), "F", DuplicatePolicy::Skip, &mut HashSet::new()).is_err());
    }

    #[test]
    fn batch_continues_past_bad_events() {
        let store = store();
        let options = AnnotateOptions::new(GenomeBuild::GRCh38);
        let mut input = NamedTempFile::new().unwrap();
        writeln!(input, "#FusionName\tLeftGene\tLeftBreakpoint\tRightGene\tRightBreakpoint").unwrap();
        writeln!(input, "GENEA--GENEB\tGENEA^ENSG_A\tchr1:350:+\tGENEB^ENSG_B\tchr2:580:-").unwrap();
        writeln!(input, "GENEA--GENEB\tGENEA^ENSG_A\tchr1:250:+\tGENEB^ENSG_B\tchr2:580:-").unwrap();
        writeln!(input, "GENEA--GENEB\tGENEA\tchr1:350:+\tGENEB^ENSG_B\tchr2:580:-").unwrap();
        writeln!(input, "GENEA--GENEB\tGENEA^ENSG_A\tchr1:350:+\tGENEB^ENSG_B\tchr2:580:-").unwrap();
        writeln!(input, "X--GENEB\tX^ENSG_X\tchr1:350:+\tGENEB^ENSG_B\tchr2:580:-").unwrap();

        let out = tempdir().unwrap();
        let parser = parser_for("star-fusion").unwrap();
        let report = run_batch(
            &store,
            parser.as_ref(),
            input.path(),
            out.path(),
            &options,
            &svg_config(),
            DuplicatePolicy::Skip,
        )
        .unwrap();

        let statuses: Vec<EventStatus> = report.events.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                EventStatus::Annotated,
                EventStatus::Failed,
                EventStatus::Malformed,
                EventStatus::Skipped,
                EventStatus::Failed,
            ]
        );
        assert!(report.events[1].message.contains("no 5' transcript"));
        let lines: Vec<Option<u64>> = report.events.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![Some(2), Some(3), Some(4), Some(5), Some(6)]);
        assert!(out.path().join("GENEA-350_GENEB-580").is_dir());

        let mut rdr = csv::Reader::from_path(out.path().join(SUMMARY_FILE)).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(&headers[5], "status");
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(&rows[0][5], "annotated");
        assert_eq!(&rows[0][7], "1");
        assert_eq!(&rows[2][5], "malformed");
        assert_eq!(&rows[1][0], "3");
        assert_eq!(&rows[1][5], "failed");
        assert_eq!(&rows[3][0], "5");
        assert_eq!(&rows[3][5], "skipped");
    }

    #[test]
    fn missing_column_aborts_the_batch() {
        let store = store();
        let options = AnnotateOptions::new(GenomeBuild::GRCh38);
        let mut input = NamedTempFile::new().unwrap();
        writeln!(input, "#FusionName\tLeftGene").unwrap();
        let out = tempdir().unwrap();
        let parser = parser_for("starfusion").unwrap();
        assert!(matches!(
            run_batch(&store, parser.as_ref(), input.path(), out.path(), &options, &svg_config(), DuplicatePolicy::Skip),
            Err(RunError::MissingColumn { .. })
        ));
    }
}
