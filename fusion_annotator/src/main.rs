use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fusion_annotator::annotation_store::JsonAnnotationStore;
use fusion_annotator::config::{
    AnnotateOptions, DuplicatePolicy, ImageFormat, RenderConfig, DEFAULT_PROTEIN_DATABASES,
};
use fusion_annotator::models::GenomeBuild;
use fusion_annotator::parsers::parser_for;
use fusion_annotator::pipeline::{process_event, run_batch, FusionEvent};

#[derive(Parser, Debug)]
#[command(version, about = "Annotate and visualise gene fusions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Annotate and visualise a single fusion
    Annotate(AnnotateArgs),
    /// Annotate every fusion in the output of a fusion-finding tool
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct AnnotateArgs {
    /// 5' gene partner (symbol, synonym or stable ID)
    #[arg(long = "gene5prime", visible_alias = "g5")]
    gene5: String,

    /// 3' gene partner
    #[arg(long = "gene3prime", visible_alias = "g3")]
    gene3: String,

    /// Last genomic base (1-based) of the 5' partner kept in the fusion
    #[arg(long = "junction5prime", visible_alias = "j5")]
    junction5: u64,

    /// First genomic base (1-based) of the 3' partner kept in the fusion
    #[arg(long = "junction3prime", visible_alias = "j3")]
    junction3: u64,

    /// Residues spanned by the figure width (default: longest protein)
    #[arg(long)]
    scale: Option<u64>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Output file of the fusion-finding tool
    #[arg(short, long)]
    file: PathBuf,

    /// fusioncatcher, starfusion (star-fusion) or arriba
    #[arg(short, long)]
    algorithm: String,

    /// What to do when an event's output directory already exists
    #[arg(long, value_enum, default_value_t = DuplicatePolicy::Overwrite)]
    on_duplicate: DuplicatePolicy,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Directory to save results
    #[arg(short, long)]
    out: PathBuf,

    /// GRCh38 (hg38), GRCh37 (hg19), GRCm38 (mm10) or an Ensembl core database name
    #[arg(short, long)]
    genome: String,

    /// JSON annotation store
    #[arg(long, env = "FUSION_ANNOTATOR_DB")]
    db: PathBuf,

    /// Include non-canonical transcripts
    #[arg(long)]
    noncanonical: bool,

    /// Protein feature databases to show, in drawing order
    #[arg(long, alias = "protein_databases", num_args = 1.., default_values = DEFAULT_PROTEIN_DATABASES)]
    protein_databases: Vec<String>,

    /// Recolour a domain: "original;colour", repeatable
    #[arg(long)]
    recolor: Vec<String>,

    /// Rename a domain: "original;new name", repeatable
    #[arg(long)]
    rename: Vec<String>,

    /// Image file type
    #[arg(long = "type", value_enum, default_value_t = ImageFormat::Png)]
    image_type: ImageFormat,

    /// Image width in inches
    #[arg(short, long, default_value_t = 10)]
    width: u32,

    /// Image height in inches, per protein row
    #[arg(long, default_value_t = 3)]
    height: u32,

    /// Dots per inch
    #[arg(long)]
    dpi: Option<u32>,

    #[arg(long, default_value_t = 12)]
    fontsize: u32,

    /// Also draw the wild-type 5' and 3' proteins
    #[arg(long, alias = "WT")]
    wt: bool,

    /// Put a * at the junction of the exported sequences
    #[arg(long)]
    middlestar: bool,

    /// Do not label domains
    #[arg(long, alias = "no_domain_labels")]
    no_domain_labels: bool,
}

impl CommonArgs {
    fn annotate_options(&self) -> Result<AnnotateOptions> {
        let build: GenomeBuild = self.genome.parse()?;
        Ok(AnnotateOptions {
            build,
            include_noncanonical: self.noncanonical,
            protein_databases: self.protein_databases.clone(),
            junction_marker: self.middlestar,
        })
    }

    fn render_config(&self, scale: Option<u64>) -> Result<RenderConfig> {
        let mut config = RenderConfig::default().with_maps(&self.rename, &self.recolor)?;
        config.width_in = self.width;
        config.height_in = self.height;
        if let Some(dpi) = self.dpi {
            config.dpi = dpi;
        }
        config.font_size = self.fontsize;
        config.scale = scale;
        config.show_labels = !self.no_domain_labels;
        config.plot_wild_type = self.wt;
        config.format = self.image_type;
        config.pixel_size(1)?;
        Ok(config)
    }

    fn open_store(&self, build: GenomeBuild) -> Result<JsonAnnotationStore> {
        let store = JsonAnnotationStore::open_for_build(&self.db, build)?;
        Ok(store)
    }
}

fn annotate(args: AnnotateArgs) -> Result<()> {
    let options = args.common.annotate_options()?;
    let render_config = args.common.render_config(args.scale)?;
    let store = args.common.open_store(options.build)?;
    std::fs::create_dir_all(&args.common.out)
        .with_context(|| format!("failed to create {:?}", args.common.out))?;

    let event = FusionEvent {
        gene5: args.gene5,
        junction5: args.junction5,
        gene3: args.gene3,
        junction3: args.junction3,
        names: None,
    };
    let (annotation, dir) = process_event(
        &store,
        &event,
        &args.common.out,
        &options,
        &render_config,
        DuplicatePolicy::Overwrite,
        &mut HashSet::new(),
    )?;
    info!(
        "{}: {} candidate(s), {} in frame, written to {:?}",
        annotation.name,
        annotation.fusions.len(),
        annotation.in_frame_count(),
        dir
    );
    Ok(())
}

fn batch(args: BatchArgs) -> Result<()> {
    let options = args.common.annotate_options()?;
    let render_config = args.common.render_config(None)?;
    let parser = parser_for(&args.algorithm)?;
    let store = args.common.open_store(options.build)?;

    let report = run_batch(
        &store,
        parser.as_ref(),
        &args.file,
        &args.common.out,
        &options,
        &render_config,
        args.on_duplicate,
    )?;
    if report.events.is_empty() {
        warn!("No fusions found in {:?}", args.file);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Annotate(args) => annotate(args),
        Command::Batch(args) => batch(args),
    }
}
