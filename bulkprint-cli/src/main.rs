use anyhow::{Context, Result};
use bulkprint::{
    classify, pipeline, DirectorySink, ExplodeConfig, LogLevel, MarkerKind, MemorySink,
    PagedDocument, PdfSource, RunStats, TitleSet,
};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "explode-bulkprint",
    about = "Split a BulkPrint PDF export into a candidates CSV and per-candidate resumes",
    version,
    author
)]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write candidates.csv and resumes/<id>.pdf from BulkPrint exports
    Explode(ExplodeArgs),

    /// Show the top-level bookmarks of a PDF and how they are classified
    Outline {
        /// Input PDF file
        input: PathBuf,
    },
}

#[derive(Args)]
struct ExplodeArgs {
    /// BulkPrint PDF files, processed in order
    inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Salutation recognized before a first name (repeatable, replaces the defaults)
    #[arg(long = "title", value_name = "TITLE")]
    titles: Vec<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Parse and report without writing any output
    #[arg(long)]
    dry_run: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Explode(args) => {
            let config = build_config(&args)?;
            init_logging(cli.log_level.unwrap_or(config.logging.level), cli.verbose);
            let stats = explode(&config, args.dry_run)?;
            print_summary(&stats, args.json)?;
        }

        Commands::Outline { input } => {
            init_logging(cli.log_level.unwrap_or(LogLevel::Warn), cli.verbose);
            show_outline(&input)?;
        }
    }

    Ok(())
}

fn init_logging(level: LogLevel, verbose: bool) {
    let level = if verbose { LogLevel::Debug } else { level };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str())))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Config file values with command-line overrides applied
fn build_config(args: &ExplodeArgs) -> Result<ExplodeConfig> {
    let mut config = match &args.config {
        Some(path) => ExplodeConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ExplodeConfig::default(),
    };

    if !args.inputs.is_empty() {
        config.inputs = args.inputs.clone();
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if !args.titles.is_empty() {
        config.titles = TitleSet::new(args.titles.iter().cloned());
    }

    Ok(config)
}

fn explode(config: &ExplodeConfig, dry_run: bool) -> Result<RunStats> {
    config.validate_inputs().context("Invalid input")?;

    if dry_run {
        info!("dry run, no output will be written");
        let (_, stats) = pipeline::run(config, MemorySink::sizes_only())?;
        return Ok(stats);
    }

    let layout = config
        .prepare_output()
        .context("Failed to create output directories")?;
    let sink = DirectorySink::create(&layout.csv_path, &layout.resume_dir)
        .with_context(|| format!("Failed to create {}", layout.csv_path.display()))?;
    info!(
        csv = %sink.csv_path().display(),
        resumes = %sink.resume_dir().display(),
        "writing output"
    );

    let (_, stats) = pipeline::run(config, sink)?;
    Ok(stats)
}

fn print_summary(stats: &RunStats, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }

    println!("Documents: {}", stats.documents);
    println!("Candidates: {}", stats.candidates);
    println!("Resumes: {}", stats.resumes);
    println!("Resume errors: {}", stats.resume_errors);

    if !stats.candidate_failures.is_empty() {
        let ids: Vec<String> = stats
            .candidate_failures
            .iter()
            .map(u32::to_string)
            .collect();
        println!("Flagged candidates: {}", ids.join(", "));
    }
    if stats.segment_failures > 0 {
        println!("Skipped resumes: {}", stats.segment_failures);
    }
    if stats.orphan_resumes > 0 {
        println!("Orphan resumes: {}", stats.orphan_resumes);
    }

    Ok(())
}

fn show_outline(input: &Path) -> Result<()> {
    let source =
        PdfSource::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let outline = source.outline().context("Failed to read outline")?;

    println!("Outline of: {}", input.display());
    println!("Pages: {}", source.page_count());
    println!("==========================================");

    if outline.is_empty() {
        println!("(no bookmarks)");
        return Ok(());
    }

    let mut candidates = 0;
    let mut resumes = 0;
    for (position, bookmark) in outline.top_level() {
        let page = bookmark
            .page
            .map(|page| (page + 1).to_string())
            .unwrap_or_else(|| "?".to_string());
        let kind = classify(&bookmark.title);
        if kind == MarkerKind::CandidateDetails {
            candidates += 1;
        } else if kind.is_resume() {
            resumes += 1;
        }
        let nested = outline.nested_after(position);

        print!("{position:>4}  page {page:>5}  {:<17}  {}", kind.as_str(), bookmark.title);
        if nested > 0 {
            print!("  (+{nested} nested)");
        }
        println!();
    }

    println!("------------------------------------------");
    println!("Candidate markers: {candidates}");
    println!("Resume markers: {resumes}");

    Ok(())
}
