use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use codesift_engine::{
    BatchReport, EngineConfig, ExportFilter, ExtractionPipeline, ExtractionReport, FragmentStatus,
    ValidatedFragment,
};
use serde::Serialize;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "codesift")]
#[command(about = "Extract and validate code fragments from untrusted text", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Extraction preset: default|aggressive|conservative
    #[arg(long, global = true, default_value = "default")]
    preset: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract fragments from pasted text (stdin or --text)
    Paste(PasteArgs),

    /// Extract fragments from one file
    File(FileArgs),

    /// Clone a repository and extract from every collected file
    Repo(RepoArgs),

    /// Remove leftover session directories older than the expiry window
    Sweep(SweepArgs),
}

#[derive(Args)]
struct PasteArgs {
    /// Inline text (reads stdin when omitted)
    #[arg(long)]
    text: Option<String>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct FileArgs {
    /// Path of the file to ingest
    path: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct RepoArgs {
    /// Repository URL (http or https)
    url: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct SweepArgs {
    /// Age threshold in seconds
    #[arg(long, default_value_t = 86_400)]
    older_than_secs: u64,
}

#[derive(Args)]
struct OutputArgs {
    /// Emit the report and fragments as pretty JSON on stdout
    #[arg(long)]
    json: bool,

    /// Print extracted fragments on stdout
    #[arg(long)]
    export: bool,

    /// Keep only fragments at or above this confidence
    #[arg(long)]
    min_confidence: Option<u8>,

    /// Keep only these statuses (repeatable)
    #[arg(long = "status", value_enum)]
    statuses: Vec<StatusArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Pending,
    Accepted,
    Rejected,
    Superseded,
}

impl StatusArg {
    fn into_status(self) -> FragmentStatus {
        match self {
            StatusArg::Pending => FragmentStatus::Pending,
            StatusArg::Accepted => FragmentStatus::Accepted,
            StatusArg::Rejected => FragmentStatus::Rejected,
            StatusArg::Superseded => FragmentStatus::Superseded,
        }
    }
}

impl OutputArgs {
    fn filter(&self) -> ExportFilter {
        let statuses = if self.statuses.is_empty() {
            None
        } else {
            Some(self.statuses.iter().map(|s| s.into_status()).collect())
        };
        ExportFilter {
            statuses,
            min_confidence: self.min_confidence,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = preset_config(&cli.preset)?;
    let pipeline = ExtractionPipeline::new(config).context("Invalid configuration")?;

    match cli.command {
        Commands::Paste(args) => run_paste(args, &pipeline).await?,
        Commands::File(args) => run_file(args, &pipeline).await?,
        Commands::Repo(args) => run_repo(args, &pipeline).await?,
        Commands::Sweep(args) => run_sweep(args, &pipeline)?,
    }

    Ok(())
}

fn preset_config(preset: &str) -> Result<EngineConfig> {
    match preset {
        "default" => Ok(EngineConfig::default()),
        "aggressive" => Ok(EngineConfig::aggressive()),
        "conservative" => Ok(EngineConfig::conservative()),
        other => anyhow::bail!("Unknown preset '{other}': expected default|aggressive|conservative"),
    }
}

async fn run_paste(args: PasteArgs, pipeline: &ExtractionPipeline) -> Result<()> {
    let text = match &args.text {
        Some(text) => text.clone(),
        None => read_stdin()?,
    };
    let report = pipeline
        .ingest_text(&text)
        .await
        .context("Paste was refused")?;
    render_document(&args.output, pipeline, report)
}

async fn run_file(args: FileArgs, pipeline: &ExtractionPipeline) -> Result<()> {
    let bytes = tokio::fs::read(&args.path)
        .await
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    let name = args
        .path
        .file_name()
        .and_then(|name| name.to_str())
        .context("File name is not valid UTF-8")?;
    let report = pipeline
        .ingest_file(name, &bytes)
        .await
        .with_context(|| format!("Upload of {name} was refused"))?;
    render_document(&args.output, pipeline, report)
}

async fn run_repo(args: RepoArgs, pipeline: &ExtractionPipeline) -> Result<()> {
    let report = pipeline
        .ingest_repository(&args.url)
        .await
        .context("Repository ingest was refused")?;
    render_batch(&args.output, pipeline, report)
}

fn run_sweep(args: SweepArgs, pipeline: &ExtractionPipeline) -> Result<()> {
    let removed = pipeline
        .boundary()
        .manager()
        .sweep_stale(Duration::from_secs(args.older_than_secs))
        .context("Sweep failed")?;
    eprintln!("Removed {removed} stale session directories");
    Ok(())
}

#[derive(Serialize)]
struct DocumentOutput {
    report: ExtractionReport,
    fragments: Vec<ValidatedFragment>,
}

#[derive(Serialize)]
struct BatchOutput {
    report: BatchReport,
    fragments: Vec<ValidatedFragment>,
}

fn render_document(
    output: &OutputArgs,
    pipeline: &ExtractionPipeline,
    report: ExtractionReport,
) -> Result<()> {
    let fragments = pipeline.export(&output.filter());

    if output.json {
        let payload = DocumentOutput { report, fragments };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!(
        "Extracted {} fragments ({} ast, {} pattern, {} rejected), {} prose discarded in {}ms",
        report.fragments,
        report.ast_valid,
        report.pattern_valid,
        report.rejected,
        report.prose_discarded,
        report.time_ms
    );
    warn_about_secrets(report.secret_findings);
    if output.export {
        print_fragments(&fragments);
    }
    Ok(())
}

fn render_batch(
    output: &OutputArgs,
    pipeline: &ExtractionPipeline,
    report: BatchReport,
) -> Result<()> {
    let fragments = pipeline.export(&output.filter());

    if output.json {
        let payload = BatchOutput { report, fragments };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!(
        "Processed {} documents ({} duplicate, {} failed): {} fragments in {}ms",
        report.documents,
        report.duplicates,
        report.errors.len(),
        report.fragments,
        report.time_ms
    );
    for error in &report.errors {
        eprintln!("  failed: {error}");
    }
    warn_about_secrets(report.secret_findings);
    if output.export {
        print_fragments(&fragments);
    }
    Ok(())
}

fn warn_about_secrets(findings: usize) {
    if findings > 0 {
        eprintln!("Warning: {findings} secret finding(s) recorded; review before sharing");
    }
}

fn print_fragments(fragments: &[ValidatedFragment]) {
    for fragment in fragments {
        let tier = fragment
            .verdict
            .tier()
            .map(|tier| tier.as_str())
            .unwrap_or("rejected");
        println!(
            "--- {} | {} | confidence {} | lines {}-{}",
            fragment.language.as_str(),
            tier,
            fragment.confidence,
            fragment.start_line,
            fragment.end_line
        );
        println!("{}", fragment.content);
        println!();
    }
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read text from stdin")?;

    if buffer.trim().is_empty() {
        anyhow::bail!("No input. Provide --text or pipe text via stdin.");
    }

    Ok(buffer)
}
