//! gradle-rdf - Gradle build output post-processing CLI
//!
//! Reformats Gradle build outputs for code-review annotation tools.
//!
//! ## Commands
//!
//! - `run`: Collect test classpaths and convert javac logs, driven by the CI payload
//! - `parse`: Convert javac logs straight to a report, without a payload

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

use gradle_rdf_core::{
    FileSystem, LocalFileSystem, LogParser, PipelineOptions, PipelineResult, Report,
    ReportEmitter, ReportPipeline, RunSummary, PAYLOAD_ENV,
};

#[derive(Parser)]
#[command(name = "gradle-rdf")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Turn Gradle build outputs into code review annotations", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process the CI payload: collect classpaths, parse javac logs, write the report
    Run {
        /// JSON payload describing test roots and javac logs
        #[arg(long, env = PAYLOAD_ENV, hide_env_values = true)]
        data: String,

        /// Destination for the diagnostics report
        #[arg(short, long, env = "RDF_OUTPUT")]
        output: PathBuf,

        /// Optional destination for the collected classpaths
        #[arg(long)]
        classpath_output: Option<PathBuf>,

        /// Base directory for relative classpath descriptors
        #[arg(long, default_value = ".")]
        base_dir: PathBuf,

        /// Value of the report's `source` field
        #[arg(long, default_value = gradle_rdf_core::domain::DEFAULT_SOURCE)]
        source: String,

        /// CI run identifier recorded in the report
        #[arg(long, env = "GITHUB_RUN_ID")]
        run_id: Option<String>,

        /// Exit non-zero when any test root or log failed
        #[arg(long)]
        strict: bool,
    },

    /// Convert javac logs to a report
    Parse {
        /// javac log files, reported in this order
        #[arg(required = true)]
        logs: Vec<PathBuf>,

        /// Destination for the diagnostics report
        #[arg(short, long)]
        output: PathBuf,

        /// Value of the report's `source` field
        #[arg(long, default_value = gradle_rdf_core::domain::DEFAULT_SOURCE)]
        source: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    gradle_rdf_core::init_tracing(cli.json, level);

    let fs: Arc<dyn FileSystem> = Arc::new(LocalFileSystem::new());

    match cli.command {
        Commands::Run {
            data,
            output,
            classpath_output,
            base_dir,
            source,
            run_id,
            strict,
        } => {
            let mut options = PipelineOptions::new(output)
                .with_base_dir(base_dir)
                .with_source(source);
            if let Some(path) = classpath_output {
                options = options.with_classpath_output(path);
            }
            if let Some(id) = run_id {
                options = options.with_run_id(id);
            }
            cmd_run(fs, &data, &options, strict).await
        }
        Commands::Parse {
            logs,
            output,
            source,
        } => cmd_parse(fs, &logs, &output, &source).await.map(|_| ()),
    }
}

async fn cmd_run(
    fs: Arc<dyn FileSystem>,
    data: &str,
    options: &PipelineOptions,
    strict: bool,
) -> Result<()> {
    // Payload problems abort before any file is read.
    let result = ReportPipeline::run_json(fs, data, options)
        .await
        .map_err(|e| {
            let context = if e.is_config() {
                "Invalid DATA payload"
            } else {
                "Report pipeline failed"
            };
            anyhow::Error::new(e).context(context)
        })?;

    print_summary(&result);

    if strict && result.has_partial_failures() {
        anyhow::bail!(
            "{} test root(s) and {} log(s) failed",
            result.classpaths.failed(),
            result.log_failures.len()
        );
    }
    Ok(())
}

async fn cmd_parse(
    fs: Arc<dyn FileSystem>,
    logs: &[PathBuf],
    output: &Path,
    source: &str,
) -> Result<Report> {
    let mut parsed = LogParser::new(fs.clone()).parse_files(logs).await;
    let logs_ok = parsed.succeeded();
    let failures = std::mem::take(&mut parsed.failures);
    let report = Report::new(source).with_diagnostics(parsed.into_diagnostics());

    RunSummary {
        logs_ok,
        logs_failed: failures.len(),
        counts: report.counts(),
        ..RunSummary::default()
    }
    .log();

    if let Some(failure) = failures.first() {
        anyhow::bail!(
            "Failed to read {} log(s), first: {}",
            failures.len(),
            failure.error
        );
    }

    let outcome = ReportEmitter::new(fs)
        .emit(&report, output)
        .await
        .context("Failed to write report")?;

    info!(path = %outcome.path.display(), "Report written");
    Ok(report)
}

fn print_summary(result: &PipelineResult) {
    let counts = result.report.counts();

    println!("Report: {}", result.report_output.path.display());
    println!("Digest: {}", result.report_output.digest);
    if let Some(cp) = &result.classpath_output {
        println!("Classpaths: {}", cp.path.display());
    }
    println!();
    println!(
        "Test roots: {} collected, {} failed",
        result.classpaths.succeeded(),
        result.classpaths.failed()
    );
    for failure in &result.classpaths.failures {
        println!("  ✗ {}: {}", failure.root, failure.error);
    }
    println!(
        "javac logs: {} parsed, {} failed",
        result.logs_parsed,
        result.log_failures.len()
    );
    for failure in &result.log_failures {
        println!("  ✗ {}: {}", failure.path.display(), failure.error);
    }
    println!(
        "Diagnostics: {} error(s), {} warning(s), {} info",
        counts.errors, counts.warnings, counts.infos
    );
    println!("Duration: {}ms", result.duration_ms);
}
