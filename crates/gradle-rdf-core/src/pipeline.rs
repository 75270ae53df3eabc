//! Run orchestration.
//!
//! Collector and parser run concurrently and are joined before the emitter
//! starts, so nothing is written until both inputs are complete.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::classpath::{ClasspathCollector, ClasspathOutcome};
use crate::domain::{Report, SeverityCounts, DEFAULT_SOURCE};
use crate::emitter::{EmitOutcome, ReportEmitter};
use crate::error::Result;
use crate::fs::FileSystem;
use crate::javac::{FileFailure, LogParser};
use crate::payload::Payload;

/// Where to write and how to label the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Base for relative classpath descriptors.
    pub base_dir: PathBuf,

    /// Diagnostics report destination.
    pub output: PathBuf,

    /// Optional classpath listing destination.
    pub classpath_output: Option<PathBuf>,

    /// Report `source` field.
    pub source: String,

    pub run_id: Option<String>,
}

impl PipelineOptions {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: PathBuf::from("."),
            output: output.into(),
            classpath_output: None,
            source: DEFAULT_SOURCE.to_string(),
            run_id: None,
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_classpath_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.classpath_output = Some(path.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }
}

/// Result of a complete run.
#[derive(Debug)]
pub struct PipelineResult {
    pub classpaths: ClasspathOutcome,

    /// The emitted report.
    pub report: Report,

    /// Number of logs parsed.
    pub logs_parsed: usize,

    /// Logs that could not be read.
    pub log_failures: Vec<FileFailure>,

    pub report_output: EmitOutcome,

    pub classpath_output: Option<EmitOutcome>,

    pub duration_ms: u64,
}

impl PipelineResult {
    /// Whether any root or log failed.
    pub fn has_partial_failures(&self) -> bool {
        self.classpaths.failed() > 0 || !self.log_failures.is_empty()
    }
}

/// Per-run counts, logged once as the `Run summary` line.
///
/// A run that aborts early logs the zero summary, so every invocation leaves
/// exactly one summary line behind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub roots_ok: usize,
    pub roots_failed: usize,
    pub logs_ok: usize,
    pub logs_failed: usize,
    pub counts: SeverityCounts,
}

impl RunSummary {
    pub fn log(&self) {
        info!(
            roots_ok = self.roots_ok,
            roots_failed = self.roots_failed,
            logs_ok = self.logs_ok,
            logs_failed = self.logs_failed,
            errors = self.counts.errors,
            warnings = self.counts.warnings,
            infos = self.counts.infos,
            "Run summary"
        );
    }
}

/// Pipeline orchestrator.
pub struct ReportPipeline;

impl ReportPipeline {
    /// Parse `raw` as the payload, then [`ReportPipeline::run`].
    ///
    /// A malformed payload fails before any file is touched.
    pub async fn run_json(
        fs: Arc<dyn FileSystem>,
        raw: &str,
        options: &PipelineOptions,
    ) -> Result<PipelineResult> {
        let payload = match Payload::from_json(raw) {
            Ok(payload) => payload,
            Err(e) => {
                RunSummary::default().log();
                return Err(e);
            }
        };
        Self::run(fs, &payload, options).await
    }

    /// Collect classpaths and parse logs concurrently, then emit.
    ///
    /// Per-root and per-log failures are carried in the result. Only an
    /// emitter failure makes the whole run fail.
    pub async fn run(
        fs: Arc<dyn FileSystem>,
        payload: &Payload,
        options: &PipelineOptions,
    ) -> Result<PipelineResult> {
        let start = Instant::now();
        info!(
            roots = payload.test_executions.len(),
            logs = payload.javac_logs.len(),
            "Starting report pipeline"
        );

        let collector = ClasspathCollector::new(fs.clone(), options.base_dir.clone());
        let parser = LogParser::new(fs.clone());

        let (classpaths, logs) = tokio::join!(
            collector.collect(&payload.test_executions),
            parser.parse_files(&payload.javac_logs),
        );

        let logs_parsed = logs.succeeded();
        let log_failures = logs.failures;
        let mut report = Report::new(options.source.clone())
            .with_diagnostics(logs.logs.into_iter().flat_map(|l| l.diagnostics));
        if let Some(run_id) = &options.run_id {
            report = report.with_run_id(run_id.clone());
        }

        RunSummary {
            roots_ok: classpaths.succeeded(),
            roots_failed: classpaths.failed(),
            logs_ok: logs_parsed,
            logs_failed: log_failures.len(),
            counts: report.counts(),
        }
        .log();
        if classpaths.failed() > 0 || !log_failures.is_empty() {
            warn!("Run completed with partial failures");
        }

        let emitter = ReportEmitter::new(fs);
        let report_output = emitter.emit(&report, &options.output).await?;
        let classpath_output = match &options.classpath_output {
            Some(dest) => Some(emitter.emit_classpaths(&classpaths, dest).await?),
            None => None,
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(duration_ms, "Report pipeline finished");

        Ok(PipelineResult {
            classpaths,
            report,
            logs_parsed,
            log_failures,
            report_output,
            classpath_output,
            duration_ms,
        })
    }
}
