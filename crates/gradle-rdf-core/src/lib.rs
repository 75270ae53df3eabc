//! gradle-rdf Core - Gradle build output post-processing
//!
//! Reformats Gradle build outputs for code-review annotation tools:
//! - Collects per-test-root classpaths from classpath listing files
//! - Parses javac logs into structured diagnostics
//! - Emits an RDFormat-style JSON report, written atomically
//!
//! All file access goes through the [`FileSystem`] capability so the
//! components can run against [`fakes::MemoryFileSystem`] in tests.

pub mod classpath;
pub mod domain;
pub mod emitter;
pub mod error;
pub mod fakes;
pub mod fs;
pub mod javac;
pub mod payload;
pub mod pipeline;
pub mod telemetry;

pub use classpath::{parse_classpath_listing, ClasspathCollector, ClasspathOutcome, RootFailure};
pub use domain::{Diagnostic, Report, Severity, SeverityCounts, TestRoot};
pub use emitter::{EmitOutcome, ReportEmitter};
pub use error::{RdfError, Result};
pub use fs::{FileSystem, LocalFileSystem};
pub use javac::{parse_log, FileFailure, LogParseOutcome, LogParser};
pub use payload::{Payload, RootDescriptor, PAYLOAD_ENV};
pub use pipeline::{PipelineOptions, PipelineResult, ReportPipeline, RunSummary};
pub use telemetry::init_tracing;
