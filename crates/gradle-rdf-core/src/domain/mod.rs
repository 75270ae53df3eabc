//! Domain types shared by the collector, parser and emitter.

pub mod classpath;
pub mod diagnostic;
pub mod report;

pub use classpath::TestRoot;
pub use diagnostic::{Diagnostic, Severity};
pub use report::{Report, SeverityCounts, DEFAULT_SOURCE};
