//! Diagnostic report document.
//!
//! A [`Report`] is built once per run, written once by the emitter and then
//! dropped. Its JSON form is the annotation schema:
//!
//! ```json
//! {"source": "javac", "diagnostics": [{"location": {...}, "severity": "ERROR", "message": "..."}]}
//! ```

use serde::{Deserialize, Serialize};

use super::diagnostic::{Diagnostic, Severity};
use crate::error::Result;

/// Default source tool name written to the report.
pub const DEFAULT_SOURCE: &str = "javac";

/// Ordered diagnostics plus run metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Name of the tool that produced the diagnostics.
    pub source: String,

    /// CI run identifier, omitted from the output when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    pub diagnostics: Vec<Diagnostic>,
}

/// Diagnostic counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl SeverityCounts {
    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.infos
    }
}

impl Report {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            run_id: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) -> Self {
        self.diagnostics.extend(diagnostics);
        self
    }

    pub fn counts(&self) -> SeverityCounts {
        self.diagnostics
            .iter()
            .fold(SeverityCounts::default(), |mut acc, d| {
                match d.severity {
                    Severity::Error => acc.errors += 1,
                    Severity::Warning => acc.warnings += 1,
                    Severity::Info => acc.infos += 1,
                }
                acc
            })
    }

    /// Serialize to pretty-printed JSON with a trailing newline.
    ///
    /// Output is deterministic for a given report.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Parse a report previously produced by [`Report::to_json_bytes`].
    pub fn from_json(raw: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(raw)?)
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE)
    }
}
