//! Normalized compiler diagnostic types.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Severity level for a diagnostic.
///
/// Serialized in upper case (`"ERROR"`, `"WARNING"`, `"INFO"`) as the
/// annotation schema expects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Map a compiler severity keyword to a [`Severity`], ignoring case.
    ///
    /// Recognizes `error`, `warning`/`warn` and `note`/`info`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "error" => Some(Severity::Error),
            "warning" | "warn" => Some(Severity::Warning),
            "note" | "info" => Some(Severity::Info),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding extracted from a compiler log.
///
/// Serializes to the annotation schema shape, with the position nested under
/// `location`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireDiagnostic", into = "WireDiagnostic")]
pub struct Diagnostic {
    /// Source file path as written in the log.
    pub file: String,

    /// Line number (1-indexed).
    pub line: NonZeroU32,

    /// Column number (1-indexed), when known.
    pub column: Option<NonZeroU32>,

    pub severity: Severity,

    /// Message text, including any continuation lines.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic. Returns `None` when `line` is 0.
    pub fn new(
        file: impl Into<String>,
        line: u32,
        severity: Severity,
        message: impl Into<String>,
    ) -> Option<Self> {
        Some(Self {
            file: file.into(),
            line: NonZeroU32::new(line)?,
            column: None,
            severity,
            message: message.into(),
        })
    }

    /// Set the column. A column of 0 leaves it unset.
    pub fn with_column(mut self, column: u32) -> Self {
        self.column = NonZeroU32::new(column);
        self
    }
}

#[derive(Serialize, Deserialize)]
struct WireLocation {
    file: String,
    line: NonZeroU32,
    column: Option<NonZeroU32>,
}

#[derive(Serialize, Deserialize)]
struct WireDiagnostic {
    location: WireLocation,
    severity: Severity,
    message: String,
}

impl From<WireDiagnostic> for Diagnostic {
    fn from(wire: WireDiagnostic) -> Self {
        Self {
            file: wire.location.file,
            line: wire.location.line,
            column: wire.location.column,
            severity: wire.severity,
            message: wire.message,
        }
    }
}

impl From<Diagnostic> for WireDiagnostic {
    fn from(diag: Diagnostic) -> Self {
        Self {
            location: WireLocation {
                file: diag.file,
                line: diag.line,
                column: diag.column,
            },
            severity: diag.severity,
            message: diag.message,
        }
    }
}
