//! Error taxonomy for gradle-rdf.

use std::path::{Path, PathBuf};

/// Errors produced while collecting classpaths, parsing logs or emitting reports.
#[derive(Debug, thiserror::Error)]
pub enum RdfError {
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid payload: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RdfError {
    /// Wrap an `std::io::Error` with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        RdfError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether this error aborts the run before any I/O.
    pub fn is_config(&self) -> bool {
        matches!(self, RdfError::Config(_))
    }
}

/// Result type for gradle-rdf operations.
pub type Result<T> = std::result::Result<T, RdfError>;
