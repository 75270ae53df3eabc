//! Report emission.
//!
//! The emitter is the only component that writes. Output is built fully in
//! memory and handed to [`FileSystem::write_atomic`], so the destination
//! holds either the old file or the complete new one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::classpath::ClasspathOutcome;
use crate::domain::Report;
use crate::error::Result;
use crate::fs::FileSystem;

/// What was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOutcome {
    pub path: PathBuf,
    pub bytes_written: usize,
    /// SHA-256 hex digest of the written bytes.
    pub digest: String,
}

/// Writes reports through a [`FileSystem`].
pub struct ReportEmitter {
    fs: Arc<dyn FileSystem>,
}

impl ReportEmitter {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Write `report` to `dest` as annotation-schema JSON.
    pub async fn emit(&self, report: &Report, dest: &Path) -> Result<EmitOutcome> {
        let bytes = report.to_json_bytes()?;
        let outcome = self.write(dest, &bytes).await?;
        info!(
            path = %outcome.path.display(),
            diagnostics = report.diagnostics.len(),
            digest = %outcome.digest,
            "Wrote diagnostics report"
        );
        Ok(outcome)
    }

    /// Write collected classpaths to `dest` as `{"<root>": ["entry", ...]}`.
    pub async fn emit_classpaths(
        &self,
        classpaths: &ClasspathOutcome,
        dest: &Path,
    ) -> Result<EmitOutcome> {
        let bytes = to_json_bytes(&classpaths.entries())?;
        let outcome = self.write(dest, &bytes).await?;
        info!(
            path = %outcome.path.display(),
            roots = classpaths.succeeded(),
            "Wrote classpath listing"
        );
        Ok(outcome)
    }

    async fn write(&self, dest: &Path, bytes: &[u8]) -> Result<EmitOutcome> {
        self.fs.write_atomic(dest, bytes).await?;
        Ok(EmitOutcome {
            path: dest.to_path_buf(),
            bytes_written: bytes.len(),
            digest: digest_hex(bytes),
        })
    }
}

fn to_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn digest_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
