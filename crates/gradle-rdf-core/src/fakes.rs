//! In-memory fakes (testing only)
//!
//! Provides `MemoryFileSystem`, which satisfies the [`FileSystem`] contract
//! without touching the disk, and `CapturedLogs`, a tracing writer that keeps
//! formatted log lines in memory.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing_subscriber::fmt::MakeWriter;

use crate::error::{RdfError, Result};
use crate::fs::FileSystem;

/// In-memory filesystem backed by a `HashMap<path, bytes>`.
///
/// Directories are implied by the files placed under them, and can also be
/// declared explicitly with [`MemoryFileSystem::add_dir`].
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    dirs: Mutex<HashSet<PathBuf>>,
    writes_fail: AtomicBool,
    writes: AtomicUsize,
    reads: AtomicUsize,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a file, builder style.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl AsRef<[u8]>) -> Self {
        self.add_file(path, contents);
        self
    }

    pub fn add_file(&self, path: impl Into<PathBuf>, contents: impl AsRef<[u8]>) {
        let mut files = self.files.lock().unwrap();
        files.insert(path.into(), contents.as_ref().to_vec());
    }

    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        let mut dirs = self.dirs.lock().unwrap();
        dirs.insert(path.into());
    }

    /// Make every subsequent write fail with `PermissionDenied`.
    pub fn fail_writes(&self, fail: bool) {
        self.writes_fail.store(fail, Ordering::SeqCst);
    }

    /// Raw bytes stored at `path`, if any.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let files = self.files.lock().unwrap();
        files.get(path.as_ref()).cloned()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of reads and directory lookups so far, including failed ones.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn read_text(&self, path: &Path) -> Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let files = self.files.lock().unwrap();
        let bytes = files.get(path).ok_or_else(|| {
            RdfError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            )
        })?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    async fn is_dir(&self, path: &Path) -> bool {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.dirs.lock().unwrap().contains(path) {
            return true;
        }
        let files = self.files.lock().unwrap();
        files.keys().any(|f| f != path && f.starts_with(path))
    }

    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if self.writes_fail.load(Ordering::SeqCst) {
            return Err(RdfError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only filesystem"),
            ));
        }
        let mut files = self.files.lock().unwrap();
        files.insert(path.to_path_buf(), contents.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Log sink for asserting on emitted tracing output.
///
/// ```ignore
/// let logs = CapturedLogs::default();
/// let _guard = tracing::subscriber::set_default(logs.subscriber());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Plain-text fmt subscriber writing into this sink.
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_target(false)
            .finish()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
