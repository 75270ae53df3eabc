//! Filesystem capability.
//!
//! Every component receives an `Arc<dyn FileSystem>` rather than touching the
//! disk directly, so tests can substitute [`crate::fakes::MemoryFileSystem`].

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use crate::error::{RdfError, Result};

/// Read/write access to files.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Read a whole file as text.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD rather than failing
    /// the read; only a file that cannot be opened is an error.
    async fn read_text(&self, path: &Path) -> Result<String>;

    /// Whether `path` exists and is a directory.
    async fn is_dir(&self, path: &Path) -> bool;

    /// Replace `path` with `contents` atomically.
    ///
    /// Readers observe either the previous file or the complete new one,
    /// never a partial write.
    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()>;
}

/// [`FileSystem`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn read_text(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| RdfError::io(path, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn is_dir(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let path = path.to_path_buf();
        let contents = contents.to_vec();
        let target = path.clone();

        tokio::task::spawn_blocking(move || persist_atomically(&path, &contents))
            .await
            .map_err(|e| RdfError::io(&target, std::io::Error::other(e)))?
    }
}

/// Write to a temp file in the destination directory, then rename over `path`.
fn persist_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = parent_dir(path);

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| RdfError::io(&dir, e))?;
    tmp.write_all(contents).map_err(|e| RdfError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| RdfError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| RdfError::io(path, e.error))?;

    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");

        let err = LocalFileSystem.read_text(&missing).await.unwrap_err();
        assert!(matches!(err, RdfError::Io { ref path, .. } if path == &missing));
    }

    #[tokio::test]
    async fn test_read_text_replaces_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("latin1.log");
        std::fs::write(&file, b"caf\xE9\nnext\n").unwrap();

        let got = LocalFileSystem.read_text(&file).await.unwrap();
        assert_eq!(got, "caf\u{FFFD}\nnext\n");
    }

    #[tokio::test]
    async fn test_write_atomic_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.json");

        LocalFileSystem.write_atomic(&dest, b"first").await.unwrap();
        LocalFileSystem.write_atomic(&dest, b"second").await.unwrap();

        let got = LocalFileSystem.read_text(&dest).await.unwrap();
        assert_eq!(got, "second");

        // Only the destination remains; the temp file was renamed away.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_write_atomic_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("no-such-dir").join("out.json");

        let err = LocalFileSystem.write_atomic(&dest, b"x").await.unwrap_err();
        assert!(matches!(err, RdfError::Io { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_is_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        std::fs::write(&file, "x").unwrap();

        assert!(LocalFileSystem.is_dir(dir.path()).await);
        assert!(!LocalFileSystem.is_dir(&file).await);
        assert!(!LocalFileSystem.is_dir(&dir.path().join("missing")).await);
    }

    #[test]
    fn test_parent_dir_of_bare_file_name() {
        assert_eq!(parent_dir(Path::new("report.json")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("a/b.json")), PathBuf::from("a"));
    }
}
