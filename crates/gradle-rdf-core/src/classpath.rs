//! Test classpath collection.
//!
//! Resolves each test root's descriptor to a classpath listing file, reads
//! it and normalizes it into an ordered entry list. Roots are read
//! concurrently; a root that fails is reported in
//! [`ClasspathOutcome::failures`] and does not affect the others.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::domain::TestRoot;
use crate::error::{RdfError, Result};
use crate::fs::FileSystem;
use crate::payload::RootDescriptor;

/// File name Gradle writes the test classpath to inside a root's directory.
pub const TEST_CLASSPATH: &str = "test-classpath.txt";

/// A test root whose classpath could not be collected.
#[derive(Debug)]
pub struct RootFailure {
    pub root: String,
    pub error: RdfError,
}

/// Result of collecting every test root.
#[derive(Debug, Default)]
pub struct ClasspathOutcome {
    /// Successfully collected roots, keyed by name.
    pub roots: BTreeMap<String, TestRoot>,

    /// Roots that failed, in name order.
    pub failures: Vec<RootFailure>,
}

impl ClasspathOutcome {
    pub fn succeeded(&self) -> usize {
        self.roots.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Root name → entries, the shape written by the classpath emitter.
    pub fn entries(&self) -> BTreeMap<&str, &[String]> {
        self.roots
            .iter()
            .map(|(name, root)| (name.as_str(), root.entries.as_slice()))
            .collect()
    }
}

/// Collects classpaths for a set of test roots.
pub struct ClasspathCollector {
    fs: Arc<dyn FileSystem>,
    base_dir: PathBuf,
}

impl ClasspathCollector {
    /// Relative descriptors are resolved against `base_dir`.
    pub fn new(fs: Arc<dyn FileSystem>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            base_dir: base_dir.into(),
        }
    }

    /// Collect every root. Never fails as a whole.
    pub async fn collect(&self, roots: &BTreeMap<String, RootDescriptor>) -> ClasspathOutcome {
        let results = join_all(
            roots
                .iter()
                .map(|(name, descriptor)| self.collect_root(name, descriptor)),
        )
        .await;

        let mut outcome = ClasspathOutcome::default();
        for (name, result) in roots.keys().zip(results) {
            match result {
                Ok(root) => {
                    debug!(root = %name, entries = root.len(), "Collected classpath");
                    outcome.roots.insert(name.clone(), root);
                }
                Err(error) => {
                    warn!(root = %name, error = %error, "Failed to collect classpath");
                    outcome.failures.push(RootFailure {
                        root: name.clone(),
                        error,
                    });
                }
            }
        }
        outcome
    }

    /// Collect a single root.
    pub async fn collect_root(&self, name: &str, descriptor: &RootDescriptor) -> Result<TestRoot> {
        let path = self.resolve_listing(descriptor).await;
        let text = self.fs.read_text(&path).await?;
        Ok(TestRoot::new(name, parse_classpath_listing(&text)))
    }

    /// The listing file a descriptor points at.
    async fn resolve_listing(&self, descriptor: &RootDescriptor) -> PathBuf {
        let path = descriptor.resolve(&self.base_dir);
        if self.fs.is_dir(&path).await {
            path.join(TEST_CLASSPATH)
        } else {
            path
        }
    }
}

/// Split a classpath listing into entries.
///
/// One entry per non-blank line. A listing with a single line is treated as
/// a platform path list (`a.jar:b.jar` on Unix) and split on the separator.
pub fn parse_classpath_listing(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect();

    match lines.as_slice() {
        [single] => std::env::split_paths(single)
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| path_to_entry(&p))
            .collect(),
        _ => lines.into_iter().map(str::to_string).collect(),
    }
}

fn path_to_entry(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
