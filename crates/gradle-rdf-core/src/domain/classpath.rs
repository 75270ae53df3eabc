//! Test root classpath types.

use serde::{Deserialize, Serialize};

/// Ordered classpath entries collected for one test root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRoot {
    /// Test root name, unique within a run (e.g. `"unit"`).
    pub name: String,

    /// Classpath entries in their original order.
    pub entries: Vec<String>,
}

impl TestRoot {
    pub fn new(name: impl Into<String>, entries: Vec<String>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
