//! Run payload supplied by the CI job.
//!
//! The payload is a JSON object, usually passed through the `DATA`
//! environment variable:
//!
//! ```json
//! {
//!   "testExecutions": { "unit": "build/unit/test-classpath.txt" },
//!   "javacLogs": ["/work/build/tmp/compileJava/javac.log"]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RdfError, Result};

/// Environment variable carrying the payload.
pub const PAYLOAD_ENV: &str = "DATA";

/// How a test root locates its classpath listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RootDescriptor {
    /// Path to a classpath file, or to a directory holding `test-classpath.txt`.
    Path(PathBuf),

    /// Explicit form: `{"classpath": "<path>"}`.
    Classpath { classpath: PathBuf },
}

impl RootDescriptor {
    pub fn path(&self) -> &Path {
        match self {
            RootDescriptor::Path(p) => p,
            RootDescriptor::Classpath { classpath } => classpath,
        }
    }

    /// Resolve against `base` unless already absolute.
    pub fn resolve(&self, base: &Path) -> PathBuf {
        let path = self.path();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        }
    }
}

/// Parsed run payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    /// Test root name → descriptor.
    pub test_executions: BTreeMap<String, RootDescriptor>,

    /// Compiler log files, in the order their diagnostics should be reported.
    #[serde(default)]
    pub javac_logs: Vec<PathBuf>,
}

impl Payload {
    /// Parse and validate a payload.
    ///
    /// Any shape problem is a [`RdfError::Config`].
    pub fn from_json(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(RdfError::Config("payload is empty".to_string()));
        }
        let payload: Payload =
            serde_json::from_str(raw).map_err(|e| RdfError::Config(e.to_string()))?;
        payload.validate()?;
        Ok(payload)
    }

    /// Read the payload from the [`PAYLOAD_ENV`] environment variable.
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var(PAYLOAD_ENV)
            .map_err(|_| RdfError::Config(format!("environment variable {PAYLOAD_ENV} is not set")))?;
        Self::from_json(&raw)
    }

    fn validate(&self) -> Result<()> {
        for (name, descriptor) in &self.test_executions {
            if name.trim().is_empty() {
                return Err(RdfError::Config("test root name must not be empty".to_string()));
            }
            if descriptor.path().as_os_str().is_empty() {
                return Err(RdfError::Config(format!(
                    "test root `{name}` has an empty descriptor"
                )));
            }
        }
        if let Some(pos) = self.javac_logs.iter().position(|p| p.as_os_str().is_empty()) {
            return Err(RdfError::Config(format!("javacLogs[{pos}] is empty")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_payload() {
        let payload = Payload::from_json(r#"{"testExecutions": {"unit": "cp.txt"}}"#).unwrap();
        assert_eq!(payload.test_executions.len(), 1);
        assert_eq!(
            payload.test_executions["unit"],
            RootDescriptor::Path(PathBuf::from("cp.txt"))
        );
        assert!(payload.javac_logs.is_empty());
    }

    #[test]
    fn test_payload_with_logs_and_object_descriptor() {
        let payload = Payload::from_json(
            r#"{
                "testExecutions": {
                    "unit": {"classpath": "build/unit.txt"},
                    "integration": "build/integration"
                },
                "javacLogs": ["/logs/main.log", "/logs/test.log"]
            }"#,
        )
        .unwrap();

        assert_eq!(
            payload.test_executions["unit"].path(),
            Path::new("build/unit.txt")
        );
        assert_eq!(payload.javac_logs.len(), 2);
        assert_eq!(payload.javac_logs[1], PathBuf::from("/logs/test.log"));
    }

    #[test]
    fn test_missing_test_executions_is_config_error() {
        let err = Payload::from_json(r#"{"javacLogs": []}"#).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("testExecutions"));
    }

    #[test]
    fn test_wrong_types_are_config_errors() {
        assert!(Payload::from_json(r#"{"testExecutions": ["unit"]}"#)
            .unwrap_err()
            .is_config());
        assert!(Payload::from_json(r#"{"testExecutions": {}, "javacLogs": "a.log"}"#)
            .unwrap_err()
            .is_config());
        assert!(Payload::from_json(r#"{"testExecutions": {"unit": 3}}"#)
            .unwrap_err()
            .is_config());
    }

    #[test]
    fn test_not_json_is_config_error() {
        assert!(Payload::from_json("testExecutions=unit").unwrap_err().is_config());
        assert!(Payload::from_json("   ").unwrap_err().is_config());
    }

    #[test]
    fn test_empty_descriptor_rejected() {
        let err = Payload::from_json(r#"{"testExecutions": {"unit": ""}}"#).unwrap_err();
        assert!(err.to_string().contains("unit"));
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let base = Path::new("/work");
        assert_eq!(
            RootDescriptor::Path(PathBuf::from("cp.txt")).resolve(base),
            PathBuf::from("/work/cp.txt")
        );
        assert_eq!(
            RootDescriptor::Path(PathBuf::from("/abs/cp.txt")).resolve(base),
            PathBuf::from("/abs/cp.txt")
        );
    }

    #[test]
    fn test_from_env_reads_data_variable() {
        // Single test so the set/remove sequence cannot interleave with another.
        std::env::set_var(PAYLOAD_ENV, r#"{"testExecutions": {"unit": "cp.txt"}}"#);
        let payload = Payload::from_env().unwrap();
        assert_eq!(payload.test_executions.len(), 1);

        std::env::remove_var(PAYLOAD_ENV);
        let err = Payload::from_env().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains(PAYLOAD_ENV));
    }
}
