//! Instance metadata side-channel
//!
//! Optional, read-only facts about the target database host (engine
//! version, vCPU, memory, storage, HA topology). Produced outside this
//! crate, typically exported from a cloud provider's API into a JSON file,
//! loaded once per run and shared with every check as
//! `Option<Arc<InstanceMetadata>>`. Checks must tolerate its absence.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for metadata loading
pub type InstanceResult<T> = Result<T, InstanceError>;

/// Metadata loading errors
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("Failed to read instance metadata {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid instance metadata JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Facts about the database host. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceMetadata {
    /// Full engine version string, e.g. "16.2"
    pub engine_version: Option<String>,
    pub engine_major: Option<u32>,
    pub engine_minor: Option<u32>,
    pub vcpus: Option<u32>,
    pub memory_bytes: Option<u64>,
    /// Provider storage class, e.g. "gp3", "io2"
    pub storage_type: Option<String>,
    pub allocated_storage_gib: Option<u64>,
    /// Whether a synchronous standby exists in another zone
    pub multi_az: Option<bool>,
    pub tags: BTreeMap<String, String>,
}

impl InstanceMetadata {
    /// Load from a JSON file
    pub fn load(path: &Path) -> InstanceResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| InstanceError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse from a JSON document
    pub fn from_json(json: &str) -> InstanceResult<Self> {
        let mut metadata: InstanceMetadata = serde_json::from_str(json)?;
        metadata.fill_version_parts();
        Ok(metadata)
    }

    /// Derive major/minor from `engine_version` when they were not given
    fn fill_version_parts(&mut self) {
        let Some(version) = self.engine_version.as_deref() else {
            return;
        };
        let mut parts = version.split('.').map(|p| p.trim().parse::<u32>().ok());
        if self.engine_major.is_none() {
            self.engine_major = parts.next().flatten();
        } else {
            parts.next();
        }
        if self.engine_minor.is_none() {
            self.engine_minor = parts.next().flatten();
        }
    }

    /// Memory in GiB, if known
    pub fn memory_gib(&self) -> Option<f64> {
        self.memory_bytes
            .map(|bytes| bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_all_unknown() {
        let metadata = InstanceMetadata::from_json("{}").unwrap();
        assert_eq!(metadata, InstanceMetadata::default());
        assert!(metadata.memory_gib().is_none());
    }

    #[test]
    fn test_version_parts_derived() {
        let metadata = InstanceMetadata::from_json(r#"{"engine_version": "15.4"}"#).unwrap();
        assert_eq!(metadata.engine_major, Some(15));
        assert_eq!(metadata.engine_minor, Some(4));
    }

    #[test]
    fn test_explicit_version_parts_kept() {
        let metadata = InstanceMetadata::from_json(
            r#"{"engine_version": "15.4", "engine_major": 15, "engine_minor": 7}"#,
        )
        .unwrap();
        assert_eq!(metadata.engine_minor, Some(7));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"vcpus": 4, "memory_bytes": 17179869184, "storage_type": "gp3", "tags": {{"env": "prod"}}}}"#
        )
        .unwrap();

        let metadata = InstanceMetadata::load(file.path()).unwrap();
        assert_eq!(metadata.vcpus, Some(4));
        assert_eq!(metadata.memory_gib(), Some(16.0));
        assert_eq!(metadata.tags.get("env").map(String::as_str), Some("prod"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = InstanceMetadata::load(Path::new("/nonexistent/instance.json")).unwrap_err();
        assert!(matches!(err, InstanceError::Read { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let err = InstanceMetadata::from_json("not json").unwrap_err();
        assert!(matches!(err, InstanceError::Parse(_)));
    }
}
