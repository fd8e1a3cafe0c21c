//! # Poll Position
//!
//! Weekly poll rankings, ingested into season-partitioned columnar artifacts
//! on object storage and served back as rows.
//!
//! ## Architecture
//!
//! - **Ingester**: fetches rankings and teams, flattens the nested polls,
//!   left-joins team metadata and writes timestamped artifacts
//! - **Artifacts**: key layout, columnar encoding, discovery by store
//!   modification time, and row reconstruction from ragged columns
//! - **API**: read-only HTTP surface over the newest artifacts

pub mod api;
pub mod artifact;
pub mod clock;
pub mod config;
pub mod ingester;
pub mod schema;
pub mod telemetry;

mod error;

pub use error::{Error, Result};

/// Object storage configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Object store backend
    pub backend: StorageBackend,
    /// Bucket name; S3 storage is unconfigured without one
    pub bucket: Option<String>,
    /// S3 region
    pub region: String,
    /// Custom S3 endpoint (MinIO, LocalStack)
    pub endpoint: Option<String>,
    /// Root directory for the local filesystem backend
    pub root: Option<String>,
}

/// Supported object store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Local,
    S3,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Local => "local",
            Self::S3 => "s3",
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "local" | "file" => Ok(Self::Local),
            "s3" | "aws" => Ok(Self::S3),
            other => Err(format!(
                "unknown storage backend '{}'; expected one of memory, local, s3",
                other
            )),
        }
    }
}

impl StorageConfig {
    /// Read storage settings from the environment.
    ///
    /// - STORAGE_BACKEND: "s3" (default), "memory" or "local"
    /// - S3_BUCKET: bucket name
    /// - S3_REGION: region (default: us-east-1)
    /// - S3_ENDPOINT: custom endpoint (optional)
    /// - STORAGE_ROOT: directory for the local backend
    pub fn from_env() -> Result<Self> {
        let backend = match std::env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse().map_err(Error::Config)?,
            Err(_) => StorageBackend::S3,
        };

        Ok(Self {
            backend,
            bucket: non_empty_env("S3_BUCKET"),
            region: non_empty_env("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            endpoint: non_empty_env("S3_ENDPOINT"),
            root: non_empty_env("STORAGE_ROOT"),
        })
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            bucket: None,
            region: "us-east-1".to_string(),
            endpoint: None,
            root: None,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
