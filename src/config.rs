//! Component factory for environment-based configuration
//!
//! Builds the object store behind both binaries from a [`StorageConfig`],
//! switching between in-memory, local filesystem and S3 backends.

use crate::{Error, Result, StorageBackend, StorageConfig};
use object_store::{aws::AmazonS3Builder, local::LocalFileSystem, memory::InMemory, ObjectStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ComponentFactory;

impl ComponentFactory {
    /// Create the object store for `config`.
    ///
    /// Returns `Ok(None)` when S3 is selected but no bucket is set; callers
    /// decide whether running without storage is acceptable.
    pub fn create_object_store(config: &StorageConfig) -> Result<Option<Arc<dyn ObjectStore>>> {
        debug!(backend = config.backend.as_str(), "Creating object store");
        match config.backend {
            StorageBackend::Memory => {
                info!("Using in-memory object store (development mode)");
                Ok(Some(Arc::new(InMemory::new())))
            }
            StorageBackend::Local => {
                let root = config.root.as_deref().ok_or_else(|| {
                    Error::Config("STORAGE_ROOT required when STORAGE_BACKEND=local".to_string())
                })?;
                std::fs::create_dir_all(root)?;
                info!(root = %root, "Using local filesystem object store");
                Ok(Some(Arc::new(LocalFileSystem::new_with_prefix(root)?)))
            }
            StorageBackend::S3 => {
                let Some(bucket) = config.bucket.as_deref() else {
                    warn!("S3_BUCKET not set; object storage is unconfigured");
                    return Ok(None);
                };

                info!(bucket = %bucket, region = %config.region, "Using S3 object store");

                // Credentials come from the standard AWS environment or IAM role
                let mut builder = AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .with_region(&config.region);

                if let Some(endpoint) = &config.endpoint {
                    info!(endpoint = %endpoint, "Using custom S3 endpoint");
                    builder = builder.with_endpoint(endpoint).with_allow_http(true);
                }

                Ok(Some(Arc::new(builder.build()?)))
            }
        }
    }

    /// Like [`Self::create_object_store`], but unconfigured storage is an error.
    pub fn require_object_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>> {
        Self::create_object_store(config)?.ok_or_else(|| {
            Error::Config("S3_BUCKET environment variable not set".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s3_without_bucket_is_unconfigured() {
        let config = StorageConfig::default();
        assert!(ComponentFactory::create_object_store(&config).unwrap().is_none());

        let err = ComponentFactory::require_object_store(&config).err().unwrap();
        assert!(err.to_string().contains("S3_BUCKET"));
    }

    #[test]
    fn test_memory_backend() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            ..Default::default()
        };
        assert!(ComponentFactory::create_object_store(&config).unwrap().is_some());
    }

    #[test]
    fn test_local_backend_requires_root() {
        let config = StorageConfig {
            backend: StorageBackend::Local,
            ..Default::default()
        };
        assert!(ComponentFactory::create_object_store(&config).is_err());

        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Local,
            root: Some(dir.path().to_string_lossy().to_string()),
            ..Default::default()
        };
        assert!(ComponentFactory::create_object_store(&config).unwrap().is_some());
    }
}
