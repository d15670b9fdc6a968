//! Object-store backend selection: local filesystem for dev/tests, S3 in
//! production. Maps named containers (collected-content, processed-content,
//! ...) onto `object_store`'s bucket/prefix abstraction (§6).

use std::path::PathBuf;
use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::ObjectStore;
use tracing::info;

use gazette_core::config::ObjectStoreConfig;

use crate::error::StorageError;

pub enum Backend {
    Local(LocalBackend),
    S3(S3Backend),
}

impl Backend {
    pub fn from_config(config: &ObjectStoreConfig) -> Result<Self, StorageError> {
        match config.backend.as_str() {
            "s3" => Ok(Backend::S3(S3Backend::new(config)?)),
            _ => Ok(Backend::Local(LocalBackend::new(&config.local_root)?)),
        }
    }

    pub fn store(&self) -> Arc<dyn ObjectStore> {
        match self {
            Backend::Local(b) => b.store.clone(),
            Backend::S3(b) => b.store.clone(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Backend::S3(_))
    }
}

pub struct LocalBackend {
    pub store: Arc<dyn ObjectStore>,
    pub root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: &std::path::Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(root)?;
        let canonical = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let store = LocalFileSystem::new_with_prefix(&canonical)
            .map_err(|e| StorageError::Other(format!("local filesystem error: {e}")))?;
        info!(root = %canonical.display(), "storage: local backend");
        Ok(Self { store: Arc::new(store), root: canonical })
    }
}

pub struct S3Backend {
    pub store: Arc<dyn ObjectStore>,
    pub bucket: String,
}

impl S3Backend {
    pub fn new(config: &ObjectStoreConfig) -> Result<Self, StorageError> {
        let bucket = config
            .bucket
            .as_deref()
            .ok_or_else(|| StorageError::NotConfigured("S3_BUCKET not set".into()))?;

        let mut builder = AmazonS3Builder::new().with_region(&config.region);

        if let Some(ref key) = config.access_key_id {
            builder = builder.with_access_key_id(key);
        }
        if let Some(ref secret) = config.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        if let Some(ref token) = config.session_token {
            builder = builder.with_token(token);
        }

        if let Some(ref endpoint) = config.endpoint_url {
            if !endpoint.is_empty() {
                let endpoint_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                    endpoint.clone()
                } else {
                    format!("https://{endpoint}")
                };
                builder = builder
                    .with_bucket_name(bucket)
                    .with_endpoint(&endpoint_url)
                    .with_allow_http(endpoint_url.starts_with("http://"));
            }
        } else {
            builder = builder.with_url(format!("s3://{bucket}"));
        }

        let store = builder.build()?;
        info!(bucket, region = %config.region, "storage: s3 backend");

        Ok(Self { store: Arc::new(store), bucket: bucket.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_backend_creates_root_dir() {
        let tmp = std::env::temp_dir().join("gazette-storage-backend-test");
        std::fs::remove_dir_all(&tmp).ok();
        let backend = Backend::Local(LocalBackend::new(&tmp).unwrap());
        assert!(!backend.is_remote());
        assert!(tmp.exists());
        std::fs::remove_dir_all(&tmp).ok();
    }
}
