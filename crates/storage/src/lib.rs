pub mod backend;
pub mod error;
pub mod validate;

use std::sync::Arc;

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};

pub use backend::Backend;
pub use error::StorageError;
pub use validate::validate_blob_name;

use gazette_core::config::ObjectStoreConfig;

/// One logical container (§6): a named, prefixed view over the shared
/// backend. `collected-content`, `processed-content`, `markdown-content`,
/// `static-sites`, and `backup` are each one `Container`, all sharing the
/// same underlying `ObjectStore` and bucket.
#[derive(Clone)]
pub struct Container {
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl Container {
    pub fn new(backend: &Backend, config: &ObjectStoreConfig, name: &str) -> Self {
        let base_prefix = config.prefix.as_deref().unwrap_or("").trim_end_matches('/');
        let prefix = if base_prefix.is_empty() {
            name.to_string()
        } else {
            format!("{base_prefix}/{name}")
        };
        Self { store: backend.store(), prefix }
    }

    fn full_path(&self, key: &str) -> ObjectPath {
        ObjectPath::from(format!("{}/{}", self.prefix, key.trim_start_matches('/')))
    }

    pub async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.store.put(&self.full_path(key), PutPayload::from(Bytes::from(bytes))).await?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let result = self.store.get(&self.full_path(key)).await?;
        Ok(result.bytes().await?.to_vec())
    }

    pub async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.store.head(&self.full_path(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.store.delete(&self.full_path(key)).await?;
        Ok(())
    }

    /// List every key under `sub_prefix` (relative to the container root).
    pub async fn list(&self, sub_prefix: &str) -> Result<Vec<String>, StorageError> {
        let list_path = if sub_prefix.is_empty() {
            ObjectPath::from(self.prefix.as_str())
        } else {
            self.full_path(sub_prefix)
        };
        let mut stream = self.store.list(Some(&list_path));
        let mut keys = Vec::new();
        while let Some(meta) = stream.try_next().await? {
            let full = meta.location.to_string();
            if let Some(stripped) = full.strip_prefix(&format!("{}/", self.prefix)) {
                keys.push(stripped.to_string());
            } else {
                keys.push(full);
            }
        }
        Ok(keys)
    }

    /// Copy every object from `self` into `dest` (used by the site
    /// publisher's backup step, §4.H).
    pub async fn mirror_into(&self, dest: &Container) -> Result<usize, StorageError> {
        let keys = self.list("").await?;
        let mut copied = 0;
        for key in keys {
            let data = self.get(&key).await?;
            dest.put(&key, data).await?;
            copied += 1;
        }
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazette_core::config::ObjectStoreConfig;

    fn test_config(root: &std::path::Path) -> ObjectStoreConfig {
        ObjectStoreConfig {
            backend: "local".into(),
            local_root: root.to_path_buf(),
            region: "us-east-1".into(),
            bucket: None,
            prefix: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            endpoint_url: None,
        }
    }

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let tmp = std::env::temp_dir().join(format!("gazette-storage-test-{}", uuid::Uuid::new_v4()));
        let config = test_config(&tmp);
        let backend = Backend::from_config(&config).unwrap();
        let container = Container::new(&backend, &config, "processed-content");

        container.put("articles/2025-10-08/a.json", b"{}".to_vec()).await.unwrap();
        let data = container.get("articles/2025-10-08/a.json").await.unwrap();
        assert_eq!(data, b"{}".to_vec());
        std::fs::remove_dir_all(&tmp).ok();
    }

    #[tokio::test]
    async fn exists_false_for_missing_key() {
        let tmp = std::env::temp_dir().join(format!("gazette-storage-test-{}", uuid::Uuid::new_v4()));
        let config = test_config(&tmp);
        let backend = Backend::from_config(&config).unwrap();
        let container = Container::new(&backend, &config, "processed-content");
        assert!(!container.exists("nope.json").await.unwrap());
        std::fs::remove_dir_all(&tmp).ok();
    }

    #[tokio::test]
    async fn mirror_into_copies_all_blobs() {
        let tmp = std::env::temp_dir().join(format!("gazette-storage-test-{}", uuid::Uuid::new_v4()));
        let config = test_config(&tmp);
        let backend = Backend::from_config(&config).unwrap();
        let web = Container::new(&backend, &config, "static-sites");
        let backup = Container::new(&backend, &config, "backup");

        web.put("index.html", b"hello".to_vec()).await.unwrap();
        web.put("css/site.css", b"body{}".to_vec()).await.unwrap();

        let copied = web.mirror_into(&backup).await.unwrap();
        assert_eq!(copied, 2);
        assert!(backup.exists("index.html").await.unwrap());
        assert!(backup.exists("css/site.css").await.unwrap());
        std::fs::remove_dir_all(&tmp).ok();
    }
}
