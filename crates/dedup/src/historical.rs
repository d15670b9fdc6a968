//! Layer 3: historical URL dedup via `metadata/published-urls.json`.

use std::collections::HashSet;

use gazette_core::item::StandardItem;
use gazette_storage::Container;
use serde::{Deserialize, Serialize};
use tracing::warn;

const METADATA_PATH: &str = "metadata/published-urls.json";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PublishedUrls {
    pub urls: HashSet<String>,
}

/// Fails open (empty set) if the metadata blob is missing or unreadable —
/// every item passes through on first run.
pub async fn load_published_urls(processed: &Container) -> PublishedUrls {
    match processed.get(METADATA_PATH).await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
        Err(err) => {
            tracing::debug!(error = %err, "no published-urls metadata yet, starting fresh");
            PublishedUrls::default()
        }
    }
}

pub fn filter_historical(items: Vec<StandardItem>, published: &PublishedUrls) -> Vec<StandardItem> {
    items
        .into_iter()
        .filter(|item| match item.source_url() {
            Some(url) if !url.is_empty() => !published.urls.contains(url),
            _ => true,
        })
        .collect()
}

/// Append newly published URLs and write the metadata blob back. Called
/// by the collector after a successful write-before-enqueue (§4.E).
pub async fn record_published(processed: &Container, new_urls: impl IntoIterator<Item = String>) -> Result<(), gazette_storage::StorageError> {
    let mut published = load_published_urls(processed).await;
    let before = published.urls.len();
    published.urls.extend(new_urls);
    if published.urls.len() == before {
        return Ok(());
    }
    let bytes = serde_json::to_vec(&published)?;
    processed.put(METADATA_PATH, bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gazette_core::config::ObjectStoreConfig;
    use gazette_core::item::Source;
    use gazette_storage::Backend;
    use std::collections::HashMap;

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

    fn item(id: &str, url: Option<&str>) -> StandardItem {
        StandardItem {
            id: id.to_string(),
            title: "Title".into(),
            content: "Content".into(),
            source: Source::Reddit,
            url: url.map(|u| u.to_string()),
            collected_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn drops_items_with_published_url() {
        let mut published = PublishedUrls::default();
        published.urls.insert("https://example.com/seen".to_string());

        let items = vec![item("1", Some("https://example.com/seen")), item("2", Some("https://example.com/new"))];
        let result = filter_historical(items, &published);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "2");
    }

    #[test]
    fn items_without_url_pass_through() {
        let published = PublishedUrls::default();
        let items = vec![item("1", None)];
        let result = filter_historical(items, &published);
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn record_published_roundtrips_through_storage() {
        let tmp = std::env::temp_dir().join(format!("gazette-dedup-test-{}", uuid::Uuid::new_v4()));
        let config = test_config(&tmp);
        let backend = Backend::from_config(&config).unwrap();
        let processed = Container::new(&backend, &config, "processed-content");

        record_published(&processed, vec!["https://example.com/a".to_string()]).await.unwrap();
        let loaded = load_published_urls(&processed).await;
        assert!(loaded.urls.contains("https://example.com/a"));
        std::fs::remove_dir_all(&tmp).ok();
    }
}
