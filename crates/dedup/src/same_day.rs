//! Layer 2: same-day blob scan over the processed-content container.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use gazette_core::hash::hash_content;
use gazette_core::item::StandardItem;
use gazette_storage::Container;
use tracing::warn;

pub async fn filter_same_day(items: Vec<StandardItem>, processed: &Container, now: DateTime<Utc>) -> Vec<StandardItem> {
    let prefix = gazette_core::seo::article_dir_prefix(now);

    let today_hashes = match collect_today_hashes(processed, &prefix).await {
        Ok(hashes) => hashes,
        Err(err) => {
            warn!(error = %err, "L2 dedup: could not list today's articles, failing open");
            return items;
        }
    };

    items
        .into_iter()
        .filter(|item| {
            let h = hash_content(&item.title, &item.content);
            h.is_empty() || !today_hashes.contains(&h)
        })
        .collect()
}

async fn collect_today_hashes(processed: &Container, prefix: &str) -> Result<HashSet<String>, String> {
    let keys = processed.list(prefix).await.map_err(|e| e.to_string())?;

    let mut hashes = HashSet::new();
    for key in keys {
        if !key.ends_with(".json") {
            continue;
        }
        let data = match processed.get(&key).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::debug!(key, error = %err, "could not read blob for L2 hashing");
                continue;
            }
        };
        let Ok(value) = serde_json::from_slice::<serde_json::Value>(&data) else { continue };
        let (Some(title), Some(content)) = (value["title"].as_str(), value["content"].as_str()) else { continue };
        let h = hash_content(title, content);
        if !h.is_empty() {
            hashes.insert(h);
        }
    }
    Ok(hashes)
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn item(id: &str, title: &str, content: &str) -> StandardItem {
        StandardItem {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            source: Source::Reddit,
            url: None,
            collected_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn drops_item_already_published_today() {
        let tmp = std::env::temp_dir().join(format!("gazette-dedup-test-{}", uuid::Uuid::new_v4()));
        let config = test_config(&tmp);
        let backend = Backend::from_config(&config).unwrap();
        let processed = Container::new(&backend, &config, "processed-content");

        let now = Utc::now();
        let prefix = gazette_core::seo::article_dir_prefix(now);
        let article = serde_json::json!({"title": "Dup Title", "content": "Duplicate content body here."});
        processed.put(&format!("{prefix}/dup-title.json"), serde_json::to_vec(&article).unwrap()).await.unwrap();

        let items = vec![
            item("1", "Dup Title", "Duplicate content body here."),
            item("2", "Fresh Title", "Fresh content body here."),
        ];
        let survivors = filter_same_day(items, &processed, now).await;
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].id, "2");
        std::fs::remove_dir_all(&tmp).ok();
    }

    #[tokio::test]
    async fn fails_open_when_container_is_empty() {
        let tmp = std::env::temp_dir().join(format!("gazette-dedup-test-{}", uuid::Uuid::new_v4()));
        let config = test_config(&tmp);
        let backend = Backend::from_config(&config).unwrap();
        let processed = Container::new(&backend, &config, "processed-content");

        let items = vec![item("1", "Title", "Some content body here that is long enough.")];
        let survivors = filter_same_day(items, &processed, Utc::now()).await;
        assert_eq!(survivors.len(), 1);
        std::fs::remove_dir_all(&tmp).ok();
    }
}
