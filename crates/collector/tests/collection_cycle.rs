//! Integration test for the collection cycle invariant (§8): `collected ==
//! published + rejected_quality + rejected_dedup`, exercised across real
//! quality, dedup, storage, and queue crates rather than stubs, plus the
//! write-before-enqueue ordering guarantee.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use gazette_collector::{run_cycle, CollectionRecord};
use gazette_core::config::ObjectStoreConfig;
use gazette_core::item::{Source, StandardItem};
use gazette_dedup::DedupPipeline;
use gazette_fetch::RateLimitedFetcher;
use gazette_queue::LocalQueue;
use gazette_sources::SourceAdapter;
use gazette_storage::{Backend, Container};

struct FixedAdapter {
    name: &'static str,
    items: Vec<StandardItem>,
}

#[async_trait]
impl SourceAdapter for FixedAdapter {
    fn source_name(&self) -> &'static str {
        self.name
    }

    async fn collect(&self, _fetcher: &RateLimitedFetcher, max_items: usize) -> Vec<StandardItem> {
        self.items.iter().take(max_items).cloned().collect()
    }
}

fn item(id: &str, title: &str, content: &str, url: Option<&str>) -> StandardItem {
    StandardItem {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        source: Source::Reddit,
        url: url.map(str::to_string),
        collected_at: Utc::now(),
        metadata: HashMap::new(),
    }
}

fn local_store_config(root: &std::path::Path) -> ObjectStoreConfig {
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
async fn invariant_holds_across_a_mixed_batch() {
    let tmp = std::env::temp_dir().join(format!("gazette-collector-it-{}", uuid::Uuid::new_v4()));
    let config = local_store_config(&tmp);
    let backend = Backend::from_config(&config).unwrap();
    let collected = Container::new(&backend, &config, "collected-content");
    let processed = Container::new(&backend, &config, "processed-content");
    let queue = LocalQueue::new(tmp.join("queue")).unwrap();
    let fetcher = RateLimitedFetcher::new(60.0, 1.0, 30.0, 2.0);

    let keeper = item(
        "keep-1",
        "A Technical Deep Dive Into Distributed Systems",
        "This is a sufficiently long and genuinely technical passage about distributed systems, consensus, and networked software architecture.",
        Some("https://example.com/keep-1"),
    );
    let duplicate_of_keeper = keeper.clone();
    let too_short = item("drop-1", "oops", "way too short");
    let off_topic = item(
        "drop-2",
        "A Lovely Afternoon At The Park With Friends",
        "We spent the whole afternoon relaxing outdoors, having a picnic, and enjoying each other's company.",
        None,
    );

    let adapter: Arc<dyn SourceAdapter> = Arc::new(FixedAdapter {
        name: "reddit",
        items: vec![keeper, too_short, off_topic, duplicate_of_keeper],
    });

    let dedup = DedupPipeline::new(true, true);
    let outcome = run_cycle(&[adapter], &fetcher, 10, true, 0.60, 3, &dedup, &collected, &processed, &queue, Utc::now())
        .await
        .expect("collection cycle should succeed");

    assert!(outcome.stats.is_consistent());
    assert_eq!(outcome.stats.collected, 4);
    assert_eq!(outcome.stats.published, 1);
    assert_eq!(outcome.stats.rejected_quality, 2);
    assert_eq!(outcome.stats.rejected_dedup, 1);

    // Write-before-enqueue: the collection blob already contains the
    // published item by the time its message is on the queue.
    let bytes = collected.get(&outcome.collection_blob).await.unwrap();
    let record: CollectionRecord = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(record.items.len(), 1);
    assert_eq!(record.items[0].id, "keep-1");

    let messages = queue.poll_batch(10).await.unwrap();
    assert_eq!(messages.len(), 1);

    std::fs::remove_dir_all(&tmp).ok();
}

#[tokio::test]
async fn zero_survivors_still_satisfies_the_invariant() {
    let tmp = std::env::temp_dir().join(format!("gazette-collector-it-{}", uuid::Uuid::new_v4()));
    let config = local_store_config(&tmp);
    let backend = Backend::from_config(&config).unwrap();
    let collected = Container::new(&backend, &config, "collected-content");
    let processed = Container::new(&backend, &config, "processed-content");
    let queue = LocalQueue::new(tmp.join("queue")).unwrap();
    let fetcher = RateLimitedFetcher::new(60.0, 1.0, 30.0, 2.0);

    let adapter: Arc<dyn SourceAdapter> = Arc::new(FixedAdapter {
        name: "reddit",
        items: vec![item("drop-1", "no", "way too short to pass", None)],
    });

    let dedup = DedupPipeline::new(true, true);
    let outcome = run_cycle(&[adapter], &fetcher, 10, true, 0.60, 3, &dedup, &collected, &processed, &queue, Utc::now())
        .await
        .expect("collection cycle should succeed even with zero survivors");

    assert!(outcome.stats.is_consistent());
    assert_eq!(outcome.stats.published, 0);
    let messages = queue.poll_batch(10).await.unwrap();
    assert!(messages.is_empty());

    std::fs::remove_dir_all(&tmp).ok();
}
