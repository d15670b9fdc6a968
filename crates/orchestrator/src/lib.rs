//! Orchestrator (§4.J): the cron trigger that wakes up the collector, plus
//! a blob-created watcher that re-derives downstream queue messages for
//! any collection or article blob whose own stage failed to enqueue after
//! writing it (§4.F/§4.G's "partial failure after write" case, §8 scenario
//! 5). Duplicate messages this produces are safe: F's lease makes retries
//! idempotent, and G's markdown write is keyed by the same deterministic
//! path every time.

pub mod schedule;
pub mod watch;

use thiserror::Error;

use gazette_core::article::ArticleArtifact;
use gazette_core::collection::CollectionRecord;
use gazette_core::message::{MarkdownJob, TopicMessage};

pub use schedule::CronTrigger;
pub use watch::BlobWatcher;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("storage error: {0}")]
    Storage(#[from] gazette_storage::StorageError),

    #[error("queue error: {0}")]
    Queue(#[from] gazette_queue::QueueError),

    #[error("malformed blob: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Blob-created catch-up for `collected-content/*.json` (§4.J): re-derive
/// one `process_topic` message per item in the collection, the same
/// fan-out E performs on the happy path.
pub fn build_catchup_topic_messages(record: &CollectionRecord, collection_blob: &str) -> Vec<TopicMessage> {
    record.items.iter().map(|item| gazette_collector::topic::build_topic_message(item, &record.collection_id, collection_blob)).collect()
}

/// Blob-created catch-up for `processed-content/*.json` (§4.J): rebuild the
/// `MarkdownJob` the processor would have enqueued from the artifact it
/// just wrote.
pub fn build_catchup_markdown_job(article: &ArticleArtifact, article_blob: &str) -> MarkdownJob {
    MarkdownJob { article_blob: article_blob.to_string(), slug: article.slug.clone(), published_date: article.published_date, template: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gazette_core::article::SourceMetadata;
    use gazette_core::item::{Source, StandardItem};
    use std::collections::HashMap;

    #[test]
    fn catchup_topic_messages_cover_every_item() {
        let mut record = CollectionRecord::new("col-1", Utc::now());
        record.items.push(StandardItem {
            id: "a".into(),
            title: "A Technical Deep Dive Into Rust".into(),
            content: "Plenty of technical content about software development here.".into(),
            source: Source::Reddit,
            url: None,
            collected_at: Utc::now(),
            metadata: HashMap::new(),
        });
        record.items.push(StandardItem {
            id: "b".into(),
            title: "Understanding Python Async".into(),
            content: "Python's async model has plenty of quirks worth exploring in depth.".into(),
            source: Source::Reddit,
            url: None,
            collected_at: Utc::now(),
            metadata: HashMap::new(),
        });

        let messages = build_catchup_topic_messages(&record, "collections/2025/10/08/col-1.json");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].collection_blob, "collections/2025/10/08/col-1.json");
        assert_eq!(messages[0].topic_id, "a");
    }

    #[test]
    fn catchup_markdown_job_carries_slug_and_date() {
        let article = ArticleArtifact {
            title: "Understanding Python Async".into(),
            slug: "understanding-python-async".into(),
            seo_title: "Understanding Python Async".into(),
            published_date: Utc::now(),
            content: "body".into(),
            source_metadata: SourceMetadata { source: "reddit".into(), source_url: None, subreddit: None, author: None },
            cost: 0.01,
            quality_score: 0.8,
            word_count: 1,
            hero_image: None,
            image_alt: None,
            image_credit: None,
            tags: None,
            category: None,
        };

        let job = build_catchup_markdown_job(&article, "articles/2025-10-08/understanding-python-async.json");
        assert_eq!(job.slug, "understanding-python-async");
        assert_eq!(job.article_blob, "articles/2025-10-08/understanding-python-async.json");
    }
}
