//! Collection streamer (§4.E): the single composition loop that turns raw
//! adapter output into published topic messages, with the exact
//! invariant `collected = published + rejected_quality + rejected_dedup`.

pub mod record;
pub mod topic;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use gazette_core::item::StandardItem;
use gazette_core::message::{correlation_id, validate_topic_message, Envelope};
use gazette_dedup::historical::record_published;
use gazette_dedup::{BatchSeen, DedupPipeline};
use gazette_fetch::RateLimitedFetcher;
use gazette_quality::{apply_diversity_cap, review, score_item};
use gazette_queue::{QueueError, QueueProducer};
use gazette_sources::{quota_per_target, SourceAdapter};
use gazette_storage::{Container, StorageError};

pub use record::{collection_blob_path, CollectionRecord};
pub use topic::{build_topic_message, topic_id_for};

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("built an invalid topic message: {0}")]
    InvalidMessage(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorStats {
    pub collected: usize,
    pub rejected_quality: usize,
    pub rejected_dedup: usize,
    pub published: usize,
}

impl CollectorStats {
    /// `collected == published + rejected_quality + rejected_dedup` (§4.E).
    pub fn is_consistent(&self) -> bool {
        self.collected == self.published + self.rejected_quality + self.rejected_dedup
    }
}

pub struct CollectionOutcome {
    pub stats: CollectorStats,
    pub collection_blob: String,
}

/// Runs one full collection cycle: pulls from every adapter, applies the
/// quality gate (the `review` filters, the detector score threshold, and
/// the per-source diversity cap, all §4.C), applies all three dedup
/// layers, then writes-before-enqueuing each survivor in order.
#[allow(clippy::too_many_arguments)]
pub async fn run_cycle(
    adapters: &[Arc<dyn SourceAdapter>],
    fetcher: &RateLimitedFetcher,
    max_items_per_cycle: usize,
    strict_mode: bool,
    score_threshold: f64,
    diversity_cap_per_source: usize,
    dedup: &DedupPipeline,
    collected: &Container,
    processed: &Container,
    producer: &dyn QueueProducer,
    now: DateTime<Utc>,
) -> Result<CollectionOutcome, CollectorError> {
    let mut stats = CollectorStats::default();

    let per_adapter_quota = quota_per_target(max_items_per_cycle, adapters.len());
    let mut raw_items = Vec::new();
    for adapter in adapters {
        let items = adapter.collect(fetcher, per_adapter_quota).await;
        info!(source = adapter.source_name(), count = items.len(), "collected from source");
        raw_items.extend(items);
    }
    stats.collected = raw_items.len();

    let mut scored: Vec<(StandardItem, String, f64)> = Vec::with_capacity(raw_items.len());
    for item in raw_items {
        let (ok, reason) = review(&item, strict_mode);
        if !ok {
            stats.rejected_quality += 1;
            tracing::debug!(id = %item.id, reason = ?reason, "rejected by quality gate");
            continue;
        }

        let score = score_item(&item.title, &item.content, item.url.as_deref()).total;
        if score < score_threshold {
            stats.rejected_quality += 1;
            tracing::debug!(id = %item.id, score, threshold = score_threshold, "rejected by quality gate: score_below_threshold");
            continue;
        }

        let source = item.source.to_string();
        scored.push((item, source, score));
    }

    let before_diversity_cap = scored.len();
    let accepted = apply_diversity_cap(scored, diversity_cap_per_source);
    stats.rejected_quality += before_diversity_cap - accepted.len();

    let mut batch_seen = BatchSeen::default();
    let (survivors, rejected_dedup) = dedup.filter(accepted, &mut batch_seen, processed, now).await;
    stats.rejected_dedup = rejected_dedup;

    let collection_id = format!("col_{}", now.timestamp());
    let collection_blob = collection_blob_path(now, &collection_id);
    let mut record = CollectionRecord::new(&collection_id, now);
    let mut newly_published = Vec::new();

    for item in survivors {
        record.items.push(item.clone());
        let bytes = serde_json::to_vec(&record)?;
        collected.put(&collection_blob, bytes).await?;

        let topic_message = build_topic_message(&item, &collection_id, &collection_blob);
        validate_topic_message(&topic_message).map_err(CollectorError::InvalidMessage)?;

        let envelope = Envelope::new(
            "process_topic",
            "gazette-collector",
            correlation_id(&collection_id, &topic_message.topic_id),
            topic_message,
        );
        let body = serde_json::to_string(&envelope)?;
        if let Err(e) = producer.send(&body).await {
            warn!(error = %e, item_id = %item.id, "failed to enqueue process_topic message after write, item is durably collected but will not be processed until retried");
            return Err(e.into());
        }

        stats.published += 1;
        if let Some(url) = item.source_url() {
            newly_published.push(url.to_string());
        }
    }

    if !newly_published.is_empty() {
        record_published(processed, newly_published).await?;
    }

    debug_assert!(stats.is_consistent());
    Ok(CollectionOutcome { stats, collection_blob })
}
