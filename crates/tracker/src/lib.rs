//! Per-processor session and cost tracking (§4.I): cumulative counters for
//! one processor's run, kept behind a mutex so the same tracker can be
//! shared across concurrently-handled messages.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Inner {
    topics_processed: u64,
    topics_failed: u64,
    articles_generated: u64,
    total_cost_usd: f64,
    total_processing_time_secs: f64,
    total_word_count: u64,
    quality_scores: Vec<f64>,
}

/// A single successful processing attempt's contribution to the session.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopicSuccess {
    pub cost_usd: f64,
    pub processing_time_secs: f64,
    pub word_count: u64,
    pub quality_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub session_id: String,
    pub processor_id: String,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: f64,
    pub topics_processed: u64,
    pub topics_failed: u64,
    pub articles_generated: u64,
    pub total_cost_usd: f64,
    pub total_word_count: u64,
    pub average_quality_score: Option<f64>,
    pub success_rate_percent: f64,
    pub average_processing_time_secs: f64,
    pub cost_per_article: f64,
    pub words_per_article: f64,
}

/// Thread-safe, append-only tracker for one processor's session.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    processor_id: String,
    session_id: String,
    session_start: DateTime<Utc>,
    inner: Arc<Mutex<Inner>>,
}

impl SessionTracker {
    pub fn new(processor_id: impl Into<String>) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        let processor_id = processor_id.into();
        tracing::info!(session_id = %session_id, processor_id = %processor_id, "session tracker started");
        Self {
            processor_id,
            session_id,
            session_start: Utc::now(),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn record_success(&self, success: TopicSuccess) {
        let mut inner = self.inner.lock().await;
        inner.topics_processed += 1;
        inner.articles_generated += 1;
        inner.total_cost_usd += success.cost_usd;
        inner.total_processing_time_secs += success.processing_time_secs;
        inner.total_word_count += success.word_count;
        if let Some(q) = success.quality_score {
            inner.quality_scores.push(q);
        }
        tracing::debug!(
            total = inner.topics_processed,
            cost = inner.total_cost_usd,
            words = inner.total_word_count,
            "topic success recorded"
        );
    }

    pub async fn record_failure(&self, error: Option<&str>) {
        let mut inner = self.inner.lock().await;
        inner.topics_failed += 1;
        tracing::debug!(failed_total = inner.topics_failed, error, "topic failure recorded");
    }

    /// Cumulative cost so far, used by the processor's budget check
    /// (§4.F step 2).
    pub async fn current_cost_usd(&self) -> f64 {
        self.inner.lock().await.total_cost_usd
    }

    pub async fn stats(&self) -> SessionStats {
        let inner = self.inner.lock().await;
        let duration = (Utc::now() - self.session_start).num_milliseconds() as f64 / 1000.0;
        let total_attempts = inner.topics_processed + inner.topics_failed;
        let success_rate = if total_attempts == 0 {
            0.0
        } else {
            (inner.topics_processed as f64 / total_attempts as f64) * 100.0
        };
        let avg_quality = if inner.quality_scores.is_empty() {
            None
        } else {
            Some(inner.quality_scores.iter().sum::<f64>() / inner.quality_scores.len() as f64)
        };

        SessionStats {
            session_id: self.session_id.clone(),
            processor_id: self.processor_id.clone(),
            session_start: self.session_start,
            session_duration_secs: round2(duration),
            topics_processed: inner.topics_processed,
            topics_failed: inner.topics_failed,
            articles_generated: inner.articles_generated,
            total_cost_usd: round6(inner.total_cost_usd),
            total_word_count: inner.total_word_count,
            average_quality_score: avg_quality.map(round3),
            success_rate_percent: round1(success_rate),
            average_processing_time_secs: if inner.topics_processed > 0 {
                round2(inner.total_processing_time_secs / inner.topics_processed as f64)
            } else {
                0.0
            },
            cost_per_article: if inner.articles_generated > 0 {
                round6(inner.total_cost_usd / inner.articles_generated as f64)
            } else {
                0.0
            },
            words_per_article: if inner.articles_generated > 0 {
                (inner.total_word_count as f64 / inner.articles_generated as f64).round()
            } else {
                0.0
            },
        }
    }

    pub async fn log_summary(&self) {
        let stats = self.stats().await;
        tracing::info!(
            session_id = %stats.session_id,
            duration_secs = stats.session_duration_secs,
            processed = stats.topics_processed,
            failed = stats.topics_failed,
            success_rate = stats.success_rate_percent,
            articles = stats.articles_generated,
            total_cost = stats.total_cost_usd,
            cost_per_article = stats.cost_per_article,
            words_per_article = stats.words_per_article,
            "session summary"
        );
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
fn round6(v: f64) -> f64 {
    (v * 1_000_000.0).round() / 1_000_000.0
}
