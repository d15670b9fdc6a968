//! Topic processor (§4.F): consumes a `process_topic` message, calls the
//! configured LLM, writes the resulting `ArticleArtifact`, and fans out a
//! markdown-generation job. Lease, budget check, LLM call, cost
//! accounting, SEO derivation, artifact write, fan-out, and attempt
//! recording are each kept as distinct pieces of this module rather than
//! folded together, so each one can be matched back to its own
//! failure-semantics bullet.

pub mod lease;
pub mod prompt;

use chrono::Utc;
use thiserror::Error;

use gazette_core::article::{ArticleArtifact, SourceMetadata};
use gazette_core::item::{topic_id_for, StandardItem};
use gazette_core::message::{Envelope, MarkdownJob, TopicMessage};
use gazette_core::seo::{create_seo_metadata, processed_path};
use gazette_core::topic::{AttemptStatus, ProcessingAttempt};
use gazette_llm::{calculate_model_cost, complete_with_retry, LlmError, LlmProvider};
use gazette_queue::{QueueError, QueueProducer};
use gazette_storage::{Container, StorageError};
use gazette_tracker::{SessionTracker, TopicSuccess};

pub use lease::LeaseRegistry;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("lease held by another processor")]
    LeaseContended,

    #[error("session or attempt cost cap exceeded")]
    BudgetExceeded,

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("malformed input: {0}")]
    Malformed(String),
}

impl ProcessorError {
    /// Transient LLM/I/O failures are worth redelivering; everything else
    /// (malformed input, lease contention, budget caps) is not (§4.F).
    pub fn retry_recommended(&self) -> bool {
        match self {
            ProcessorError::Llm(e) => e.is_transient(),
            ProcessorError::Storage(_) | ProcessorError::Queue(_) => true,
            ProcessorError::LeaseContended | ProcessorError::BudgetExceeded | ProcessorError::Malformed(_) | ProcessorError::Serde(_) => false,
        }
    }
}

pub struct ProcessorConfig {
    pub processor_id: String,
    pub lease_ttl_secs: i64,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_retries: u32,
    pub session_cost_cap_usd: f64,
    pub attempt_cost_cap_usd: f64,
}

/// Everything step 6 onward needs, handed back to the caller so it can
/// decide what to enqueue and log.
pub struct ProcessedTopic {
    pub article_blob: String,
    pub markdown_job: MarkdownJob,
    pub word_count: u64,
    pub cost_usd: f64,
}

/// Look up the item matching `topic_id` inside a decoded collection blob
/// (§4.F: the queue message carries only a reference, not the content).
pub fn find_item<'a>(items: &'a [StandardItem], topic_id: &str) -> Option<&'a StandardItem> {
    items.iter().find(|item| topic_id_for(item) == topic_id)
}

/// Runs steps 1 (lease), 2 (budget), 3 (LLM call), 4 (cost), 5 (SEO), 6
/// (write artifact) and returns what the caller needs to do step 7
/// (enqueue) and step 8 (record attempt). The lease is released by the
/// caller only after step 7 succeeds, per the partial-failure semantics
/// named in §4.F: a crash between write and enqueue must re-run this
/// function and land on the same deterministic artifact path.
pub async fn process_topic(
    topic: &TopicMessage,
    source_item: &StandardItem,
    leases: &LeaseRegistry,
    tracker: &SessionTracker,
    provider: &dyn LlmProvider,
    processed: &Container,
    config: &ProcessorConfig,
) -> Result<ProcessedTopic, ProcessorError> {
    let now = Utc::now();

    if !leases.try_acquire(&topic.topic_id, &config.processor_id, config.lease_ttl_secs, now).await {
        return Err(ProcessorError::LeaseContended);
    }

    let session_cost = tracker.current_cost_usd().await;
    if session_cost >= config.session_cost_cap_usd {
        leases.release(&topic.topic_id).await;
        return Err(ProcessorError::BudgetExceeded);
    }

    let messages = prompt::build_messages(topic);
    let completion = match complete_with_retry(provider, messages, config.temperature, config.max_tokens, config.max_retries).await {
        Ok(c) => c,
        Err(e) => {
            leases.release(&topic.topic_id).await;
            return Err(e.into());
        }
    };

    let cost_usd = calculate_model_cost(&config.model, completion.usage);
    if cost_usd > config.attempt_cost_cap_usd {
        leases.release(&topic.topic_id).await;
        return Err(ProcessorError::BudgetExceeded);
    }

    let seo = create_seo_metadata(&topic.title, now).ok_or_else(|| ProcessorError::Malformed(format!("title '{}' slugifies to empty", topic.title)))?;
    let word_count = completion.text.split_whitespace().count() as u64;

    let artifact = ArticleArtifact {
        title: topic.title.clone(),
        slug: seo.slug.clone(),
        seo_title: seo.seo_title,
        published_date: now,
        content: completion.text,
        source_metadata: SourceMetadata {
            source: topic.source.clone(),
            source_url: source_item.source_url().map(str::to_string),
            subreddit: topic.subreddit.clone(),
            author: topic.author.clone(),
        },
        cost: cost_usd,
        quality_score: topic.priority_score,
        word_count,
        hero_image: None,
        image_alt: None,
        image_credit: None,
        tags: None,
        category: None,
    };

    let article_blob = processed_path(now, &seo.slug);
    let bytes = serde_json::to_vec(&artifact)?;
    processed.put(&article_blob, bytes).await?;

    let markdown_job = MarkdownJob {
        article_blob: article_blob.clone(),
        slug: seo.slug,
        published_date: now,
        template: None,
    };

    Ok(ProcessedTopic { article_blob, markdown_job, word_count, cost_usd })
}

/// Step 7 (enqueue the markdown job) and step 8 (record the attempt),
/// releasing the lease and updating the session tracker on success. Callers
/// on the failure path release the lease and call `tracker.record_failure`
/// directly — there's no artifact to record an attempt against.
pub async fn finish_topic(
    topic_id: &str,
    processor_id: &str,
    processed: &ProcessedTopic,
    producer: &dyn QueueProducer,
    leases: &LeaseRegistry,
    tracker: &SessionTracker,
) -> Result<(), ProcessorError> {
    let envelope = Envelope::new("markdown_generated", "gazette-processor", topic_id.to_string(), processed.markdown_job.clone());
    let body = serde_json::to_string(&envelope)?;
    producer.send(&body).await?;

    leases
        .record_attempt(
            topic_id,
            ProcessingAttempt {
                attempt_id: uuid::Uuid::new_v4().to_string(),
                processor_id: processor_id.to_string(),
                started_at: Utc::now(),
                completed_at: Some(Utc::now()),
                status: AttemptStatus::Succeeded,
                tokens_used: 0,
                cost_usd: processed.cost_usd,
                quality_score: None,
                word_count: Some(processed.word_count),
                error: None,
            },
        )
        .await;
    leases.release(topic_id).await;
    tracker
        .record_success(TopicSuccess { cost_usd: processed.cost_usd, processing_time_secs: 0.0, word_count: processed.word_count, quality_score: None })
        .await;
    Ok(())
}
