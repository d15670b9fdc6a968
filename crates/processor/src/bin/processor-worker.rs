//! processor-worker — consumes `content-processing-requests` and turns
//! each surviving topic into an article artifact plus a markdown job
//! (§4.F).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use tracing::{info, warn};

use gazette_core::collection::CollectionRecord;
use gazette_core::config::{load_dotenv, Config};
use gazette_core::message::{Envelope, TopicMessage};
use gazette_processor::{finish_topic, find_item, process_topic, LeaseRegistry, ProcessedTopic, ProcessorConfig, ProcessorError};
use gazette_queue::{QueueConsumer, Queues};
use gazette_storage::{Backend, Container};
use gazette_tracker::SessionTracker;
use gazette_worker::{Worker, WorkerError, WorkerRunner, WorkerRunnerConfig};

#[derive(Parser, Debug)]
#[command(name = "processor-worker", version, about = "Generates articles from collected topics")]
struct Cli {
    #[arg(long, env = "GAZETTE_PROFILE", default_value = "")]
    profile: String,

    #[arg(long, default_value_t = 5)]
    poll_batch_size: u32,

    #[arg(long, default_value_t = 30)]
    shutdown_timeout_secs: u64,
}

struct ProcessorWorker {
    leases: LeaseRegistry,
    tracker: SessionTracker,
    provider: Box<dyn gazette_llm::LlmProvider>,
    collected: Container,
    processed: Container,
    queues: Arc<Queues>,
    config: ProcessorConfig,
}

impl ProcessorWorker {
    async fn handle_one(&self, raw_body: &str) -> Result<(), String> {
        let envelope: Envelope<TopicMessage> = serde_json::from_str(raw_body).map_err(|e| format!("malformed envelope: {e}"))?;
        let topic = envelope.payload;

        let blob_bytes = self
            .collected
            .get(&topic.collection_blob)
            .await
            .map_err(|e| format!("transient: could not read collection blob {}: {e}", topic.collection_blob))?;
        let record: CollectionRecord =
            serde_json::from_slice(&blob_bytes).map_err(|e| format!("malformed collection blob {}: {e}", topic.collection_blob))?;
        let source_item =
            find_item(&record.items, &topic.topic_id).ok_or_else(|| format!("malformed: topic_id {} not found in its own collection blob", topic.topic_id))?;

        let attempt = process_topic(&topic, source_item, &self.leases, &self.tracker, self.provider.as_ref(), &self.processed, &self.config).await;

        match attempt {
            Ok(processed) => self.complete(&topic.topic_id, processed).await,
            Err(ProcessorError::LeaseContended) => {
                info!(topic_id = %topic.topic_id, "lease held by another processor, leaving for redelivery");
                Err("transient: lease contended".to_string())
            }
            Err(e) if e.retry_recommended() => Err(format!("transient: {e}")),
            Err(e) => {
                self.tracker.record_failure(Some(&e.to_string())).await;
                Err(format!("malformed: {e}"))
            }
        }
    }

    async fn complete(&self, topic_id: &str, processed: ProcessedTopic) -> Result<(), String> {
        finish_topic(topic_id, &self.config.processor_id, &processed, self.queues.markdown_requests_producer.as_ref(), &self.leases, &self.tracker)
            .await
            .map_err(|e| format!("transient: failed to finish topic after artifact write: {e}"))
    }
}

#[async_trait]
impl Worker for ProcessorWorker {
    fn name(&self) -> &str {
        "processor-worker"
    }

    async fn poll_once(&self) -> Result<(), WorkerError> {
        let messages = self.queues.processing_requests.poll_batch(5).await.map_err(|e| WorkerError::Other(e.to_string()))?;

        for message in messages {
            match self.handle_one(&message.body).await {
                Ok(()) => {
                    if let Err(e) = self.queues.processing_requests.ack(&message.receipt_handle).await {
                        warn!(error = %e, "failed to ack processed message");
                    }
                }
                Err(reason) if reason.starts_with("transient:") => {
                    warn!(reason = %reason, "transient processing failure, returning for redelivery");
                    if let Err(e) = self.queues.processing_requests.nack(&message.receipt_handle).await {
                        warn!(error = %e, "failed to nack message");
                    }
                }
                Err(reason) => {
                    tracing::error!(reason = %reason, "unrecoverable processing failure, dropping without retry");
                    if let Err(e) = self.queues.processing_requests.ack(&message.receipt_handle).await {
                        warn!(error = %e, "failed to ack malformed message");
                    }
                }
            }
        }

        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    load_dotenv();
    let config = Config::for_profile(&cli.profile);
    config.log_summary();

    let backend = Backend::from_config(&config.object_store)?;
    let collected = Container::new(&backend, &config.object_store, "collected-content");
    let processed = Container::new(&backend, &config.object_store, "processed-content");
    let queues = Arc::new(Queues::from_config(&config.object_store, &config.queue)?);

    let processor_id = format!("proc-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]);
    let provider = gazette_llm::create_provider(&config.llm)?;
    let tracker = SessionTracker::new(processor_id.clone());

    let processor_config = ProcessorConfig {
        processor_id: processor_id.clone(),
        lease_ttl_secs: config.queue.lease_ttl_secs,
        model: config.llm.model.clone(),
        temperature: config.llm.temperature,
        max_tokens: config.llm.max_tokens,
        max_retries: config.llm.max_retries,
        session_cost_cap_usd: config.llm.session_cost_cap_usd,
        attempt_cost_cap_usd: config.llm.attempt_cost_cap_usd,
    };

    let worker = Arc::new(ProcessorWorker {
        leases: LeaseRegistry::new(),
        tracker,
        provider,
        collected,
        processed,
        queues,
        config: processor_config,
    });

    let runner_config = WorkerRunnerConfig::new("processor-worker").with_shutdown_timeout(Duration::from_secs(cli.shutdown_timeout_secs));
    let tracker_handle = worker.tracker.clone();

    info!(processor_id = %processor_id, "processor-worker starting");
    WorkerRunner::run(worker, runner_config, None).await?;
    tracker_handle.log_summary().await;
    info!("processor-worker exited cleanly");

    Ok(())
}
