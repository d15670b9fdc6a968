//! orchestrator — fires the collection cron and watches `collected-content`
//! / `processed-content` for blobs whose stage failed to enqueue its own
//! downstream message (§4.J).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use tokio::sync::Mutex;
use tracing::{info, warn};

use gazette_core::collection::CollectionRecord;
use gazette_core::config::{load_dotenv, Config};
use gazette_core::message::{correlation_id, CollectionWakeup, Envelope};
use gazette_orchestrator::{build_catchup_markdown_job, build_catchup_topic_messages, BlobWatcher, CronTrigger};
use gazette_queue::{QueueProducer, Queues};
use gazette_storage::{Backend, Container};
use gazette_worker::{Worker, WorkerError, WorkerRunner, WorkerRunnerConfig};

#[derive(Parser, Debug)]
#[command(name = "orchestrator", version, about = "Drives the cron and blob-created triggers for the pipeline")]
struct Cli {
    #[arg(long, env = "GAZETTE_PROFILE", default_value = "")]
    profile: String,

    #[arg(long, default_value_t = 30)]
    shutdown_timeout_secs: u64,
}

struct OrchestratorWorker {
    trigger: Mutex<Option<CronTrigger>>,
    collected_seen: Mutex<BlobWatcher>,
    processed_seen: Mutex<BlobWatcher>,
    collected: Container,
    processed: Container,
    queues: Arc<Queues>,
}

impl OrchestratorWorker {
    async fn run_cron_check(&self) -> Result<(), String> {
        let mut trigger_slot = self.trigger.lock().await;
        let Some(trigger) = trigger_slot.as_mut() else { return Ok(()) };

        let now = chrono::Utc::now();
        if !trigger.due(now) {
            return Ok(());
        }

        let wakeup = CollectionWakeup::default();
        let envelope = Envelope::new("collection_wakeup", "gazette-orchestrator", format!("cron_{}", now.timestamp()), wakeup);
        let body = serde_json::to_string(&envelope).map_err(|e| format!("malformed: failed to encode cron wake-up: {e}"))?;

        self.queues
            .collection_requests_producer
            .send(&body)
            .await
            .map_err(|e| format!("transient: failed to enqueue cron wake-up: {e}"))?;

        trigger.record_trigger_at(now);
        info!("cron wake-up enqueued");
        Ok(())
    }

    async fn run_collected_watch(&self) -> Result<(), String> {
        let keys = self.collected.list("").await.map_err(|e| format!("transient: failed to list collected-content: {e}"))?;
        let fresh = {
            let mut seen = self.collected_seen.lock().await;
            seen.diff_new(keys)
        };

        for key in fresh {
            if !key.ends_with(".json") {
                info!(blob = %key, "ignoring non-JSON blob in collected-content");
                continue;
            }

            let bytes = match self.collected.get(&key).await {
                Ok(b) => b,
                Err(e) => {
                    warn!(blob = %key, error = %e, "could not read collected blob for catch-up fan-out");
                    continue;
                }
            };
            let record: CollectionRecord = match serde_json::from_slice(&bytes) {
                Ok(r) => r,
                Err(e) => {
                    warn!(blob = %key, error = %e, "malformed collection blob, skipping catch-up fan-out");
                    continue;
                }
            };

            for topic in build_catchup_topic_messages(&record, &key) {
                let cid = correlation_id(&topic.collection_id, &topic.topic_id);
                let envelope = Envelope::new("process_topic", "gazette-orchestrator", cid, topic);
                match serde_json::to_string(&envelope) {
                    Ok(body) => {
                        if let Err(e) = self.queues.processing_requests_producer.send(&body).await {
                            warn!(blob = %key, error = %e, "failed to enqueue catch-up processing message");
                        }
                    }
                    Err(e) => warn!(blob = %key, error = %e, "failed to encode catch-up processing message"),
                }
            }
            info!(blob = %key, "blob-created catch-up fan-out complete for collected-content");
        }

        Ok(())
    }

    async fn run_processed_watch(&self) -> Result<(), String> {
        let keys = self.processed.list("").await.map_err(|e| format!("transient: failed to list processed-content: {e}"))?;
        let fresh = {
            let mut seen = self.processed_seen.lock().await;
            seen.diff_new(keys)
        };

        for key in fresh {
            if !key.ends_with(".json") {
                info!(blob = %key, "ignoring non-JSON blob in processed-content");
                continue;
            }

            let bytes = match self.processed.get(&key).await {
                Ok(b) => b,
                Err(e) => {
                    warn!(blob = %key, error = %e, "could not read processed blob for catch-up markdown job");
                    continue;
                }
            };
            let article: gazette_core::article::ArticleArtifact = match serde_json::from_slice(&bytes) {
                Ok(a) => a,
                Err(e) => {
                    warn!(blob = %key, error = %e, "malformed article blob, skipping catch-up markdown job");
                    continue;
                }
            };

            let job = build_catchup_markdown_job(&article, &key);
            let envelope = Envelope::new("generate_markdown", "gazette-orchestrator", format!("catchup_{}", job.slug), job);
            match serde_json::to_string(&envelope) {
                Ok(body) => {
                    if let Err(e) = self.queues.markdown_requests_producer.send(&body).await {
                        warn!(blob = %key, error = %e, "failed to enqueue catch-up markdown job");
                    } else {
                        info!(blob = %key, "blob-created catch-up markdown job enqueued");
                    }
                }
                Err(e) => warn!(blob = %key, error = %e, "failed to encode catch-up markdown job"),
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Worker for OrchestratorWorker {
    fn name(&self) -> &str {
        "orchestrator"
    }

    async fn poll_once(&self) -> Result<(), WorkerError> {
        if let Err(e) = self.run_cron_check().await {
            warn!(reason = %e, "cron check failed this tick");
        }
        if let Err(e) = self.run_collected_watch().await {
            warn!(reason = %e, "collected-content watch failed this tick");
        }
        if let Err(e) = self.run_processed_watch().await {
            warn!(reason = %e, "processed-content watch failed this tick");
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

    let trigger = CronTrigger::new(&config.scheduler.cron_expression, Duration::from_secs(config.scheduler.cooldown_secs));

    let worker = Arc::new(OrchestratorWorker {
        trigger: Mutex::new(trigger),
        collected_seen: Mutex::new(BlobWatcher::new()),
        processed_seen: Mutex::new(BlobWatcher::new()),
        collected,
        processed,
        queues,
    });

    let runner_config = WorkerRunnerConfig::new("orchestrator").with_shutdown_timeout(Duration::from_secs(cli.shutdown_timeout_secs));

    info!("orchestrator starting");
    WorkerRunner::run(worker, runner_config, None).await?;
    info!("orchestrator exited cleanly");

    Ok(())
}
