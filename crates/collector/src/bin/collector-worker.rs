//! collector-worker — consumes `content-collection-requests` cron
//! wake-ups and runs one collection cycle per message (§4.E).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use tracing::{info, warn};

use gazette_collector::run_cycle;
use gazette_core::config::{load_dotenv, Config};
use gazette_core::message::{CollectionWakeup, Envelope};
use gazette_dedup::DedupPipeline;
use gazette_fetch::RateLimitedFetcher;
use gazette_queue::{QueueConsumer, Queues};
use gazette_sources::{MastodonAdapter, RedditAdapter, RssAdapter, SourceAdapter};
use gazette_storage::{Backend, Container};
use gazette_worker::{Worker, WorkerError, WorkerRunner, WorkerRunnerConfig};

#[derive(Parser, Debug)]
#[command(name = "collector-worker", version, about = "Collects and publishes candidate topics")]
struct Cli {
    #[arg(long, env = "GAZETTE_PROFILE", default_value = "")]
    profile: String,

    #[arg(long, default_value_t = 10)]
    poll_batch_size: u32,

    #[arg(long, default_value_t = 30)]
    shutdown_timeout_secs: u64,
}

struct CollectorWorker {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    fetcher: RateLimitedFetcher,
    default_max_items: usize,
    strict_mode: bool,
    score_threshold: f64,
    diversity_cap_per_source: usize,
    dedup: DedupPipeline,
    collected: Container,
    processed: Container,
    queues: Arc<Queues>,
}

impl CollectorWorker {
    fn adapters_for(&self, wakeup: &CollectionWakeup) -> Vec<Arc<dyn SourceAdapter>> {
        match &wakeup.sources {
            None => self.adapters.clone(),
            Some(names) => self.adapters.iter().filter(|a| names.iter().any(|n| n == a.source_name())).cloned().collect(),
        }
    }

    async fn handle_one(&self, raw_body: &str) -> Result<(), String> {
        let envelope: Envelope<CollectionWakeup> = serde_json::from_str(raw_body).map_err(|e| format!("malformed wake-up envelope: {e}"))?;
        let wakeup = envelope.payload;
        let max_items = wakeup.max_items.unwrap_or(self.default_max_items);
        let adapters = self.adapters_for(&wakeup);
        if adapters.is_empty() {
            return Err("malformed wake-up: no matching source adapters configured".to_string());
        }

        let outcome = run_cycle(
            &adapters,
            &self.fetcher,
            max_items,
            self.strict_mode,
            self.score_threshold,
            self.diversity_cap_per_source,
            &self.dedup,
            &self.collected,
            &self.processed,
            self.queues.processing_requests_producer.as_ref(),
            chrono::Utc::now(),
        )
        .await
        .map_err(|e| format!("transient: collection cycle failed: {e}"))?;

        info!(
            collected = outcome.stats.collected,
            published = outcome.stats.published,
            rejected_quality = outcome.stats.rejected_quality,
            rejected_dedup = outcome.stats.rejected_dedup,
            blob = %outcome.collection_blob,
            "collection cycle complete"
        );
        Ok(())
    }
}

#[async_trait]
impl Worker for CollectorWorker {
    fn name(&self) -> &str {
        "collector-worker"
    }

    async fn poll_once(&self) -> Result<(), WorkerError> {
        let messages = self
            .queues
            .collection_requests
            .poll_batch(10)
            .await
            .map_err(|e| WorkerError::Other(e.to_string()))?;

        for message in messages {
            match self.handle_one(&message.body).await {
                Ok(()) => {
                    if let Err(e) = self.queues.collection_requests.ack(&message.receipt_handle).await {
                        warn!(error = %e, "failed to ack wake-up message");
                    }
                }
                Err(reason) if reason.starts_with("transient:") => {
                    warn!(reason = %reason, "transient collection failure, returning wake-up for redelivery");
                    if let Err(e) = self.queues.collection_requests.nack(&message.receipt_handle).await {
                        warn!(error = %e, "failed to nack message");
                    }
                }
                Err(reason) => {
                    tracing::error!(reason = %reason, "malformed wake-up message, dropping without retry");
                    if let Err(e) = self.queues.collection_requests.ack(&message.receipt_handle).await {
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

    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();
    if !config.sources.reddit_subreddits.is_empty() {
        adapters.push(Arc::new(RedditAdapter::new(config.sources.reddit_subreddits.clone())));
    }
    if !config.sources.mastodon_hosts.is_empty() {
        adapters.push(Arc::new(MastodonAdapter::new(config.sources.mastodon_hosts.clone())));
    }
    if !config.sources.rss_feeds.is_empty() {
        adapters.push(Arc::new(RssAdapter::new(config.sources.rss_feeds.clone())));
    }

    let fetcher = RateLimitedFetcher::new(
        config.rate_limit.requests_per_minute,
        config.rate_limit.initial_backoff_secs,
        config.rate_limit.max_backoff_secs,
        config.rate_limit.backoff_multiplier,
    );

    let worker = Arc::new(CollectorWorker {
        adapters,
        fetcher,
        default_max_items: config.sources.max_items_per_cycle,
        strict_mode: config.quality.strict_mode_default,
        score_threshold: config.quality.score_threshold,
        diversity_cap_per_source: config.quality.diversity_cap_per_source,
        dedup: DedupPipeline::new(config.quality.enable_l2_dedup, config.quality.enable_l3_dedup),
        collected,
        processed,
        queues,
    });

    let runner_config = WorkerRunnerConfig::new("collector-worker").with_shutdown_timeout(Duration::from_secs(cli.shutdown_timeout_secs));

    info!("collector-worker starting");
    WorkerRunner::run(worker, runner_config, None).await?;
    info!("collector-worker exited cleanly");

    Ok(())
}
