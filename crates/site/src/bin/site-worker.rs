//! site-worker — consumes `site-publishing-requests` and rebuilds and
//! redeploys the static site (§4.H). Unlike the other stage workers, a
//! single message triggers a full-site rebuild rather than touching one
//! blob: every currently-published markdown file is re-rendered by Hugo,
//! not just the one named in the message.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use tracing::{info, warn};

use gazette_core::config::{load_dotenv, Config};
use gazette_core::message::{Envelope, PublishJob};
use gazette_queue::{QueueConsumer, Queues};
use gazette_site::publish;
use gazette_storage::{Backend, Container};
use gazette_worker::{Worker, WorkerError, WorkerRunner, WorkerRunnerConfig};

#[derive(Parser, Debug)]
#[command(name = "site-worker", version, about = "Builds and deploys the static site")]
struct Cli {
    #[arg(long, env = "GAZETTE_PROFILE", default_value = "")]
    profile: String,

    #[arg(long, default_value_t = 1)]
    poll_batch_size: u32,

    #[arg(long, default_value_t = 60)]
    shutdown_timeout_secs: u64,
}

struct SiteWorker {
    markdown: Container,
    web: Container,
    backup: Container,
    queues: Arc<Queues>,
    config: gazette_core::config::SiteConfig,
    poll_batch_size: u32,
}

impl SiteWorker {
    async fn handle_one(&self, raw_body: &str) -> Result<(), String> {
        let envelope: Envelope<PublishJob> = serde_json::from_str(raw_body).map_err(|e| format!("malformed envelope: {e}"))?;
        let job = envelope.payload;

        let result = publish(&self.markdown, &self.web, &self.backup, &self.config)
            .await
            .map_err(|e| if e.retry_recommended() { format!("transient: {e}") } else { format!("malformed: {e}") })?;

        if !result.errors.is_empty() {
            warn!(slug = %job.slug, errors = ?result.errors, "deploy completed with non-fatal errors");
        }

        info!(
            slug = %job.slug,
            files_uploaded = result.files_uploaded,
            duration_secs = result.duration_secs,
            "site deployed"
        );
        Ok(())
    }
}

#[async_trait]
impl Worker for SiteWorker {
    fn name(&self) -> &str {
        "site-worker"
    }

    async fn poll_once(&self) -> Result<(), WorkerError> {
        let messages = self
            .queues
            .publishing_requests
            .poll_batch(self.poll_batch_size)
            .await
            .map_err(|e| WorkerError::Other(e.to_string()))?;

        for message in messages {
            match self.handle_one(&message.body).await {
                Ok(()) => {
                    if let Err(e) = self.queues.publishing_requests.ack(&message.receipt_handle).await {
                        warn!(error = %e, "failed to ack published message");
                    }
                }
                Err(reason) if reason.starts_with("transient:") => {
                    warn!(reason = %reason, "transient publish failure, returning message for redelivery");
                    if let Err(e) = self.queues.publishing_requests.nack(&message.receipt_handle).await {
                        warn!(error = %e, "failed to nack message");
                    }
                }
                Err(reason) => {
                    tracing::error!(reason = %reason, "unrecoverable publish failure, dropping without retry");
                    if let Err(e) = self.queues.publishing_requests.ack(&message.receipt_handle).await {
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
    let markdown = Container::new(&backend, &config.object_store, "markdown-content");
    let web = Container::new(&backend, &config.object_store, "static-sites");
    let backup = Container::new(&backend, &config.object_store, "backup");
    let queues = Arc::new(Queues::from_config(&config.object_store, &config.queue)?);

    let worker = Arc::new(SiteWorker {
        markdown,
        web,
        backup,
        queues,
        config: config.site.clone(),
        poll_batch_size: cli.poll_batch_size,
    });

    let runner_config = WorkerRunnerConfig::new("site-worker").with_shutdown_timeout(Duration::from_secs(cli.shutdown_timeout_secs));

    info!("site-worker starting");
    WorkerRunner::run(worker, runner_config, None).await?;
    info!("site-worker exited cleanly");

    Ok(())
}
