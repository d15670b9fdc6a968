//! render-worker — consumes `markdown-generation-requests`, renders one
//! markdown file per message, writes it to `markdown-content`, and enqueues
//! `site-publishing-requests` (§4.G).

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use tracing::{error, info, warn};

use gazette_core::config::{load_dotenv, Config};
use gazette_core::message::{Envelope, MarkdownJob, PublishJob};
use gazette_queue::{QueueConsumer, QueueProducer, Queues};
use gazette_render::{render_markdown, TemplateKind};
use gazette_storage::{Backend, Container};
use gazette_worker::{Worker, WorkerError, WorkerRunner, WorkerRunnerConfig};

#[derive(Parser, Debug)]
#[command(name = "render-worker", version, about = "Renders processed articles into markdown")]
struct Cli {
    #[arg(long, env = "GAZETTE_PROFILE", default_value = "")]
    profile: String,

    #[arg(long, default_value_t = 10)]
    poll_batch_size: u32,

    #[arg(long, default_value_t = 10)]
    shutdown_timeout_secs: u64,
}

struct RenderWorker {
    processed: Container,
    markdown: Container,
    queues: Arc<Queues>,
    poll_batch_size: u32,
}

impl RenderWorker {
    async fn handle_one(&self, raw_body: &str) -> Result<(), String> {
        let envelope: Envelope<MarkdownJob> = serde_json::from_str(raw_body).map_err(|e| format!("malformed envelope: {e}"))?;
        let correlation_id = envelope.correlation_id.clone();
        let job = envelope.payload;

        let article_bytes = self
            .processed
            .get(&job.article_blob)
            .await
            .map_err(|e| format!("transient: could not read {}: {e}", job.article_blob))?;
        let article: serde_json::Value = serde_json::from_slice(&article_bytes).map_err(|e| format!("malformed article json: {e}"))?;

        let template = job
            .template
            .as_deref()
            .map(TemplateKind::from_str)
            .transpose()
            .map_err(|e| format!("malformed template: {e}"))?
            .unwrap_or(TemplateKind::Default);

        let artifact = render_markdown(&article, template).map_err(|e| format!("malformed article: {e}"))?;

        self.markdown
            .put(&artifact.path, artifact.rendered().into_bytes())
            .await
            .map_err(|e| format!("transient: could not write {}: {e}", artifact.path))?;

        let publish_payload = PublishJob {
            markdown_blob: artifact.path.clone(),
            slug: job.slug.clone(),
            force_rebuild: false,
        };
        let publish_envelope = Envelope::new("markdown_generated", "gazette-render", correlation_id, publish_payload);
        let body = serde_json::to_string(&publish_envelope).map_err(|e| format!("failed to encode publish job: {e}"))?;
        self.queues
            .publishing_requests_producer
            .send(&body)
            .await
            .map_err(|e| format!("transient: could not enqueue publish job: {e}"))?;

        info!(article = %job.article_blob, markdown = %artifact.path, "rendered markdown");
        Ok(())
    }
}

#[async_trait]
impl Worker for RenderWorker {
    fn name(&self) -> &str {
        "render-worker"
    }

    async fn poll_once(&self) -> Result<(), WorkerError> {
        let messages = self
            .queues
            .markdown_requests
            .poll_batch(self.poll_batch_size)
            .await
            .map_err(|e| WorkerError::Other(e.to_string()))?;

        for message in messages {
            match self.handle_one(&message.body).await {
                Ok(()) => {
                    if let Err(e) = self.queues.markdown_requests.ack(&message.receipt_handle).await {
                        warn!(error = %e, "failed to ack rendered message");
                    }
                }
                Err(reason) if reason.starts_with("transient:") => {
                    warn!(reason = %reason, "transient render failure, returning message for redelivery");
                    if let Err(e) = self.queues.markdown_requests.nack(&message.receipt_handle).await {
                        warn!(error = %e, "failed to nack message");
                    }
                }
                Err(reason) => {
                    error!(reason = %reason, "malformed markdown job, dropping without retry");
                    if let Err(e) = self.queues.markdown_requests.ack(&message.receipt_handle).await {
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
    let processed = Container::new(&backend, &config.object_store, "processed-content");
    let markdown = Container::new(&backend, &config.object_store, "markdown-content");
    let queues = Arc::new(Queues::from_config(&config.object_store, &config.queue)?);

    let worker = Arc::new(RenderWorker {
        processed,
        markdown,
        queues,
        poll_batch_size: cli.poll_batch_size,
    });

    let runner_config = WorkerRunnerConfig::new("render-worker").with_shutdown_timeout(Duration::from_secs(cli.shutdown_timeout_secs));

    info!("render-worker starting");
    WorkerRunner::run(worker, runner_config, None).await?;
    info!("render-worker exited cleanly");

    Ok(())
}
