//! gazette-cli — the operator's out-of-band trigger surface (§6): rebuild
//! the whole site, or regenerate markdown for the N most recent articles.
//! Both subcommands only build and send a queue message; no pipeline logic
//! lives here.

use clap::{Parser, Subcommand};
use tracing::info;

use gazette_core::article::ArticleArtifact;
use gazette_core::config::{load_dotenv, Config};
use gazette_core::message::{Envelope, MarkdownJob, PublishJob};
use gazette_orchestrator::build_catchup_markdown_job;
use gazette_queue::{QueueProducer, Queues};
use gazette_storage::{Backend, Container};

#[derive(Parser, Debug)]
#[command(name = "gazette-cli", version, about = "Operator controls for the content pipeline")]
struct Cli {
    #[arg(long, env = "GAZETTE_PROFILE", default_value = "")]
    profile: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Force a full site rebuild and redeploy.
    Rebuild {
        /// Delete every blob in the live web container before deploying,
        /// rather than letting the deploy step overwrite it in place.
        #[arg(long)]
        empty_live: bool,
    },
    /// Re-enqueue markdown generation for the N most recently processed articles.
    Regenerate {
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    load_dotenv();
    let config = Config::for_profile(&cli.profile);

    let backend = Backend::from_config(&config.object_store)?;
    let queues = Queues::from_config(&config.object_store, &config.queue)?;

    match cli.command {
        Commands::Rebuild { empty_live } => rebuild(&backend, &config, &queues, empty_live).await,
        Commands::Regenerate { count } => regenerate(&backend, &config, &queues, count).await,
    }
}

async fn rebuild(backend: &Backend, config: &Config, queues: &Queues, empty_live: bool) -> anyhow::Result<()> {
    if empty_live {
        let web = Container::new(backend, &config.object_store, "static-sites");
        let keys = web.list("").await?;
        info!(count = keys.len(), "emptying live web container before rebuild");
        for key in keys {
            web.delete(&key).await?;
        }
    }

    let job = PublishJob { markdown_blob: "cli-rebuild-trigger".into(), slug: "rebuild".into(), force_rebuild: true };
    let envelope = Envelope::new("rebuild_requested", "gazette-cli", format!("cli-rebuild-{}", chrono::Utc::now().timestamp()), job);
    let body = serde_json::to_string(&envelope)?;

    queues.publishing_requests_producer.send(&body).await?;
    info!("rebuild message enqueued");
    Ok(())
}

async fn regenerate(backend: &Backend, config: &Config, queues: &Queues, count: usize) -> anyhow::Result<()> {
    let processed = Container::new(backend, &config.object_store, "processed-content");
    let mut keys = processed.list("").await?;
    keys.sort();
    let recent: Vec<String> = keys.into_iter().rev().take(count).collect();

    info!(count = recent.len(), "regenerating markdown for the most recent articles");

    for key in recent {
        let bytes = processed.get(&key).await?;
        let article: ArticleArtifact = serde_json::from_slice(&bytes)?;
        let job: MarkdownJob = build_catchup_markdown_job(&article, &key);
        let envelope = Envelope::new("generate_markdown", "gazette-cli", format!("cli-regen-{}", job.slug), job);
        let body = serde_json::to_string(&envelope)?;
        queues.markdown_requests_producer.send(&body).await?;
        info!(article = %key, "regeneration message enqueued");
    }

    Ok(())
}
