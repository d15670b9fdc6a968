//! Shared worker lifecycle for every long-running stage binary.
//!
//! A [`Worker`] implements one poll iteration; [`WorkerRunner`] drives it in
//! a loop with signal handling and a bounded graceful-shutdown window: on
//! `SIGINT`/`SIGTERM` the runner stops requesting new iterations, waits for
//! the in-flight one to finish up to `shutdown_timeout`, then returns. It
//! never tries to drain the queue on the way out (§5).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("{0}")]
    Other(String),
}

/// One pipeline-stage worker. `poll_once` is called repeatedly by the
/// runner until shutdown; it should perform at most one unit of work
/// (poll the queue once, process what it finds) and return quickly when
/// there is nothing to do, so shutdown can be observed promptly.
#[async_trait]
pub trait Worker: Send + Sync {
    fn name(&self) -> &str;

    async fn start(&self) -> Result<(), WorkerError> {
        Ok(())
    }

    async fn poll_once(&self) -> Result<(), WorkerError>;

    async fn stop(&self) -> Result<(), WorkerError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WorkerRunnerConfig {
    pub name: String,
    pub shutdown_timeout: Duration,
    pub idle_sleep: Duration,
}

impl WorkerRunnerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shutdown_timeout: Duration::from_secs(10),
            idle_sleep: Duration::from_millis(50),
        }
    }

    pub fn with_shutdown_timeout(mut self, d: Duration) -> Self {
        self.shutdown_timeout = d;
        self
    }
}

pub struct WorkerRunner;

impl WorkerRunner {
    /// Run `worker` until shutdown is requested, either externally via
    /// `shutdown_notify` or by OS signal.
    pub async fn run(
        worker: Arc<dyn Worker>,
        config: WorkerRunnerConfig,
        shutdown_notify: Option<Arc<Notify>>,
    ) -> Result<(), WorkerError> {
        let name = config.name.clone();
        info!(worker = %name, "starting worker");
        worker.start().await?;

        let shutdown = Arc::new(Notify::new());

        let sig_shutdown = shutdown.clone();
        let sig_name = name.clone();
        let signal_handle = tokio::spawn(async move {
            wait_for_shutdown(shutdown_notify).await;
            info!(worker = %sig_name, "shutdown signal received");
            sig_shutdown.notify_waiters();
        });

        let poll_worker = worker.clone();
        let poll_shutdown = shutdown.clone();
        let poll_name = name.clone();
        let idle_sleep = config.idle_sleep;
        let poll_handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = poll_shutdown.notified() => break,
                    result = poll_worker.poll_once() => {
                        if let Err(e) = result {
                            warn!(worker = %poll_name, error = %e, "poll_once failed");
                        }
                        tokio::time::sleep(idle_sleep).await;
                    }
                }
            }
        });

        shutdown.notified().await;
        signal_handle.abort();

        info!(worker = %name, timeout = ?config.shutdown_timeout, "stopping worker");
        match tokio::time::timeout(config.shutdown_timeout, poll_handle).await {
            Ok(Ok(())) => info!(worker = %name, "worker loop exited cleanly"),
            Ok(Err(e)) => warn!(worker = %name, error = %e, "worker loop task panicked"),
            Err(_) => warn!(worker = %name, "poll loop did not exit within shutdown timeout, forcing"),
        }

        match worker.stop().await {
            Ok(()) => info!(worker = %name, "worker stopped gracefully"),
            Err(e) => warn!(worker = %name, error = %e, "worker stop returned error"),
        }

        Ok(())
    }
}

async fn wait_for_shutdown(external: Option<Arc<Notify>>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("install SIGINT handler");
        if let Some(ext) = external {
            tokio::select! {
                _ = sigterm.recv() => {}
                _ = sigint.recv() => {}
                _ = ext.notified() => {}
            }
        } else {
            tokio::select! {
                _ = sigterm.recv() => {}
                _ = sigint.recv() => {}
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Some(ext) = external {
            ext.notified().await;
        } else {
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}
