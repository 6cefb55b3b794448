//! Webhook dispatcher
//!
//! A bounded mpsc queue feeds `workers` tasks that share the receiver. Each
//! job carries one event and the hooks matched when it was emitted; a worker
//! POSTs the envelope to every hook in turn. Failures are counted and logged,
//! never retried.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use khan_common::WebhooksConfig;
use khan_core::entities::Hook;
use khan_core::traits::EventSink;
use khan_core::value_objects::now_ms;
use khan_core::DomainEvent;

use crate::envelope::envelope;
use crate::registry::HookRegistry;
use crate::stats::{DispatcherStats, StatsSnapshot};

/// Dispatcher tuning
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub workers: usize,
    pub buffer_size: usize,
    pub timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::from(&WebhooksConfig::default())
    }
}

impl From<&WebhooksConfig> for DispatcherConfig {
    fn from(config: &WebhooksConfig) -> Self {
        Self {
            workers: config.workers.max(1),
            buffer_size: config.buffer_size.max(1),
            timeout: config.timeout(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug)]
struct Job {
    event: DomainEvent,
    hooks: Vec<Hook>,
    enqueued_at: i64,
}

/// Webhook dispatcher, usable as the services' [`EventSink`]
pub struct WebhookDispatcher {
    sender: mpsc::Sender<Job>,
    registry: Arc<HookRegistry>,
    stats: Arc<DispatcherStats>,
    workers: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for WebhookDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookDispatcher")
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

impl WebhookDispatcher {
    /// Create the dispatcher and spawn its workers on the current runtime
    pub fn start(
        config: DispatcherConfig,
        registry: Arc<HookRegistry>,
    ) -> Result<Arc<Self>, WebhookError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let (sender, receiver) = mpsc::channel(config.buffer_size);
        let receiver = Arc::new(Mutex::new(receiver));
        let stats = Arc::new(DispatcherStats::default());

        let workers = (0..config.workers)
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                let stats = Arc::clone(&stats);
                let client = client.clone();
                tokio::spawn(async move { run_worker(worker, receiver, client, stats).await })
            })
            .collect();

        info!(
            workers = config.workers,
            buffer_size = config.buffer_size,
            timeout_ms = config.timeout.as_millis() as u64,
            "Webhook dispatcher started"
        );

        Ok(Arc::new(Self {
            sender,
            registry,
            stats,
            workers: parking_lot::Mutex::new(workers),
        }))
    }

    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Queue an event for every matching hook; never blocks.
    ///
    /// Returns false when the event was dropped because the queue is full.
    pub fn dispatch(&self, event: DomainEvent) -> bool {
        let hooks = self.registry.matching(&event.game_id, event.event_type);
        if hooks.is_empty() {
            return true;
        }

        self.stats.begin();
        let job = Job {
            event,
            hooks,
            enqueued_at: now_ms(),
        };
        match self.sender.try_send(job) {
            Ok(()) => {
                self.stats.enqueued();
                true
            }
            Err(err) => {
                let job = err.into_inner();
                self.stats.dropped();
                warn!(
                    game_id = %job.event.game_id,
                    event_type = %job.event.event_type,
                    hooks = job.hooks.len(),
                    "Webhook queue full, event dropped"
                );
                false
            }
        }
    }

    /// Resolve once every queued event has been delivered or failed
    pub async fn wait(&self) {
        self.stats.wait_idle().await;
    }

    /// Wait up to `grace` for the queue to drain, then stop the workers.
    ///
    /// Returns whether the queue drained in time.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        let drained = tokio::time::timeout(grace, self.wait()).await.is_ok();
        if !drained {
            warn!(
                in_flight = self.stats.in_flight(),
                "Webhook queue not drained within grace period"
            );
        }
        for worker in self.workers.lock().drain(..) {
            worker.abort();
        }
        info!(drained, "Webhook dispatcher stopped");
        drained
    }
}

impl EventSink for WebhookDispatcher {
    fn emit(&self, event: DomainEvent) {
        self.dispatch(event);
    }
}

async fn run_worker(
    worker: usize,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    client: reqwest::Client,
    stats: Arc<DispatcherStats>,
) {
    loop {
        let job = receiver.lock().await.recv().await;
        let Some(job) = job else {
            debug!(worker, "Webhook queue closed, worker exiting");
            return;
        };
        for hook in &job.hooks {
            if deliver(&client, hook, &job).await {
                stats.delivered();
            } else {
                stats.failed();
            }
        }
        stats.finish();
    }
}

#[instrument(skip(client, job), fields(hook_id = %hook.public_id, url = %hook.url, event_type = %job.event.event_type))]
async fn deliver(client: &reqwest::Client, hook: &Hook, job: &Job) -> bool {
    let body = envelope(&job.event, job.enqueued_at);
    match client.post(&hook.url).json(&body).send().await {
        Ok(response) if response.status().as_u16() < 400 => {
            debug!(status = response.status().as_u16(), "Webhook delivered");
            true
        }
        Ok(response) => {
            warn!(status = response.status().as_u16(), "Webhook rejected");
            false
        }
        Err(e) => {
            warn!(error = %e, "Webhook request failed");
            false
        }
    }
}
