//! Application state
//!
//! Holds the shared state for the Axum application: the service context,
//! the configuration, and the background workers drained on shutdown.

use std::sync::Arc;
use std::time::Duration;

use khan_common::AppConfig;
use khan_service::{IndexStatsSnapshot, ServiceContext};
use khan_webhooks::{StatsSnapshot, WebhookDispatcher};
use tracing::info;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Service context containing all dependencies
    service_context: Arc<ServiceContext>,
    /// Application configuration
    config: Arc<AppConfig>,
    /// Webhook dispatcher, absent when events go elsewhere
    dispatcher: Option<Arc<WebhookDispatcher>>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(
        service_context: ServiceContext,
        config: AppConfig,
        dispatcher: Option<Arc<WebhookDispatcher>>,
    ) -> Self {
        Self {
            service_context: Arc::new(service_context),
            config: Arc::new(config),
            dispatcher,
        }
    }

    /// Get the service context
    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> Option<&Arc<WebhookDispatcher>> {
        self.dispatcher.as_ref()
    }

    pub fn dispatcher_stats(&self) -> StatsSnapshot {
        self.dispatcher
            .as_ref()
            .map(|dispatcher| dispatcher.stats())
            .unwrap_or_default()
    }

    pub fn index_stats(&self) -> IndexStatsSnapshot {
        self.service_context.index_queue().stats()
    }

    /// Give the dispatcher and the index queue up to `grace` each to drain
    pub async fn drain(&self, grace: Duration) {
        let webhooks_drained = match &self.dispatcher {
            Some(dispatcher) => dispatcher.shutdown(grace).await,
            None => true,
        };
        let index_drained = self.service_context.index_queue().shutdown(grace).await;
        info!(webhooks_drained, index_drained, "Background work drained");
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service_context", &"ServiceContext")
            .field("config", &"AppConfig")
            .field("dispatcher", &self.dispatcher.is_some())
            .finish()
    }
}
