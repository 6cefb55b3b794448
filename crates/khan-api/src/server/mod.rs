//! Server setup and initialization
//!
//! Wires the store, search index, index queue, hook registry, webhook
//! dispatcher and summary cache into an [`AppState`], then serves it until
//! SIGINT/SIGTERM and drains background work for `graceperiod.ms`.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use khan_cache::{RedisClanIndex, RedisPool, RedisPoolConfig, RedisPoolError, TtlCache, TtlCacheConfig};
use khan_common::{AppConfig, CipherError, NameCipher};
use khan_core::traits::{ClanSearchIndex, Store};
use khan_core::DomainError;
use khan_db::{create_pool, DatabaseConfig, PgStore};
use khan_service::{IndexQueue, IndexQueueConfig, ServiceContextBuilder, ServiceError};
use khan_webhooks::{DispatcherConfig, HookRegistry, WebhookDispatcher, WebhookError};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::middleware::apply_middleware;
use crate::routes::create_router;
use crate::state::AppState;

/// Startup and serving failures
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Redis(#[from] RedisPoolError),

    #[error(transparent)]
    Webhooks(#[from] WebhookError),

    #[error("Failed to load hooks: {0}")]
    Hooks(#[from] DomainError),

    #[error("Failed to build service context: {0}")]
    Context(#[from] ServiceError),

    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config().server.request_timeout_secs.max(1));
    let router = create_router();
    let router = apply_middleware(router, timeout);
    router.with_state(state)
}

/// Connect PostgreSQL and the Redis search index, then build the state
pub async fn create_app_state(config: AppConfig) -> Result<AppState, ServerError> {
    let cipher = Arc::new(NameCipher::from_key(
        config.security.encryption_key.as_deref(),
    )?);
    if cipher.is_enabled() {
        info!("Player name encryption enabled");
    }

    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&DatabaseConfig::from(&config.postgres))
        .await
        .map_err(|e| ServerError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    let redis = RedisPool::new(RedisPoolConfig::for_search(&config))?;
    let index = Arc::new(RedisClanIndex::new(redis, config.search.clone()));
    if let Err(e) = index.ping().await {
        warn!(error = %e, "Search store unreachable, index jobs will retry");
    }

    build_state(config, Arc::new(PgStore::new(pool, cipher)), index).await
}

/// Start the background workers over the given stores and build the state
///
/// Must run inside a Tokio runtime.
pub async fn build_state(
    config: AppConfig,
    store: Arc<dyn Store>,
    index: Arc<dyn ClanSearchIndex>,
) -> Result<AppState, ServerError> {
    let index_queue = IndexQueue::start(IndexQueueConfig::from(&config.search), index);

    let registry = Arc::new(HookRegistry::new());
    let hooks = registry.load(store.as_ref()).await?;
    info!(hooks, "Hook registry loaded");

    let dispatcher = WebhookDispatcher::start(
        DispatcherConfig::from(&config.webhooks),
        Arc::clone(&registry),
    )?;

    let summaries = Arc::new(TtlCache::new(TtlCacheConfig::from(&config.cache)));
    summaries.spawn_cleanup();

    let service_context = ServiceContextBuilder::new()
        .store(store)
        .index_queue(index_queue)
        .events(dispatcher.clone())
        .hooks(registry)
        .summaries(summaries)
        .defaults(config.khan.clone())
        .max_search_results(config.search.max_results)
        .build()?;

    Ok(AppState::new(service_context, config, Some(dispatcher)))
}

/// Serve `app` until `shutdown` resolves
pub async fn run_server(
    app: Router,
    listener: TcpListener,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), ServerError> {
    let addr = config.server.address();
    let grace = config.graceperiod.duration();

    let state = create_app_state(config).await?;
    let app = create_app(state.clone());

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("Server listening on http://{}", addr);

    run_server(app, listener, shutdown_signal()).await?;

    info!(grace_ms = grace.as_millis() as u64, "HTTP server stopped, draining");
    state.drain(grace).await;
    Ok(())
}

/// Resolve on SIGINT, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Received shutdown signal");
}
