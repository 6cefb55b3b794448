//! Service context - dependency container for services
//!
//! Holds the primary store, the index job queue, the event sink, and the
//! shared caches every transition needs.

use std::sync::Arc;

use tracing::warn;

use khan_cache::{TtlCache, TtlCacheConfig};
use khan_common::{CacheConfig, KhanDefaults, SearchConfig};
use khan_core::traits::{ClanSearchIndex, EventSink, Isolation, Store, Transaction};
use khan_core::value_objects::{Clock, SystemClock};
use khan_core::DomainEvent;
use khan_webhooks::HookRegistry;

use super::error::{ServiceError, ServiceResult};
use crate::dto::ClanSummaryResponse;
use crate::indexing::{IndexJob, IndexQueue};

/// Cache of `clans-summary` results keyed by game and sorted public ids
pub type SummaryCache = TtlCache<Vec<ClanSummaryResponse>>;

/// Service context containing all dependencies
///
/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct ServiceContext {
    store: Arc<dyn Store>,
    index_queue: Arc<IndexQueue>,
    events: Arc<dyn EventSink>,
    hooks: Option<Arc<HookRegistry>>,
    summaries: Arc<SummaryCache>,
    clock: Arc<dyn Clock>,
    defaults: KhanDefaults,
    max_search_results: usize,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn Store>,
        index_queue: Arc<IndexQueue>,
        events: Arc<dyn EventSink>,
        hooks: Option<Arc<HookRegistry>>,
        summaries: Arc<SummaryCache>,
        clock: Arc<dyn Clock>,
        defaults: KhanDefaults,
        max_search_results: usize,
    ) -> Self {
        Self {
            store,
            index_queue,
            events,
            hooks,
            summaries,
            clock,
            defaults,
            max_search_results,
        }
    }

    // === Stores ===

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Begin a transaction on the primary store
    pub async fn begin(&self, isolation: Isolation) -> ServiceResult<Box<dyn Transaction>> {
        Ok(self.store.begin(isolation).await?)
    }

    pub fn search_index(&self) -> &dyn ClanSearchIndex {
        self.index_queue.index().as_ref()
    }

    pub fn index_queue(&self) -> &Arc<IndexQueue> {
        &self.index_queue
    }

    pub fn summaries(&self) -> &SummaryCache {
        self.summaries.as_ref()
    }

    pub fn hooks(&self) -> Option<&Arc<HookRegistry>> {
        self.hooks.as_ref()
    }

    // === Settings ===

    pub fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn defaults(&self) -> &KhanDefaults {
        &self.defaults
    }

    pub fn max_search_results(&self) -> usize {
        self.max_search_results
    }

    // === Post-commit hand-off ===

    /// Commit, then emit `events` in order and queue `index_jobs`.
    ///
    /// Nothing is emitted when the commit fails.
    pub(crate) async fn commit(
        &self,
        tx: Box<dyn Transaction>,
        events: Vec<DomainEvent>,
        index_jobs: Vec<IndexJob>,
    ) -> ServiceResult<()> {
        tx.commit().await?;
        for event in events {
            self.events.emit(event);
        }
        for job in index_jobs {
            if !self.index_queue.enqueue(job) {
                warn!("Search index update skipped, queue full");
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("store", &"dyn Store")
            .field("index_queue", &self.index_queue)
            .field("hooks", &self.hooks.is_some())
            .field("defaults", &self.defaults)
            .field("max_search_results", &self.max_search_results)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
///
/// The store, index queue and event sink are required; the rest fall back
/// to the configuration defaults and the wall clock.
pub struct ServiceContextBuilder {
    store: Option<Arc<dyn Store>>,
    index_queue: Option<Arc<IndexQueue>>,
    events: Option<Arc<dyn EventSink>>,
    hooks: Option<Arc<HookRegistry>>,
    summaries: Option<Arc<SummaryCache>>,
    clock: Option<Arc<dyn Clock>>,
    defaults: KhanDefaults,
    max_search_results: usize,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            index_queue: None,
            events: None,
            hooks: None,
            summaries: None,
            clock: None,
            defaults: KhanDefaults::default(),
            max_search_results: SearchConfig::default().max_results,
        }
    }

    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn index_queue(mut self, queue: Arc<IndexQueue>) -> Self {
        self.index_queue = Some(queue);
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// Registry refreshed after hook changes
    pub fn hooks(mut self, hooks: Arc<HookRegistry>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn summaries(mut self, summaries: Arc<SummaryCache>) -> Self {
        self.summaries = Some(summaries);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn defaults(mut self, defaults: KhanDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn max_search_results(mut self, max_search_results: usize) -> Self {
        self.max_search_results = max_search_results;
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let summaries = self.summaries.unwrap_or_else(|| {
            Arc::new(TtlCache::new(TtlCacheConfig::from(&CacheConfig::default())))
        });
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);

        Ok(ServiceContext::new(
            self.store
                .ok_or_else(|| ServiceError::validation("store is required"))?,
            self.index_queue
                .ok_or_else(|| ServiceError::validation("index_queue is required"))?,
            self.events
                .ok_or_else(|| ServiceError::validation("events is required"))?,
            self.hooks,
            summaries,
            clock,
            self.defaults,
            self.max_search_results.max(1),
        ))
    }
}

impl Default for ServiceContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
