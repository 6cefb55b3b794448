//! # khan-webhooks
//!
//! Fans committed domain events out to subscriber URLs.
//!
//! - [`HookRegistry`]: read-mostly `game → event type → hooks` map, loaded
//!   from the store at startup and refreshed on hook changes
//! - [`WebhookDispatcher`]: bounded queue drained by a fixed worker pool;
//!   enqueue never blocks and drops the event when the queue is full
//! - [`DispatcherStats`]: lock-free counters, also driving [`WebhookDispatcher::wait`]

mod dispatcher;
mod envelope;
mod registry;
mod stats;

pub use dispatcher::{DispatcherConfig, WebhookDispatcher, WebhookError};
pub use envelope::envelope;
pub use registry::HookRegistry;
pub use stats::{DispatcherStats, StatsSnapshot};
