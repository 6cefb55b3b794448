//! Background search index maintenance
//!
//! Transitions enqueue whole-document upserts and deletes after commit; a
//! small worker pool applies them to the search index with retries.

mod queue;
mod stats;

pub use queue::{IndexJob, IndexOp, IndexQueue, IndexQueueConfig};
pub use stats::{IndexStats, IndexStatsSnapshot};
