//! Integration test utilities for the clan service
//!
//! Runs the full router over the in-process store and search index on an
//! ephemeral port, with a local receiver standing in for webhook
//! subscribers.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
