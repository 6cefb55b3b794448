//! # khan-db
//!
//! Store layer implementing the repository traits with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! This crate provides the implementations of the `khan-core` store ports:
//!
//! - Connection pool management and migrations
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers (player names go through the name cipher)
//! - [`PgStore`], whose transactions implement every repository trait
//! - [`MemoryStore`], an in-process store with the same constraints
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use khan_db::{create_pool, DatabaseConfig, PgStore};
//! use khan_core::traits::{Isolation, Store};
//!
//! async fn example(cipher: Arc<khan_common::NameCipher>) -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::default()).await?;
//!     let store = PgStore::new(pool, cipher);
//!     let mut tx = store.begin(Isolation::ReadCommitted).await?;
//!     let game = tx.find_game("my-game").await?;
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::MemoryStore;
pub use pool::{create_pool, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{PgStore, PgTransaction};
