//! PostgreSQL implementation of the repository ports
//!
//! [`PgStore`] hands out [`PgTransaction`]s; each entity file implements one
//! repository trait for the transaction.

mod clan;
mod error;
mod game;
mod hook;
mod membership;
mod player;
mod postgres;

pub use postgres::{PgStore, PgTransaction};
