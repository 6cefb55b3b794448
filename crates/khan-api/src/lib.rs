//! # khan-api
//!
//! HTTP facade built with Axum. Handlers validate payloads, call one
//! service transition each, and map errors onto the `{success, reason}`
//! envelope.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, create_app_state, run, ServerError};
pub use state::AppState;
