//! Health and status handlers

use axum::{extract::State, http::StatusCode};
use khan_service::IndexStatsSnapshot;
use khan_webhooks::StatsSnapshot;
use serde::Serialize;
use tracing::warn;

use crate::response::Success;
use crate::state::AppState;

/// Liveness probe that also checks the primary store
///
/// GET /healthcheck
pub async fn healthcheck(State(state): State<AppState>) -> (StatusCode, String) {
    match state.service_context().store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            state.config().healthcheck.working_text.clone(),
        ),
        Err(e) => {
            warn!(error = %e, "Healthcheck failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Background worker counters
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub webhooks: StatsSnapshot,
    pub index_queue: IndexStatsSnapshot,
}

/// GET /status
pub async fn status(State(state): State<AppState>) -> Success<StatusResponse> {
    Success(StatusResponse {
        webhooks: state.dispatcher_stats(),
        index_queue: state.index_stats(),
    })
}
