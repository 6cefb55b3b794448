//! Game handlers

use axum::extract::State;
use khan_service::dto::{CreatedResponse, EmptyResponse, GameRequest};
use khan_service::GameService;

use crate::extractors::{GamePath, PathParams, ValidatedJson};
use crate::response::{ApiResult, Success};
use crate::state::AppState;

/// Create a game
///
/// POST /games
pub async fn create_game(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<GameRequest>,
) -> ApiResult<Success<CreatedResponse>> {
    let service = GameService::new(state.service_context());
    let response = service.create_game(request).await?;
    Ok(Success(response))
}

/// Update a game, creating it when absent
///
/// PUT /games/{game_id}
pub async fn upsert_game(
    State(state): State<AppState>,
    PathParams(path): PathParams<GamePath>,
    ValidatedJson(request): ValidatedJson<GameRequest>,
) -> ApiResult<Success<EmptyResponse>> {
    let service = GameService::new(state.service_context());
    let response = service.upsert_game(&path.game_id, request).await?;
    Ok(Success(response))
}
