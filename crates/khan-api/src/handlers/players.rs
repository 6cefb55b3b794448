//! Player handlers

use axum::extract::State;
use khan_service::dto::{
    CreatePlayerRequest, PlayerDetailsResponse, PlayerResponse, UpdatePlayerRequest,
};
use khan_service::PlayerService;

use crate::extractors::{GamePath, PathParams, PlayerPath, ValidatedJson};
use crate::response::{ApiResult, Success};
use crate::state::AppState;

/// Create a player
///
/// POST /games/{game_id}/players
pub async fn create_player(
    State(state): State<AppState>,
    PathParams(path): PathParams<GamePath>,
    ValidatedJson(request): ValidatedJson<CreatePlayerRequest>,
) -> ApiResult<Success<PlayerResponse>> {
    let service = PlayerService::new(state.service_context());
    let response = service.create_player(&path.game_id, request).await?;
    Ok(Success(response))
}

/// Update a player, creating it when absent
///
/// PUT /games/{game_id}/players/{player_id}
pub async fn upsert_player(
    State(state): State<AppState>,
    PathParams(path): PathParams<PlayerPath>,
    ValidatedJson(request): ValidatedJson<UpdatePlayerRequest>,
) -> ApiResult<Success<PlayerResponse>> {
    let service = PlayerService::new(state.service_context());
    let response = service
        .upsert_player(&path.game_id, &path.player_id, request)
        .await?;
    Ok(Success(response))
}

/// Player with counters and memberships
///
/// GET /games/{game_id}/players/{player_id}
pub async fn get_player(
    State(state): State<AppState>,
    PathParams(path): PathParams<PlayerPath>,
) -> ApiResult<Success<PlayerDetailsResponse>> {
    let service = PlayerService::new(state.service_context());
    let response = service.get_player(&path.game_id, &path.player_id).await?;
    Ok(Success(response))
}
