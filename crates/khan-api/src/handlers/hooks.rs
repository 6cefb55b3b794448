//! Hook handlers

use axum::extract::State;
use khan_service::dto::{CreateHookRequest, CreatedResponse, EmptyResponse};
use khan_service::HookService;

use crate::extractors::{GamePath, HookPath, PathParams, ValidatedJson};
use crate::response::{ApiResult, Success};
use crate::state::AppState;

/// Subscribe a URL to an event type
///
/// POST /games/{game_id}/hooks
pub async fn create_hook(
    State(state): State<AppState>,
    PathParams(path): PathParams<GamePath>,
    ValidatedJson(request): ValidatedJson<CreateHookRequest>,
) -> ApiResult<Success<CreatedResponse>> {
    let service = HookService::new(state.service_context());
    let response = service.create_hook(&path.game_id, request).await?;
    Ok(Success(response))
}

/// DELETE /games/{game_id}/hooks/{hook_id}
pub async fn delete_hook(
    State(state): State<AppState>,
    PathParams(path): PathParams<HookPath>,
) -> ApiResult<Success<EmptyResponse>> {
    let service = HookService::new(state.service_context());
    let response = service.delete_hook(&path.game_id, &path.hook_id).await?;
    Ok(Success(response))
}
