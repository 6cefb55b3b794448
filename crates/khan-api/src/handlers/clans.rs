//! Clan handlers

use axum::extract::State;
use khan_service::dto::{
    ClanDetailsResponse, ClanListResponse, ClanSearchQuery, ClanSummariesQuery,
    ClanSummaryResponse, CreateClanRequest, CreatedResponse, EmptyResponse, LeaveClanResponse,
    TransferOwnershipRequest, TransferOwnershipResponse, UpdateClanRequest,
};
use khan_service::ClanService;

use crate::extractors::{ClanPath, GamePath, PathParams, ValidatedJson, ValidatedQuery};
use crate::response::{ApiResult, Success};
use crate::state::AppState;

/// Create a clan
///
/// POST /games/{game_id}/clans
pub async fn create_clan(
    State(state): State<AppState>,
    PathParams(path): PathParams<GamePath>,
    ValidatedJson(request): ValidatedJson<CreateClanRequest>,
) -> ApiResult<Success<CreatedResponse>> {
    let service = ClanService::new(state.service_context());
    let response = service.create_clan(&path.game_id, request).await?;
    Ok(Success(response))
}

/// Update a clan; only its owner may
///
/// PUT /games/{game_id}/clans/{clan_id}
pub async fn update_clan(
    State(state): State<AppState>,
    PathParams(path): PathParams<ClanPath>,
    ValidatedJson(request): ValidatedJson<UpdateClanRequest>,
) -> ApiResult<Success<EmptyResponse>> {
    let service = ClanService::new(state.service_context());
    let response = service
        .update_clan(&path.game_id, &path.clan_id, request)
        .await?;
    Ok(Success(response))
}

/// GET /games/{game_id}/clans
pub async fn list_clans(
    State(state): State<AppState>,
    PathParams(path): PathParams<GamePath>,
) -> ApiResult<Success<ClanListResponse>> {
    let service = ClanService::new(state.service_context());
    let response = service.list_clans(&path.game_id).await?;
    Ok(Success(response))
}

/// Clan with owner and roster
///
/// GET /games/{game_id}/clans/{clan_id}
pub async fn get_clan(
    State(state): State<AppState>,
    PathParams(path): PathParams<ClanPath>,
) -> ApiResult<Success<ClanDetailsResponse>> {
    let service = ClanService::new(state.service_context());
    let response = service.get_clan(&path.game_id, &path.clan_id).await?;
    Ok(Success(response))
}

/// GET /games/{game_id}/clans/{clan_id}/summary
pub async fn get_clan_summary(
    State(state): State<AppState>,
    PathParams(path): PathParams<ClanPath>,
) -> ApiResult<Success<ClanSummaryResponse>> {
    let service = ClanService::new(state.service_context());
    let response = service
        .get_clan_summary(&path.game_id, &path.clan_id)
        .await?;
    Ok(Success(response))
}

/// Summaries for a comma-separated list of clans, served from cache
///
/// GET /games/{game_id}/clans-summary?clanPublicIds=a,b,c
pub async fn get_clan_summaries(
    State(state): State<AppState>,
    PathParams(path): PathParams<GamePath>,
    ValidatedQuery(query): ValidatedQuery<ClanSummariesQuery>,
) -> ApiResult<Success<ClanListResponse>> {
    let service = ClanService::new(state.service_context());
    let response = service
        .get_clan_summaries(&path.game_id, &query.ids())
        .await?;
    Ok(Success(response))
}

/// GET /games/{game_id}/clan-search?term=...
pub async fn search_clans(
    State(state): State<AppState>,
    PathParams(path): PathParams<GamePath>,
    ValidatedQuery(query): ValidatedQuery<ClanSearchQuery>,
) -> ApiResult<Success<ClanListResponse>> {
    let term = query.term.unwrap_or_default();
    let service = ClanService::new(state.service_context());
    let response = service.search_clans(&path.game_id, &term).await?;
    Ok(Success(response))
}

/// Owner leaves; the clan is handed over or deleted
///
/// POST /games/{game_id}/clans/{clan_id}/leave
pub async fn leave_clan(
    State(state): State<AppState>,
    PathParams(path): PathParams<ClanPath>,
) -> ApiResult<Success<LeaveClanResponse>> {
    let service = ClanService::new(state.service_context());
    let response = service.leave_clan(&path.game_id, &path.clan_id).await?;
    Ok(Success(response))
}

/// POST /games/{game_id}/clans/{clan_id}/transfer-ownership
pub async fn transfer_ownership(
    State(state): State<AppState>,
    PathParams(path): PathParams<ClanPath>,
    ValidatedJson(request): ValidatedJson<TransferOwnershipRequest>,
) -> ApiResult<Success<TransferOwnershipResponse>> {
    let service = ClanService::new(state.service_context());
    let response = service
        .transfer_ownership(&path.game_id, &path.clan_id, request)
        .await?;
    Ok(Success(response))
}
