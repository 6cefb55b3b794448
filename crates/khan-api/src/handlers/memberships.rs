//! Membership handlers
//!
//! One handler per transition under `/clans/{clan_id}/memberships`.

use axum::extract::State;
use khan_service::dto::{
    ApplicationResponse, ApplyForMembershipRequest, EmptyResponse, InvitationReplyRequest,
    InviteForMembershipRequest, LevelResponse, MembershipActionRequest,
};
use khan_service::MembershipService;

use crate::extractors::{ClanPath, PathParams, ValidatedJson};
use crate::response::{ApiResult, Success};
use crate::state::AppState;

/// Player applies to a clan
///
/// POST .../memberships/application
pub async fn apply_for_membership(
    State(state): State<AppState>,
    PathParams(path): PathParams<ClanPath>,
    ValidatedJson(request): ValidatedJson<ApplyForMembershipRequest>,
) -> ApiResult<Success<ApplicationResponse>> {
    let service = MembershipService::new(state.service_context());
    let response = service
        .apply_for_membership(&path.game_id, &path.clan_id, request)
        .await?;
    Ok(Success(response))
}

/// POST .../memberships/application/approve
pub async fn approve_application(
    State(state): State<AppState>,
    PathParams(path): PathParams<ClanPath>,
    ValidatedJson(request): ValidatedJson<MembershipActionRequest>,
) -> ApiResult<Success<EmptyResponse>> {
    let service = MembershipService::new(state.service_context());
    let response = service
        .approve_application(&path.game_id, &path.clan_id, request)
        .await?;
    Ok(Success(response))
}

/// POST .../memberships/application/deny
pub async fn deny_application(
    State(state): State<AppState>,
    PathParams(path): PathParams<ClanPath>,
    ValidatedJson(request): ValidatedJson<MembershipActionRequest>,
) -> ApiResult<Success<EmptyResponse>> {
    let service = MembershipService::new(state.service_context());
    let response = service
        .deny_application(&path.game_id, &path.clan_id, request)
        .await?;
    Ok(Success(response))
}

/// Member invites a player
///
/// POST .../memberships/invitation
pub async fn invite_for_membership(
    State(state): State<AppState>,
    PathParams(path): PathParams<ClanPath>,
    ValidatedJson(request): ValidatedJson<InviteForMembershipRequest>,
) -> ApiResult<Success<EmptyResponse>> {
    let service = MembershipService::new(state.service_context());
    let response = service
        .invite_for_membership(&path.game_id, &path.clan_id, request)
        .await?;
    Ok(Success(response))
}

/// POST .../memberships/invitation/approve
pub async fn approve_invitation(
    State(state): State<AppState>,
    PathParams(path): PathParams<ClanPath>,
    ValidatedJson(request): ValidatedJson<InvitationReplyRequest>,
) -> ApiResult<Success<EmptyResponse>> {
    let service = MembershipService::new(state.service_context());
    let response = service
        .approve_invitation(&path.game_id, &path.clan_id, request)
        .await?;
    Ok(Success(response))
}

/// POST .../memberships/invitation/deny
pub async fn deny_invitation(
    State(state): State<AppState>,
    PathParams(path): PathParams<ClanPath>,
    ValidatedJson(request): ValidatedJson<InvitationReplyRequest>,
) -> ApiResult<Success<EmptyResponse>> {
    let service = MembershipService::new(state.service_context());
    let response = service
        .deny_invitation(&path.game_id, &path.clan_id, request)
        .await?;
    Ok(Success(response))
}

/// POST .../memberships/promote
pub async fn promote_member(
    State(state): State<AppState>,
    PathParams(path): PathParams<ClanPath>,
    ValidatedJson(request): ValidatedJson<MembershipActionRequest>,
) -> ApiResult<Success<LevelResponse>> {
    let service = MembershipService::new(state.service_context());
    let response = service
        .promote_member(&path.game_id, &path.clan_id, request)
        .await?;
    Ok(Success(response))
}

/// POST .../memberships/demote
pub async fn demote_member(
    State(state): State<AppState>,
    PathParams(path): PathParams<ClanPath>,
    ValidatedJson(request): ValidatedJson<MembershipActionRequest>,
) -> ApiResult<Success<LevelResponse>> {
    let service = MembershipService::new(state.service_context());
    let response = service
        .demote_member(&path.game_id, &path.clan_id, request)
        .await?;
    Ok(Success(response))
}

/// Kick a member, or leave when requestor and player are the same
///
/// POST .../memberships/delete
pub async fn delete_membership(
    State(state): State<AppState>,
    PathParams(path): PathParams<ClanPath>,
    ValidatedJson(request): ValidatedJson<MembershipActionRequest>,
) -> ApiResult<Success<EmptyResponse>> {
    let service = MembershipService::new(state.service_context());
    let response = service
        .delete_membership(&path.game_id, &path.clan_id, request)
        .await?;
    Ok(Success(response))
}
