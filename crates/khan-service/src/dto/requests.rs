//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate`. Required fields
//! are `Option` with a `required` rule so a payload missing several of them
//! is rejected with every message at once.

use serde::Deserialize;
use validator::Validate;

use khan_core::value_objects::{MembershipLevels, Metadata};

// ============================================================================
// Game Requests
// ============================================================================

/// Game configuration, shared by create and upsert
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GameRequest {
    /// Only read on create; upsert takes the id from the path
    #[serde(rename = "publicID")]
    #[validate(length(min = 1, max = 255, message = "publicID must be 1-255 characters"))]
    pub public_id: Option<String>,

    #[validate(
        required(message = "name is required"),
        length(min = 1, max = 2000, message = "name must be 1-2000 characters")
    )]
    pub name: Option<String>,

    #[validate(required(message = "membershipLevels is required"))]
    pub membership_levels: Option<MembershipLevels>,

    #[serde(default)]
    pub metadata: Metadata,

    #[validate(required(message = "minLevelToAcceptApplication is required"))]
    pub min_level_to_accept_application: Option<i32>,

    #[validate(required(message = "minLevelToCreateInvitation is required"))]
    pub min_level_to_create_invitation: Option<i32>,

    #[validate(required(message = "minLevelToRemoveMember is required"))]
    pub min_level_to_remove_member: Option<i32>,

    #[validate(required(message = "minLevelOffsetToRemoveMember is required"))]
    pub min_level_offset_to_remove_member: Option<i32>,

    #[validate(required(message = "minLevelOffsetToPromoteMember is required"))]
    pub min_level_offset_to_promote_member: Option<i32>,

    #[validate(required(message = "minLevelOffsetToDemoteMember is required"))]
    pub min_level_offset_to_demote_member: Option<i32>,

    #[validate(required(message = "maxMembers is required"))]
    pub max_members: Option<i32>,

    #[validate(required(message = "maxClansPerPlayer is required"))]
    pub max_clans_per_player: Option<i32>,

    #[validate(required(message = "cooldownAfterDeny is required"))]
    pub cooldown_after_deny: Option<i32>,

    #[validate(required(message = "cooldownAfterDelete is required"))]
    pub cooldown_after_delete: Option<i32>,

    /// Falls back to `khan.defaultCooldownBeforeApply`
    pub cooldown_before_apply: Option<i32>,

    /// Falls back to `khan.defaultCooldownBeforeInvite`
    pub cooldown_before_invite: Option<i32>,

    /// Falls back to `khan.maxPendingInvites`
    pub max_pending_invites: Option<i32>,

    #[serde(default)]
    pub clan_hook_fields_whitelist: String,

    #[serde(default)]
    pub player_hook_fields_whitelist: String,
}

// ============================================================================
// Player Requests
// ============================================================================

/// Create player request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlayerRequest {
    #[serde(rename = "publicID")]
    #[validate(
        required(message = "publicID is required"),
        length(min = 1, max = 255, message = "publicID must be 1-255 characters")
    )]
    pub public_id: Option<String>,

    #[validate(
        required(message = "name is required"),
        length(min = 1, max = 2000, message = "name must be 1-2000 characters")
    )]
    pub name: Option<String>,

    #[serde(default)]
    pub metadata: Metadata,
}

/// Update (or create) player request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayerRequest {
    #[validate(
        required(message = "name is required"),
        length(min = 1, max = 2000, message = "name must be 1-2000 characters")
    )]
    pub name: Option<String>,

    #[serde(default)]
    pub metadata: Metadata,
}

// ============================================================================
// Clan Requests
// ============================================================================

/// Create clan request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClanRequest {
    #[serde(rename = "publicID")]
    #[validate(
        required(message = "publicID is required"),
        length(min = 1, max = 255, message = "publicID must be 1-255 characters")
    )]
    pub public_id: Option<String>,

    #[validate(
        required(message = "name is required"),
        length(min = 1, max = 2000, message = "name must be 1-2000 characters")
    )]
    pub name: Option<String>,

    #[serde(rename = "ownerPublicID")]
    #[validate(required(message = "ownerPublicID is required"))]
    pub owner_public_id: Option<String>,

    #[serde(default)]
    pub metadata: Metadata,

    #[validate(required(message = "allowApplication is required"))]
    pub allow_application: Option<bool>,

    #[validate(required(message = "autoJoin is required"))]
    pub auto_join: Option<bool>,
}

/// Update clan request; `ownerPublicID` must name the current owner
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClanRequest {
    #[validate(
        required(message = "name is required"),
        length(min = 1, max = 2000, message = "name must be 1-2000 characters")
    )]
    pub name: Option<String>,

    #[serde(rename = "ownerPublicID")]
    #[validate(required(message = "ownerPublicID is required"))]
    pub owner_public_id: Option<String>,

    #[serde(default)]
    pub metadata: Metadata,

    #[validate(required(message = "allowApplication is required"))]
    pub allow_application: Option<bool>,

    #[validate(required(message = "autoJoin is required"))]
    pub auto_join: Option<bool>,
}

/// Transfer ownership request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransferOwnershipRequest {
    #[serde(rename = "playerPublicID")]
    #[validate(required(message = "playerPublicID is required"))]
    pub player_public_id: Option<String>,
}

// ============================================================================
// Membership Requests
// ============================================================================

/// Player applies to a clan
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplyForMembershipRequest {
    #[validate(required(message = "level is required"))]
    pub level: Option<String>,

    #[serde(rename = "playerPublicID")]
    #[validate(required(message = "playerPublicID is required"))]
    pub player_public_id: Option<String>,

    #[serde(default)]
    #[validate(length(max = 2000, message = "message must be at most 2000 characters"))]
    pub message: String,
}

/// Clan member invites a player
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InviteForMembershipRequest {
    #[validate(required(message = "level is required"))]
    pub level: Option<String>,

    #[serde(rename = "playerPublicID")]
    #[validate(required(message = "playerPublicID is required"))]
    pub player_public_id: Option<String>,

    #[serde(rename = "requestorPublicID")]
    #[validate(required(message = "requestorPublicID is required"))]
    pub requestor_public_id: Option<String>,

    #[serde(default)]
    #[validate(length(max = 2000, message = "message must be at most 2000 characters"))]
    pub message: String,
}

/// Acting member targets a player's membership: approve or deny an
/// application, promote, demote, or delete
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MembershipActionRequest {
    #[serde(rename = "playerPublicID")]
    #[validate(required(message = "playerPublicID is required"))]
    pub player_public_id: Option<String>,

    #[serde(rename = "requestorPublicID")]
    #[validate(required(message = "requestorPublicID is required"))]
    pub requestor_public_id: Option<String>,
}

/// Invitee answers an invitation
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InvitationReplyRequest {
    #[serde(rename = "playerPublicID")]
    #[validate(required(message = "playerPublicID is required"))]
    pub player_public_id: Option<String>,
}

// ============================================================================
// Hook Requests
// ============================================================================

/// Register a webhook
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateHookRequest {
    /// Event type code
    #[serde(rename = "type")]
    #[validate(
        required(message = "type is required"),
        range(min = 0, message = "type must be a known event type")
    )]
    pub event_type: Option<i32>,

    #[serde(rename = "hookURL")]
    #[validate(
        required(message = "hookURL is required"),
        length(min = 1, max = 2000, message = "hookURL must be 1-2000 characters"),
        url(message = "hookURL must be a valid URL")
    )]
    pub hook_url: Option<String>,
}

// ============================================================================
// Query Parameters
// ============================================================================

/// `GET /clans-summary?clanPublicIds=a,b,c`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClanSummariesQuery {
    #[validate(
        required(message = "clanPublicIds is required"),
        length(min = 1, message = "clanPublicIds is required")
    )]
    pub clan_public_ids: Option<String>,
}

impl ClanSummariesQuery {
    /// Non-empty ids from the comma-separated list
    pub fn ids(&self) -> Vec<String> {
        self.clan_public_ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// `GET /clan-search?term=...`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ClanSearchQuery {
    #[validate(
        required(message = "term is required"),
        length(min = 1, max = 255, message = "term must be 1-255 characters")
    )]
    pub term: Option<String>,
}
