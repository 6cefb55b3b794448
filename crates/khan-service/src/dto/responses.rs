//! Response DTOs for API endpoints
//!
//! Field names are camelCase with the `publicID` spelling subscribers and
//! clients already rely on. The API wraps each of these in the
//! `{success, ...}` envelope, so every response is a JSON object.

use serde::Serialize;

use khan_core::entities::MembershipState;
use khan_core::value_objects::Metadata;

// ============================================================================
// Common
// ============================================================================

/// Response with no payload beyond `success`
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmptyResponse {}

/// Public id of a created entity
#[derive(Debug, Clone, Serialize)]
pub struct CreatedResponse {
    #[serde(rename = "publicID")]
    pub public_id: String,
}

// ============================================================================
// Player Responses
// ============================================================================

/// Player identity as embedded in clan and membership views
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    #[serde(rename = "publicID")]
    pub public_id: String,
    pub name: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    #[serde(rename = "publicID")]
    pub public_id: String,
    pub name: String,
    pub metadata: Metadata,
    pub membership_count: i32,
    pub ownership_count: i32,
}

/// Clan public ids grouped by the player's relation to them
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerClansDigest {
    pub owned: Vec<String>,
    pub approved: Vec<String>,
    pub pending_applications: Vec<String>,
    pub pending_invites: Vec<String>,
    pub denied: Vec<String>,
    pub banned: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMembershipResponse {
    pub level: String,
    pub state: MembershipState,
    pub message: String,
    pub clan: ClanSummaryResponse,
    #[serde(rename = "requestorPublicID")]
    pub requestor_public_id: Option<String>,
    #[serde(rename = "approverPublicID")]
    pub approver_public_id: Option<String>,
    #[serde(rename = "denierPublicID")]
    pub denier_public_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub approved_at: i64,
    pub denied_at: i64,
}

/// `GET /players/{publicID}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDetailsResponse {
    #[serde(flatten)]
    pub player: PlayerResponse,
    pub created_at: i64,
    pub updated_at: i64,
    pub clans: PlayerClansDigest,
    pub memberships: Vec<PlayerMembershipResponse>,
}

// ============================================================================
// Clan Responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanSummaryResponse {
    #[serde(rename = "publicID")]
    pub public_id: String,
    pub name: String,
    pub metadata: Metadata,
    pub membership_count: i32,
    pub allow_application: bool,
    pub auto_join: bool,
}

/// List of clans for list, multi-get, and search endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ClanListResponse {
    pub clans: Vec<ClanSummaryResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub level: String,
    pub message: String,
    pub player: PlayerSummary,
    #[serde(rename = "requestorPublicID")]
    pub requestor_public_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub approved_at: i64,
    pub denied_at: i64,
}

/// Live memberships of a clan grouped by state
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanRoster {
    pub members: Vec<RosterEntry>,
    pub pending_applications: Vec<RosterEntry>,
    pub pending_invites: Vec<RosterEntry>,
    pub denied: Vec<RosterEntry>,
    pub banned: Vec<RosterEntry>,
}

/// `GET /clans/{publicID}`
#[derive(Debug, Clone, Serialize)]
pub struct ClanDetailsResponse {
    #[serde(flatten)]
    pub clan: ClanSummaryResponse,
    pub owner: PlayerSummary,
    pub roster: ClanRoster,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveClanResponse {
    pub previous_owner: PlayerSummary,
    pub new_owner: Option<PlayerSummary>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOwnershipResponse {
    pub previous_owner: PlayerSummary,
    pub new_owner: PlayerSummary,
}

// ============================================================================
// Membership Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationResponse {
    /// Whether the clan approved the application on creation
    pub approved: bool,
}

/// Level after a promote or demote
#[derive(Debug, Clone, Serialize)]
pub struct LevelResponse {
    pub level: String,
}
