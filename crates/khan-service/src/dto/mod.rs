//! Data transfer objects for API requests and responses
//!
//! This module provides:
//! - Request DTOs with validation for API inputs
//! - Response DTOs for serializing API outputs
//! - Mappers for converting domain entities to DTOs

pub mod mappers;
pub mod requests;
pub mod responses;

// Re-export commonly used request types
pub use requests::{
    ApplyForMembershipRequest, ClanSearchQuery, ClanSummariesQuery, CreateClanRequest,
    CreateHookRequest, CreatePlayerRequest, GameRequest, InvitationReplyRequest,
    InviteForMembershipRequest, MembershipActionRequest, TransferOwnershipRequest,
    UpdateClanRequest, UpdatePlayerRequest,
};

// Re-export commonly used response types
pub use responses::{
    ApplicationResponse, ClanDetailsResponse, ClanListResponse, ClanRoster, ClanSummaryResponse,
    CreatedResponse, EmptyResponse, LeaveClanResponse, LevelResponse, PlayerClansDigest,
    PlayerDetailsResponse, PlayerMembershipResponse, PlayerResponse, PlayerSummary, RosterEntry,
    TransferOwnershipResponse,
};
