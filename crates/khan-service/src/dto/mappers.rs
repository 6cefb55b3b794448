//! Entity to DTO mappers
//!
//! Implements `From` conversions from domain entities to response DTOs, and
//! the request-to-entity conversion for game configuration.

use khan_common::KhanDefaults;
use khan_core::entities::{Clan, Game, Membership, Player};
use khan_core::ClanDocument;

use super::requests::GameRequest;
use super::responses::{
    ClanSummaryResponse, PlayerResponse, PlayerSummary, RosterEntry,
};

// ============================================================================
// Player Mappers
// ============================================================================

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            public_id: player.public_id.clone(),
            name: player.name.clone(),
            metadata: player.metadata.clone(),
        }
    }
}

impl From<&Player> for PlayerResponse {
    fn from(player: &Player) -> Self {
        Self {
            public_id: player.public_id.clone(),
            name: player.name.clone(),
            metadata: player.metadata.clone(),
            membership_count: player.membership_count,
            ownership_count: player.ownership_count,
        }
    }
}

// ============================================================================
// Clan Mappers
// ============================================================================

impl From<&Clan> for ClanSummaryResponse {
    fn from(clan: &Clan) -> Self {
        Self {
            public_id: clan.public_id.clone(),
            name: clan.name.clone(),
            metadata: clan.metadata.clone(),
            membership_count: clan.membership_count,
            allow_application: clan.allow_application,
            auto_join: clan.auto_join,
        }
    }
}

impl From<&ClanDocument> for ClanSummaryResponse {
    fn from(document: &ClanDocument) -> Self {
        Self {
            public_id: document.public_id.clone(),
            name: document.name.clone(),
            metadata: document.metadata.clone(),
            membership_count: document.membership_count,
            allow_application: document.allow_application,
            auto_join: document.auto_join,
        }
    }
}

impl RosterEntry {
    pub fn new(membership: &Membership, player: &Player, requestor: Option<&Player>) -> Self {
        Self {
            level: membership.level.clone(),
            message: membership.message.clone(),
            player: PlayerSummary::from(player),
            requestor_public_id: requestor.map(|requestor| requestor.public_id.clone()),
            created_at: membership.created_at,
            updated_at: membership.updated_at,
            approved_at: membership.approved_at,
            denied_at: membership.denied_at,
        }
    }
}

// ============================================================================
// Game Mappers
// ============================================================================

impl GameRequest {
    /// Build the game row, filling omitted optional fields from `defaults`.
    ///
    /// Expects a validated request; missing required fields become zero and
    /// are then rejected by [`Game::validate`].
    pub fn into_game(self, public_id: &str, defaults: &KhanDefaults, now: i64) -> Game {
        Game {
            id: 0,
            public_id: public_id.to_string(),
            name: self.name.unwrap_or_default(),
            metadata: self.metadata,
            membership_levels: self.membership_levels.unwrap_or_default(),
            min_level_to_accept_application: self.min_level_to_accept_application.unwrap_or_default(),
            min_level_to_create_invitation: self.min_level_to_create_invitation.unwrap_or_default(),
            min_level_to_remove_member: self.min_level_to_remove_member.unwrap_or_default(),
            min_level_offset_to_remove_member: self
                .min_level_offset_to_remove_member
                .unwrap_or_default(),
            min_level_offset_to_promote_member: self
                .min_level_offset_to_promote_member
                .unwrap_or_default(),
            min_level_offset_to_demote_member: self
                .min_level_offset_to_demote_member
                .unwrap_or_default(),
            max_members: self.max_members.unwrap_or_default(),
            max_clans_per_player: self.max_clans_per_player.unwrap_or_default(),
            max_pending_invites: self
                .max_pending_invites
                .unwrap_or(defaults.max_pending_invites),
            cooldown_after_deny: self.cooldown_after_deny.unwrap_or_default(),
            cooldown_after_delete: self.cooldown_after_delete.unwrap_or_default(),
            cooldown_before_apply: self
                .cooldown_before_apply
                .unwrap_or(defaults.default_cooldown_before_apply),
            cooldown_before_invite: self
                .cooldown_before_invite
                .unwrap_or(defaults.default_cooldown_before_invite),
            clan_hook_fields_whitelist: self.clan_hook_fields_whitelist,
            player_hook_fields_whitelist: self.player_hook_fields_whitelist,
            created_at: now,
            updated_at: now,
        }
    }
}
