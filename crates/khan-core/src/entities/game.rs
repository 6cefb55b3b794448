//! Game entity - a tenant and its clan policy

use crate::error::DomainError;
use crate::value_objects::{MembershipLevels, Metadata};

/// Game (tenant) entity.
///
/// Every other row is scoped by the game's public id. Cooldowns are in
/// seconds; `max_pending_invites = -1` means unbounded.
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub id: i64,
    pub public_id: String,
    pub name: String,
    pub metadata: Metadata,
    pub membership_levels: MembershipLevels,
    pub min_level_to_accept_application: i32,
    pub min_level_to_create_invitation: i32,
    pub min_level_to_remove_member: i32,
    pub min_level_offset_to_remove_member: i32,
    pub min_level_offset_to_promote_member: i32,
    pub min_level_offset_to_demote_member: i32,
    pub max_members: i32,
    pub max_clans_per_player: i32,
    pub max_pending_invites: i32,
    pub cooldown_after_deny: i32,
    pub cooldown_after_delete: i32,
    pub cooldown_before_apply: i32,
    pub cooldown_before_invite: i32,
    pub clan_hook_fields_whitelist: String,
    pub player_hook_fields_whitelist: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Game {
    #[inline]
    pub fn min_level(&self) -> i32 {
        self.membership_levels.min_level()
    }

    #[inline]
    pub fn max_level(&self) -> i32 {
        self.membership_levels.max_level()
    }

    /// Rank of a level name in this game
    pub fn level_rank(&self, level: &str) -> Option<i32> {
        self.membership_levels.rank(level)
    }

    /// Whether pending invitations are capped
    pub fn caps_pending_invites(&self) -> bool {
        self.max_pending_invites >= 0
    }

    pub fn clan_whitelist(&self) -> Vec<&str> {
        split_whitelist(&self.clan_hook_fields_whitelist)
    }

    pub fn player_whitelist(&self) -> Vec<&str> {
        split_whitelist(&self.player_hook_fields_whitelist)
    }

    /// Check configuration consistency before persisting
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.membership_levels.is_empty() {
            return Err(DomainError::Validation(
                "membershipLevels must have at least one level".to_string(),
            ));
        }

        let min_level = self.min_level();
        let thresholds = [
            ("minLevelToAcceptApplication", self.min_level_to_accept_application),
            ("minLevelToCreateInvitation", self.min_level_to_create_invitation),
            ("minLevelToRemoveMember", self.min_level_to_remove_member),
        ];
        let too_low: Vec<String> = thresholds
            .iter()
            .filter(|(_, value)| *value < min_level)
            .map(|(name, _)| format!("{name} should be greater or equal to minLevel"))
            .collect();
        if !too_low.is_empty() {
            return Err(DomainError::Validation(too_low.join(", ")));
        }

        if self.max_members < 1 || self.max_clans_per_player < 1 {
            return Err(DomainError::Validation(
                "maxMembers and maxClansPerPlayer must be positive".to_string(),
            ));
        }
        if self.max_pending_invites < -1 {
            return Err(DomainError::Validation(
                "maxPendingInvites must be -1 or greater".to_string(),
            ));
        }
        Ok(())
    }
}

fn split_whitelist(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .collect()
}
