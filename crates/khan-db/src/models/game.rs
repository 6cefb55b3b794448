//! Game database model

use std::collections::BTreeMap;

use khan_core::Metadata;
use sqlx::types::Json;
use sqlx::FromRow;

/// Database model for games table
#[derive(Debug, Clone, FromRow)]
pub struct GameModel {
    pub id: i64,
    pub public_id: String,
    pub name: String,
    pub metadata: Json<Metadata>,
    pub membership_levels: Json<BTreeMap<String, i32>>,
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

/// Column list shared by every games query
pub(crate) const GAME_COLUMNS: &str = "id, public_id, name, metadata, membership_levels, \
    min_level_to_accept_application, min_level_to_create_invitation, min_level_to_remove_member, \
    min_level_offset_to_remove_member, min_level_offset_to_promote_member, \
    min_level_offset_to_demote_member, max_members, max_clans_per_player, max_pending_invites, \
    cooldown_after_deny, cooldown_after_delete, cooldown_before_apply, cooldown_before_invite, \
    clan_hook_fields_whitelist, player_hook_fields_whitelist, created_at, updated_at";
