//! Game entity <-> model mapper

use khan_core::entities::Game;
use khan_core::MembershipLevels;

use crate::models::GameModel;

/// Convert GameModel to Game entity
impl From<GameModel> for Game {
    fn from(model: GameModel) -> Self {
        Game {
            id: model.id,
            public_id: model.public_id,
            name: model.name,
            metadata: model.metadata.0,
            membership_levels: MembershipLevels::new(model.membership_levels.0),
            min_level_to_accept_application: model.min_level_to_accept_application,
            min_level_to_create_invitation: model.min_level_to_create_invitation,
            min_level_to_remove_member: model.min_level_to_remove_member,
            min_level_offset_to_remove_member: model.min_level_offset_to_remove_member,
            min_level_offset_to_promote_member: model.min_level_offset_to_promote_member,
            min_level_offset_to_demote_member: model.min_level_offset_to_demote_member,
            max_members: model.max_members,
            max_clans_per_player: model.max_clans_per_player,
            max_pending_invites: model.max_pending_invites,
            cooldown_after_deny: model.cooldown_after_deny,
            cooldown_after_delete: model.cooldown_after_delete,
            cooldown_before_apply: model.cooldown_before_apply,
            cooldown_before_invite: model.cooldown_before_invite,
            clan_hook_fields_whitelist: model.clan_hook_fields_whitelist,
            player_hook_fields_whitelist: model.player_hook_fields_whitelist,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
