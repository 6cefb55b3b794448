//! Domain events - immutable snapshots emitted after a transition commits
//!
//! The payload holds the event-specific fields. The webhook dispatcher adds
//! the envelope (`id`, `type`, `timestamp`, `gameID`) around them.

use serde::Serialize;
use serde_json::{json, Value};

use super::event_type::EventType;
use crate::entities::{Clan, Game, Membership, Player};
use crate::value_objects::{MembershipLevels, Metadata};

/// Event handed to the dispatcher after commit
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEvent {
    pub game_id: String,
    pub event_type: EventType,
    pub payload: Metadata,
}

// ============================================================================
// Payload snapshots
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePayload {
    #[serde(rename = "publicID")]
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
}

impl From<&Game> for GamePayload {
    fn from(game: &Game) -> Self {
        Self {
            public_id: game.public_id.clone(),
            name: game.name.clone(),
            metadata: game.metadata.clone(),
            membership_levels: game.membership_levels.clone(),
            min_level_to_accept_application: game.min_level_to_accept_application,
            min_level_to_create_invitation: game.min_level_to_create_invitation,
            min_level_to_remove_member: game.min_level_to_remove_member,
            min_level_offset_to_remove_member: game.min_level_offset_to_remove_member,
            min_level_offset_to_promote_member: game.min_level_offset_to_promote_member,
            min_level_offset_to_demote_member: game.min_level_offset_to_demote_member,
            max_members: game.max_members,
            max_clans_per_player: game.max_clans_per_player,
            max_pending_invites: game.max_pending_invites,
            cooldown_after_deny: game.cooldown_after_deny,
            cooldown_after_delete: game.cooldown_after_delete,
            cooldown_before_apply: game.cooldown_before_apply,
            cooldown_before_invite: game.cooldown_before_invite,
            clan_hook_fields_whitelist: game.clan_hook_fields_whitelist.clone(),
            player_hook_fields_whitelist: game.player_hook_fields_whitelist.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPayload {
    #[serde(rename = "publicID")]
    pub public_id: String,
    pub name: String,
    pub metadata: Metadata,
    pub membership_count: i32,
    pub ownership_count: i32,
}

impl From<&Player> for PlayerPayload {
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

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanPayload {
    #[serde(rename = "publicID")]
    pub public_id: String,
    pub name: String,
    pub metadata: Metadata,
    pub allow_application: bool,
    pub auto_join: bool,
    pub membership_count: i32,
}

impl From<&Clan> for ClanPayload {
    fn from(clan: &Clan) -> Self {
        Self {
            public_id: clan.public_id.clone(),
            name: clan.name.clone(),
            metadata: clan.metadata.clone(),
            allow_application: clan.allow_application,
            auto_join: clan.auto_join,
            membership_count: clan.membership_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPayload {
    pub level: String,
    pub approved: bool,
    pub denied: bool,
    pub banned: bool,
    pub message: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub approved_at: i64,
    pub denied_at: i64,
    pub deleted_at: i64,
}

impl From<&Membership> for MembershipPayload {
    fn from(membership: &Membership) -> Self {
        Self {
            level: membership.level.clone(),
            approved: membership.approved,
            denied: membership.denied,
            banned: membership.banned,
            message: membership.message.clone(),
            created_at: membership.created_at,
            updated_at: membership.updated_at,
            approved_at: membership.approved_at,
            denied_at: membership.denied_at,
            deleted_at: membership.deleted_at,
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl DomainEvent {
    pub fn new(game_id: impl Into<String>, event_type: EventType, payload: Value) -> Self {
        let payload = match payload {
            Value::Object(map) => map,
            _ => Metadata::new(),
        };
        Self {
            game_id: game_id.into(),
            event_type,
            payload,
        }
    }

    pub fn game_updated(game: &Game) -> Self {
        Self::new(
            &game.public_id,
            EventType::GameUpdated,
            json!(GamePayload::from(game)),
        )
    }

    pub fn player_created(player: &Player) -> Self {
        Self::new(
            &player.game_id,
            EventType::PlayerCreated,
            json!(PlayerPayload::from(player)),
        )
    }

    pub fn player_updated(player: &Player) -> Self {
        Self::new(
            &player.game_id,
            EventType::PlayerUpdated,
            json!(PlayerPayload::from(player)),
        )
    }

    pub fn clan_created(clan: &Clan, owner: &Player) -> Self {
        Self::new(
            &clan.game_id,
            EventType::ClanCreated,
            json!({
                "clan": ClanPayload::from(clan),
                "owner": PlayerPayload::from(owner),
            }),
        )
    }

    pub fn clan_updated(clan: &Clan, owner: &Player) -> Self {
        Self::new(
            &clan.game_id,
            EventType::ClanUpdated,
            json!({
                "clan": ClanPayload::from(clan),
                "owner": PlayerPayload::from(owner),
            }),
        )
    }

    /// Owner left. `new_owner` is `None` when the clan was destroyed.
    pub fn clan_left(clan: &Clan, previous_owner: &Player, new_owner: Option<&Player>) -> Self {
        Self::new(
            &clan.game_id,
            EventType::ClanLeft,
            json!({
                "clan": ClanPayload::from(clan),
                "previousOwner": PlayerPayload::from(previous_owner),
                "newOwner": new_owner.map(PlayerPayload::from),
                "isDeleted": new_owner.is_none(),
            }),
        )
    }

    pub fn clan_ownership_transferred(
        clan: &Clan,
        previous_owner: &Player,
        new_owner: &Player,
    ) -> Self {
        Self::new(
            &clan.game_id,
            EventType::ClanOwnershipTransferred,
            json!({
                "clan": ClanPayload::from(clan),
                "previousOwner": PlayerPayload::from(previous_owner),
                "newOwner": PlayerPayload::from(new_owner),
            }),
        )
    }

    pub fn membership_application_created(
        clan: &Clan,
        player: &Player,
        requestor: &Player,
        membership: &Membership,
    ) -> Self {
        Self::membership(
            EventType::MembershipApplicationCreated,
            clan,
            player,
            requestor,
            membership,
            None,
        )
    }

    pub fn membership_approved(
        clan: &Clan,
        player: &Player,
        requestor: &Player,
        approver: &Player,
        membership: &Membership,
    ) -> Self {
        Self::membership(
            EventType::MembershipApproved,
            clan,
            player,
            requestor,
            membership,
            Some(("approver", approver)),
        )
    }

    pub fn membership_denied(
        clan: &Clan,
        player: &Player,
        requestor: &Player,
        denier: &Player,
        membership: &Membership,
    ) -> Self {
        Self::membership(
            EventType::MembershipDenied,
            clan,
            player,
            requestor,
            membership,
            Some(("denier", denier)),
        )
    }

    pub fn membership_promoted(
        clan: &Clan,
        player: &Player,
        requestor: &Player,
        membership: &Membership,
    ) -> Self {
        Self::membership(
            EventType::MembershipPromoted,
            clan,
            player,
            requestor,
            membership,
            None,
        )
    }

    pub fn membership_demoted(
        clan: &Clan,
        player: &Player,
        requestor: &Player,
        membership: &Membership,
    ) -> Self {
        Self::membership(
            EventType::MembershipDemoted,
            clan,
            player,
            requestor,
            membership,
            None,
        )
    }

    pub fn membership_left(
        clan: &Clan,
        player: &Player,
        requestor: &Player,
        membership: &Membership,
    ) -> Self {
        Self::membership(
            EventType::MembershipLeft,
            clan,
            player,
            requestor,
            membership,
            None,
        )
    }

    fn membership(
        event_type: EventType,
        clan: &Clan,
        player: &Player,
        requestor: &Player,
        membership: &Membership,
        actor: Option<(&str, &Player)>,
    ) -> Self {
        let mut payload = json!({
            "clan": ClanPayload::from(clan),
            "player": PlayerPayload::from(player),
            "requestor": PlayerPayload::from(requestor),
            "membership": MembershipPayload::from(membership),
        });
        if let (Some((key, actor)), Value::Object(map)) = (actor, &mut payload) {
            map.insert(key.to_string(), json!(PlayerPayload::from(actor)));
        }
        Self::new(&clan.game_id, event_type, payload)
    }

    /// Public id of a nested player field, if present
    pub fn player_field(&self, field: &str) -> Option<&str> {
        self.payload
            .get(field)
            .and_then(|value| value.get("publicID"))
            .and_then(Value::as_str)
    }
}
