//! Membership entity <-> model mapper

use khan_core::entities::Membership;

use crate::models::MembershipModel;

/// Convert MembershipModel to Membership entity
impl From<MembershipModel> for Membership {
    fn from(model: MembershipModel) -> Self {
        Membership {
            id: model.id,
            game_id: model.game_id,
            clan_id: model.clan_id,
            player_id: model.player_id,
            level: model.membership_level,
            approved: model.approved,
            denied: model.denied,
            banned: model.banned,
            requestor_id: model.requestor_id,
            approver_id: model.approver_id,
            denier_id: model.denier_id,
            deleted_by: model.deleted_by,
            message: model.message,
            created_at: model.created_at,
            updated_at: model.updated_at,
            approved_at: model.approved_at,
            denied_at: model.denied_at,
            deleted_at: model.deleted_at,
        }
    }
}
