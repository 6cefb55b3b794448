//! Clan entity <-> model mapper

use khan_core::entities::Clan;

use crate::models::ClanModel;

/// Convert ClanModel to Clan entity
impl From<ClanModel> for Clan {
    fn from(model: ClanModel) -> Self {
        Clan {
            id: model.id,
            game_id: model.game_id,
            public_id: model.public_id,
            name: model.name,
            metadata: model.metadata.0,
            allow_application: model.allow_application,
            auto_join: model.auto_join,
            membership_count: model.membership_count,
            owner_id: model.owner_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
