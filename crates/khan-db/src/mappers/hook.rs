//! Hook entity <-> model mapper

use khan_core::entities::Hook;
use khan_core::{DomainError, EventType};

use crate::models::HookModel;

/// Convert HookModel to Hook entity; unknown event codes are an integrity error
impl TryFrom<HookModel> for Hook {
    type Error = DomainError;

    fn try_from(model: HookModel) -> Result<Self, Self::Error> {
        let event_type = EventType::from_code(model.event_type).ok_or_else(|| {
            DomainError::IntegrityError(format!(
                "hook {} has unknown event type {}",
                model.public_id, model.event_type
            ))
        })?;
        Ok(Hook {
            id: model.id,
            game_id: model.game_id,
            public_id: model.public_id,
            event_type,
            url: model.url,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
