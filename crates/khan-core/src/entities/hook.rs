//! Hook entity - a webhook subscription

use crate::events::EventType;

/// Webhook subscription, unique per (game, event type, url)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hook {
    pub id: i64,
    pub game_id: String,
    pub public_id: String,
    pub event_type: EventType,
    pub url: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Hook {
    pub fn matches(&self, game_id: &str, event_type: EventType) -> bool {
        self.game_id == game_id && self.event_type == event_type
    }
}
