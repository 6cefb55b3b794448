//! Player entity - a user within a game

use crate::value_objects::Metadata;

/// Player entity. Created on first touch, never hard-deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: i64,
    pub game_id: String,
    pub public_id: String,
    pub name: String,
    pub metadata: Metadata,
    /// Approved, non-deleted memberships
    pub membership_count: i32,
    /// Clans this player owns
    pub ownership_count: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Player {
    /// Create an unsaved player
    pub fn new(
        game_id: impl Into<String>,
        public_id: impl Into<String>,
        name: impl Into<String>,
        metadata: Metadata,
        now: i64,
    ) -> Self {
        Self {
            id: 0,
            game_id: game_id.into(),
            public_id: public_id.into(),
            name: name.into(),
            metadata,
            membership_count: 0,
            ownership_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Clans the player currently belongs to, owned ones included
    #[inline]
    pub fn live_clan_count(&self) -> i32 {
        self.membership_count + self.ownership_count
    }
}
