//! Clan entity - a player group with a single owner

use crate::value_objects::Metadata;

/// Clan entity.
///
/// The owner holds an implicit approved membership, so `membership_count`
/// is always 1 + approved live membership rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Clan {
    pub id: i64,
    pub game_id: String,
    pub public_id: String,
    pub name: String,
    pub metadata: Metadata,
    pub allow_application: bool,
    pub auto_join: bool,
    pub membership_count: i32,
    pub owner_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Clan {
    #[inline]
    pub fn is_owner(&self, player_id: i64) -> bool {
        self.owner_id == player_id
    }

    /// Whether applications skip the approval step
    #[inline]
    pub fn auto_approves(&self) -> bool {
        self.auto_join && self.allow_application
    }
}
