//! Player database model

use khan_core::Metadata;
use sqlx::types::Json;
use sqlx::FromRow;

/// Database model for players table.
///
/// `name` holds the stored form, possibly encrypted.
#[derive(Debug, Clone, FromRow)]
pub struct PlayerModel {
    pub id: i64,
    pub game_id: String,
    pub public_id: String,
    pub name: String,
    pub metadata: Json<Metadata>,
    pub membership_count: i32,
    pub ownership_count: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

pub(crate) const PLAYER_COLUMNS: &str = "id, game_id, public_id, name, metadata, \
    membership_count, ownership_count, created_at, updated_at";
