//! Clan database model

use khan_core::Metadata;
use sqlx::types::Json;
use sqlx::FromRow;

/// Database model for clans table
#[derive(Debug, Clone, FromRow)]
pub struct ClanModel {
    pub id: i64,
    pub game_id: String,
    pub public_id: String,
    pub name: String,
    pub metadata: Json<Metadata>,
    pub allow_application: bool,
    pub auto_join: bool,
    pub membership_count: i32,
    pub owner_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

pub(crate) const CLAN_COLUMNS: &str = "id, game_id, public_id, name, metadata, \
    allow_application, auto_join, membership_count, owner_id, created_at, updated_at";
