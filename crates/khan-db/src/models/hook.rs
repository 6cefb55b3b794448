//! Hook database model

use sqlx::FromRow;

/// Database model for hooks table
#[derive(Debug, Clone, FromRow)]
pub struct HookModel {
    pub id: i64,
    pub game_id: String,
    pub public_id: String,
    pub event_type: i32,
    pub url: String,
    pub created_at: i64,
    pub updated_at: i64,
}

pub(crate) const HOOK_COLUMNS: &str =
    "id, game_id, public_id, event_type, url, created_at, updated_at";
