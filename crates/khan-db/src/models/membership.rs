//! Membership database model

use sqlx::FromRow;

/// Database model for memberships table
#[derive(Debug, Clone, FromRow)]
pub struct MembershipModel {
    pub id: i64,
    pub game_id: String,
    pub clan_id: i64,
    pub player_id: i64,
    pub membership_level: String,
    pub approved: bool,
    pub denied: bool,
    pub banned: bool,
    pub requestor_id: i64,
    pub approver_id: Option<i64>,
    pub denier_id: Option<i64>,
    pub deleted_by: Option<i64>,
    pub message: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub approved_at: i64,
    pub denied_at: i64,
    pub deleted_at: i64,
}

impl MembershipModel {
    #[inline]
    pub fn is_live(&self) -> bool {
        self.deleted_at == 0
    }
}

pub(crate) const MEMBERSHIP_COLUMNS: &str = "id, game_id, clan_id, player_id, membership_level, \
    approved, denied, banned, requestor_id, approver_id, denier_id, deleted_by, message, \
    created_at, updated_at, approved_at, denied_at, deleted_at";
