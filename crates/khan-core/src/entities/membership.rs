//! Membership entity - the directed relation from a player to a clan

use serde::Serialize;

/// Exclusive state of a membership row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MembershipState {
    PendingApplication,
    PendingInvite,
    Approved,
    Denied,
    Deleted,
    Banned,
}

impl MembershipState {
    #[inline]
    pub fn is_pending(self) -> bool {
        matches!(self, Self::PendingApplication | Self::PendingInvite)
    }
}

/// Membership entity.
///
/// A row is live while `deleted_at == 0`. Terminal rows (denied or deleted)
/// are recycled when the same pair re-enters, so each pair keeps at most
/// one live row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub id: i64,
    pub game_id: String,
    pub clan_id: i64,
    pub player_id: i64,
    pub level: String,
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

impl Membership {
    /// Create an unsaved pending request.
    ///
    /// `requestor_id == player_id` makes it an application, anything else an
    /// invitation.
    pub fn pending(
        game_id: impl Into<String>,
        clan_id: i64,
        player_id: i64,
        requestor_id: i64,
        level: impl Into<String>,
        message: impl Into<String>,
        now: i64,
    ) -> Self {
        Self {
            id: 0,
            game_id: game_id.into(),
            clan_id,
            player_id,
            level: level.into(),
            approved: false,
            denied: false,
            banned: false,
            requestor_id,
            approver_id: None,
            denier_id: None,
            deleted_by: None,
            message: message.into(),
            created_at: now,
            updated_at: now,
            approved_at: 0,
            denied_at: 0,
            deleted_at: 0,
        }
    }

    pub fn state(&self) -> MembershipState {
        if self.deleted_at > 0 {
            MembershipState::Deleted
        } else if self.banned {
            MembershipState::Banned
        } else if self.approved {
            MembershipState::Approved
        } else if self.denied {
            MembershipState::Denied
        } else if self.requestor_id == self.player_id {
            MembershipState::PendingApplication
        } else {
            MembershipState::PendingInvite
        }
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.deleted_at == 0
    }

    #[inline]
    pub fn is_approved(&self) -> bool {
        self.state() == MembershipState::Approved
    }

    /// Approve a pending request
    pub fn approve(&mut self, approver_id: i64, now: i64) {
        self.approved = true;
        self.denied = false;
        self.approver_id = Some(approver_id);
        self.approved_at = now;
        self.updated_at = now;
    }

    /// Deny a pending request
    pub fn deny(&mut self, denier_id: i64, now: i64) {
        self.approved = false;
        self.denied = true;
        self.denier_id = Some(denier_id);
        self.denied_at = now;
        self.updated_at = now;
    }

    /// Soft delete (leave or kick)
    pub fn soft_delete(&mut self, deleted_by: i64, now: i64) {
        self.approved = false;
        self.deleted_by = Some(deleted_by);
        self.deleted_at = now;
        self.updated_at = now;
    }

    /// Turn this row back into a fresh pending request for the same pair
    pub fn reopen(&mut self, requestor_id: i64, level: &str, message: &str, now: i64) {
        self.level = level.to_string();
        self.approved = false;
        self.denied = false;
        self.requestor_id = requestor_id;
        self.approver_id = None;
        self.denier_id = None;
        self.deleted_by = None;
        self.message = message.to_string();
        self.approved_at = 0;
        self.denied_at = 0;
        self.deleted_at = 0;
        self.updated_at = now;
    }

    /// Turn this row into an approved membership at `level`
    pub fn restore_approved(&mut self, level: &str, approver_id: i64, now: i64) {
        self.reopen(self.player_id, level, "", now);
        self.approve(approver_id, now);
    }
}
