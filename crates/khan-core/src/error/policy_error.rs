//! Policy errors - tagged rejections produced by the policy engine

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Which cooldown window blocked a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CooldownKind {
    AfterDeny,
    AfterDelete,
    BeforeApply,
    BeforeInvite,
}

impl CooldownKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AfterDeny => "cooldownAfterDeny",
            Self::AfterDelete => "cooldownAfterDelete",
            Self::BeforeApply => "cooldownBeforeApply",
            Self::BeforeInvite => "cooldownBeforeInvite",
        }
    }
}

impl fmt::Display for CooldownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection of a proposed membership transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Clan reached the maximum number of members")]
    ClanFull,

    #[error("Player already has a valid membership in this clan")]
    AlreadyMember,

    #[error("Player reached the maximum number of clans")]
    MaxClans,

    #[error("Must wait {seconds_left} seconds ({kind}) before this request")]
    Cooldown { kind: CooldownKind, seconds_left: i64 },

    #[error("Requestor level is too low for this action")]
    LevelTooLow,

    #[error("Level offset between requestor and target is too small")]
    OffsetTooSmall,

    #[error("Requestor is not authorized to perform this action")]
    NotAuthorized,

    #[error("Clan reached the maximum number of pending invites")]
    MaxPendingInvites,

    #[error("Level {level} is not valid for this game")]
    InvalidLevel { level: String },
}

impl PolicyError {
    /// Variant name, used as the API `reason`
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClanFull => "ClanFull",
            Self::AlreadyMember => "AlreadyMember",
            Self::MaxClans => "MaxClans",
            Self::Cooldown { .. } => "Cooldown",
            Self::LevelTooLow => "LevelTooLow",
            Self::OffsetTooSmall => "OffsetTooSmall",
            Self::NotAuthorized => "NotAuthorized",
            Self::MaxPendingInvites => "MaxPendingInvites",
            Self::InvalidLevel { .. } => "InvalidLevel",
        }
    }

    pub fn invalid_level(level: impl Into<String>) -> Self {
        Self::InvalidLevel {
            level: level.into(),
        }
    }
}
