//! Event types that hooks can subscribe to

use std::fmt;

/// Hook event type. The integer code is what subscribers see in `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    GameUpdated,
    PlayerCreated,
    PlayerUpdated,
    ClanCreated,
    ClanUpdated,
    ClanLeft,
    ClanOwnershipTransferred,
    MembershipApplicationCreated,
    MembershipApproved,
    MembershipDenied,
    MembershipPromoted,
    MembershipDemoted,
    MembershipLeft,
}

impl EventType {
    pub const ALL: [EventType; 13] = [
        Self::GameUpdated,
        Self::PlayerCreated,
        Self::PlayerUpdated,
        Self::ClanCreated,
        Self::ClanUpdated,
        Self::ClanLeft,
        Self::ClanOwnershipTransferred,
        Self::MembershipApplicationCreated,
        Self::MembershipApproved,
        Self::MembershipDenied,
        Self::MembershipPromoted,
        Self::MembershipDemoted,
        Self::MembershipLeft,
    ];

    pub fn code(self) -> i32 {
        match self {
            Self::GameUpdated => 0,
            Self::PlayerCreated => 1,
            Self::PlayerUpdated => 2,
            Self::ClanCreated => 3,
            Self::ClanUpdated => 4,
            Self::ClanLeft => 5,
            Self::ClanOwnershipTransferred => 6,
            Self::MembershipApplicationCreated => 7,
            Self::MembershipApproved => 8,
            Self::MembershipDenied => 9,
            Self::MembershipPromoted => 10,
            Self::MembershipDemoted => 11,
            Self::MembershipLeft => 12,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|event_type| event_type.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::GameUpdated => "game_updated",
            Self::PlayerCreated => "player_created",
            Self::PlayerUpdated => "player_updated",
            Self::ClanCreated => "clan_created",
            Self::ClanUpdated => "clan_updated",
            Self::ClanLeft => "clan_left",
            Self::ClanOwnershipTransferred => "clan_ownership_transferred",
            Self::MembershipApplicationCreated => "membership_application_created",
            Self::MembershipApproved => "membership_approved",
            Self::MembershipDenied => "membership_denied",
            Self::MembershipPromoted => "membership_promoted",
            Self::MembershipDemoted => "membership_demoted",
            Self::MembershipLeft => "membership_left",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
