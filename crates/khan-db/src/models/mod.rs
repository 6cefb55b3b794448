//! Database models - direct mappings of table rows

mod clan;
mod game;
mod hook;
mod membership;
mod player;

pub use clan::ClanModel;
pub use game::GameModel;
pub use hook::HookModel;
pub use membership::MembershipModel;
pub use player::PlayerModel;

pub(crate) use clan::CLAN_COLUMNS;
pub(crate) use game::GAME_COLUMNS;
pub(crate) use hook::HOOK_COLUMNS;
pub(crate) use membership::MEMBERSHIP_COLUMNS;
pub(crate) use player::PLAYER_COLUMNS;
