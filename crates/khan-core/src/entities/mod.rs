//! Domain entities - core business objects

mod clan;
mod game;
mod hook;
mod membership;
mod player;

pub use clan::Clan;
pub use game::Game;
pub use hook::Hook;
pub use membership::{Membership, MembershipState};
pub use player::Player;

#[cfg(test)]
pub(crate) use game::fixtures as game_fixtures;
