//! Entity <-> model mappers

mod clan;
mod game;
mod hook;
mod membership;
mod player;

pub use player::PlayerWrite;
