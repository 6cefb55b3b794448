//! Business logic services
//!
//! Each service borrows the [`ServiceContext`] and runs one transition per
//! method: begin a transaction, load and lock rows, consult the policy
//! engine, mutate, commit, then hand events and index jobs off.

pub mod clan;
pub mod context;
pub mod error;
pub mod game;
pub mod hook;
pub mod membership;
pub mod player;
pub mod prune;

mod lookup;

pub use clan::ClanService;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use game::GameService;
pub use hook::HookService;
pub use membership::MembershipService;
pub use player::PlayerService;
pub use prune::{GamePruneResult, PruneService};
