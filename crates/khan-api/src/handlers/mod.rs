//! Route handlers
//!
//! All HTTP request handlers organized by resource.

pub mod clans;
pub mod games;
pub mod health;
pub mod hooks;
pub mod memberships;
pub mod players;
