//! Axum extractors for request handling
//!
//! Validated bodies and query strings, and typed path parameters.

mod path;
mod validated;

pub use path::{ClanPath, GamePath, HookPath, PathParams, PlayerPath};
pub use validated::{ValidatedJson, ValidatedQuery};
