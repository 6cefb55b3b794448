//! Policy engine - pure rules over a game's configuration
//!
//! Every function here is side-effect free. The domain service loads the
//! rows, asks the policy, and only then mutates.

mod rules;

pub use rules::{
    auto_approve, choose_successor, may_admit, may_apply, may_approve_application,
    may_approve_invitation, may_create_clan, may_demote, may_invite, may_promote, may_remove,
    validate_level, Actor, PolicyResult,
};
