//! Domain errors

mod domain_error;
mod policy_error;

pub use domain_error::{DomainError, EntityKind};
pub use policy_error::{CooldownKind, PolicyError};
