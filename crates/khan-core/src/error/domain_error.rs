//! Domain errors - error types for the domain layer

use std::fmt;

use thiserror::Error;

use super::policy_error::PolicyError;

/// Kind of entity a lookup failed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Game,
    Player,
    Clan,
    Membership,
    Hook,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Game => "Game",
            Self::Player => "Player",
            Self::Clan => "Clan",
            Self::Membership => "Membership",
            Self::Hook => "Hook",
        };
        f.write_str(name)
    }
}

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("{kind} was not found with id: {id}")]
    NotFound { kind: EntityKind, id: String },

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("{0}")]
    Validation(String),

    // =========================================================================
    // Policy Rejections
    // =========================================================================
    #[error(transparent)]
    Policy(#[from] PolicyError),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Integrity error: {0}")]
    IntegrityError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Search index error: {0}")]
    IndexError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { kind, .. } => match kind {
                EntityKind::Game => "UNKNOWN_GAME",
                EntityKind::Player => "UNKNOWN_PLAYER",
                EntityKind::Clan => "UNKNOWN_CLAN",
                EntityKind::Membership => "UNKNOWN_MEMBERSHIP",
                EntityKind::Hook => "UNKNOWN_HOOK",
            },
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Policy(err) => err.name(),
            Self::IntegrityError(_) => "INTEGRITY_ERROR",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::IndexError(_) => "INDEX_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a "not found" error for a specific kind
    pub fn is_not_found_kind(&self, expected: EntityKind) -> bool {
        matches!(self, Self::NotFound { kind, .. } if *kind == expected)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a policy conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Policy(_))
    }

    pub fn policy(&self) -> Option<&PolicyError> {
        match self {
            Self::Policy(err) => Some(err),
            _ => None,
        }
    }
}
