//! Service layer error types
//!
//! Separates "the entity named by the URL does not exist" (404) from
//! failures inside a transition, which keep the domain classification.

use std::fmt;

use khan_core::{DomainError, EntityKind, PolicyError};
use validator::ValidationErrors;

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Error raised while running a transition
    Domain(DomainError),

    /// The entity addressed by the request path does not exist
    NotFound { kind: EntityKind, id: String },

    /// Request payload rejected
    Validation(String),

    /// Internal error
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => write!(f, "{e}"),
            Self::NotFound { kind, id } => write!(f, "{kind} was not found with id: {id}"),
            Self::Validation(msg) => f.write_str(msg),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            _ => None,
        }
    }
}

impl ServiceError {
    /// Create a not found error for a path subject
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Policy rejection carried by this error, if any
    pub fn policy(&self) -> Option<&PolicyError> {
        match self {
            Self::Domain(e) => e.policy(),
            _ => None,
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// Not-found errors raised on nested lookups keep the legacy 500.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Domain(e) => {
                if e.is_validation() {
                    400
                } else if e.is_conflict() {
                    409
                } else {
                    500
                }
            }
            Self::NotFound { .. } => 404,
            Self::Validation(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code for API responses
    ///
    /// Policy rejections report the variant name.
    pub fn error_code(&self) -> &str {
        match self {
            Self::Domain(e) => e.code(),
            Self::NotFound { kind, .. } => match kind {
                EntityKind::Game => "UNKNOWN_GAME",
                EntityKind::Player => "UNKNOWN_PLAYER",
                EntityKind::Clan => "UNKNOWN_CLAN",
                EntityKind::Membership => "UNKNOWN_MEMBERSHIP",
                EntityKind::Hook => "UNKNOWN_HOOK",
            },
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<PolicyError> for ServiceError {
    fn from(err: PolicyError) -> Self {
        Self::Domain(DomainError::Policy(err))
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(validation_reason(&errors))
    }
}

/// Comma-joined validation messages, sorted for stable output
pub fn validation_reason(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();
    messages.sort();
    messages.dedup();
    messages.join(", ")
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
