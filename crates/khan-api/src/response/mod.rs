//! Response types and error handling for API endpoints
//!
//! Every body is an envelope: `{"success": true, ...payload}` on 200 and
//! `{"success": false, "reason": ...}` otherwise.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use khan_core::PolicyError;
use khan_service::services::error::validation_reason;
use khan_service::ServiceError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

/// API error type for consistent error responses
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// Comma-joined field messages
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidBody(String),

    #[error("{0}")]
    InvalidQuery(String),

    #[error("Invalid path parameter: {0}")]
    InvalidPath(String),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(validation_reason(&errors))
    }
}

impl ApiError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Service(e) => StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Validation(_)
            | Self::InvalidBody(_)
            | Self::InvalidQuery(_)
            | Self::InvalidPath(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for logs
    #[must_use]
    pub fn error_code(&self) -> &str {
        match self {
            Self::Service(e) => e.error_code(),
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::InvalidQuery(_) => "INVALID_QUERY_PARAMETER",
            Self::InvalidPath(_) => "INVALID_PATH_PARAMETER",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Policy rejection behind this error, if any
    pub fn policy(&self) -> Option<&PolicyError> {
        match self {
            Self::Service(e) => e.policy(),
            _ => None,
        }
    }

    /// `reason` field: the variant name for policy rejections, else the message
    pub fn reason(&self) -> String {
        match self.policy() {
            Some(policy) => policy.name().to_string(),
            None => match self {
                Self::Internal(e) => e.to_string(),
                other => other.to_string(),
            },
        }
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    pub fn invalid_body(msg: impl Into<String>) -> Self {
        Self::InvalidBody(msg.into())
    }

    /// Create an invalid query error
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_left: Option<i64>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(error = %self, code = self.error_code(), "Request failed");
        }

        let (message, seconds_left) = match self.policy() {
            Some(policy) => {
                let seconds_left = match policy {
                    PolicyError::Cooldown { seconds_left, .. } => Some(*seconds_left),
                    _ => None,
                };
                (Some(policy.to_string()), seconds_left)
            }
            None => (None, None),
        };

        let body = ErrorBody {
            success: false,
            reason: self.reason(),
            message,
            seconds_left,
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct Envelope<T> {
    success: bool,
    #[serde(flatten)]
    payload: T,
}

/// Successful (200) response; the payload's fields sit next to `success`
pub struct Success<T>(pub T);

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        Json(Envelope {
            success: true,
            payload: self.0,
        })
        .into_response()
    }
}
