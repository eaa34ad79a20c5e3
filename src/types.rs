//! Error types for Taskgate
//!
//! A single closed set of failure kinds flows from the store and auth
//! layers up to the response boundary, where `status()`/`code()` provide
//! the one place that translates kinds into HTTP responses.

use hyper::StatusCode;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ApiError>;

/// Domain failure kinds
///
/// Anything not covered by a specific variant is wrapped in `Database` and
/// surfaces as a 500 whose body carries the raw error text.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Registration attempted with an email that already has an account
    #[error("Email already registered")]
    DuplicateEmail,

    /// Login with an unknown email or a wrong password (indistinguishable)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed, expired, or semantically invalid bearer token
    #[error("{0}")]
    Unauthenticated(String),

    /// Record lookup by id matched nothing
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Request body could not be parsed
    #[error("{0}")]
    BadRequest(String),

    /// Catch-all wrapping any persistence failure
    #[error("{0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// HTTP status for this failure kind
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::DuplicateEmail => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code included in error payloads
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::DuplicateEmail => "DUPLICATE_EMAIL",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Database(_) | ApiError::Io(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::DuplicateEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Unauthenticated("Token expired".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::NotFound("Task").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Database("connection reset".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_error_text_surfaces() {
        // Unexpected store failures expose the raw error message
        let err = ApiError::Database("E11000 duplicate key".into());
        assert_eq!(err.to_string(), "E11000 duplicate key");
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(ApiError::NotFound("Task").to_string(), "Task not found");
    }
}
