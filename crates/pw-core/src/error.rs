//! # AppError
//!
//! Centralized error handling for PawSter.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all pw-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., User, Thread, FriendRequest)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., post too long, unknown plan)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Missing or invalid credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to touch the resource
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Infrastructure failure (e.g., DB down, SMTP unreachable)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Resource already exists or is in the wrong state (e.g., duplicate repost)
    #[error("conflict: {0}")]
    Conflict(String),

    /// The payment gateway refused or failed a request
    #[error("payment gateway error: {0}")]
    Gateway(String),

    /// Rate limit exceeded
    #[error("too many requests: {0}")]
    RateLimitExceeded(String),
}

impl AppError {
    pub fn not_found(kind: &str, id: impl ToString) -> Self {
        AppError::NotFound(kind.to_string(), id.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }
}

/// A specialized Result type for PawSter logic.
pub type Result<T> = std::result::Result<T, AppError>;
