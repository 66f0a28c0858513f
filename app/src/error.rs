//! Error handling for the AquaMon application
//!
//! Nothing here is fatal to the process: every variant degrades to a
//! visible message while the session stays in its previous state.

use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// User-input validation failure; shown inline next to the field,
    /// recoverable by retrying the same step.
    #[error("{message}")]
    Validation { field: String, message: String },

    /// Missing credential or bad setup; unrecoverable without operator
    /// configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed or failed AI reply.
    #[error("AI service error: {0}")]
    AiService(String),

    /// Quota-exhaustion failure, distinguished so the user is told to
    /// retry later rather than re-check their input.
    #[error("API request failed due to quota limits: {0}")]
    QuotaExceeded(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a field-level validation error.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn is_quota(&self) -> bool {
        matches!(self, AppError::QuotaExceeded(_))
    }
}

/// Result type alias for application code
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_is_the_message() {
        let err = AppError::validation("phone_number", "Please enter a valid 10-digit phone number");
        assert_eq!(err.to_string(), "Please enter a valid 10-digit phone number");
    }

    #[test]
    fn test_quota_is_distinguished() {
        let quota = AppError::QuotaExceeded("check your plan".to_string());
        assert!(quota.is_quota());
        assert!(!AppError::AiService("boom".to_string()).is_quota());
    }
}
