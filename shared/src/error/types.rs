//! Application error type

use super::codes::ErrorCode;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// Every service operation returns this type. It carries:
/// - a standardized [`ErrorCode`]
/// - a human-readable message, shown to staff as-is
/// - optional structured details (record ids, field names)
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, context, etc.)
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Whether this error is a "record vanished" condition
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::NotFound
                | ErrorCode::OrderNotFound
                | ErrorCode::WithdrawalNotFound
                | ErrorCode::ServiceNotFound
                | ErrorCode::SubServiceNotFound
                | ErrorCode::AdminNotFound
                | ErrorCode::ProviderNotFound
                | ErrorCode::CustomerNotFound
                | ErrorCode::GroupNotFound
                | ErrorCode::CityNotFound
                | ErrorCode::ComplaintNotFound
        )
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create a typed not found error carrying the record id
    pub fn not_found_with(code: ErrorCode, id: impl Into<String>) -> Self {
        Self::new(code).with_detail("id", id.into())
    }

    /// Create a not authenticated error
    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    /// Create a permission denied error
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, msg)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    /// Create an already exists error
    pub fn already_exists(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::AlreadyExists, format!("{} already exists", r))
            .with_detail("resource", r)
    }

    /// Create an invalid credentials error
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    /// Create an email-already-in-use error
    pub fn email_in_use(email: impl Into<String>) -> Self {
        Self::new(ErrorCode::EmailAlreadyInUse).with_detail("email", email.into())
    }

    /// Create an in-flight conflict error for a record key
    pub fn in_progress(key: impl Into<String>) -> Self {
        Self::new(ErrorCode::OperationInProgress).with_detail("key", key.into())
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::NotFound);
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Resource not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::validation("Missing required field")
            .with_detail("field", "price")
            .with_detail("order_id", "o-1");
        let details = err.details.unwrap();
        assert_eq!(details.get("field"), Some(&Value::from("price")));
        assert_eq!(details.get("order_id"), Some(&Value::from("o-1")));
    }

    #[test]
    fn test_not_found_family() {
        assert!(AppError::not_found_with(ErrorCode::GroupNotFound, "g1").is_not_found());
        assert!(AppError::not_found("order").is_not_found());
        assert!(!AppError::new(ErrorCode::InsufficientBalance).is_not_found());
    }

    #[test]
    fn test_email_in_use_is_distinct() {
        let err = AppError::email_in_use("a@b.c");
        assert_eq!(err.code, ErrorCode::EmailAlreadyInUse);
        assert_ne!(err.code, ErrorCode::DatabaseError);
    }
}
