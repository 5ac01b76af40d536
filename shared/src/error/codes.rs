//! Unified error codes for the console
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Finance errors (withdrawals, balances)
//! - 6xxx: Catalog errors (services, images)
//! - 8xxx: Directory errors (admins, providers, groups, cities)
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so they survive a trip
/// through the document store and any client that reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Another mutation on the same record is still in flight
    OperationInProgress = 9,
    /// Destructive bulk operation was not confirmed
    ConfirmationRequired = 10,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Session has expired
    SessionExpired = 1005,
    /// Account is disabled
    AccountDisabled = 1007,
    /// Email already registered with the identity provider
    EmailAlreadyInUse = 1008,
    /// Too many failed attempts
    RateLimited = 1009,
    /// Password too short
    PasswordTooShort = 1010,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Super admin role required
    SuperAdminRequired = 2003,
    /// Cannot delete the last super admin
    CannotDeleteLastSuperAdmin = 2005,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has already been completed
    OrderAlreadyCompleted = 4003,
    /// Order has already been cancelled
    OrderAlreadyCancelled = 4004,
    /// Status transition not allowed by the lifecycle
    InvalidTransition = 4008,
    /// Order price is missing or negative
    OrderInvalidPrice = 4009,
    /// Order has neither a customer reference nor a customer snapshot
    OrderCustomerRequired = 4010,
    /// Status needs an assigned provider
    OrderProviderRequired = 4011,

    // ==================== 5xxx: Finance ====================
    /// Withdrawal request not found
    WithdrawalNotFound = 5001,
    /// Provider balance is lower than the requested amount
    InsufficientBalance = 5002,
    /// Withdrawal request was already processed
    WithdrawalAlreadyProcessed = 5003,
    /// Withdrawal amount below minimum or not positive
    WithdrawalInvalidAmount = 5004,

    // ==================== 6xxx: Catalog ====================
    /// Main service not found
    ServiceNotFound = 6001,
    /// Service has invalid price
    ServiceInvalidPrice = 6002,
    /// Sub-service not found
    SubServiceNotFound = 6101,
    /// File too large
    FileTooLarge = 6501,
    /// Empty file provided
    EmptyFile = 6505,
    /// Invalid storage path
    InvalidStoragePath = 6507,
    /// File storage failed
    FileStorageFailed = 6509,

    // ==================== 8xxx: Directory ====================
    /// Admin not found
    AdminNotFound = 8001,
    /// Provider not found
    ProviderNotFound = 8002,
    /// Customer not found
    CustomerNotFound = 8003,
    /// Provider group not found
    GroupNotFound = 8101,
    /// City not found
    CityNotFound = 8201,
    /// Complaint not found
    ComplaintNotFound = 8301,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,

    // ==================== 94xx: Storage ====================
    /// Storage full (disk space insufficient)
    StorageFull = 9401,
    /// Storage corrupted (data file damaged)
    StorageCorrupted = 9403,
    /// System busy (IO error, retry later)
    SystemBusy = 9404,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::OperationInProgress => "Another operation on this record is in progress",
            ErrorCode::ConfirmationRequired => "Operation requires explicit confirmation",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::SessionExpired => "Session has expired",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::EmailAlreadyInUse => "Email is already in use",
            ErrorCode::RateLimited => "Too many attempts, try again later",
            ErrorCode::PasswordTooShort => "Password must be at least 6 characters",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::SuperAdminRequired => "Super admin role is required",
            ErrorCode::CannotDeleteLastSuperAdmin => "Cannot delete the last super admin",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyCompleted => "Order has already been completed",
            ErrorCode::OrderAlreadyCancelled => "Order has already been cancelled",
            ErrorCode::InvalidTransition => "Order status transition is not allowed",
            ErrorCode::OrderInvalidPrice => "Order price must be a non-negative number",
            ErrorCode::OrderCustomerRequired => "Order requires a customer",
            ErrorCode::OrderProviderRequired => "Order has no assigned provider",

            // Finance
            ErrorCode::WithdrawalNotFound => "Withdrawal request not found",
            ErrorCode::InsufficientBalance => "Insufficient provider balance",
            ErrorCode::WithdrawalAlreadyProcessed => "Withdrawal request already processed",
            ErrorCode::WithdrawalInvalidAmount => "Invalid withdrawal amount",

            // Catalog
            ErrorCode::ServiceNotFound => "Service not found",
            ErrorCode::ServiceInvalidPrice => "Service has invalid price",
            ErrorCode::SubServiceNotFound => "Sub-service not found",
            ErrorCode::FileTooLarge => "File too large",
            ErrorCode::EmptyFile => "Empty file provided",
            ErrorCode::InvalidStoragePath => "Invalid storage path",
            ErrorCode::FileStorageFailed => "File storage failed",

            // Directory
            ErrorCode::AdminNotFound => "Admin not found",
            ErrorCode::ProviderNotFound => "Provider not found",
            ErrorCode::CustomerNotFound => "Customer not found",
            ErrorCode::GroupNotFound => "Provider group not found",
            ErrorCode::CityNotFound => "City not found",
            ErrorCode::ComplaintNotFound => "Complaint not found",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",

            // Storage
            ErrorCode::StorageFull => "Storage full (disk space insufficient)",
            ErrorCode::StorageCorrupted => "Storage corrupted (data file damaged)",
            ErrorCode::SystemBusy => "System busy, please retry later",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::OperationInProgress),
            10 => Ok(ErrorCode::ConfirmationRequired),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1005 => Ok(ErrorCode::SessionExpired),
            1007 => Ok(ErrorCode::AccountDisabled),
            1008 => Ok(ErrorCode::EmailAlreadyInUse),
            1009 => Ok(ErrorCode::RateLimited),
            1010 => Ok(ErrorCode::PasswordTooShort),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::SuperAdminRequired),
            2005 => Ok(ErrorCode::CannotDeleteLastSuperAdmin),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4003 => Ok(ErrorCode::OrderAlreadyCompleted),
            4004 => Ok(ErrorCode::OrderAlreadyCancelled),
            4008 => Ok(ErrorCode::InvalidTransition),
            4009 => Ok(ErrorCode::OrderInvalidPrice),
            4010 => Ok(ErrorCode::OrderCustomerRequired),
            4011 => Ok(ErrorCode::OrderProviderRequired),

            // Finance
            5001 => Ok(ErrorCode::WithdrawalNotFound),
            5002 => Ok(ErrorCode::InsufficientBalance),
            5003 => Ok(ErrorCode::WithdrawalAlreadyProcessed),
            5004 => Ok(ErrorCode::WithdrawalInvalidAmount),

            // Catalog
            6001 => Ok(ErrorCode::ServiceNotFound),
            6002 => Ok(ErrorCode::ServiceInvalidPrice),
            6101 => Ok(ErrorCode::SubServiceNotFound),
            6501 => Ok(ErrorCode::FileTooLarge),
            6505 => Ok(ErrorCode::EmptyFile),
            6507 => Ok(ErrorCode::InvalidStoragePath),
            6509 => Ok(ErrorCode::FileStorageFailed),

            // Directory
            8001 => Ok(ErrorCode::AdminNotFound),
            8002 => Ok(ErrorCode::ProviderNotFound),
            8003 => Ok(ErrorCode::CustomerNotFound),
            8101 => Ok(ErrorCode::GroupNotFound),
            8201 => Ok(ErrorCode::CityNotFound),
            8301 => Ok(ErrorCode::ComplaintNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),

            // Storage
            9401 => Ok(ErrorCode::StorageFull),
            9403 => Ok(ErrorCode::StorageCorrupted),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip_through_u16() {
        for code in [
            ErrorCode::Success,
            ErrorCode::EmailAlreadyInUse,
            ErrorCode::InvalidTransition,
            ErrorCode::InsufficientBalance,
            ErrorCode::SubServiceNotFound,
            ErrorCode::GroupNotFound,
            ErrorCode::SystemBusy,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_invalid_code_rejected() {
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&ErrorCode::InsufficientBalance).unwrap();
        assert_eq!(json, "5002");
        let code: ErrorCode = serde_json::from_str("1008").unwrap();
        assert_eq!(code, ErrorCode::EmailAlreadyInUse);
    }

    #[test]
    fn test_display_is_padded() {
        assert_eq!(ErrorCode::NotFound.to_string(), "E0003");
        assert_eq!(ErrorCode::OrderNotFound.to_string(), "E4001");
    }
}
