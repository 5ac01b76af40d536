//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 2xxx: Permission errors
/// - 4xxx: Order errors
/// - 5xxx: Finance errors
/// - 6xxx: Catalog errors
/// - 8xxx: Directory errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Order errors (4xxx)
    Order,
    /// Finance errors (5xxx)
    Finance,
    /// Catalog errors (6xxx)
    Catalog,
    /// Directory errors (8xxx)
    Directory,
    /// System errors (9xxx and unassigned ranges)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            4000..5000 => Self::Order,
            5000..6000 => Self::Finance,
            6000..7000 => Self::Catalog,
            8000..9000 => Self::Directory,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Order => "order",
            Self::Finance => "finance",
            Self::Catalog => "catalog",
            Self::Directory => "directory",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1008), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2001), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(3001), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(4001), ErrorCategory::Order);
        assert_eq!(ErrorCategory::from_code(5002), ErrorCategory::Finance);
        assert_eq!(ErrorCategory::from_code(6101), ErrorCategory::Catalog);
        assert_eq!(ErrorCategory::from_code(8101), ErrorCategory::Directory);
        assert_eq!(ErrorCategory::from_code(9002), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::EmailAlreadyInUse.category(), ErrorCategory::Auth);
        assert_eq!(ErrorCode::InvalidTransition.category(), ErrorCategory::Order);
        assert_eq!(ErrorCode::InsufficientBalance.category(), ErrorCategory::Finance);
        assert_eq!(ErrorCode::SubServiceNotFound.category(), ErrorCategory::Catalog);
        assert_eq!(ErrorCode::GroupNotFound.category(), ErrorCategory::Directory);
        assert_eq!(ErrorCode::DatabaseError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_category_serialize() {
        let json = serde_json::to_string(&ErrorCategory::Finance).unwrap();
        assert_eq!(json, "\"finance\"");
        let category: ErrorCategory = serde_json::from_str("\"directory\"").unwrap();
        assert_eq!(category, ErrorCategory::Directory);
    }
}
