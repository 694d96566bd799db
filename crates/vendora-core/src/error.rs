//! # Error Types
//!
//! Input-validation errors for vendora-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vendora-core errors (this file)                                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vendora-db errors (separate crate)                                    │
//! │  └── DbError          - Storage failures, duplicates, stock conflicts  │
//! │                                                                         │
//! │  vendora-orders errors (separate crate)                                │
//! │  └── OrderError       - Cross-entity order flow failures               │
//! │                                                                         │
//! │  Flow: ValidationError → DbError → OrderError → HTTP layer             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, value, limits)
//! 3. Errors are enum variants, never String
//! 4. Validation always runs before any mutation

use thiserror::Error;

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// They are always raised before business logic runs, so a failed
/// validation never leaves partial state behind.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., bad characters in a SKU).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        };
        assert_eq!(err.to_string(), "sku must be at most 50 characters");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }
}
