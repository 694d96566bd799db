//! # Database Error Types
//!
//! Error types for storage operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OrderError (vendora-orders) / HTTP layer                              │
//! │                                                                         │
//! │  Duplicate-key failures from the partial unique indexes are mapped     │
//! │  onto the same typed variants the pre-write checks produce, so a      │
//! │  caller sees one error shape whether the duplicate was caught before   │
//! │  or during the write.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use vendora_core::{InvoiceStatus, ValidationError};

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity absent, soft-deleted, or owned by another tenant.
    ///
    /// The three cases are indistinguishable to the caller; a caller must
    /// never be able to probe for the existence of other tenants' data.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Input failed business-rule validation before any mutation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// SKU already used by a live product of the same tenant.
    #[error("duplicate SKU: '{sku}' already exists")]
    DuplicateSku { sku: String },

    /// Barcode already used by a product of the same tenant.
    #[error("duplicate barcode: '{barcode}' already exists")]
    DuplicateBarcode { barcode: String },

    /// Barcode already used by a variant of the same tenant.
    #[error("duplicate variant barcode: '{barcode}' already exists")]
    DuplicateVariantBarcode { barcode: String },

    /// A stock debit would drive the level negative.
    ///
    /// Raised by the conditional stock update; the rejected debit leaves
    /// stock unchanged.
    #[error("insufficient stock for {target}: available {available}, requested {requested}")]
    InsufficientStock {
        target: String,
        available: i64,
        requested: i64,
    },

    /// The invoice status machine forbids this transition.
    #[error("invoice status cannot move from {from:?} to {to:?}")]
    InvalidStatusTransition {
        from: InvoiceStatus,
        to: InvoiceStatus,
    },

    /// Unique index violation not covered by a typed duplicate variant.
    #[error("duplicate value for {field}")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite reports constraint failures as
                // "UNIQUE constraint failed: <table>.<column>".
                if msg.contains("UNIQUE constraint failed") {
                    if msg.contains("products.sku") {
                        DbError::DuplicateSku {
                            sku: "unknown".to_string(),
                        }
                    } else if msg.contains("products.barcode") {
                        DbError::DuplicateBarcode {
                            barcode: "unknown".to_string(),
                        }
                    } else if msg.contains("product_variants.barcode") {
                        DbError::DuplicateVariantBarcode {
                            barcode: "unknown".to_string(),
                        }
                    } else {
                        let field = msg
                            .split("UNIQUE constraint failed: ")
                            .nth(1)
                            .unwrap_or("unknown")
                            .to_string();
                        DbError::UniqueViolation { field }
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Variant option/attribute columns are JSON; a decode failure is an
/// internal error, never a caller mistake.
impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Internal(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
