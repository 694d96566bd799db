//! # Order Flow Errors
//!
//! Errors raised by the cross-entity order flows.
//!
//! ## Two Failure Phases
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    When Order Placement Fails                           │
//! │                                                                         │
//! │  Phase 1: validation (before any mutation)                             │
//! │  ├── EmptyCart / CartTooLarge / Validation                             │
//! │  ├── Db(NotFound) - unknown product                                    │
//! │  ├── ProductInactive / UnknownVariant                                  │
//! │  └── InsufficientStock - clean failure, nothing persisted              │
//! │                                                                         │
//! │  Phase 2: stock debits (the invoice already exists)                    │
//! │  └── PartialFulfillment - a concurrent sale won the race after the    │
//! │      availability check passed. The invoice is NOT rolled back; the   │
//! │      sale stays recorded and the shortfalls are reported for          │
//! │      reconciliation.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use vendora_core::{ValidationError, MAX_CART_LINES};
use vendora_db::DbError;

/// A stock debit that failed after the invoice was persisted.
#[derive(Debug, Clone)]
pub struct Shortfall {
    pub product_id: String,
    pub variant_id: Option<String>,
    /// Display name of the sellable unit, from the sale-time snapshot.
    pub name: String,
    pub requested: i64,
    pub available: i64,
}

/// Errors raised by order placement and cancellation.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// The cart exceeds the line limit.
    #[error("cart cannot have more than {MAX_CART_LINES} line items")]
    CartTooLarge,

    /// The product exists but is flagged not sellable.
    #[error("product {product_id} is inactive")]
    ProductInactive { product_id: String },

    /// The cart line references a variant the product doesn't have.
    #[error("unknown variant {variant_id} for product {product_id}")]
    UnknownVariant {
        product_id: String,
        variant_id: String,
    },

    /// Availability check failed before any mutation.
    #[error("insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// The invoice was persisted but one or more stock debits lost the
    /// race against a concurrent sale. The sale stays recorded; the
    /// listed shortfalls need manual reconciliation.
    #[error(
        "invoice {invoice_id} was recorded but {count} stock debit(s) failed; \
         inventory requires reconciliation",
        count = .shortfalls.len()
    )]
    PartialFulfillment {
        invoice_id: String,
        shortfalls: Vec<Shortfall>,
    },

    /// Input failed validation before any mutation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage-layer failure (not found, duplicates, I/O).
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type for order flow operations.
pub type OrderResult<T> = Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_fulfillment_message() {
        let err = OrderError::PartialFulfillment {
            invoice_id: "inv-1".to_string(),
            shortfalls: vec![Shortfall {
                product_id: "p1".to_string(),
                variant_id: None,
                name: "Cola".to_string(),
                requested: 6,
                available: 4,
            }],
        };
        assert_eq!(
            err.to_string(),
            "invoice inv-1 was recorded but 1 stock debit(s) failed; inventory requires reconciliation"
        );
    }
}
