//! # vendora-orders: Cross-Entity Order Flows
//!
//! The coordinator between the catalog and the invoice ledger. This crate
//! is the only place a sale touches both: it validates a cart against
//! fresh catalog reads, persists the invoice snapshot, and issues the
//! atomic per-line stock debits (credits on cancellation).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP layer (excluded)                                                 │
//! │       │  authenticated tenant + schema-validated bodies                │
//! │       ▼                                                                 │
//! │  ★ vendora-orders (THIS CRATE) ★                                       │
//! │       │   OrderService::place_order / cancel_order / resolve_barcode  │
//! │       ▼                                                                 │
//! │  vendora-db ──► SQLite (conditional stock updates, partial indexes)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency Model
//!
//! No cross-document transaction is assumed. The single correctness-
//! critical primitive is the catalog's conditional stock update; the
//! flows here sequence independent atomic steps and report partial
//! application (`OrderError::PartialFulfillment`) instead of hiding it.

pub mod error;
pub mod service;

pub use error::{OrderError, OrderResult, Shortfall};
pub use service::{CancelOutcome, CartLine, InvoiceDraft, OrderService, RestoredLine, ScanHit};
