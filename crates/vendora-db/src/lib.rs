//! # vendora-db: Database Layer for Vendora
//!
//! This crate provides database access for the Vendora backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vendora Data Flow                                │
//! │                                                                         │
//! │  Request handler (HTTP layer, excluded) / vendora-orders               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     vendora-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (catalog.rs)  │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CatalogRepo   │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ InvoiceRepo   │    │ 002_exp.sql  │  │   │
//! │  │   │ Management    │    │ ExpenseRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                       SQLite Database (WAL)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (catalog, invoice, expense)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vendora_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/vendora.db")).await?;
//!
//! let products = db.products().list(tenant, false).await?;
//! let new_stock = db.products().adjust_stock(tenant, id, None, -3).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::{CatalogRepository, ImportFailure, ImportSummary};
pub use repository::expense::ExpenseRepository;
pub use repository::invoice::InvoiceRepository;
