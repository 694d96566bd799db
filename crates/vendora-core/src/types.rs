//! # Domain Types
//!
//! Core domain types used throughout Vendora.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Invoice     │   │    Expense      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku / barcode  │   │  items[] (snap) │   │  category       │       │
//! │  │  stock          │   │  status/balance │   │  amount_cents   │       │
//! │  │  variants[]     │   │  payments[]     │   │  expense_date   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Every entity is scoped by tenant_id; uniqueness constraints and       │
//! │  queries never cross the tenant boundary.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, barcode, ...) - human-readable, potentially mutable

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Barcode Type
// =============================================================================

/// Symbology of a product or variant barcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeType {
    #[default]
    Code128,
    Ean13,
    Upc,
    Qr,
}

// =============================================================================
// Product & Variant
// =============================================================================

/// A product in the tenant's catalog.
///
/// ## Stock Semantics
/// If `variants` is non-empty, `stock` is a derived value equal to the sum
/// of the variant stock levels. It is recomputed on every write that
/// touches variants and never trusted from caller input in that case.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this product belongs to.
    pub tenant_id: String,

    /// Display name shown on invoices and in the catalog.
    pub name: String,

    /// Stock Keeping Unit - business identifier, unique per tenant among
    /// non-deleted products. Absent when the tenant doesn't use SKUs.
    pub sku: Option<String>,

    /// Barcode, unique per tenant when present.
    pub barcode: Option<String>,

    /// Barcode symbology.
    pub barcode_type: BarcodeType,

    /// Optional long description.
    pub description: Option<String>,

    /// Category label (free-form, tenant-defined).
    pub category: String,

    /// Brand label.
    pub brand: Option<String>,

    /// Selling price in minor units.
    pub price_cents: i64,

    /// Purchase cost in minor units (for margin reporting).
    pub cost_cents: Option<i64>,

    /// Current stock level. Derived from variants when variants exist.
    pub stock: i64,

    /// Sales unit ("pcs", "kg", ...).
    pub unit: String,

    /// Tax rate in basis points (825 = 8.25%).
    pub tax_rate_bps: Option<u32>,

    /// Reorder threshold for low-stock reporting.
    pub min_stock: i64,

    /// Expiry date for perishable goods.
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,

    /// Whether the product is currently sellable.
    pub is_active: bool,

    /// Sellable sub-units. Lifecycle fully owned by this product.
    pub variants: Vec<Variant>,

    /// Soft-delete flag. Deleted products are excluded from default reads.
    pub is_deleted: bool,

    /// When the product was soft-deleted.
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether this product is decomposed into variants.
    #[inline]
    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    /// Finds a variant by its id.
    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    /// Whether the product sits at or below its reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

/// A sellable sub-unit of a product (e.g. size/color).
///
/// Variants have no identity outside their parent: they are created,
/// updated and removed only as part of a product write.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Variant {
    /// Identifier local to the parent product.
    pub id: String,

    /// Display name ("Red / XL"). Falls back to joined options.
    pub name: Option<String>,

    /// Display labels for the option axes.
    pub options: Vec<String>,

    /// Selling price in minor units.
    pub price_cents: i64,

    /// Stock level of this variant.
    pub stock: i64,

    /// Variant-level SKU.
    pub sku: Option<String>,

    /// Variant-level barcode, unique per tenant when present.
    pub barcode: Option<String>,

    /// Barcode symbology.
    pub barcode_type: BarcodeType,

    /// Purchase cost in minor units.
    pub cost_cents: Option<i64>,

    /// Free-form attribute map ("Color" -> "Red").
    pub attributes: BTreeMap<String, String>,
}

impl Variant {
    /// Display label for invoices: explicit name, else joined options.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.options.join(" / "),
        }
    }
}

// =============================================================================
// Invoice Status
// =============================================================================

/// Payment lifecycle state of an invoice.
///
/// ## State Machine
/// ```text
/// Unpaid ──► PartiallyPaid ──► Paid
///    │             │             │
///    └─────────────┴─────────────┴──► Refunded | Cancelled | Voided
///                                          (terminal, no way out)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Unpaid,
    PartiallyPaid,
    Paid,
    Refunded,
    Cancelled,
    Voided,
}

impl InvoiceStatus {
    /// Terminal states accept no further transitions or payments.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            InvoiceStatus::Refunded | InvoiceStatus::Cancelled | InvoiceStatus::Voided
        )
    }

    /// Whether a transition from `self` to `to` is legal.
    pub fn can_transition(self, to: InvoiceStatus) -> bool {
        use InvoiceStatus::*;

        if self.is_terminal() {
            return false;
        }

        match (self, to) {
            // Payments only ever move the status forward.
            (Unpaid, PartiallyPaid) | (Unpaid, Paid) | (PartiallyPaid, Paid) => true,
            // Any non-terminal state can be closed out.
            (_, Refunded) | (_, Cancelled) | (_, Voided) => true,
            _ => false,
        }
    }

    /// Derives the payment status from the outstanding balance.
    pub fn from_balance(balance_cents: i64, total_cents: i64) -> Self {
        if balance_cents <= 0 {
            InvoiceStatus::Paid
        } else if balance_cents < total_cents {
            InvoiceStatus::PartiallyPaid
        } else {
            InvoiceStatus::Unpaid
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Upi,
    BankTransfer,
}

// =============================================================================
// Invoice Kind
// =============================================================================

/// Commercial form of the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    /// Settled at the counter.
    #[default]
    Cash,
    /// Payable later; tracked through the balance.
    Credit,
}

// =============================================================================
// Invoice
// =============================================================================

/// A sale record.
///
/// ## Immutability
/// Once created, `items` and the monetary totals are historical record and
/// never change. Only `status`, `payments`, `balance_cents`,
/// `internal_notes` and the soft-delete fields are mutable post-creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub tenant_id: String,
    pub customer_id: Option<String>,
    pub customer_name: String,
    #[ts(as = "String")]
    pub invoice_date: NaiveDate,
    pub kind: InvoiceKind,
    /// Line-item snapshots captured at sale time.
    pub items: Vec<InvoiceItem>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub additional_charges_cents: i64,
    /// Rounding applied to reach a round total. May be negative.
    pub round_off_cents: i64,
    pub total_cents: i64,
    pub status: InvoiceStatus,
    pub payment_method: PaymentMethod,
    /// Outstanding amount; decreases as payments are recorded.
    pub balance_cents: i64,
    pub payments: Vec<InvoicePayment>,
    pub internal_notes: Option<String>,
    pub is_deleted: bool,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the outstanding balance as Money.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }
}

// =============================================================================
// Invoice Item
// =============================================================================

/// A line item in an invoice.
///
/// Uses the snapshot pattern: product data (name, price, sku, barcode) is
/// copied at sale time and never re-synced, so later product edits or
/// deletions cannot alter invoice history. `product_id`/`variant_id` are
/// historical pointers, not live foreign keys.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,
    /// The product sold (may no longer exist).
    pub product_id: String,
    /// The variant sold, when the line resolved to one.
    pub variant_id: Option<String>,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Variant display name at time of sale (frozen).
    pub variant_name_snapshot: Option<String>,
    /// SKU at time of sale (frozen).
    pub sku_snapshot: Option<String>,
    /// Barcode at time of sale (frozen).
    pub barcode_snapshot: Option<String>,
    /// Quantity sold. Always positive.
    pub quantity: i64,
    /// Unit price in minor units at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Line total (unit_price × quantity).
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl InvoiceItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

// =============================================================================
// Invoice Payment
// =============================================================================

/// A payment towards an invoice.
/// An invoice can have multiple payments for split or installment tender.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoicePayment {
    pub id: String,
    pub invoice_id: String,
    pub method: PaymentMethod,
    /// Amount paid in minor units.
    pub amount_cents: i64,
    /// External reference (UTR, card auth code, cheque number).
    pub reference: Option<String>,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Expense
// =============================================================================

/// A business expense. Independent of the stock ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub tenant_id: String,
    pub category: String,
    pub description: Option<String>,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub expense_date: NaiveDate,
    pub payment_method: PaymentMethod,
    /// Receipt or voucher reference.
    pub reference: Option<String>,
    pub is_deleted: bool,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Write Drafts
// =============================================================================

/// Input for creating a product.
///
/// Empty-string `sku`/`barcode` values are normalized to absent before any
/// uniqueness check, so sparse-uniqueness semantics apply uniformly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NewProduct {
    pub name: String,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub barcode_type: BarcodeType,
    pub description: Option<String>,
    pub category: String,
    pub brand: Option<String>,
    pub price_cents: i64,
    pub cost_cents: Option<i64>,
    /// Honored only when `variants` is empty; otherwise stock is derived.
    pub stock: Option<i64>,
    pub unit: Option<String>,
    pub tax_rate_bps: Option<u32>,
    pub min_stock: i64,
    pub expiry_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
    pub variants: Vec<VariantDraft>,
}

/// Input for a variant, as part of a product create or update.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VariantDraft {
    pub name: Option<String>,
    pub options: Vec<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub barcode_type: BarcodeType,
    pub cost_cents: Option<i64>,
    pub attributes: BTreeMap<String, String>,
}

/// Partial update of a product. `None` = leave unchanged.
///
/// An empty string for `sku`/`barcode` clears the field (normalized to
/// absent). A present `variants` list replaces the variant set wholesale
/// and triggers a stock recomputation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub barcode_type: Option<BarcodeType>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub price_cents: Option<i64>,
    pub cost_cents: Option<i64>,
    /// Honored only when the product ends up variant-free.
    pub stock: Option<i64>,
    pub unit: Option<String>,
    pub tax_rate_bps: Option<u32>,
    pub min_stock: Option<i64>,
    pub expiry_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
    pub variants: Option<Vec<VariantDraft>>,
}

impl ProductPatch {
    /// Whether the patch carries no changes at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sku.is_none()
            && self.barcode.is_none()
            && self.barcode_type.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.brand.is_none()
            && self.price_cents.is_none()
            && self.cost_cents.is_none()
            && self.stock.is_none()
            && self.unit.is_none()
            && self.tax_rate_bps.is_none()
            && self.min_stock.is_none()
            && self.expiry_date.is_none()
            && self.is_active.is_none()
            && self.variants.is_none()
    }
}

/// Input for recording a payment against an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NewPayment {
    pub method: PaymentMethod,
    pub amount_cents: i64,
    pub reference: Option<String>,
    pub note: Option<String>,
}

/// Input for recording an expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub amount_cents: i64,
    pub expense_date: NaiveDate,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub reference: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_forward_transitions() {
        use InvoiceStatus::*;

        assert!(Unpaid.can_transition(PartiallyPaid));
        assert!(Unpaid.can_transition(Paid));
        assert!(PartiallyPaid.can_transition(Paid));

        // Payments never move backwards.
        assert!(!Paid.can_transition(PartiallyPaid));
        assert!(!PartiallyPaid.can_transition(Unpaid));
    }

    #[test]
    fn test_status_terminal_states() {
        use InvoiceStatus::*;

        for from in [Unpaid, PartiallyPaid, Paid] {
            assert!(from.can_transition(Refunded));
            assert!(from.can_transition(Cancelled));
            assert!(from.can_transition(Voided));
        }

        for terminal in [Refunded, Cancelled, Voided] {
            assert!(terminal.is_terminal());
            for to in [Unpaid, PartiallyPaid, Paid, Refunded, Cancelled, Voided] {
                assert!(!terminal.can_transition(to));
            }
        }
    }

    #[test]
    fn test_status_from_balance() {
        assert_eq!(
            InvoiceStatus::from_balance(1000, 1000),
            InvoiceStatus::Unpaid
        );
        assert_eq!(
            InvoiceStatus::from_balance(400, 1000),
            InvoiceStatus::PartiallyPaid
        );
        assert_eq!(InvoiceStatus::from_balance(0, 1000), InvoiceStatus::Paid);
        // Overpayment still counts as paid.
        assert_eq!(InvoiceStatus::from_balance(-50, 1000), InvoiceStatus::Paid);
    }

    #[test]
    fn test_variant_display_name() {
        let mut variant = Variant {
            id: "v1".to_string(),
            name: None,
            options: vec!["Red".to_string(), "XL".to_string()],
            price_cents: 100,
            stock: 0,
            sku: None,
            barcode: None,
            barcode_type: BarcodeType::default(),
            cost_cents: None,
            attributes: BTreeMap::new(),
        };
        assert_eq!(variant.display_name(), "Red / XL");

        variant.name = Some("Red XL".to_string());
        assert_eq!(variant.display_name(), "Red XL");
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(ProductPatch::default().is_empty());

        let patch = ProductPatch {
            price_cents: Some(500),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
