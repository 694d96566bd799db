//! # Order Service
//!
//! The order placement / cancellation coordinator.
//!
//! ## Placement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       place_order(tenant, cart)                         │
//! │                                                                         │
//! │  1. RESOLVE                                                            │
//! │     └── fresh product read per line (never a stale cart snapshot)      │
//! │     └── line targets the variant when variant_id is set                │
//! │                                                                         │
//! │  2. VALIDATE                                                           │
//! │     └── quantity, activity, availability - before any mutation         │
//! │                                                                         │
//! │  3. PERSIST INVOICE                                                    │
//! │     └── item snapshots freeze name/price/sku/barcode at this moment    │
//! │                                                                         │
//! │  4. DEBIT STOCK (per line, each one atomic)                            │
//! │     └── adjust_stock(-qty) - conditional update, loses cleanly to      │
//! │         a concurrent sale instead of overselling                        │
//! │     └── a lost race does NOT roll the invoice back: the sale stays    │
//! │         recorded and the shortfall is reported (PartialFulfillment)   │
//! │                                                                         │
//! │  Cancellation walks the stored snapshots in reverse: credit per line, │
//! │  warning (not failing) when the product has since been deleted.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no coordinator-level locking: the conditional stock update in
//! the catalog is the sole concurrency primitive. Multi-line orders are a
//! sequence of independent atomic adjustments, so partial application
//! under failure is possible and reported, never silent.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{OrderError, OrderResult, Shortfall};
use vendora_core::validation::{validate_price_cents, validate_quantity};
use vendora_core::{
    Invoice, InvoiceItem, InvoiceKind, InvoicePayment, InvoiceStatus, Money, PaymentMethod,
    Product, ValidationError, MAX_CART_LINES,
};
use vendora_db::{Database, DbError};

// =============================================================================
// Inputs
// =============================================================================

/// One cart line of an order request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    /// Targets a specific variant; absent for the base product.
    #[serde(default)]
    pub variant_id: Option<String>,
    pub quantity: i64,
    /// Caller price override (negotiated/discounted price). Falls back to
    /// the current catalog price.
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
}

/// Invoice metadata and pre-computed totals for an order.
///
/// Totals arrive already computed and schema-validated by the caller; the
/// coordinator persists them as-is.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InvoiceDraft {
    pub customer_id: Option<String>,
    pub customer_name: String,
    /// Defaults to today (UTC) when absent.
    pub invoice_date: Option<NaiveDate>,
    pub kind: InvoiceKind,
    pub payment_method: PaymentMethod,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub additional_charges_cents: i64,
    pub round_off_cents: i64,
    pub total_cents: i64,
    /// Amount settled at creation; drives the initial status and balance.
    pub paid_cents: i64,
    pub internal_notes: Option<String>,
}

// =============================================================================
// Outputs
// =============================================================================

/// Outcome of an order cancellation.
#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub invoice_id: String,
    /// Stock credits that were applied.
    pub restored: Vec<RestoredLine>,
    /// Products that no longer exist; their credits were skipped.
    pub missing_products: Vec<String>,
}

/// A stock credit applied during cancellation.
#[derive(Debug, Clone)]
pub struct RestoredLine {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: i64,
    pub new_stock: i64,
}

/// A barcode scan resolved to a sellable unit.
#[derive(Debug, Clone)]
pub struct ScanHit {
    pub product: Product,
    /// Index into `product.variants` when the scan matched a variant code.
    pub variant_index: Option<usize>,
}

impl ScanHit {
    /// Selling price of the scanned unit.
    pub fn unit_price_cents(&self) -> i64 {
        match self.variant_index {
            Some(index) => self.product.variants[index].price_cents,
            None => self.product.price_cents,
        }
    }
}

/// A cart line resolved against a fresh catalog read.
struct ResolvedLine {
    product_id: String,
    variant_id: Option<String>,
    name: String,
    variant_name: Option<String>,
    sku: Option<String>,
    barcode: Option<String>,
    quantity: i64,
    unit_price_cents: i64,
    line_total_cents: i64,
}

// =============================================================================
// Service
// =============================================================================

/// Coordinates cross-entity order flows over the catalog and the ledger.
#[derive(Debug, Clone)]
pub struct OrderService {
    db: Database,
}

impl OrderService {
    /// Creates a new OrderService.
    pub fn new(db: Database) -> Self {
        OrderService { db }
    }

    /// Places an order: validates the cart, persists the invoice snapshot,
    /// debits stock per line.
    ///
    /// ## Failure Semantics
    /// * Validation failures (unknown product, insufficient stock) are
    ///   reported before any mutation
    /// * A debit that loses a race after the invoice exists yields
    ///   `OrderError::PartialFulfillment`: sale recorded, inventory
    ///   flagged for reconciliation
    pub async fn place_order(
        &self,
        tenant: &str,
        cart: &[CartLine],
        draft: &InvoiceDraft,
    ) -> OrderResult<Invoice> {
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        if cart.len() > MAX_CART_LINES {
            return Err(OrderError::CartTooLarge);
        }
        if draft.paid_cents < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "paid".to_string(),
            }
            .into());
        }

        let catalog = self.db.products();

        // Resolve and validate every line against a fresh read before
        // anything is written.
        let mut resolved = Vec::with_capacity(cart.len());
        for line in cart {
            resolved.push(self.resolve_line(tenant, line).await?);
        }

        let now = Utc::now();
        let invoice_id = Uuid::new_v4().to_string();

        let items: Vec<InvoiceItem> = resolved
            .iter()
            .map(|line| InvoiceItem {
                id: Uuid::new_v4().to_string(),
                invoice_id: invoice_id.clone(),
                product_id: line.product_id.clone(),
                variant_id: line.variant_id.clone(),
                name_snapshot: line.name.clone(),
                variant_name_snapshot: line.variant_name.clone(),
                sku_snapshot: line.sku.clone(),
                barcode_snapshot: line.barcode.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                line_total_cents: line.line_total_cents,
                created_at: now,
            })
            .collect();

        let balance_cents = draft.total_cents - draft.paid_cents;
        let status = InvoiceStatus::from_balance(balance_cents, draft.total_cents);
        let payments = if draft.paid_cents > 0 {
            vec![InvoicePayment {
                id: Uuid::new_v4().to_string(),
                invoice_id: invoice_id.clone(),
                method: draft.payment_method,
                amount_cents: draft.paid_cents,
                reference: None,
                note: None,
                created_at: now,
            }]
        } else {
            vec![]
        };

        let invoice = Invoice {
            id: invoice_id.clone(),
            tenant_id: tenant.to_string(),
            customer_id: draft.customer_id.clone(),
            customer_name: draft.customer_name.clone(),
            invoice_date: draft.invoice_date.unwrap_or_else(|| now.date_naive()),
            kind: draft.kind,
            items,
            subtotal_cents: draft.subtotal_cents,
            tax_cents: draft.tax_cents,
            discount_cents: draft.discount_cents,
            additional_charges_cents: draft.additional_charges_cents,
            round_off_cents: draft.round_off_cents,
            total_cents: draft.total_cents,
            status,
            payment_method: draft.payment_method,
            balance_cents,
            payments,
            internal_notes: draft.internal_notes.clone(),
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        self.db.invoices().insert(tenant, &invoice).await?;

        // Debit stock per line. Each debit is atomic on its own; a line
        // that lost the race against a concurrent sale is collected, not
        // rolled back.
        let mut shortfalls = Vec::new();
        for line in &resolved {
            match catalog
                .adjust_stock(
                    tenant,
                    &line.product_id,
                    line.variant_id.as_deref(),
                    -line.quantity,
                )
                .await
            {
                Ok(_) => {}
                Err(DbError::InsufficientStock {
                    available,
                    requested,
                    ..
                }) => {
                    warn!(
                        tenant = %tenant,
                        invoice = %invoice_id,
                        product = %line.product_id,
                        available = %available,
                        requested = %requested,
                        "Stock debit lost the race; sale recorded, flagging for reconciliation"
                    );
                    shortfalls.push(Shortfall {
                        product_id: line.product_id.clone(),
                        variant_id: line.variant_id.clone(),
                        name: line.name.clone(),
                        requested,
                        available,
                    });
                }
                Err(DbError::NotFound { .. }) => {
                    warn!(
                        tenant = %tenant,
                        invoice = %invoice_id,
                        product = %line.product_id,
                        "Product vanished between validation and debit; flagging for reconciliation"
                    );
                    shortfalls.push(Shortfall {
                        product_id: line.product_id.clone(),
                        variant_id: line.variant_id.clone(),
                        name: line.name.clone(),
                        requested: line.quantity,
                        available: 0,
                    });
                }
                Err(other) => return Err(other.into()),
            }
        }

        if !shortfalls.is_empty() {
            return Err(OrderError::PartialFulfillment {
                invoice_id,
                shortfalls,
            });
        }

        info!(
            tenant = %tenant,
            invoice = %invoice_id,
            lines = %invoice.items.len(),
            total = %invoice.total_cents,
            "Order placed"
        );

        Ok(invoice)
    }

    /// Cancels an order: marks the invoice cancelled, soft-deletes it, and
    /// credits stock back per stored item snapshot.
    ///
    /// The credit uses the historical product/variant IDs, so it is
    /// correct even if the product was edited in the meantime. A product
    /// deleted since the sale yields a warning and is reported in
    /// `missing_products`, never a hard failure.
    pub async fn cancel_order(&self, tenant: &str, invoice_id: &str) -> OrderResult<CancelOutcome> {
        let ledger = self.db.invoices();
        let catalog = self.db.products();

        let invoice = ledger.get(tenant, invoice_id, false).await?;

        // Terminal invoices (already cancelled/refunded/voided) reject
        // the transition here, before any stock moves.
        ledger
            .update_status(tenant, invoice_id, InvoiceStatus::Cancelled)
            .await?;
        ledger.soft_delete(tenant, invoice_id).await?;

        let mut restored = Vec::new();
        let mut missing_products = Vec::new();

        for item in &invoice.items {
            match catalog
                .adjust_stock(
                    tenant,
                    &item.product_id,
                    item.variant_id.as_deref(),
                    item.quantity,
                )
                .await
            {
                Ok(new_stock) => restored.push(RestoredLine {
                    product_id: item.product_id.clone(),
                    variant_id: item.variant_id.clone(),
                    quantity: item.quantity,
                    new_stock,
                }),
                Err(DbError::NotFound { .. }) => {
                    warn!(
                        tenant = %tenant,
                        invoice = %invoice_id,
                        product = %item.product_id,
                        "Stock credit skipped; product no longer exists"
                    );
                    missing_products.push(item.product_id.clone());
                }
                Err(other) => return Err(other.into()),
            }
        }

        info!(
            tenant = %tenant,
            invoice = %invoice_id,
            restored = %restored.len(),
            skipped = %missing_products.len(),
            "Order cancelled"
        );

        Ok(CancelOutcome {
            invoice_id: invoice_id.to_string(),
            restored,
            missing_products,
        })
    }

    /// Resolves a scanned barcode to a sellable unit: product barcodes
    /// first, then variant barcodes.
    pub async fn resolve_barcode(&self, tenant: &str, code: &str) -> OrderResult<Option<ScanHit>> {
        let catalog = self.db.products();

        if let Some(product) = catalog.find_by_barcode(tenant, code).await? {
            return Ok(Some(ScanHit {
                product,
                variant_index: None,
            }));
        }

        if let Some((product, index)) = catalog.find_by_variant_barcode(tenant, code).await? {
            return Ok(Some(ScanHit {
                product,
                variant_index: Some(index),
            }));
        }

        Ok(None)
    }

    /// Resolves one cart line against a fresh catalog read and validates
    /// quantity and availability.
    async fn resolve_line(&self, tenant: &str, line: &CartLine) -> OrderResult<ResolvedLine> {
        validate_quantity(line.quantity)?;
        if let Some(price) = line.unit_price_cents {
            validate_price_cents(price)?;
        }

        let product = self.db.products().get(tenant, &line.product_id, false).await?;
        if !product.is_active {
            return Err(OrderError::ProductInactive {
                product_id: product.id,
            });
        }

        let (name, variant_name, sku, barcode, catalog_price, available) = match &line.variant_id {
            Some(variant_id) => {
                let variant =
                    product
                        .variant(variant_id)
                        .ok_or_else(|| OrderError::UnknownVariant {
                            product_id: product.id.clone(),
                            variant_id: variant_id.clone(),
                        })?;
                (
                    product.name.clone(),
                    Some(variant.display_name()),
                    variant.sku.clone().or_else(|| product.sku.clone()),
                    variant.barcode.clone(),
                    variant.price_cents,
                    variant.stock,
                )
            }
            None => (
                product.name.clone(),
                None,
                product.sku.clone(),
                product.barcode.clone(),
                product.price_cents,
                product.stock,
            ),
        };

        if available < line.quantity {
            return Err(OrderError::InsufficientStock {
                name: match &variant_name {
                    Some(variant_name) => format!("{name} ({variant_name})"),
                    None => name,
                },
                available,
                requested: line.quantity,
            });
        }

        let unit_price_cents = line.unit_price_cents.unwrap_or(catalog_price);
        let line_total = Money::from_cents(unit_price_cents)
            .checked_mul(line.quantity)
            .ok_or(ValidationError::OutOfRange {
                field: "line_total".to_string(),
                min: 0,
                max: i64::MAX,
            })?;

        Ok(ResolvedLine {
            product_id: line.product_id.clone(),
            variant_id: line.variant_id.clone(),
            name,
            variant_name,
            sku,
            barcode,
            quantity: line.quantity,
            unit_price_cents,
            line_total_cents: line_total.cents(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use vendora_core::{NewProduct, ProductPatch, VariantDraft};
    use vendora_db::DbConfig;

    const TENANT: &str = "tenant-a";

    async fn service() -> OrderService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        OrderService::new(db)
    }

    async fn seed_product(svc: &OrderService, name: &str, sku: &str, stock: i64) -> Product {
        svc.db
            .products()
            .create(
                TENANT,
                &NewProduct {
                    name: name.to_string(),
                    sku: Some(sku.to_string()),
                    category: "general".to_string(),
                    price_cents: 5000,
                    stock: Some(stock),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }

    async fn seed_shirt(svc: &OrderService) -> Product {
        svc.db
            .products()
            .create(
                TENANT,
                &NewProduct {
                    name: "Shirt".to_string(),
                    sku: Some("SHIRT".to_string()),
                    category: "apparel".to_string(),
                    price_cents: 2500,
                    barcode: Some("PROD-SHIRT".to_string()),
                    variants: vec![
                        VariantDraft {
                            options: vec!["Red".to_string()],
                            price_cents: 2500,
                            stock: 5,
                            barcode: Some("VAR-RED".to_string()),
                            ..Default::default()
                        },
                        VariantDraft {
                            options: vec!["Blue".to_string()],
                            price_cents: 2600,
                            stock: 8,
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }

    fn line(product: &Product, quantity: i64) -> CartLine {
        CartLine {
            product_id: product.id.clone(),
            variant_id: None,
            quantity,
            unit_price_cents: None,
        }
    }

    fn draft(total_cents: i64, paid_cents: i64) -> InvoiceDraft {
        InvoiceDraft {
            customer_name: "Walk-in".to_string(),
            subtotal_cents: total_cents,
            total_cents,
            paid_cents,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_place_order_debits_stock() {
        let svc = service().await;
        let product = seed_product(&svc, "Cola", "COLA", 10).await;

        let invoice = svc
            .place_order(TENANT, &[line(&product, 3)], &draft(15_000, 15_000))
            .await
            .unwrap();

        assert_eq!(invoice.items.len(), 1);
        assert_eq!(invoice.items[0].quantity, 3);
        assert_eq!(invoice.items[0].unit_price_cents, 5000);
        assert_eq!(invoice.items[0].sku_snapshot.as_deref(), Some("COLA"));
        // Fully paid at the counter.
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.balance_cents, 0);
        assert_eq!(invoice.payments.len(), 1);

        let fresh = svc.db.products().get(TENANT, &product.id, false).await.unwrap();
        assert_eq!(fresh.stock, 7);
    }

    #[tokio::test]
    async fn test_unpaid_credit_order() {
        let svc = service().await;
        let product = seed_product(&svc, "Cola", "COLA", 10).await;

        let invoice = svc
            .place_order(TENANT, &[line(&product, 1)], &draft(5000, 0))
            .await
            .unwrap();

        assert_eq!(invoice.status, InvoiceStatus::Unpaid);
        assert_eq!(invoice.balance_cents, 5000);
        assert!(invoice.payments.is_empty());
    }

    #[tokio::test]
    async fn test_variant_order_targets_variant_stock() {
        let svc = service().await;
        let shirt = seed_shirt(&svc).await;
        let red = shirt.variants[0].clone();

        let cart = [CartLine {
            product_id: shirt.id.clone(),
            variant_id: Some(red.id.clone()),
            quantity: 2,
            unit_price_cents: None,
        }];
        let invoice = svc.place_order(TENANT, &cart, &draft(5000, 5000)).await.unwrap();

        assert_eq!(invoice.items[0].variant_id.as_deref(), Some(red.id.as_str()));
        assert_eq!(invoice.items[0].variant_name_snapshot.as_deref(), Some("Red"));
        assert_eq!(invoice.items[0].unit_price_cents, 2500);

        let fresh = svc.db.products().get(TENANT, &shirt.id, false).await.unwrap();
        assert_eq!(fresh.variants[0].stock, 3);
        // Parent stock stays the variant sum: 3 + 8.
        assert_eq!(fresh.stock, 11);
    }

    #[tokio::test]
    async fn test_insufficient_stock_is_a_clean_failure() {
        let svc = service().await;
        let product = seed_product(&svc, "Cola", "COLA", 2).await;

        let err = svc
            .place_order(TENANT, &[line(&product, 5)], &draft(25_000, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock { available: 2, requested: 5, .. }));

        // Nothing was persisted.
        assert!(svc.db.invoices().list(TENANT, true).await.unwrap().is_empty());
        let fresh = svc.db.products().get(TENANT, &product.id, false).await.unwrap();
        assert_eq!(fresh.stock, 2);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let svc = service().await;
        assert!(matches!(
            svc.place_order(TENANT, &[], &draft(0, 0)).await.unwrap_err(),
            OrderError::EmptyCart
        ));
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let svc = service().await;
        let cart = [CartLine {
            product_id: "missing".to_string(),
            variant_id: None,
            quantity: 1,
            unit_price_cents: None,
        }];
        assert!(matches!(
            svc.place_order(TENANT, &cart, &draft(0, 0)).await.unwrap_err(),
            OrderError::Db(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_lines_report_partial_fulfillment() {
        // Two lines for the same product pass the pre-mutation check
        // individually, but together exceed stock: the second debit fails
        // after the invoice exists. Policy: keep the sale, flag the gap.
        let svc = service().await;
        let product = seed_product(&svc, "Cola", "COLA", 10).await;

        let err = svc
            .place_order(
                TENANT,
                &[line(&product, 6), line(&product, 6)],
                &draft(60_000, 0),
            )
            .await
            .unwrap_err();

        match err {
            OrderError::PartialFulfillment {
                invoice_id,
                shortfalls,
            } => {
                assert_eq!(shortfalls.len(), 1);
                assert_eq!(shortfalls[0].requested, 6);
                assert_eq!(shortfalls[0].available, 4);
                // The invoice stays recorded for reconciliation.
                assert!(svc.db.invoices().get(TENANT, &invoice_id, false).await.is_ok());
            }
            other => panic!("expected PartialFulfillment, got {other:?}"),
        }

        let fresh = svc.db.products().get(TENANT, &product.id, false).await.unwrap();
        assert_eq!(fresh.stock, 4);
    }

    #[tokio::test]
    async fn test_concurrent_orders_never_oversell() {
        let svc = service().await;
        let product = seed_product(&svc, "Cola", "COLA", 10).await;

        let cart_a = [line(&product, 6)];
        let cart_b = [line(&product, 6)];
        let draft_a = draft(30_000, 0);
        let draft_b = draft(30_000, 0);
        let (a, b) = tokio::join!(
            svc.place_order(TENANT, &cart_a, &draft_a),
            svc.place_order(TENANT, &cart_b, &draft_b),
        );

        // Exactly one order wins; the other fails cleanly or is flagged.
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        for result in [&a, &b] {
            if let Err(err) = result {
                assert!(matches!(
                    err,
                    OrderError::InsufficientStock { .. } | OrderError::PartialFulfillment { .. }
                ));
            }
        }

        // Never double-decremented, never negative.
        let fresh = svc.db.products().get(TENANT, &product.id, false).await.unwrap();
        assert_eq!(fresh.stock, 4);
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_from_snapshot() {
        let svc = service().await;
        let product = seed_product(&svc, "Cola", "COLA", 10).await;

        let invoice = svc
            .place_order(TENANT, &[line(&product, 4)], &draft(20_000, 0))
            .await
            .unwrap();
        assert_eq!(
            svc.db.products().get(TENANT, &product.id, false).await.unwrap().stock,
            6
        );

        // Edit the product in between; the snapshot must still drive the credit.
        svc.db
            .products()
            .update(
                TENANT,
                &product.id,
                &ProductPatch {
                    name: Some("Cola Zero".to_string()),
                    price_cents: Some(9999),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let outcome = svc.cancel_order(TENANT, &invoice.id).await.unwrap();
        assert_eq!(outcome.restored.len(), 1);
        assert_eq!(outcome.restored[0].new_stock, 10);
        assert!(outcome.missing_products.is_empty());

        // Back to the pre-order level.
        let fresh = svc.db.products().get(TENANT, &product.id, false).await.unwrap();
        assert_eq!(fresh.stock, 10);

        // The invoice is cancelled and hidden from default reads.
        let cancelled = svc.db.invoices().get(TENANT, &invoice.id, true).await.unwrap();
        assert_eq!(cancelled.status, InvoiceStatus::Cancelled);
        assert!(cancelled.is_deleted);
    }

    #[tokio::test]
    async fn test_cancel_with_deleted_product_warns_not_fails() {
        let svc = service().await;
        let product = seed_product(&svc, "Cola", "COLA", 10).await;

        let invoice = svc
            .place_order(TENANT, &[line(&product, 4)], &draft(20_000, 0))
            .await
            .unwrap();

        svc.db.products().soft_delete(TENANT, &product.id).await.unwrap();

        let outcome = svc.cancel_order(TENANT, &invoice.id).await.unwrap();
        assert!(outcome.restored.is_empty());
        assert_eq!(outcome.missing_products, vec![product.id.clone()]);
    }

    #[tokio::test]
    async fn test_cancel_twice_rejected() {
        let svc = service().await;
        let product = seed_product(&svc, "Cola", "COLA", 10).await;

        let invoice = svc
            .place_order(TENANT, &[line(&product, 1)], &draft(5000, 0))
            .await
            .unwrap();

        svc.cancel_order(TENANT, &invoice.id).await.unwrap();
        // The cancelled invoice is soft-deleted: a second cancel can't see it.
        assert!(matches!(
            svc.cancel_order(TENANT, &invoice.id).await.unwrap_err(),
            OrderError::Db(DbError::NotFound { .. })
        ));

        // Stock was credited exactly once.
        let fresh = svc.db.products().get(TENANT, &product.id, false).await.unwrap();
        assert_eq!(fresh.stock, 10);
    }

    #[tokio::test]
    async fn test_invoice_snapshot_survives_product_edits() {
        let svc = service().await;
        let product = seed_product(&svc, "Cola", "COLA", 10).await;

        let cart = [CartLine {
            product_id: product.id.clone(),
            variant_id: None,
            quantity: 3,
            unit_price_cents: Some(50),
        }];
        let invoice = svc.place_order(TENANT, &cart, &draft(150, 0)).await.unwrap();

        svc.db
            .products()
            .update(
                TENANT,
                &product.id,
                &ProductPatch {
                    price_cents: Some(75),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let fetched = svc.db.invoices().get(TENANT, &invoice.id, false).await.unwrap();
        assert_eq!(fetched.items[0].unit_price_cents, 50);
        assert_eq!(fetched.items[0].line_total_cents, 150);
    }

    #[tokio::test]
    async fn test_resolve_barcode() {
        let svc = service().await;
        let shirt = seed_shirt(&svc).await;

        let hit = svc.resolve_barcode(TENANT, "PROD-SHIRT").await.unwrap().unwrap();
        assert_eq!(hit.product.id, shirt.id);
        assert_eq!(hit.variant_index, None);
        assert_eq!(hit.unit_price_cents(), 2500);

        let hit = svc.resolve_barcode(TENANT, "VAR-RED").await.unwrap().unwrap();
        assert_eq!(hit.product.id, shirt.id);
        assert_eq!(hit.variant_index, Some(0));
        assert_eq!(hit.unit_price_cents(), 2500);

        assert!(svc.resolve_barcode(TENANT, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inactive_product_not_sellable() {
        let svc = service().await;
        let product = seed_product(&svc, "Cola", "COLA", 10).await;
        svc.db
            .products()
            .update(
                TENANT,
                &product.id,
                &ProductPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            svc.place_order(TENANT, &[line(&product, 1)], &draft(5000, 0))
                .await
                .unwrap_err(),
            OrderError::ProductInactive { .. }
        ));
    }
}
