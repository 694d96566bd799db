//! # Invoice Repository
//!
//! Database operations for the invoice ledger.
//!
//! ## Invoice Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Invoice Lifecycle                                 │
//! │                                                                         │
//! │  1. INSERT (header + item snapshots, one transaction)                  │
//! │     └── totals are trusted: they were computed and validated upstream  │
//! │                                                                         │
//! │  2. PAYMENTS                                                           │
//! │     └── record_payment() → balance debited, status derived             │
//! │         Unpaid ──► PartiallyPaid ──► Paid                              │
//! │                                                                         │
//! │  3. CLOSE OUT                                                          │
//! │     └── update_status() → Refunded | Cancelled | Voided (terminal)     │
//! │                                                                         │
//! │  Items and totals are immutable history after step 1. Only status,    │
//! │  payments, balance, notes and the soft-delete fields ever change.      │
//! │                                                                         │
//! │  Stock is NEVER touched here - order placement and cancellation own    │
//! │  the cross-entity flow, keeping this component free of coupling.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use vendora_core::validation::validate_payment_amount;
use vendora_core::{
    Invoice, InvoiceItem, InvoiceKind, InvoicePayment, InvoiceStatus, NewPayment, PaymentMethod,
};

// =============================================================================
// Row Types
// =============================================================================

/// Raw invoice header row; items and payments are loaded separately.
#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    tenant_id: String,
    customer_id: Option<String>,
    customer_name: String,
    invoice_date: NaiveDate,
    kind: InvoiceKind,
    subtotal_cents: i64,
    tax_cents: i64,
    discount_cents: i64,
    additional_charges_cents: i64,
    round_off_cents: i64,
    total_cents: i64,
    status: InvoiceStatus,
    payment_method: PaymentMethod,
    balance_cents: i64,
    internal_notes: Option<String>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_invoice(self, items: Vec<InvoiceItem>, payments: Vec<InvoicePayment>) -> Invoice {
        Invoice {
            id: self.id,
            tenant_id: self.tenant_id,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            invoice_date: self.invoice_date,
            kind: self.kind,
            items,
            subtotal_cents: self.subtotal_cents,
            tax_cents: self.tax_cents,
            discount_cents: self.discount_cents,
            additional_charges_cents: self.additional_charges_cents,
            round_off_cents: self.round_off_cents,
            total_cents: self.total_cents,
            status: self.status,
            payment_method: self.payment_method,
            balance_cents: self.balance_cents,
            payments,
            internal_notes: self.internal_notes,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const INVOICE_COLS: &str = "id, tenant_id, customer_id, customer_name, invoice_date, kind, \
     subtotal_cents, tax_cents, discount_cents, additional_charges_cents, round_off_cents, \
     total_cents, status, payment_method, balance_cents, internal_notes, is_deleted, \
     deleted_at, created_at, updated_at";

const ITEM_COLS: &str = "id, invoice_id, product_id, variant_id, name_snapshot, \
     variant_name_snapshot, sku_snapshot, barcode_snapshot, quantity, unit_price_cents, \
     line_total_cents, created_at";

const PAYMENT_COLS: &str = "id, invoice_id, method, amount_cents, reference, note, created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Persists an invoice with its item snapshots (and any payments
    /// recorded at creation) in one transaction.
    ///
    /// Totals are trusted as given: they were computed and validated by
    /// the caller. Stock is not touched here.
    pub async fn insert(&self, tenant: &str, invoice: &Invoice) -> DbResult<()> {
        debug!(tenant = %tenant, id = %invoice.id, total = %invoice.total_cents, "Inserting invoice");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, tenant_id, customer_id, customer_name, invoice_date, kind,
                subtotal_cents, tax_cents, discount_cents, additional_charges_cents,
                round_off_cents, total_cents, status, payment_method, balance_cents,
                internal_notes, is_deleted, deleted_at, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15,
                ?16, 0, NULL, ?17, ?18
            )
            "#,
        )
        .bind(&invoice.id)
        .bind(tenant)
        .bind(&invoice.customer_id)
        .bind(&invoice.customer_name)
        .bind(invoice.invoice_date)
        .bind(invoice.kind)
        .bind(invoice.subtotal_cents)
        .bind(invoice.tax_cents)
        .bind(invoice.discount_cents)
        .bind(invoice.additional_charges_cents)
        .bind(invoice.round_off_cents)
        .bind(invoice.total_cents)
        .bind(invoice.status)
        .bind(invoice.payment_method)
        .bind(invoice.balance_cents)
        .bind(&invoice.internal_notes)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &invoice.items {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    id, invoice_id, product_id, variant_id, name_snapshot,
                    variant_name_snapshot, sku_snapshot, barcode_snapshot,
                    quantity, unit_price_cents, line_total_cents, created_at
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5,
                    ?6, ?7, ?8,
                    ?9, ?10, ?11, ?12
                )
                "#,
            )
            .bind(&item.id)
            .bind(&invoice.id)
            .bind(&item.product_id)
            .bind(&item.variant_id)
            .bind(&item.name_snapshot)
            .bind(&item.variant_name_snapshot)
            .bind(&item.sku_snapshot)
            .bind(&item.barcode_snapshot)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.line_total_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        for payment in &invoice.payments {
            insert_payment(&mut tx, &invoice.id, payment).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Gets an invoice by ID, with items and payments.
    pub async fn get(&self, tenant: &str, id: &str, include_deleted: bool) -> DbResult<Invoice> {
        let query = format!(
            "SELECT {INVOICE_COLS} FROM invoices \
             WHERE id = ?1 AND tenant_id = ?2 AND (?3 OR is_deleted = 0)"
        );

        let row: Option<InvoiceRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(tenant)
            .bind(include_deleted)
            .fetch_optional(&self.pool)
            .await?;

        let row = row.ok_or_else(|| DbError::not_found("Invoice", id))?;

        let items_query =
            format!("SELECT {ITEM_COLS} FROM invoice_items WHERE invoice_id = ?1 ORDER BY created_at, id");
        let items: Vec<InvoiceItem> = sqlx::query_as(&items_query)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        let payments_query = format!(
            "SELECT {PAYMENT_COLS} FROM invoice_payments WHERE invoice_id = ?1 ORDER BY created_at, id"
        );
        let payments: Vec<InvoicePayment> = sqlx::query_as(&payments_query)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(row.into_invoice(items, payments))
    }

    /// Lists a tenant's invoices, newest first, with items and payments.
    pub async fn list(&self, tenant: &str, include_deleted: bool) -> DbResult<Vec<Invoice>> {
        let query = format!(
            "SELECT {INVOICE_COLS} FROM invoices \
             WHERE tenant_id = ?1 AND (?2 OR is_deleted = 0) \
             ORDER BY invoice_date DESC, created_at DESC"
        );

        let rows: Vec<InvoiceRow> = sqlx::query_as(&query)
            .bind(tenant)
            .bind(include_deleted)
            .fetch_all(&self.pool)
            .await?;

        let items_query = format!(
            "SELECT {ITEM_COLS} FROM invoice_items WHERE invoice_id IN \
             (SELECT id FROM invoices WHERE tenant_id = ?1 AND (?2 OR is_deleted = 0)) \
             ORDER BY created_at, id"
        );
        let all_items: Vec<InvoiceItem> = sqlx::query_as(&items_query)
            .bind(tenant)
            .bind(include_deleted)
            .fetch_all(&self.pool)
            .await?;

        let payments_query = format!(
            "SELECT {PAYMENT_COLS} FROM invoice_payments WHERE invoice_id IN \
             (SELECT id FROM invoices WHERE tenant_id = ?1 AND (?2 OR is_deleted = 0)) \
             ORDER BY created_at, id"
        );
        let all_payments: Vec<InvoicePayment> = sqlx::query_as(&payments_query)
            .bind(tenant)
            .bind(include_deleted)
            .fetch_all(&self.pool)
            .await?;

        let mut items_by_invoice: std::collections::HashMap<String, Vec<InvoiceItem>> =
            std::collections::HashMap::new();
        for item in all_items {
            items_by_invoice
                .entry(item.invoice_id.clone())
                .or_default()
                .push(item);
        }

        let mut payments_by_invoice: std::collections::HashMap<String, Vec<InvoicePayment>> =
            std::collections::HashMap::new();
        for payment in all_payments {
            payments_by_invoice
                .entry(payment.invoice_id.clone())
                .or_default()
                .push(payment);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = items_by_invoice.remove(&row.id).unwrap_or_default();
                let payments = payments_by_invoice.remove(&row.id).unwrap_or_default();
                row.into_invoice(items, payments)
            })
            .collect())
    }

    // -------------------------------------------------------------------------
    // Status & Payments
    // -------------------------------------------------------------------------

    /// Moves an invoice to a new status.
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidStatusTransition)` - The state machine forbids
    ///   the move (terminal states accept nothing)
    pub async fn update_status(
        &self,
        tenant: &str,
        id: &str,
        to: InvoiceStatus,
    ) -> DbResult<Invoice> {
        let current = self.get(tenant, id, false).await?;

        if !current.status.can_transition(to) {
            return Err(DbError::InvalidStatusTransition {
                from: current.status,
                to,
            });
        }

        let now = Utc::now();
        sqlx::query(
            "UPDATE invoices SET status = ?3, updated_at = ?4 WHERE id = ?1 AND tenant_id = ?2",
        )
        .bind(id)
        .bind(tenant)
        .bind(to)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(tenant = %tenant, id = %id, from = ?current.status, to = ?to, "Invoice status updated");

        self.get(tenant, id, false).await
    }

    /// Records a payment and derives the resulting status.
    ///
    /// The balance is debited with a delta update (`balance_cents -
    /// amount`), never a read-modify-write, and the status CASE rides the
    /// same conditional statement so a settled or closed invoice rejects
    /// the payment atomically.
    pub async fn record_payment(
        &self,
        tenant: &str,
        id: &str,
        payment: &NewPayment,
    ) -> DbResult<Invoice> {
        validate_payment_amount(payment.amount_cents)?;

        let current = self.get(tenant, id, false).await?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET balance_cents = balance_cents - ?3,
                status = CASE
                    WHEN balance_cents - ?3 <= 0 THEN 'paid'
                    ELSE 'partially_paid'
                END,
                updated_at = ?4
            WHERE id = ?1 AND tenant_id = ?2 AND is_deleted = 0
              AND status IN ('unpaid', 'partially_paid')
            "#,
        )
        .bind(id)
        .bind(tenant)
        .bind(payment.amount_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // The invoice exists (the read above succeeded) but is settled
            // or closed out; report the rejected transition.
            let to = InvoiceStatus::from_balance(
                current.balance_cents - payment.amount_cents,
                current.total_cents,
            );
            return Err(DbError::InvalidStatusTransition {
                from: current.status,
                to,
            });
        }

        let record = InvoicePayment {
            id: Uuid::new_v4().to_string(),
            invoice_id: id.to_string(),
            method: payment.method,
            amount_cents: payment.amount_cents,
            reference: payment.reference.clone(),
            note: payment.note.clone(),
            created_at: now,
        };
        insert_payment(&mut tx, id, &record).await?;

        tx.commit().await?;

        debug!(tenant = %tenant, id = %id, amount = %payment.amount_cents, "Payment recorded");

        self.get(tenant, id, false).await
    }

    /// Updates the internal notes. The only free-text field that stays
    /// mutable after creation.
    pub async fn set_notes(&self, tenant: &str, id: &str, notes: Option<&str>) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE invoices SET internal_notes = ?3, updated_at = ?4
            WHERE id = ?1 AND tenant_id = ?2 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(tenant)
        .bind(notes)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Soft Delete
    // -------------------------------------------------------------------------

    /// Soft-deletes an invoice. Restoring stock is the order flow's job,
    /// not the ledger's.
    pub async fn soft_delete(&self, tenant: &str, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE invoices SET is_deleted = 1, deleted_at = ?3, updated_at = ?3
            WHERE id = ?1 AND tenant_id = ?2 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(tenant)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        debug!(tenant = %tenant, id = %id, "Invoice soft-deleted");
        Ok(())
    }

    /// Restores a soft-deleted invoice.
    pub async fn restore(&self, tenant: &str, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE invoices SET is_deleted = 0, deleted_at = NULL, updated_at = ?3
            WHERE id = ?1 AND tenant_id = ?2 AND is_deleted = 1
            "#,
        )
        .bind(id)
        .bind(tenant)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        Ok(())
    }

    /// Soft-deletes a batch of invoices; returns how many rows changed.
    ///
    /// Already-deleted or foreign IDs are skipped silently, matching the
    /// per-row semantics of `soft_delete`.
    pub async fn bulk_soft_delete(&self, tenant: &str, ids: &[String]) -> DbResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = ids
            .iter()
            .enumerate()
            .map(|(i, _)| format!("?{}", i + 3))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "UPDATE invoices SET is_deleted = 1, deleted_at = ?1, updated_at = ?1 \
             WHERE tenant_id = ?2 AND is_deleted = 0 AND id IN ({placeholders})"
        );

        let now = Utc::now();
        let mut q = sqlx::query(&query).bind(now).bind(tenant);
        for id in ids {
            q = q.bind(id);
        }
        let result = q.execute(&self.pool).await?;

        debug!(tenant = %tenant, requested = ids.len(), deleted = result.rows_affected(), "Bulk soft-delete");
        Ok(result.rows_affected())
    }
}

async fn insert_payment(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    invoice_id: &str,
    payment: &InvoicePayment,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoice_payments (
            id, invoice_id, method, amount_cents, reference, note, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&payment.id)
    .bind(invoice_id)
    .bind(payment.method)
    .bind(payment.amount_cents)
    .bind(&payment.reference)
    .bind(&payment.note)
    .bind(payment.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    const TENANT: &str = "tenant-a";

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Builds an unpaid single-line invoice ready for insert.
    fn credit_invoice(total_cents: i64) -> Invoice {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        Invoice {
            id: id.clone(),
            tenant_id: TENANT.to_string(),
            customer_id: None,
            customer_name: "Walk-in".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            kind: InvoiceKind::Credit,
            items: vec![InvoiceItem {
                id: Uuid::new_v4().to_string(),
                invoice_id: id,
                product_id: "prod-1".to_string(),
                variant_id: None,
                name_snapshot: "Cola".to_string(),
                variant_name_snapshot: None,
                sku_snapshot: Some("COLA".to_string()),
                barcode_snapshot: None,
                quantity: 3,
                unit_price_cents: total_cents / 3,
                line_total_cents: total_cents,
                created_at: now,
            }],
            subtotal_cents: total_cents,
            tax_cents: 0,
            discount_cents: 0,
            additional_charges_cents: 0,
            round_off_cents: 0,
            total_cents,
            status: InvoiceStatus::Unpaid,
            payment_method: PaymentMethod::Cash,
            balance_cents: total_cents,
            payments: vec![],
            internal_notes: None,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = db().await;
        let repo = db.invoices();

        let invoice = credit_invoice(150);
        repo.insert(TENANT, &invoice).await.unwrap();

        let fetched = repo.get(TENANT, &invoice.id, false).await.unwrap();
        assert_eq!(fetched.total_cents, 150);
        assert_eq!(fetched.items.len(), 1);
        assert_eq!(fetched.items[0].name_snapshot, "Cola");
        assert_eq!(fetched.items[0].quantity, 3);
        assert_eq!(fetched.status, InvoiceStatus::Unpaid);
        assert_eq!(fetched.balance_cents, 150);

        // Other tenants see nothing.
        assert!(matches!(
            repo.get("tenant-b", &invoice.id, false).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_payment_lifecycle() {
        let db = db().await;
        let repo = db.invoices();

        let invoice = credit_invoice(1000);
        repo.insert(TENANT, &invoice).await.unwrap();

        // Partial payment.
        let after = repo
            .record_payment(
                TENANT,
                &invoice.id,
                &NewPayment {
                    method: PaymentMethod::Upi,
                    amount_cents: 400,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(after.status, InvoiceStatus::PartiallyPaid);
        assert_eq!(after.balance_cents, 600);
        assert_eq!(after.payments.len(), 1);

        // Settling payment.
        let after = repo
            .record_payment(
                TENANT,
                &invoice.id,
                &NewPayment {
                    method: PaymentMethod::Cash,
                    amount_cents: 600,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(after.status, InvoiceStatus::Paid);
        assert_eq!(after.balance_cents, 0);
        assert_eq!(after.payments.len(), 2);

        // A settled invoice rejects further payments.
        let err = repo
            .record_payment(
                TENANT,
                &invoice.id,
                &NewPayment {
                    method: PaymentMethod::Cash,
                    amount_cents: 1,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidStatusTransition { .. }));
    }

    #[tokio::test]
    async fn test_zero_payment_rejected() {
        let db = db().await;
        let repo = db.invoices();

        let invoice = credit_invoice(100);
        repo.insert(TENANT, &invoice).await.unwrap();

        let err = repo
            .record_payment(TENANT, &invoice.id, &NewPayment::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_terminal_states_are_sticky() {
        let db = db().await;
        let repo = db.invoices();

        let invoice = credit_invoice(100);
        repo.insert(TENANT, &invoice).await.unwrap();

        let cancelled = repo
            .update_status(TENANT, &invoice.id, InvoiceStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, InvoiceStatus::Cancelled);

        // No way out of a terminal state.
        for to in [
            InvoiceStatus::Unpaid,
            InvoiceStatus::Paid,
            InvoiceStatus::Refunded,
        ] {
            let err = repo
                .update_status(TENANT, &invoice.id, to)
                .await
                .unwrap_err();
            assert!(matches!(err, DbError::InvalidStatusTransition { .. }));
        }

        // Payments on a cancelled invoice are rejected too.
        let err = repo
            .record_payment(
                TENANT,
                &invoice.id,
                &NewPayment {
                    amount_cents: 50,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidStatusTransition { .. }));
    }

    #[tokio::test]
    async fn test_notes_stay_mutable() {
        let db = db().await;
        let repo = db.invoices();

        let invoice = credit_invoice(100);
        repo.insert(TENANT, &invoice).await.unwrap();

        repo.set_notes(TENANT, &invoice.id, Some("called customer"))
            .await
            .unwrap();
        let fetched = repo.get(TENANT, &invoice.id, false).await.unwrap();
        assert_eq!(fetched.internal_notes.as_deref(), Some("called customer"));
    }

    #[tokio::test]
    async fn test_soft_delete_and_bulk() {
        let db = db().await;
        let repo = db.invoices();

        let a = credit_invoice(100);
        let b = credit_invoice(200);
        let c = credit_invoice(300);
        for invoice in [&a, &b, &c] {
            repo.insert(TENANT, invoice).await.unwrap();
        }

        repo.soft_delete(TENANT, &a.id).await.unwrap();
        assert_eq!(repo.list(TENANT, false).await.unwrap().len(), 2);
        assert_eq!(repo.list(TENANT, true).await.unwrap().len(), 3);

        // Bulk delete skips the already-deleted row.
        let deleted = repo
            .bulk_soft_delete(TENANT, &[a.id.clone(), b.id.clone(), c.id.clone()])
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert!(repo.list(TENANT, false).await.unwrap().is_empty());

        repo.restore(TENANT, &b.id).await.unwrap();
        let restored = repo.get(TENANT, &b.id, false).await.unwrap();
        assert_eq!(restored.total_cents, 200);
    }
}
