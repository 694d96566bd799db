//! # Catalog Repository
//!
//! Database operations for products and their variants.
//!
//! ## Write Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product Write Pipeline                               │
//! │                                                                         │
//! │  create(tenant, draft)                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Field validation (vendora-core)                                    │
//! │  2. SKU uniqueness check          ── tenant scope, live products only  │
//! │  3. Barcode uniqueness check      ── tenant scope, when present        │
//! │  4. Variant barcode checks        ── tenant scope, across ALL products │
//! │  5. Resolve stock source          ── derived from variants when any    │
//! │  6. INSERT product + variant rows ── one transaction                   │
//! │                                                                         │
//! │  Empty-string SKUs/barcodes are normalized to NULL before step 2, so   │
//! │  absent codes never collide with each other.                           │
//! │                                                                         │
//! │  The partial unique indexes re-check steps 2-4 at the storage level;   │
//! │  a write that slips between check and insert still fails cleanly.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Adjustment
//! `adjust_stock` is the sole mutation primitive for stock levels. It is a
//! single conditional UPDATE (`stock + delta >= 0`), so two concurrent
//! debits can never oversell: the second one fails instead of racing a
//! read-modify-write cycle.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use vendora_core::validation::{self, normalize_code};
use vendora_core::{
    BarcodeType, NewProduct, Product, ProductPatch, StockSource, Variant, VariantDraft,
};

// =============================================================================
// Row Types
// =============================================================================

/// Raw product row; variants are loaded separately and attached.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    tenant_id: String,
    name: String,
    sku: Option<String>,
    barcode: Option<String>,
    barcode_type: BarcodeType,
    description: Option<String>,
    category: String,
    brand: Option<String>,
    price_cents: i64,
    cost_cents: Option<i64>,
    stock: i64,
    unit: String,
    tax_rate_bps: Option<u32>,
    min_stock: i64,
    expiry_date: Option<NaiveDate>,
    is_active: bool,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, variants: Vec<Variant>) -> Product {
        Product {
            id: self.id,
            tenant_id: self.tenant_id,
            name: self.name,
            sku: self.sku,
            barcode: self.barcode,
            barcode_type: self.barcode_type,
            description: self.description,
            category: self.category,
            brand: self.brand,
            price_cents: self.price_cents,
            cost_cents: self.cost_cents,
            stock: self.stock,
            unit: self.unit,
            tax_rate_bps: self.tax_rate_bps,
            min_stock: self.min_stock,
            expiry_date: self.expiry_date,
            is_active: self.is_active,
            variants,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Raw variant row; options/attributes are JSON text columns.
#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: String,
    product_id: String,
    name: Option<String>,
    options: String,
    price_cents: i64,
    stock: i64,
    sku: Option<String>,
    barcode: Option<String>,
    barcode_type: BarcodeType,
    cost_cents: Option<i64>,
    attributes: String,
}

impl VariantRow {
    fn into_variant(self) -> DbResult<Variant> {
        Ok(Variant {
            id: self.id,
            name: self.name,
            options: serde_json::from_str(&self.options)?,
            price_cents: self.price_cents,
            stock: self.stock,
            sku: self.sku,
            barcode: self.barcode,
            barcode_type: self.barcode_type,
            cost_cents: self.cost_cents,
            attributes: serde_json::from_str(&self.attributes)?,
        })
    }
}

const PRODUCT_COLS: &str = "id, tenant_id, name, sku, barcode, barcode_type, description, \
     category, brand, price_cents, cost_cents, stock, unit, tax_rate_bps, min_stock, \
     expiry_date, is_active, is_deleted, deleted_at, created_at, updated_at";

const VARIANT_COLS: &str = "id, product_id, name, options, price_cents, stock, sku, barcode, \
     barcode_type, cost_cents, attributes";

// =============================================================================
// Bulk Import
// =============================================================================

/// Outcome of a catalog bulk import.
///
/// Recoverable per-row failures (validation, duplicates) are collected;
/// infrastructure failures abort the import.
#[derive(Debug, Default)]
pub struct ImportSummary {
    /// IDs of the products created, in input order.
    pub created: Vec<String>,
    /// Rows that were skipped, with the reason.
    pub failures: Vec<ImportFailure>,
}

/// A skipped row in a bulk import.
#[derive(Debug)]
pub struct ImportFailure {
    /// Index of the draft in the input batch.
    pub index: usize,
    pub reason: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product and variant database operations.
///
/// All read methods take an explicit `include_deleted` flag; passing
/// `false` gives the default soft-delete-filtered view, and every call
/// site shows which view it reads.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Creates a product (and its variants) for a tenant.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The persisted product
    /// * `Err(DbError::Validation)` - Field validation failed
    /// * `Err(DbError::DuplicateSku | DuplicateBarcode | DuplicateVariantBarcode)`
    pub async fn create(&self, tenant: &str, draft: &NewProduct) -> DbResult<Product> {
        validation::validate_new_product(draft)?;

        let sku = normalize_code(draft.sku.clone());
        let barcode = normalize_code(draft.barcode.clone());

        if let Some(sku) = &sku {
            self.ensure_sku_free(tenant, sku, None).await?;
        }
        if let Some(barcode) = &barcode {
            self.ensure_barcode_free(tenant, barcode, None).await?;
        }
        for code in variant_barcodes(&draft.variants)? {
            self.ensure_variant_barcode_free(tenant, &code, None).await?;
        }

        let source = StockSource::classify(draft.stock, !draft.variants.is_empty());
        let stock = source.resolve(draft.variants.iter().map(|v| v.stock));

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let variants = build_variants(&draft.variants);

        debug!(tenant = %tenant, id = %id, name = %draft.name, "Creating product");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, name, sku, barcode, barcode_type, description,
                category, brand, price_cents, cost_cents, stock, unit,
                tax_rate_bps, min_stock, expiry_date, is_active,
                is_deleted, deleted_at, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17,
                0, NULL, ?18, ?18
            )
            "#,
        )
        .bind(&id)
        .bind(tenant)
        .bind(draft.name.trim())
        .bind(&sku)
        .bind(&barcode)
        .bind(draft.barcode_type)
        .bind(&draft.description)
        .bind(&draft.category)
        .bind(&draft.brand)
        .bind(draft.price_cents)
        .bind(draft.cost_cents)
        .bind(stock)
        .bind(draft.unit.as_deref().unwrap_or("pcs"))
        .bind(draft.tax_rate_bps)
        .bind(draft.min_stock)
        .bind(draft.expiry_date)
        .bind(draft.is_active.unwrap_or(true))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for (position, variant) in variants.iter().enumerate() {
            insert_variant(&mut tx, tenant, &id, position as i64, variant).await?;
        }

        tx.commit().await?;

        self.get(tenant, &id, false).await
    }

    /// Imports a batch of product drafts.
    ///
    /// Per-row validation and duplicate failures do not abort the batch;
    /// they are reported in the summary so the caller can surface them
    /// row by row.
    pub async fn bulk_create(&self, tenant: &str, drafts: &[NewProduct]) -> DbResult<ImportSummary> {
        let mut summary = ImportSummary::default();

        for (index, draft) in drafts.iter().enumerate() {
            match self.create(tenant, draft).await {
                Ok(product) => summary.created.push(product.id),
                Err(
                    err @ (DbError::Validation(_)
                    | DbError::DuplicateSku { .. }
                    | DbError::DuplicateBarcode { .. }
                    | DbError::DuplicateVariantBarcode { .. }),
                ) => summary.failures.push(ImportFailure {
                    index,
                    reason: err.to_string(),
                }),
                Err(other) => return Err(other),
            }
        }

        debug!(
            tenant = %tenant,
            created = summary.created.len(),
            failed = summary.failures.len(),
            "Bulk import finished"
        );

        Ok(summary)
    }

    // -------------------------------------------------------------------------
    // Update
    // -------------------------------------------------------------------------

    /// Applies a partial update to a product.
    ///
    /// ## Semantics
    /// - Absent patch fields leave the stored value unchanged
    /// - An empty-string `sku`/`barcode` clears the field
    /// - A changed barcode re-runs the uniqueness check (excluding self)
    /// - A present `variants` list replaces the variant set wholesale,
    ///   re-runs the variant barcode checks (excluding self) and derives
    ///   `stock` from the new variants
    /// - An explicit `stock` is honored only when the product ends up
    ///   variant-free
    pub async fn update(&self, tenant: &str, id: &str, patch: &ProductPatch) -> DbResult<Product> {
        validation::validate_product_patch(patch)?;

        let current = self.get(tenant, id, false).await?;

        let sku = match &patch.sku {
            Some(raw) => normalize_code(Some(raw.clone())),
            None => current.sku.clone(),
        };
        if let Some(new_sku) = &sku {
            if current.sku.as_deref() != Some(new_sku) {
                self.ensure_sku_free(tenant, new_sku, Some(id)).await?;
            }
        }

        let barcode = match &patch.barcode {
            Some(raw) => normalize_code(Some(raw.clone())),
            None => current.barcode.clone(),
        };
        if let Some(new_barcode) = &barcode {
            if current.barcode.as_deref() != Some(new_barcode) {
                self.ensure_barcode_free(tenant, new_barcode, Some(id)).await?;
            }
        }

        let variants = match &patch.variants {
            Some(drafts) => {
                for code in variant_barcodes(drafts)? {
                    self.ensure_variant_barcode_free(tenant, &code, Some(id))
                        .await?;
                }
                Some(build_variants(drafts))
            }
            None => None,
        };

        let next_variants = variants.as_deref().unwrap_or(&current.variants);
        let source = StockSource::classify(
            patch.stock.or(Some(current.stock)),
            !next_variants.is_empty(),
        );
        let stock = source.resolve(next_variants.iter().map(|v| v.stock));

        let now = Utc::now();

        debug!(tenant = %tenant, id = %id, "Updating product");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?3,
                sku = ?4,
                barcode = ?5,
                barcode_type = ?6,
                description = ?7,
                category = ?8,
                brand = ?9,
                price_cents = ?10,
                cost_cents = ?11,
                stock = ?12,
                unit = ?13,
                tax_rate_bps = ?14,
                min_stock = ?15,
                expiry_date = ?16,
                is_active = ?17,
                updated_at = ?18
            WHERE id = ?1 AND tenant_id = ?2 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(tenant)
        .bind(patch.name.as_deref().map(str::trim).unwrap_or(&current.name))
        .bind(&sku)
        .bind(&barcode)
        .bind(patch.barcode_type.unwrap_or(current.barcode_type))
        .bind(patch.description.as_deref().or(current.description.as_deref()))
        .bind(patch.category.as_deref().unwrap_or(&current.category))
        .bind(patch.brand.as_deref().or(current.brand.as_deref()))
        .bind(patch.price_cents.unwrap_or(current.price_cents))
        .bind(patch.cost_cents.or(current.cost_cents))
        .bind(stock)
        .bind(patch.unit.as_deref().unwrap_or(&current.unit))
        .bind(patch.tax_rate_bps.or(current.tax_rate_bps))
        .bind(patch.min_stock.unwrap_or(current.min_stock))
        .bind(patch.expiry_date.or(current.expiry_date))
        .bind(patch.is_active.unwrap_or(current.is_active))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        if let Some(variants) = &variants {
            sqlx::query("DELETE FROM product_variants WHERE product_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for (position, variant) in variants.iter().enumerate() {
                insert_variant(&mut tx, tenant, id, position as i64, variant).await?;
            }
        }

        tx.commit().await?;

        self.get(tenant, id, false).await
    }

    // -------------------------------------------------------------------------
    // Stock Adjustment
    // -------------------------------------------------------------------------

    /// Adjusts a stock level by `delta` (negative for sales, positive for
    /// restocking or credits) and returns the new level.
    ///
    /// ## Atomicity
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  ❌ DISALLOWED: read stock, compute, write stock                    │
    /// │     (two concurrent sales both read 10, both write 4 → oversold)   │
    /// │                                                                     │
    /// │  ✅ THIS METHOD: single conditional UPDATE                          │
    /// │     UPDATE ... SET stock = stock + ?delta                          │
    /// │     WHERE ... AND stock + ?delta >= 0                              │
    /// │     (the second concurrent debit matches no row and is rejected)   │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Returns
    /// * `Ok(new_stock)` - Adjustment applied
    /// * `Err(DbError::InsufficientStock)` - Debit would go negative; stock unchanged
    /// * `Err(DbError::NotFound)` - Product/variant absent or soft-deleted
    pub async fn adjust_stock(
        &self,
        tenant: &str,
        product_id: &str,
        variant_id: Option<&str>,
        delta: i64,
    ) -> DbResult<i64> {
        match variant_id {
            Some(variant_id) => {
                self.adjust_variant_stock(tenant, product_id, variant_id, delta)
                    .await
            }
            None => self.adjust_product_stock(tenant, product_id, delta).await,
        }
    }

    async fn adjust_product_stock(
        &self,
        tenant: &str,
        product_id: &str,
        delta: i64,
    ) -> DbResult<i64> {
        let now = Utc::now();

        let new_stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock + ?3, updated_at = ?4
            WHERE id = ?1 AND tenant_id = ?2 AND is_deleted = 0
              AND stock + ?3 >= 0
            RETURNING stock
            "#,
        )
        .bind(product_id)
        .bind(tenant)
        .bind(delta)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match new_stock {
            Some(stock) => {
                debug!(tenant = %tenant, product = %product_id, delta = %delta, stock = %stock, "Stock adjusted");
                Ok(stock)
            }
            None => {
                let available: Option<i64> = sqlx::query_scalar(
                    "SELECT stock FROM products WHERE id = ?1 AND tenant_id = ?2 AND is_deleted = 0",
                )
                .bind(product_id)
                .bind(tenant)
                .fetch_optional(&self.pool)
                .await?;

                match available {
                    Some(available) => Err(DbError::InsufficientStock {
                        target: product_id.to_string(),
                        available,
                        requested: -delta,
                    }),
                    None => Err(DbError::not_found("Product", product_id)),
                }
            }
        }
    }

    async fn adjust_variant_stock(
        &self,
        tenant: &str,
        product_id: &str,
        variant_id: &str,
        delta: i64,
    ) -> DbResult<i64> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let new_stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE product_variants
            SET stock = stock + ?4
            WHERE product_id = ?1 AND id = ?2 AND tenant_id = ?3
              AND stock + ?4 >= 0
              AND EXISTS (
                  SELECT 1 FROM products p
                  WHERE p.id = ?1 AND p.tenant_id = ?3 AND p.is_deleted = 0
              )
            RETURNING stock
            "#,
        )
        .bind(product_id)
        .bind(variant_id)
        .bind(tenant)
        .bind(delta)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(stock) = new_stock else {
            let available: Option<i64> = sqlx::query_scalar(
                r#"
                SELECT v.stock FROM product_variants v
                JOIN products p ON p.id = v.product_id
                WHERE v.product_id = ?1 AND v.id = ?2 AND v.tenant_id = ?3
                  AND p.is_deleted = 0
                "#,
            )
            .bind(product_id)
            .bind(variant_id)
            .bind(tenant)
            .fetch_optional(&mut *tx)
            .await?;

            return match available {
                Some(available) => Err(DbError::InsufficientStock {
                    target: format!("{product_id}/{variant_id}"),
                    available,
                    requested: -delta,
                }),
                None => Err(DbError::not_found("Variant", variant_id)),
            };
        };

        // The parent's stock is derived; resynchronize it in the same
        // transaction so the invariant holds at commit.
        sqlx::query(
            r#"
            UPDATE products
            SET stock = (
                SELECT COALESCE(SUM(stock), 0) FROM product_variants
                WHERE product_id = ?1
            ),
            updated_at = ?3
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(product_id)
        .bind(tenant)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(tenant = %tenant, product = %product_id, variant = %variant_id, delta = %delta, stock = %stock, "Variant stock adjusted");
        Ok(stock)
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Gets a product by ID, with its variants.
    ///
    /// `include_deleted = false` gives the default filtered view; an
    /// absent, soft-deleted or other-tenant product is `NotFound`.
    pub async fn get(&self, tenant: &str, id: &str, include_deleted: bool) -> DbResult<Product> {
        let query = format!(
            "SELECT {PRODUCT_COLS} FROM products \
             WHERE id = ?1 AND tenant_id = ?2 AND (?3 OR is_deleted = 0)"
        );

        let row: Option<ProductRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(tenant)
            .bind(include_deleted)
            .fetch_optional(&self.pool)
            .await?;

        let row = row.ok_or_else(|| DbError::not_found("Product", id))?;
        let variants = self.load_variants(id).await?;
        Ok(row.into_product(variants))
    }

    /// Lists a tenant's products with variants, sorted by name.
    pub async fn list(&self, tenant: &str, include_deleted: bool) -> DbResult<Vec<Product>> {
        let query = format!(
            "SELECT {PRODUCT_COLS} FROM products \
             WHERE tenant_id = ?1 AND (?2 OR is_deleted = 0) ORDER BY name"
        );

        let rows: Vec<ProductRow> = sqlx::query_as(&query)
            .bind(tenant)
            .bind(include_deleted)
            .fetch_all(&self.pool)
            .await?;

        let variant_query = format!(
            "SELECT {VARIANT_COLS} FROM product_variants \
             WHERE tenant_id = ?1 ORDER BY product_id, position"
        );
        let variant_rows: Vec<VariantRow> = sqlx::query_as(&variant_query)
            .bind(tenant)
            .fetch_all(&self.pool)
            .await?;

        let mut grouped: std::collections::HashMap<String, Vec<Variant>> =
            std::collections::HashMap::new();
        for row in variant_rows {
            let product_id = row.product_id.clone();
            grouped.entry(product_id).or_default().push(row.into_variant()?);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let variants = grouped.remove(&row.id).unwrap_or_default();
                row.into_product(variants)
            })
            .collect())
    }

    /// Counts a tenant's live products.
    pub async fn count(&self, tenant: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE tenant_id = ?1 AND is_deleted = 0",
        )
        .bind(tenant)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Point lookup by product barcode. Soft-deleted products never match.
    pub async fn find_by_barcode(&self, tenant: &str, barcode: &str) -> DbResult<Option<Product>> {
        let query = format!(
            "SELECT {PRODUCT_COLS} FROM products \
             WHERE tenant_id = ?1 AND barcode = ?2 AND is_deleted = 0"
        );

        let row: Option<ProductRow> = sqlx::query_as(&query)
            .bind(tenant)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let variants = self.load_variants(&row.id).await?;
                Ok(Some(row.into_product(variants)))
            }
            None => Ok(None),
        }
    }

    /// Point lookup by variant barcode.
    ///
    /// ## Returns
    /// The parent product plus the index of the matching variant inside
    /// `product.variants`, or `None` when no live product matches.
    pub async fn find_by_variant_barcode(
        &self,
        tenant: &str,
        barcode: &str,
    ) -> DbResult<Option<(Product, usize)>> {
        let hit: Option<(String, String)> = sqlx::query_as(
            r#"
            SELECT v.product_id, v.id FROM product_variants v
            JOIN products p ON p.id = v.product_id
            WHERE v.tenant_id = ?1 AND v.barcode = ?2 AND p.is_deleted = 0
            "#,
        )
        .bind(tenant)
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        let Some((product_id, variant_id)) = hit else {
            return Ok(None);
        };

        let product = self.get(tenant, &product_id, false).await?;
        let index = product
            .variants
            .iter()
            .position(|v| v.id == variant_id)
            .ok_or_else(|| DbError::not_found("Variant", &variant_id))?;

        Ok(Some((product, index)))
    }

    /// Lists live, active products at or below their reorder threshold.
    pub async fn low_stock(&self, tenant: &str) -> DbResult<Vec<Product>> {
        let query = format!(
            "SELECT {PRODUCT_COLS} FROM products \
             WHERE tenant_id = ?1 AND is_deleted = 0 AND is_active = 1 \
               AND stock <= min_stock ORDER BY name"
        );

        let rows: Vec<ProductRow> = sqlx::query_as(&query)
            .bind(tenant)
            .fetch_all(&self.pool)
            .await?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let variants = self.load_variants(&row.id).await?;
            products.push(row.into_product(variants));
        }
        Ok(products)
    }

    // -------------------------------------------------------------------------
    // Soft Delete
    // -------------------------------------------------------------------------

    /// Soft-deletes a product. It disappears from default reads but stays
    /// restorable with all fields intact.
    pub async fn soft_delete(&self, tenant: &str, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_deleted = 1, deleted_at = ?3, updated_at = ?3
            WHERE id = ?1 AND tenant_id = ?2 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(tenant)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        debug!(tenant = %tenant, id = %id, "Product soft-deleted");
        Ok(())
    }

    /// Restores a soft-deleted product.
    ///
    /// Fails with a duplicate error if the SKU was reused by another live
    /// product while this one was deleted (the partial index re-checks).
    pub async fn restore(&self, tenant: &str, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_deleted = 0, deleted_at = NULL, updated_at = ?3
            WHERE id = ?1 AND tenant_id = ?2 AND is_deleted = 1
            "#,
        )
        .bind(id)
        .bind(tenant)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        debug!(tenant = %tenant, id = %id, "Product restored");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Uniqueness Checks
    // -------------------------------------------------------------------------

    async fn ensure_sku_free(
        &self,
        tenant: &str,
        sku: &str,
        exclude_id: Option<&str>,
    ) -> DbResult<()> {
        let existing: Option<String> = sqlx::query_scalar(
            r#"
            SELECT id FROM products
            WHERE tenant_id = ?1 AND sku = ?2 AND is_deleted = 0
              AND (?3 IS NULL OR id <> ?3)
            LIMIT 1
            "#,
        )
        .bind(tenant)
        .bind(sku)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            return Err(DbError::DuplicateSku {
                sku: sku.to_string(),
            });
        }
        Ok(())
    }

    async fn ensure_barcode_free(
        &self,
        tenant: &str,
        barcode: &str,
        exclude_id: Option<&str>,
    ) -> DbResult<()> {
        let existing: Option<String> = sqlx::query_scalar(
            r#"
            SELECT id FROM products
            WHERE tenant_id = ?1 AND barcode = ?2
              AND (?3 IS NULL OR id <> ?3)
            LIMIT 1
            "#,
        )
        .bind(tenant)
        .bind(barcode)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            return Err(DbError::DuplicateBarcode {
                barcode: barcode.to_string(),
            });
        }
        Ok(())
    }

    async fn ensure_variant_barcode_free(
        &self,
        tenant: &str,
        barcode: &str,
        exclude_product_id: Option<&str>,
    ) -> DbResult<()> {
        let existing: Option<String> = sqlx::query_scalar(
            r#"
            SELECT product_id FROM product_variants
            WHERE tenant_id = ?1 AND barcode = ?2
              AND (?3 IS NULL OR product_id <> ?3)
            LIMIT 1
            "#,
        )
        .bind(tenant)
        .bind(barcode)
        .bind(exclude_product_id)
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            return Err(DbError::DuplicateVariantBarcode {
                barcode: barcode.to_string(),
            });
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    async fn load_variants(&self, product_id: &str) -> DbResult<Vec<Variant>> {
        let query = format!(
            "SELECT {VARIANT_COLS} FROM product_variants \
             WHERE product_id = ?1 ORDER BY position"
        );

        let rows: Vec<VariantRow> = sqlx::query_as(&query)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(VariantRow::into_variant).collect()
    }
}

/// Builds domain variants (with fresh local IDs) from drafts, normalizing
/// the business codes.
fn build_variants(drafts: &[VariantDraft]) -> Vec<Variant> {
    drafts
        .iter()
        .map(|draft| Variant {
            id: Uuid::new_v4().to_string(),
            name: draft.name.clone(),
            options: draft.options.clone(),
            price_cents: draft.price_cents,
            stock: draft.stock,
            sku: normalize_code(draft.sku.clone()),
            barcode: normalize_code(draft.barcode.clone()),
            barcode_type: draft.barcode_type,
            cost_cents: draft.cost_cents,
            attributes: draft.attributes.clone(),
        })
        .collect()
}

/// Collects the normalized variant barcodes of a draft set, rejecting
/// duplicates inside the set itself.
fn variant_barcodes(drafts: &[VariantDraft]) -> DbResult<Vec<String>> {
    let mut seen = Vec::new();
    for draft in drafts {
        if let Some(code) = normalize_code(draft.barcode.clone()) {
            if seen.contains(&code) {
                return Err(DbError::DuplicateVariantBarcode { barcode: code });
            }
            seen.push(code);
        }
    }
    Ok(seen)
}

async fn insert_variant(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    tenant: &str,
    product_id: &str,
    position: i64,
    variant: &Variant,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO product_variants (
            id, product_id, tenant_id, position, name, options,
            price_cents, stock, sku, barcode, barcode_type, cost_cents, attributes
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11, ?12, ?13
        )
        "#,
    )
    .bind(&variant.id)
    .bind(product_id)
    .bind(tenant)
    .bind(position)
    .bind(&variant.name)
    .bind(serde_json::to_string(&variant.options)?)
    .bind(variant.price_cents)
    .bind(variant.stock)
    .bind(&variant.sku)
    .bind(&variant.barcode)
    .bind(variant.barcode_type)
    .bind(variant.cost_cents)
    .bind(serde_json::to_string(&variant.attributes)?)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
