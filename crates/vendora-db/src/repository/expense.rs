//! # Expense Repository
//!
//! Database operations for business expenses. Expenses are independent of
//! the stock ledger; they share the tenant scoping and soft-delete
//! conventions of the rest of the schema.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use vendora_core::{Expense, NewExpense, ValidationError};

const EXPENSE_COLS: &str = "id, tenant_id, category, description, amount_cents, expense_date, \
     payment_method, reference, is_deleted, deleted_at, created_at, updated_at";

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Records an expense.
    pub async fn create(&self, tenant: &str, draft: &NewExpense) -> DbResult<Expense> {
        if draft.category.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "category".to_string(),
            }
            .into());
        }
        if draft.amount_cents < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "amount".to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant.to_string(),
            category: draft.category.trim().to_string(),
            description: draft.description.clone(),
            amount_cents: draft.amount_cents,
            expense_date: draft.expense_date,
            payment_method: draft.payment_method,
            reference: draft.reference.clone(),
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        debug!(tenant = %tenant, id = %expense.id, amount = %expense.amount_cents, "Recording expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, tenant_id, category, description, amount_cents, expense_date,
                payment_method, reference, is_deleted, deleted_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, NULL, ?9, ?9)
            "#,
        )
        .bind(&expense.id)
        .bind(tenant)
        .bind(&expense.category)
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(expense.expense_date)
        .bind(expense.payment_method)
        .bind(&expense.reference)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Gets an expense by ID.
    pub async fn get(&self, tenant: &str, id: &str, include_deleted: bool) -> DbResult<Expense> {
        let query = format!(
            "SELECT {EXPENSE_COLS} FROM expenses \
             WHERE id = ?1 AND tenant_id = ?2 AND (?3 OR is_deleted = 0)"
        );

        let expense: Option<Expense> = sqlx::query_as(&query)
            .bind(id)
            .bind(tenant)
            .bind(include_deleted)
            .fetch_optional(&self.pool)
            .await?;

        expense.ok_or_else(|| DbError::not_found("Expense", id))
    }

    /// Lists a tenant's expenses, newest first.
    pub async fn list(&self, tenant: &str, include_deleted: bool) -> DbResult<Vec<Expense>> {
        let query = format!(
            "SELECT {EXPENSE_COLS} FROM expenses \
             WHERE tenant_id = ?1 AND (?2 OR is_deleted = 0) \
             ORDER BY expense_date DESC, created_at DESC"
        );

        let expenses: Vec<Expense> = sqlx::query_as(&query)
            .bind(tenant)
            .bind(include_deleted)
            .fetch_all(&self.pool)
            .await?;

        Ok(expenses)
    }

    /// Sums live expenses over a date range (inclusive).
    pub async fn total_between(
        &self,
        tenant: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(amount_cents) FROM expenses
            WHERE tenant_id = ?1 AND is_deleted = 0
              AND expense_date >= ?2 AND expense_date <= ?3
            "#,
        )
        .bind(tenant)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Soft-deletes an expense.
    pub async fn soft_delete(&self, tenant: &str, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE expenses SET is_deleted = 1, deleted_at = ?3, updated_at = ?3
            WHERE id = ?1 AND tenant_id = ?2 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(tenant)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(())
    }

    /// Restores a soft-deleted expense.
    pub async fn restore(&self, tenant: &str, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE expenses SET is_deleted = 0, deleted_at = NULL, updated_at = ?3
            WHERE id = ?1 AND tenant_id = ?2 AND is_deleted = 1
            "#,
        )
        .bind(id)
        .bind(tenant)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    const TENANT: &str = "tenant-a";

    async fn repo() -> ExpenseRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.expenses()
    }

    fn rent(amount_cents: i64, day: u32) -> NewExpense {
        NewExpense {
            category: "rent".to_string(),
            description: None,
            amount_cents,
            expense_date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            payment_method: Default::default(),
            reference: None,
        }
    }

    #[tokio::test]
    async fn test_create_list_and_total() {
        let repo = repo().await;

        repo.create(TENANT, &rent(50_000, 1)).await.unwrap();
        repo.create(TENANT, &rent(1_500, 10)).await.unwrap();
        repo.create("tenant-b", &rent(9_999, 5)).await.unwrap();

        let expenses = repo.list(TENANT, false).await.unwrap();
        assert_eq!(expenses.len(), 2);

        let total = repo
            .total_between(
                TENANT,
                NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(total, 51_500);
    }

    #[tokio::test]
    async fn test_validation() {
        let repo = repo().await;

        let mut draft = rent(100, 1);
        draft.category = "  ".to_string();
        assert!(matches!(
            repo.create(TENANT, &draft).await.unwrap_err(),
            DbError::Validation(_)
        ));

        let mut draft = rent(100, 1);
        draft.amount_cents = -1;
        assert!(matches!(
            repo.create(TENANT, &draft).await.unwrap_err(),
            DbError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_soft_delete_round_trip() {
        let repo = repo().await;

        let expense = repo.create(TENANT, &rent(100, 1)).await.unwrap();
        repo.soft_delete(TENANT, &expense.id).await.unwrap();

        assert!(repo.list(TENANT, false).await.unwrap().is_empty());
        assert!(repo.get(TENANT, &expense.id, true).await.is_ok());

        repo.restore(TENANT, &expense.id).await.unwrap();
        let restored = repo.get(TENANT, &expense.id, false).await.unwrap();
        assert_eq!(restored.amount_cents, 100);
    }
}
