use sqlx::PgPool;
use tracing::{info, instrument};

use crate::discounts::reconcile::apply_action;
use crate::discounts::types::ReconcileAction;
use crate::models::{DiscountTrackerEntry, InvoiceRow};
use crate::months::MonthKey;
use crate::store::StoreError;

/// PostgreSQL-backed store. `invoice_rows` and `discount_tracker` mirror the
/// two spreadsheet tabs one row per sheet row.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_invoices(&self) -> Result<Vec<InvoiceRow>, StoreError> {
        let rows = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT customer_name, date, number, debit, credit, matching
            FROM invoice_rows
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self))]
    pub async fn list_entries(&self) -> Result<Vec<DiscountTrackerEntry>, StoreError> {
        let entries = sqlx::query_as::<_, DiscountTrackerEntry>(
            r#"
            SELECT customer_name, reconciliation_months, monthly_rebate, q_rent, b_rent
            FROM discount_tracker
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Toggles `month` for the customer inside one transaction. The entry
    /// row is locked with `FOR UPDATE` so concurrent toggles serialize.
    #[instrument(skip(self))]
    pub async fn reconcile(
        &self,
        customer_name: &str,
        month: MonthKey,
        action: ReconcileAction,
    ) -> Result<Vec<String>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(i64, Vec<String>)> = sqlx::query_as(
            r#"
            SELECT id, reconciliation_months
            FROM discount_tracker
            WHERE btrim(customer_name) = btrim($1)
            FOR UPDATE
            "#,
        )
        .bind(customer_name)
        .fetch_optional(&mut *tx)
        .await?;

        let (id, months) =
            current.ok_or_else(|| StoreError::CustomerNotFound(customer_name.to_string()))?;

        // A repeated toggle can still tidy a hand-edited list (order,
        // duplicates, whitespace), so compare against the stored value.
        let (updated, changed) = apply_action(&months, month, action);
        if updated != months {
            sqlx::query(
                r#"
                UPDATE discount_tracker
                SET reconciliation_months = $2
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(&updated)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            "{} {} for {} (changed: {})",
            action, month, customer_name, changed
        );
        Ok(updated)
    }
}
