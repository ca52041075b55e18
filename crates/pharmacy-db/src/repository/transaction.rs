//! # Transaction Repository
//!
//! Read access to completed sales plus bulk import of historical rows.
//!
//! ## Detail Join
//! ```text
//! transactions t ──JOIN──► masks m                 (mask name)
//!        │
//!        └──LEFT JOIN──► pharmacy_masks pm         (price as listed TODAY)
//!                        ON pm.pharmacy_id = t.pharmacy_id
//!                       AND pm.mask_id     = t.mask_id
//! ```
//! The amount actually paid is `transaction_amount_cents`. The joined price
//! may differ after a re-pricing and is `NULL` once the listing is removed.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use pharmacy_core::{
    DateRange, MaskAtPrice, NewTransaction, PageRequest, Transaction, TransactionDetail,
    TransactionTotals,
};

use super::timestamp;
use crate::error::{DbError, DbResult};

/// Flat row of the detail join.
#[derive(Debug, sqlx::FromRow)]
struct DetailRow {
    id: i64,
    user_id: i64,
    pharmacy_id: i64,
    mask_id: i64,
    transaction_amount_cents: i64,
    transaction_date: DateTime<Utc>,
    mask_name: String,
    mask_price_cents: Option<i64>,
}

impl From<DetailRow> for TransactionDetail {
    fn from(row: DetailRow) -> Self {
        TransactionDetail {
            id: row.id,
            user_id: row.user_id,
            pharmacy_id: row.pharmacy_id,
            mask_id: row.mask_id,
            transaction_amount_cents: row.transaction_amount_cents,
            transaction_date: row.transaction_date,
            mask: MaskAtPrice {
                id: row.mask_id,
                name: row.mask_name,
                price_cents: row.mask_price_cents,
            },
        }
    }
}

const DETAIL_SELECT: &str = r#"
    SELECT t.id,
           t.user_id,
           t.pharmacy_id,
           t.mask_id,
           t.transaction_amount_cents,
           t.transaction_date,
           m.name AS mask_name,
           pm.price_cents AS mask_price_cents
    FROM transactions t
    JOIN masks m ON m.id = t.mask_id
    LEFT JOIN pharmacy_masks pm
           ON pm.pharmacy_id = t.pharmacy_id
          AND pm.mask_id = t.mask_id
"#;

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Transaction>> {
        let tx = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, pharmacy_id, mask_id, transaction_amount_cents, transaction_date
            FROM transactions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tx)
    }

    /// A transaction with its mask name and the current listing price.
    ///
    /// ## Errors
    /// - `NotFound("transaction")` when no such transaction exists
    pub async fn get_detail(&self, id: i64) -> DbResult<TransactionDetail> {
        debug!(transaction_id = id, "Getting transaction detail");

        let sql = format!("{DETAIL_SELECT} WHERE t.id = ?");
        let row = sqlx::query_as::<_, DetailRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("transaction", id))?;

        Ok(row.into())
    }

    /// Masks sold by one pharmacy, ordered by mask name then current price.
    pub async fn for_pharmacy(
        &self,
        pharmacy_id: i64,
        page: PageRequest,
    ) -> DbResult<Vec<TransactionDetail>> {
        debug!(pharmacy_id, "Listing sold masks");

        let sql = format!(
            "{DETAIL_SELECT} WHERE t.pharmacy_id = ? \
             ORDER BY m.name, pm.price_cents, t.id LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query_as::<_, DetailRow>(&sql)
            .bind(pharmacy_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Number and total value of transactions in `range`. Zero/zero if none.
    pub async fn summary(&self, range: DateRange) -> DbResult<TransactionTotals> {
        debug!(start = %range.start, end = %range.end, "Summarizing transactions");

        let totals = sqlx::query_as::<_, TransactionTotals>(
            r#"
            SELECT COUNT(*) AS transaction_count,
                   COALESCE(SUM(transaction_amount_cents), 0) AS total_amount_cents
            FROM transactions
            WHERE transaction_date BETWEEN ? AND ?
            "#,
        )
        .bind(timestamp(range.start))
        .bind(timestamp(range.end))
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }

    /// Writes a historical transaction as-is. Balances are not touched.
    pub async fn insert(&self, new: &NewTransaction) -> DbResult<Transaction> {
        let tx = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions
                (user_id, pharmacy_id, mask_id, transaction_amount_cents, transaction_date)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, user_id, pharmacy_id, mask_id, transaction_amount_cents, transaction_date
            "#,
        )
        .bind(new.user_id)
        .bind(new.pharmacy_id)
        .bind(new.mask_id)
        .bind(new.transaction_amount_cents)
        .bind(timestamp(new.transaction_date))
        .fetch_one(&self.pool)
        .await?;

        Ok(tx)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
