//! # Mask Repository
//!
//! Masks, listing prices and per-mask sales.

use sqlx::SqlitePool;
use tracing::{debug, info};

use pharmacy_core::validation::validate_price_cents;
use pharmacy_core::{DateRange, Mask, MaskSalesSummary, NewMask, PharmacyMask};

use super::timestamp;
use crate::error::{DbError, DbResult};

/// Repository for mask database operations.
#[derive(Debug, Clone)]
pub struct MaskRepository {
    pool: SqlitePool,
}

impl MaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MaskRepository { pool }
    }

    /// Gets a mask by id, if it exists.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Mask>> {
        let mask = sqlx::query_as::<_, Mask>("SELECT id, name FROM masks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(mask)
    }

    /// Gets a mask by id or fails with `NotFound("mask")`.
    pub async fn get(&self, id: i64) -> DbResult<Mask> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("mask", id))
    }

    /// Inserts a mask and returns it with its new id.
    pub async fn insert(&self, new: &NewMask) -> DbResult<Mask> {
        let mask = sqlx::query_as::<_, Mask>(
            "INSERT INTO masks (name) VALUES (?) RETURNING id, name",
        )
        .bind(new.name.trim())
        .fetch_one(&self.pool)
        .await?;

        info!(mask_id = mask.id, name = %mask.name, "Mask created");
        Ok(mask)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM masks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Lists a mask at a pharmacy, or changes the price of an existing listing.
    ///
    /// A (pharmacy, mask) pair has at most one listing, so this never creates
    /// a duplicate.
    pub async fn upsert_listing(
        &self,
        pharmacy_id: i64,
        mask_id: i64,
        price_cents: i64,
    ) -> DbResult<PharmacyMask> {
        validate_price_cents(price_cents).map_err(pharmacy_core::CoreError::from)?;

        let listing = sqlx::query_as::<_, PharmacyMask>(
            r#"
            INSERT INTO pharmacy_masks (pharmacy_id, mask_id, price_cents)
            VALUES (?, ?, ?)
            ON CONFLICT (pharmacy_id, mask_id)
            DO UPDATE SET price_cents = excluded.price_cents
            RETURNING id, pharmacy_id, mask_id, price_cents
            "#,
        )
        .bind(pharmacy_id)
        .bind(mask_id)
        .bind(price_cents)
        .fetch_one(&self.pool)
        .await?;

        debug!(pharmacy_id, mask_id, price_cents, "Listing upserted");
        Ok(listing)
    }

    /// The listing for (pharmacy, mask), if any.
    pub async fn listing(&self, pharmacy_id: i64, mask_id: i64) -> DbResult<Option<PharmacyMask>> {
        let listing = sqlx::query_as::<_, PharmacyMask>(
            r#"
            SELECT id, pharmacy_id, mask_id, price_cents
            FROM pharmacy_masks
            WHERE pharmacy_id = ? AND mask_id = ?
            "#,
        )
        .bind(pharmacy_id)
        .bind(mask_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(listing)
    }

    /// Stops listing a mask at a pharmacy. Past transactions are untouched.
    pub async fn remove_listing(&self, pharmacy_id: i64, mask_id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM pharmacy_masks WHERE pharmacy_id = ? AND mask_id = ?")
            .bind(pharmacy_id)
            .bind(mask_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "mask_price",
                format!("{pharmacy_id}/{mask_id}"),
            ));
        }
        Ok(())
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Per-mask count and value of transactions in `range`, ordered by mask id.
    /// Masks without sales in the range are omitted.
    pub async fn sales_summary(&self, range: DateRange) -> DbResult<Vec<MaskSalesSummary>> {
        debug!(start = %range.start, end = %range.end, "Summarizing mask sales");

        let rows = sqlx::query_as::<_, MaskSalesSummary>(
            r#"
            SELECT m.id AS mask_id,
                   m.name AS mask_name,
                   COUNT(t.id) AS mask_count,
                   SUM(t.transaction_amount_cents) AS total_value
            FROM masks m
            JOIN transactions t ON t.mask_id = m.id
            WHERE t.transaction_date BETWEEN ? AND ?
            GROUP BY m.id, m.name
            ORDER BY m.id
            "#,
        )
        .bind(timestamp(range.start))
        .bind(timestamp(range.end))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
