//! # Pharmacy Repository
//!
//! Pharmacies, their opening hours and their mask listings.
//!
//! ## Count Filters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "Pharmacies with more than 1 mask priced $5 - $50"                     │
//! │                                                                         │
//! │  pharmacy_masks                   in range?    count per pharmacy       │
//! │  ─────────────────────────        ─────────    ──────────────────       │
//! │  P1  Adult   $50.00                  ✓                                  │
//! │  P1  Child   $30.00                  ✓          P1 → 2   ✓ (2 > 1)      │
//! │  P2  Adult   $70.00                  ✗                                  │
//! │  P2  Child   $60.00                  ✗          P2 → 0   never listed   │
//! │                                                                         │
//! │  A pharmacy with no listing in the price range never appears, even      │
//! │  for "less than N".                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveTime;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{debug, info};

use pharmacy_core::{
    Comparison, CountRange, DayOfWeek, MaskListing, NewPharmacy, NewPharmacyHour, PageRequest,
    Pharmacy, PharmacyHour, PharmacyMaskCount, PharmacyWithHours, PriceRange, SortBy,
};

use super::time_of_day;
use crate::error::{DbError, DbResult};

/// Repository for pharmacy database operations.
#[derive(Debug, Clone)]
pub struct PharmacyRepository {
    pool: SqlitePool,
}

impl PharmacyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PharmacyRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lists pharmacies by id, each with its opening hours.
    pub async fn list(&self, page: PageRequest) -> DbResult<Vec<PharmacyWithHours>> {
        debug!(skip = page.skip, limit = page.limit, "Listing pharmacies");

        // Both reads share one snapshot
        let mut tx = self.pool.begin().await?;

        let pharmacies = sqlx::query_as::<_, Pharmacy>(
            r#"
            SELECT id, name, cash_balance_cents
            FROM pharmacies
            ORDER BY id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *tx)
        .await?;

        // Same window as above, so the hours belong to exactly this page
        let hours = sqlx::query_as::<_, PharmacyHour>(
            r#"
            SELECT id, pharmacy_id, day_of_week, open_time, close_time
            FROM pharmacy_hours
            WHERE pharmacy_id IN (
                SELECT id FROM pharmacies ORDER BY id LIMIT ? OFFSET ?
            )
            ORDER BY pharmacy_id, id
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(attach_hours(pharmacies, hours))
    }

    /// Gets a pharmacy by id, if it exists.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Pharmacy>> {
        let pharmacy = sqlx::query_as::<_, Pharmacy>(
            "SELECT id, name, cash_balance_cents FROM pharmacies WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pharmacy)
    }

    /// Gets a pharmacy with its cash balance and opening hours.
    ///
    /// ## Errors
    /// - `NotFound("pharmacy")` when no such pharmacy exists
    pub async fn get(&self, id: i64) -> DbResult<PharmacyWithHours> {
        debug!(pharmacy_id = id, "Getting pharmacy detail");

        let pharmacy = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("pharmacy", id))?;

        let hours = self.hours(id).await?;
        Ok(PharmacyWithHours::new(pharmacy, hours))
    }

    /// Opening hours of one pharmacy.
    pub async fn hours(&self, pharmacy_id: i64) -> DbResult<Vec<PharmacyHour>> {
        let hours = sqlx::query_as::<_, PharmacyHour>(
            r#"
            SELECT id, pharmacy_id, day_of_week, open_time, close_time
            FROM pharmacy_hours
            WHERE pharmacy_id = ?
            ORDER BY id
            "#,
        )
        .bind(pharmacy_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(hours)
    }

    /// Pharmacies with an opening window covering `time` on `day`.
    ///
    /// Both ends of a window are inclusive. A pharmacy with several matching
    /// windows appears once.
    pub async fn open_at(
        &self,
        day: DayOfWeek,
        time: NaiveTime,
        page: PageRequest,
    ) -> DbResult<Vec<Pharmacy>> {
        debug!(day = %day, time = %time, "Finding open pharmacies");

        let t = time_of_day(time);
        let pharmacies = sqlx::query_as::<_, Pharmacy>(
            r#"
            SELECT DISTINCT p.id, p.name, p.cash_balance_cents
            FROM pharmacies p
            JOIN pharmacy_hours h ON h.pharmacy_id = p.id
            WHERE h.day_of_week = ?
              AND h.open_time <= ?
              AND h.close_time >= ?
            ORDER BY p.id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(day.as_str())
        .bind(&t)
        .bind(&t)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(pharmacies)
    }

    /// Listings of one pharmacy with mask names.
    ///
    /// A pharmacy without listings (or that does not exist) yields an empty
    /// page. Ties in the sort key fall back to the listing id.
    pub async fn masks(
        &self,
        pharmacy_id: i64,
        sort_by: SortBy,
        page: PageRequest,
    ) -> DbResult<Vec<MaskListing>> {
        debug!(pharmacy_id, ?sort_by, "Listing pharmacy masks");

        let order = match sort_by {
            SortBy::Name => "m.name, pm.id",
            SortBy::Price => "pm.price_cents, pm.id",
        };

        let sql = format!(
            r#"
            SELECT pm.id, pm.mask_id, m.name, pm.price_cents
            FROM pharmacy_masks pm
            JOIN masks m ON m.id = pm.mask_id
            WHERE pm.pharmacy_id = ?
            ORDER BY {order}
            LIMIT ? OFFSET ?
            "#
        );

        let listings = sqlx::query_as::<_, MaskListing>(&sql)
            .bind(pharmacy_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(listings)
    }

    /// Pharmacies whose number of listings priced inside `price` is strictly
    /// more / less than `count`, ordered by pharmacy id.
    pub async fn by_mask_count(
        &self,
        comparison: Comparison,
        count: i64,
        price: PriceRange,
        page: PageRequest,
    ) -> DbResult<Vec<PharmacyMaskCount>> {
        debug!(?comparison, count, min = %price.min, max = %price.max, "Filtering pharmacies by mask count");

        let op = match comparison {
            Comparison::More => ">",
            Comparison::Less => "<",
        };

        let sql = format!(
            r#"
            SELECT p.id, p.name, COUNT(pm.id) AS mask_count
            FROM pharmacies p
            JOIN pharmacy_masks pm ON pm.pharmacy_id = p.id
            WHERE pm.price_cents BETWEEN ? AND ?
            GROUP BY p.id, p.name
            HAVING COUNT(pm.id) {op} ?
            ORDER BY p.id
            LIMIT ? OFFSET ?
            "#
        );

        let rows = sqlx::query_as::<_, PharmacyMaskCount>(&sql)
            .bind(price.min.cents())
            .bind(price.max.cents())
            .bind(count)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Pharmacies whose in-range listing count lies in `[min, max]`.
    pub async fn by_mask_count_range(
        &self,
        counts: CountRange,
        price: PriceRange,
        page: PageRequest,
    ) -> DbResult<Vec<PharmacyMaskCount>> {
        debug!(min_count = counts.min, max_count = counts.max, "Filtering pharmacies by mask count range");

        let rows = sqlx::query_as::<_, PharmacyMaskCount>(
            r#"
            SELECT p.id, p.name, COUNT(pm.id) AS mask_count
            FROM pharmacies p
            JOIN pharmacy_masks pm ON pm.pharmacy_id = p.id
            WHERE pm.price_cents BETWEEN ? AND ?
            GROUP BY p.id, p.name
            HAVING COUNT(pm.id) BETWEEN ? AND ?
            ORDER BY p.id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(price.min.cents())
        .bind(price.max.cents())
        .bind(counts.min)
        .bind(counts.max)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a pharmacy and returns it with its new id.
    pub async fn insert(&self, new: &NewPharmacy) -> DbResult<Pharmacy> {
        let pharmacy = sqlx::query_as::<_, Pharmacy>(
            r#"
            INSERT INTO pharmacies (name, cash_balance_cents)
            VALUES (?, ?)
            RETURNING id, name, cash_balance_cents
            "#,
        )
        .bind(new.name.trim())
        .bind(new.cash_balance_cents)
        .fetch_one(&self.pool)
        .await?;

        info!(pharmacy_id = pharmacy.id, name = %pharmacy.name, "Pharmacy created");
        Ok(pharmacy)
    }

    /// Adds an opening window to a pharmacy.
    pub async fn add_hours(&self, pharmacy_id: i64, hour: &NewPharmacyHour) -> DbResult<PharmacyHour> {
        let row = sqlx::query_as::<_, PharmacyHour>(
            r#"
            INSERT INTO pharmacy_hours (pharmacy_id, day_of_week, open_time, close_time)
            VALUES (?, ?, ?, ?)
            RETURNING id, pharmacy_id, day_of_week, open_time, close_time
            "#,
        )
        .bind(pharmacy_id)
        .bind(hour.day_of_week.as_str())
        .bind(time_of_day(hour.open_time))
        .bind(time_of_day(hour.close_time))
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Deletes a pharmacy together with its hours and listings.
    ///
    /// A pharmacy that already has transactions cannot be deleted
    /// (`ForeignKeyViolation`).
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM pharmacies WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("pharmacy", id));
        }

        info!(pharmacy_id = id, "Pharmacy deleted");
        Ok(())
    }

    /// Total number of pharmacies.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pharmacies")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Groups hour rows under their pharmacy, preserving pharmacy order.
fn attach_hours(pharmacies: Vec<Pharmacy>, hours: Vec<PharmacyHour>) -> Vec<PharmacyWithHours> {
    let mut by_pharmacy: HashMap<i64, Vec<PharmacyHour>> = HashMap::new();
    for hour in hours {
        by_pharmacy.entry(hour.pharmacy_id).or_default().push(hour);
    }

    pharmacies
        .into_iter()
        .map(|p| {
            let hours = by_pharmacy.remove(&p.id).unwrap_or_default();
            PharmacyWithHours::new(p, hours)
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{self, at, PHARMACY_ONE, PHARMACY_TWO};
    use pharmacy_core::Money;

    fn prices(min: i64, max: i64) -> PriceRange {
        PriceRange::new(Money::from_cents(min), Money::from_cents(max)).unwrap()
    }

    #[tokio::test]
    async fn test_list_includes_hours() {
        let db = fixtures::seeded().await;

        let page = db.pharmacies().list(PageRequest::default()).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].name, "Pharmacy One");
        assert_eq!(page[0].opening_hours.len(), 2);
        assert_eq!(page[0].opening_hours[0].day_of_week, DayOfWeek::Mon);
        assert_eq!(page[1].opening_hours[1].day_of_week, DayOfWeek::Thur);
    }

    #[tokio::test]
    async fn test_list_hours_follow_the_page() {
        let db = fixtures::empty().await;
        let repo = db.pharmacies();

        let mut ids = Vec::new();
        for (i, day) in [DayOfWeek::Mon, DayOfWeek::Tue, DayOfWeek::Wed].into_iter().enumerate() {
            let pharmacy = repo
                .insert(&NewPharmacy {
                    name: format!("Pharmacy {i}"),
                    cash_balance_cents: 0,
                })
                .await
                .unwrap();
            repo.add_hours(
                pharmacy.id,
                &NewPharmacyHour {
                    day_of_week: day,
                    open_time: at(8, 0),
                    close_time: at(18, 0),
                },
            )
            .await
            .unwrap();
            ids.push(pharmacy.id);
        }
        repo.delete(ids[0]).await.unwrap();

        let page = repo.list(PageRequest::new(0, 2)).await.unwrap();
        assert_eq!(page.iter().map(|p| p.id).collect::<Vec<_>>(), ids[1..].to_vec());
        for pharmacy in &page {
            assert_eq!(pharmacy.opening_hours.len(), 1);
            assert_eq!(pharmacy.opening_hours[0].pharmacy_id, pharmacy.id);
        }
        assert_eq!(page[1].opening_hours[0].day_of_week, DayOfWeek::Wed);
    }

    #[tokio::test]
    async fn test_list_pagination_law() {
        let db = fixtures::empty().await;
        for i in 0..7 {
            db.pharmacies()
                .insert(&NewPharmacy {
                    name: format!("Pharmacy {i}"),
                    cash_balance_cents: 0,
                })
                .await
                .unwrap();
        }

        let repo = db.pharmacies();
        let ids = |v: Vec<PharmacyWithHours>| v.into_iter().map(|p| p.id).collect::<Vec<_>>();

        let mut joined = ids(repo.list(PageRequest::new(1, 3)).await.unwrap());
        joined.extend(ids(repo.list(PageRequest::new(4, 3)).await.unwrap()));
        let double = ids(repo.list(PageRequest::new(1, 6)).await.unwrap());

        assert_eq!(joined, double);
        assert_eq!(double, vec![2, 3, 4, 5, 6, 7]);
    }

    #[tokio::test]
    async fn test_get_detail_and_not_found() {
        let db = fixtures::seeded().await;

        let detail = db.pharmacies().get(PHARMACY_TWO).await.unwrap();
        assert_eq!(detail.cash_balance_cents, 20_000);
        assert_eq!(detail.opening_hours[0].open_time, at(9, 0));

        let err = db.pharmacies().get(999).await.unwrap_err();
        assert!(err.is_not_found("pharmacy"));
    }

    #[tokio::test]
    async fn test_open_at_bounds_are_inclusive() {
        let db = fixtures::seeded().await;
        let repo = db.pharmacies();
        let page = PageRequest::default();

        let open = repo.open_at(DayOfWeek::Mon, at(8, 0), page).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, PHARMACY_ONE);

        let open = repo.open_at(DayOfWeek::Mon, at(18, 0), page).await.unwrap();
        assert_eq!(open.len(), 1);

        let open = repo.open_at(DayOfWeek::Mon, at(18, 1), page).await.unwrap();
        assert!(open.is_empty());

        let open = repo.open_at(DayOfWeek::Thur, at(12, 30), page).await.unwrap();
        assert_eq!(open[0].id, PHARMACY_TWO);

        assert!(repo.open_at(DayOfWeek::Sun, at(12, 0), page).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_at_is_distinct() {
        let db = fixtures::seeded().await;
        db.pharmacies()
            .add_hours(
                PHARMACY_ONE,
                &NewPharmacyHour {
                    day_of_week: DayOfWeek::Mon,
                    open_time: at(12, 0),
                    close_time: at(20, 0),
                },
            )
            .await
            .unwrap();

        let open = db
            .pharmacies()
            .open_at(DayOfWeek::Mon, at(13, 0), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(open.len(), 1);
    }

    #[tokio::test]
    async fn test_masks_sorted_by_name_and_price() {
        let db = fixtures::seeded().await;
        let repo = db.pharmacies();

        let by_name = repo
            .masks(PHARMACY_TWO, SortBy::Name, PageRequest::default())
            .await
            .unwrap();
        let names: Vec<&str> = by_name.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Adult Mask", "Child Mask"]);

        let by_price = repo
            .masks(PHARMACY_TWO, SortBy::Price, PageRequest::default())
            .await
            .unwrap();
        let cents: Vec<i64> = by_price.iter().map(|l| l.price_cents).collect();
        assert_eq!(cents, vec![6_000, 7_000]);

        assert!(repo
            .masks(404, SortBy::Name, PageRequest::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_by_mask_count_is_strict() {
        let db = fixtures::seeded().await;
        let repo = db.pharmacies();
        let page = PageRequest::default();

        // $0 - $100 covers every listing: both pharmacies have 2
        let more = repo
            .by_mask_count(Comparison::More, 1, prices(0, 10_000), page)
            .await
            .unwrap();
        assert_eq!(more.len(), 2);

        let more = repo
            .by_mask_count(Comparison::More, 2, prices(0, 10_000), page)
            .await
            .unwrap();
        assert!(more.is_empty());

        // $5 - $50 only covers Pharmacy One's two listings
        let less = repo
            .by_mask_count(Comparison::Less, 3, prices(500, 5_000), page)
            .await
            .unwrap();
        assert_eq!(less.len(), 1);
        assert_eq!(less[0].id, PHARMACY_ONE);
        assert_eq!(less[0].mask_count, 2);
    }

    #[tokio::test]
    async fn test_by_mask_count_range() {
        let db = fixtures::seeded().await;
        let repo = db.pharmacies();

        let rows = repo
            .by_mask_count_range(
                CountRange::new(2, 10).unwrap(),
                prices(500, 5_000),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Pharmacy One");

        // $55 - $75 only covers Pharmacy Two's listings
        let rows = repo
            .by_mask_count_range(
                CountRange::new(2, 10).unwrap(),
                prices(5_500, 7_500),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, PHARMACY_TWO);
    }

    #[tokio::test]
    async fn test_delete_cascades_hours_and_listings() {
        let db = fixtures::empty().await;
        let pharmacy = db
            .pharmacies()
            .insert(&NewPharmacy {
                name: "Short Lived".to_string(),
                cash_balance_cents: 0,
            })
            .await
            .unwrap();
        db.pharmacies()
            .add_hours(
                pharmacy.id,
                &NewPharmacyHour {
                    day_of_week: DayOfWeek::Fri,
                    open_time: at(9, 0),
                    close_time: at(12, 0),
                },
            )
            .await
            .unwrap();

        db.pharmacies().delete(pharmacy.id).await.unwrap();

        assert!(db.pharmacies().hours(pharmacy.id).await.unwrap().is_empty());
        assert!(db.pharmacies().delete(pharmacy.id).await.unwrap_err().is_not_found("pharmacy"));
    }
}
