//! # Purchase Repository
//!
//! Executes one sale atomically: debit the user, credit the pharmacy, record
//! the transaction.
//!
//! ## Purchase Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     purchase(user, pharmacy, mask)                      │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├─ 1. UPDATE users SET balance = balance WHERE id = ?   (lock)       │
//! │    │      0 rows ──► NotFound("user")                                   │
//! │    │                                                                    │
//! │    ├─ 2. SELECT balance FROM users                                      │
//! │    ├─ 3. SELECT pharmacy          missing ──► NotFound("pharmacy")      │
//! │    ├─ 4. SELECT listing price     missing ──► NotFound("mask_price")    │
//! │    ├─ 5. settle()                 short   ──► InsufficientFunds         │
//! │    │                                                                    │
//! │    ├─ 6. users.balance      -= price  ┐                                 │
//! │    ├─ 7. pharmacies.balance += price  ├─ any error ──► TransactionFailed│
//! │    ├─ 8. INSERT transactions          ┘                                 │
//! │    │                                                                    │
//! │  COMMIT ──► transaction id                                              │
//! │                                                                         │
//! │  Every early return drops the sqlx::Transaction, which rolls back.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//! SQLite locks the whole database, not rows. Step 1 is a write, so the
//! connection takes the write lock before it reads any balance. A second
//! purchase blocks at its own step 1 (up to the busy timeout) and then reads
//! the balance the first purchase committed. Two purchases can never both
//! pass the funds check against the same starting balance.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use pharmacy_core::purchase::settle;
use pharmacy_core::{CoreError, Money, PurchaseReceipt, PurchaseRequest};

use super::timestamp;
use crate::error::{DbError, DbResult};

/// The purchase transactor.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Buys one mask for a user from a pharmacy at the listed price.
    ///
    /// ## Errors
    /// Checked in this order, before anything is written:
    /// - `NotFound("user")`
    /// - `NotFound("pharmacy")`
    /// - `NotFound("mask_price")` when the pharmacy does not list the mask
    /// - `Rejected(InsufficientFunds)`
    ///
    /// `TransactionFailed` if a write or the commit fails, or if the stored
    /// balances cannot absorb the sale. All writes are rolled back.
    pub async fn purchase(&self, request: PurchaseRequest) -> DbResult<PurchaseReceipt> {
        let PurchaseRequest {
            user_id,
            pharmacy_id,
            mask_id,
        } = request;
        let started_at = Utc::now();

        debug!(user_id, pharmacy_id, mask_id, "Starting purchase");

        let mut tx = self.pool.begin().await.map_err(failed("begin"))?;

        // --- 1. lock the user ------------------------------------------------
        let locked = sqlx::query(
            "UPDATE users SET cash_balance_cents = cash_balance_cents WHERE id = ?",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(failed("lock user"))?;

        if locked.rows_affected() == 0 {
            return Err(DbError::not_found("user", user_id));
        }

        // --- 2-4. read what the sale depends on ------------------------------
        let buyer_balance: i64 =
            sqlx::query_scalar("SELECT cash_balance_cents FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;

        let seller_balance: i64 =
            sqlx::query_scalar("SELECT cash_balance_cents FROM pharmacies WHERE id = ?")
                .bind(pharmacy_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("pharmacy", pharmacy_id))?;

        let price: i64 = sqlx::query_scalar(
            "SELECT price_cents FROM pharmacy_masks WHERE pharmacy_id = ? AND mask_id = ?",
        )
        .bind(pharmacy_id)
        .bind(mask_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("mask_price", format!("{pharmacy_id}/{mask_id}")))?;

        // --- 5. funds check --------------------------------------------------
        let settlement = settle(
            Money::from_cents(buyer_balance),
            Money::from_cents(seller_balance),
            Money::from_cents(price),
        )
        .map_err(|e| match e {
            CoreError::InsufficientFunds {
                required,
                available,
            } => {
                warn!(user_id, %required, %available, "Purchase rejected: insufficient funds");
                DbError::Rejected(e)
            }
            // Stored balances or prices the buyer cannot fix
            CoreError::Validation(cause) => {
                error!(pharmacy_id, mask_id, error = %cause, "Purchase failed, rolling back");
                DbError::TransactionFailed("purchase could not be completed (settle)".to_string())
            }
        })?;

        let amount = settlement.amount.cents();

        // --- 6-8. mutations --------------------------------------------------
        sqlx::query("UPDATE users SET cash_balance_cents = cash_balance_cents - ? WHERE id = ?")
            .bind(amount)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(failed("debit user"))?;

        sqlx::query(
            "UPDATE pharmacies SET cash_balance_cents = cash_balance_cents + ? WHERE id = ?",
        )
        .bind(amount)
        .bind(pharmacy_id)
        .execute(&mut *tx)
        .await
        .map_err(failed("credit pharmacy"))?;

        let transaction_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO transactions
                (user_id, pharmacy_id, mask_id, transaction_amount_cents, transaction_date)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(pharmacy_id)
        .bind(mask_id)
        .bind(amount)
        .bind(timestamp(started_at))
        .fetch_one(&mut *tx)
        .await
        .map_err(failed("record transaction"))?;

        tx.commit().await.map_err(failed("commit"))?;

        info!(
            transaction_id,
            user_id,
            pharmacy_id,
            mask_id,
            amount = %settlement.amount,
            user_balance = %settlement.buyer_balance_after,
            "Purchase committed"
        );

        Ok(PurchaseReceipt { transaction_id })
    }
}

/// Maps a store error inside the purchase to `TransactionFailed`, logging
/// the cause. The message returned to callers stays generic.
fn failed(step: &'static str) -> impl Fn(sqlx::Error) -> DbError {
    move |err| {
        error!(step, error = %err, "Purchase failed, rolling back");
        DbError::TransactionFailed(format!("purchase could not be completed ({step})"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{self, ADULT_MASK, CHILD_MASK, PHARMACY_ONE, PHARMACY_TWO};
    use crate::{Database, DbConfig};
    use pharmacy_core::{NewMask, NewPharmacy, NewUser};

    fn request(user_id: i64, pharmacy_id: i64, mask_id: i64) -> PurchaseRequest {
        PurchaseRequest {
            user_id,
            pharmacy_id,
            mask_id,
        }
    }

    /// (user balance, pharmacy balance, transaction count)
    async fn snapshot(db: &Database, user_id: i64, pharmacy_id: i64) -> (i64, i64, i64) {
        let user = db.users().get(user_id).await.unwrap();
        let pharmacy = db.pharmacies().get_by_id(pharmacy_id).await.unwrap().unwrap();
        let count = db.transactions().count().await.unwrap();
        (user.cash_balance_cents, pharmacy.cash_balance_cents, count)
    }

    /// One user, one pharmacy ($150), one mask listed at $50.
    async fn single_listing(db: &Database, user_balance: i64) -> (i64, i64, i64) {
        let user = db
            .users()
            .insert(&NewUser {
                name: "Buyer".to_string(),
                cash_balance_cents: user_balance,
            })
            .await
            .unwrap();
        let pharmacy = db
            .pharmacies()
            .insert(&NewPharmacy {
                name: "Seller".to_string(),
                cash_balance_cents: 15_000,
            })
            .await
            .unwrap();
        let mask = db
            .masks()
            .insert(&NewMask {
                name: "Adult Mask".to_string(),
            })
            .await
            .unwrap();
        db.masks()
            .upsert_listing(pharmacy.id, mask.id, 5_000)
            .await
            .unwrap();
        (user.id, pharmacy.id, mask.id)
    }

    #[tokio::test]
    async fn test_successful_purchase_is_zero_sum() {
        let db = fixtures::empty().await;
        let (user, pharmacy, mask) = single_listing(&db, 30_000).await;

        let receipt = db.purchases().purchase(request(user, pharmacy, mask)).await.unwrap();

        assert_eq!(snapshot(&db, user, pharmacy).await, (25_000, 20_000, 1));

        let tx = db.transactions().get_by_id(receipt.transaction_id).await.unwrap().unwrap();
        assert_eq!(tx.transaction_amount_cents, 5_000);
        assert_eq!((tx.user_id, tx.pharmacy_id, tx.mask_id), (user, pharmacy, mask));
        assert!(tx.transaction_date <= Utc::now());
    }

    #[tokio::test]
    async fn test_insufficient_funds_changes_nothing() {
        let db = fixtures::empty().await;
        let (user, pharmacy, mask) = single_listing(&db, 1_000).await;

        let err = db.purchases().purchase(request(user, pharmacy, mask)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::InsufficientFunds { .. })
        ));

        assert_eq!(snapshot(&db, user, pharmacy).await, (1_000, 15_000, 0));
    }

    #[tokio::test]
    async fn test_exact_balance_goes_to_zero() {
        let db = fixtures::empty().await;
        let (user, pharmacy, mask) = single_listing(&db, 5_000).await;

        db.purchases().purchase(request(user, pharmacy, mask)).await.unwrap();
        assert_eq!(snapshot(&db, user, pharmacy).await, (0, 20_000, 1));

        // broke now
        let err = db.purchases().purchase(request(user, pharmacy, mask)).await.unwrap_err();
        assert!(matches!(err, DbError::Rejected(_)));
        assert_eq!(snapshot(&db, user, pharmacy).await, (0, 20_000, 1));
    }

    #[tokio::test]
    async fn test_not_found_checks_in_order() {
        let db = fixtures::seeded().await;
        let purchases = db.purchases();
        let before = snapshot(&db, 1, PHARMACY_ONE).await;

        // nothing exists: the user is reported first
        let err = purchases.purchase(request(99, 99, 99)).await.unwrap_err();
        assert!(err.is_not_found("user"));

        let err = purchases.purchase(request(1, 99, ADULT_MASK)).await.unwrap_err();
        assert!(err.is_not_found("pharmacy"));

        let err = purchases.purchase(request(1, PHARMACY_ONE, 99)).await.unwrap_err();
        assert!(err.is_not_found("mask_price"));

        assert_eq!(snapshot(&db, 1, PHARMACY_ONE).await, before);
    }

    #[tokio::test]
    async fn test_unlisted_mask_is_not_found() {
        let db = fixtures::seeded().await;
        db.masks().remove_listing(PHARMACY_TWO, CHILD_MASK).await.unwrap();

        let err = db
            .purchases()
            .purchase(request(1, PHARMACY_TWO, CHILD_MASK))
            .await
            .unwrap_err();
        assert!(err.is_not_found("mask_price"));
    }

    #[tokio::test]
    async fn test_amount_is_a_price_snapshot() {
        let db = fixtures::seeded().await;

        let receipt = db
            .purchases()
            .purchase(request(1, PHARMACY_ONE, ADULT_MASK))
            .await
            .unwrap();
        db.masks()
            .upsert_listing(PHARMACY_ONE, ADULT_MASK, 9_900)
            .await
            .unwrap();

        let detail = db.transactions().get_detail(receipt.transaction_id).await.unwrap();
        assert_eq!(detail.transaction_amount_cents, 5_000);
        assert_eq!(detail.mask.price_cents, Some(9_900));
    }

    #[tokio::test]
    async fn test_closed_pool_reports_transaction_failure() {
        let db = fixtures::empty().await;
        let (user, pharmacy, mask) = single_listing(&db, 30_000).await;
        let purchases = db.purchases();
        db.close().await;

        let err = purchases.purchase(request(user, pharmacy, mask)).await.unwrap_err();
        assert!(matches!(err, DbError::TransactionFailed(_)));
    }

    #[tokio::test]
    async fn test_failed_insert_rolls_back_balances() {
        let db = fixtures::empty().await;
        let (user, pharmacy, mask) = single_listing(&db, 30_000).await;

        // Fails the last write, after both balance updates ran
        sqlx::query(
            r#"
            CREATE TRIGGER reject_transactions BEFORE INSERT ON transactions
            BEGIN
                SELECT RAISE(ABORT, 'transactions are read-only');
            END
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = db.purchases().purchase(request(user, pharmacy, mask)).await.unwrap_err();
        assert!(matches!(err, DbError::TransactionFailed(_)));
        assert_eq!(snapshot(&db, user, pharmacy).await, (30_000, 15_000, 0));
    }

    #[tokio::test]
    async fn test_seller_balance_overflow_is_a_failure() {
        let db = fixtures::empty().await;
        let (user, pharmacy, mask) = single_listing(&db, 30_000).await;

        sqlx::query("UPDATE pharmacies SET cash_balance_cents = ? WHERE id = ?")
            .bind(i64::MAX - 1_000)
            .bind(pharmacy)
            .execute(db.pool())
            .await
            .unwrap();

        let err = db.purchases().purchase(request(user, pharmacy, mask)).await.unwrap_err();
        assert!(matches!(err, DbError::TransactionFailed(_)));
        assert_eq!(
            snapshot(&db, user, pharmacy).await,
            (30_000, i64::MAX - 1_000, 0)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_purchases_cannot_overdraw() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(
            DbConfig::new(dir.path().join("market.db"))
                .max_connections(4)
                .busy_timeout(std::time::Duration::from_secs(10)),
        )
        .await
        .unwrap();

        // $80 covers either listing ($50 or $60) but not both
        let (user, pharmacy, adult) = single_listing(&db, 8_000).await;
        let child = db
            .masks()
            .insert(&NewMask {
                name: "Child Mask".to_string(),
            })
            .await
            .unwrap()
            .id;
        db.masks().upsert_listing(pharmacy, child, 6_000).await.unwrap();

        let a = db.purchases();
        let b = db.purchases();
        let (first, second) = tokio::join!(
            tokio::spawn(async move { a.purchase(request(user, pharmacy, adult)).await }),
            tokio::spawn(async move { b.purchase(request(user, pharmacy, child)).await }),
        );
        let outcomes = [first.unwrap(), second.unwrap()];

        let successes = outcomes.iter().filter(|r| r.is_ok()).count();
        let rejections = outcomes
            .iter()
            .filter(|r| matches!(r, Err(DbError::Rejected(CoreError::InsufficientFunds { .. }))))
            .count();
        assert_eq!((successes, rejections), (1, 1));

        let (user_balance, pharmacy_balance, count) = snapshot(&db, user, pharmacy).await;
        assert_eq!(count, 1);
        assert!(user_balance >= 0);
        assert_eq!(8_000 - user_balance, pharmacy_balance - 15_000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_concurrent_purchases_preserve_money() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(
            DbConfig::new(dir.path().join("market.db"))
                .max_connections(5)
                .busy_timeout(std::time::Duration::from_secs(10)),
        )
        .await
        .unwrap();

        // $120 buys exactly two $50 masks out of eight attempts
        let (user, pharmacy, mask) = single_listing(&db, 12_000).await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = db.purchases();
                tokio::spawn(async move { repo.purchase(request(user, pharmacy, mask)).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(DbError::Rejected(CoreError::InsufficientFunds { .. })) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(successes, 2);
        assert_eq!(snapshot(&db, user, pharmacy).await, (2_000, 25_000, 2));
    }
}
