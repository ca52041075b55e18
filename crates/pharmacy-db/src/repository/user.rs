//! # User Repository
//!
//! Buyers and spending rankings. Balances only change through
//! [`PurchaseRepository`](super::purchase::PurchaseRepository).

use sqlx::SqlitePool;
use tracing::{debug, info};

use pharmacy_core::{DateRange, NewUser, User, UserSpending};

use super::timestamp;
use crate::error::{DbError, DbResult};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, cash_balance_cents FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by id or fails with `NotFound("user")`.
    pub async fn get(&self, id: i64) -> DbResult<User> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("user", id))
    }

    pub async fn insert(&self, new: &NewUser) -> DbResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, cash_balance_cents)
            VALUES (?, ?)
            RETURNING id, name, cash_balance_cents
            "#,
        )
        .bind(new.name.trim())
        .bind(new.cash_balance_cents)
        .fetch_one(&self.pool)
        .await?;

        info!(user_id = user.id, "User created");
        Ok(user)
    }

    /// Users ranked by the sum of their transactions in `range`.
    ///
    /// Highest spender first; equal totals are ordered by user id. Users with
    /// no transactions in the range are not listed.
    pub async fn top_by_transaction_amount(
        &self,
        range: DateRange,
        limit: u32,
    ) -> DbResult<Vec<UserSpending>> {
        debug!(start = %range.start, end = %range.end, limit, "Ranking users by spending");

        let rows = sqlx::query_as::<_, UserSpending>(
            r#"
            SELECT u.id,
                   u.name,
                   SUM(t.transaction_amount_cents) AS total_amount_cents
            FROM users u
            JOIN transactions t ON t.user_id = u.id
            WHERE t.transaction_date BETWEEN ? AND ?
            GROUP BY u.id, u.name
            ORDER BY total_amount_cents DESC, u.id
            LIMIT ?
            "#,
        )
        .bind(timestamp(range.start))
        .bind(timestamp(range.end))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{self, USER_ONE, USER_TWO};
    use chrono::{TimeZone, Utc};

    fn range(from: (i32, u32, u32), to: (i32, u32, u32)) -> DateRange {
        DateRange::new(
            Utc.with_ymd_and_hms(from.0, from.1, from.2, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(to.0, to.1, to.2, 23, 59, 59).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_user() {
        let db = fixtures::seeded().await;
        let user = db.users().get(USER_TWO).await.unwrap();
        assert_eq!(user.name, "User Two");
        assert_eq!(user.cash_balance().cents(), 40_000);

        assert!(db.users().get(77).await.unwrap_err().is_not_found("user"));
    }

    #[tokio::test]
    async fn test_top_users_in_october() {
        let db = fixtures::seeded().await;
        let top = db
            .users()
            .top_by_transaction_amount(range((2024, 10, 1), (2024, 10, 31)), 10)
            .await
            .unwrap();

        let summary: Vec<(i64, i64)> = top.iter().map(|u| (u.id, u.total_amount_cents)).collect();
        assert_eq!(summary, vec![(USER_ONE, 5_000), (USER_TWO, 4_000)]);
    }

    #[tokio::test]
    async fn test_top_users_range_is_inclusive_and_limited() {
        let db = fixtures::seeded().await;

        // 2024-11-08 is the last day; User Two spent 40 + 50
        let top = db
            .users()
            .top_by_transaction_amount(range((2024, 10, 1), (2024, 11, 8)), 1)
            .await
            .unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, USER_TWO);
        assert_eq!(top[0].total_amount_cents, 9_000);
    }

    #[tokio::test]
    async fn test_top_users_ties_break_by_id() {
        let db = fixtures::seeded().await;

        // Only User One bought on Oct 30 ($30); give User Two an equal purchase
        let top = db
            .users()
            .top_by_transaction_amount(range((2024, 10, 30), (2024, 10, 30)), 10)
            .await
            .unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, USER_ONE);

        db.transactions()
            .insert(&pharmacy_core::NewTransaction {
                user_id: USER_TWO,
                pharmacy_id: 1,
                mask_id: 1,
                transaction_amount_cents: 3_000,
                transaction_date: Utc.with_ymd_and_hms(2024, 10, 30, 12, 0, 0).unwrap(),
            })
            .await
            .unwrap();

        let top = db
            .users()
            .top_by_transaction_amount(range((2024, 10, 30), (2024, 10, 30)), 10)
            .await
            .unwrap();
        let ids: Vec<i64> = top.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![USER_ONE, USER_TWO]);
    }
}
