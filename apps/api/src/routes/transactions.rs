//! # Transaction Routes

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use pharmacy_core::{TransactionDetail, TransactionTotals};

use super::DateRangeQuery;
use crate::error::ApiResult;
use crate::extract::{ApiPath, ApiQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions/summary", get(summary))
        .route("/transactions/{id}", get(get_transaction))
}

/// Count and total value of transactions between `start_date` and `end_date`.
async fn summary(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> ApiResult<Json<TransactionTotals>> {
    let range = query.range()?;
    Ok(Json(state.db.transactions().summary(range).await?))
}

async fn get_transaction(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<TransactionDetail>> {
    Ok(Json(state.db.transactions().get_detail(id).await?))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, get, ADULT_MASK, ALICE};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_summary() {
        let (app, _db) = app().await;

        let (status, body) = get(
            &app,
            "/transactions/summary?start_date=2024-10-01&end_date=2024-10-31",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"transaction_count": 2, "total_amount_cents": 12_000}));

        // the bare end date covers the whole day
        let (_, body) = get(
            &app,
            "/transactions/summary?start_date=2024-10-01&end_date=2024-10-01",
        )
        .await;
        assert_eq!(body["transaction_count"], 1);

        let (_, body) = get(
            &app,
            "/transactions/summary?start_date=2030-01-01T00:00:00Z&end_date=2030-12-31T00:00:00Z",
        )
        .await;
        assert_eq!(body, json!({"transaction_count": 0, "total_amount_cents": 0}));
    }

    #[tokio::test]
    async fn test_detail() {
        let (app, _db) = app().await;

        let (status, body) = get(&app, "/transactions/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], ALICE);
        assert_eq!(body["transaction_amount_cents"], 5_000);
        assert_eq!(
            body["mask"],
            json!({"id": ADULT_MASK, "name": "Adult Mask", "price_cents": 5_000})
        );

        let (status, body) = get(&app, "/transactions/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
