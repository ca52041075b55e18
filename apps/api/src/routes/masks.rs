//! # Mask Routes

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use pharmacy_core::validation::{validate_name, validate_search_term};
use pharmacy_core::{Mask, MaskSalesSummary, NewMask};

use super::{DateRangeQuery, TermQuery};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/masks", post(create_mask))
        .route("/masks/search", get(search_masks))
        .route("/masks/transactions/summary", get(sales_summary))
        .route("/masks/{id}", get(get_mask))
}

async fn get_mask(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Mask>> {
    Ok(Json(state.db.masks().get(id).await?))
}

async fn create_mask(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewMask>,
) -> ApiResult<(StatusCode, Json<Mask>)> {
    validate_name("name", &new.name)?;

    let mask = state.db.masks().insert(&new).await?;
    info!(mask_id = mask.id, "Mask created via API");
    Ok((StatusCode::CREATED, Json(mask)))
}

async fn search_masks(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TermQuery>,
) -> ApiResult<Json<Vec<Mask>>> {
    validate_search_term(&query.search_term)?;
    Ok(Json(state.db.search().masks(&query.search_term).await?))
}

/// Per-mask count and value of sales between `start_date` and `end_date`.
async fn sales_summary(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> ApiResult<Json<Vec<MaskSalesSummary>>> {
    let range = query.range()?;
    Ok(Json(state.db.masks().sales_summary(range).await?))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, get, post, ADULT_MASK};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_mask() {
        let (app, _db) = app().await;

        let (status, body) = get(&app, "/masks/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"id": ADULT_MASK, "name": "Adult Mask"}));

        let (status, body) = get(&app, "/masks/7").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "mask not found: 7");
    }

    #[tokio::test]
    async fn test_create_mask() {
        let (app, _db) = app().await;

        let (status, body) = post(&app, "/masks", json!({"name": "N95"})).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 3);

        let (status, _) = post(&app, "/masks", json!({"title": "N95"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_masks() {
        let (app, _db) = app().await;

        let (status, body) = get(&app, "/masks/search?search_term=child").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "Child Mask");
    }

    #[tokio::test]
    async fn test_sales_summary() {
        let (app, _db) = app().await;

        let (status, body) = get(
            &app,
            "/masks/transactions/summary?start_date=2024-10-01&end_date=2024-10-31",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{
                "mask_id": ADULT_MASK,
                "mask_name": "Adult Mask",
                "mask_count": 2,
                "total_value": 12_000
            }])
        );

        let (status, _) = get(&app, "/masks/transactions/summary?start_date=2024-10-01").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
