//! # User Routes

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use pharmacy_core::validation::{parse_end_date, parse_start_date, validate_top_limit};
use pharmacy_core::{DateRange, UserSpending};

use super::default_limit;
use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/users/transaction_amount", get(top_users))
}

#[derive(Debug, Deserialize)]
pub struct TopUsersQuery {
    pub start_date: String,
    pub end_date: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

/// Top `limit` users by total transaction amount in the date range.
async fn top_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TopUsersQuery>,
) -> ApiResult<Json<Vec<UserSpending>>> {
    validate_top_limit(query.limit)?;
    let range = DateRange::new(
        parse_start_date(&query.start_date)?,
        parse_end_date(&query.end_date)?,
    )?;

    let top = state
        .db
        .users()
        .top_by_transaction_amount(range, query.limit)
        .await?;
    Ok(Json(top))
}
