//! # Purchase Route
//!
//! `POST /purchase` with `{user_id, pharmacy_id, mask_id}`.
//!
//! ```text
//! 201 {"transaction_id": 3}
//! 404 NOT_FOUND           user, pharmacy, or mask not listed there
//! 400 INSUFFICIENT_FUNDS  nothing written
//! 500 TRANSACTION_FAILED  rolled back, safe to retry
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use tracing::debug;

use pharmacy_core::{PurchaseReceipt, PurchaseRequest};

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/purchase", post(purchase))
}

async fn purchase(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PurchaseRequest>,
) -> ApiResult<(StatusCode, Json<PurchaseReceipt>)> {
    debug!(?request, "Purchase requested");
    let receipt = state.db.purchases().purchase(request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
