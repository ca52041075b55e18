//! # Search Route
//!
//! `GET /search` ranks pharmacies and masks together by name similarity and
//! tags each hit with its kind.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use pharmacy_core::validation::validate_search_term;
use pharmacy_core::{SearchHit, SearchType};

use super::{default_limit, page};
use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/search", get(search))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search_term: String,
    #[serde(default)]
    pub search_type: SearchType,
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<Json<Vec<SearchHit>>> {
    validate_search_term(&query.search_term)?;
    let page = page(query.skip, query.limit)?;

    let hits = state
        .db
        .search()
        .search(&query.search_term, query.search_type, page)
        .await?;
    debug!(term = %query.search_term, hits = hits.len(), "Search served");
    Ok(Json(hits))
}
