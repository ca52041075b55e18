//! # Pharmacy Routes
//!
//! Browsing, filtering and creating pharmacies.
//!
//! ## Mask Count Filter
//! ```text
//! GET /pharmacies/filters/masks/count?comparison=more&count=1&min_price=1000&max_price=6000
//!
//!   listings priced in [$10, $60]      count per pharmacy      keep count > 1
//!   ─────────────────────────────      ──────────────────      ──────────────
//!   Carepoint   Adult $50  ✓           Carepoint  2       ──►  Carepoint
//!   Carepoint   Child $30  ✓           (Mask Depot has no
//!   Mask Depot  Adult $70  ✗            listing in range)
//! ```
//! Prices are integer cents. A pharmacy with no listing in the price range
//! is never returned, whatever the comparison.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{debug, info};

use pharmacy_core::validation::{
    parse_time, validate_balance_cents, validate_count, validate_name, validate_search_term,
};
use pharmacy_core::{
    Comparison, CountRange, DayOfWeek, MaskListing, Money, NewPharmacy, PageRequest, Pharmacy,
    PharmacyMaskCount, PharmacyWithHours, PriceRange, SortBy, TransactionDetail,
};

use super::{default_limit, page, TermQuery};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

/// Threshold used by the count filter when none is given.
const DEFAULT_MASK_COUNT: i64 = 10;

fn default_mask_count() -> i64 {
    DEFAULT_MASK_COUNT
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pharmacies", get(list_pharmacies).post(create_pharmacy))
        .route("/pharmacies/open/at", get(open_pharmacies))
        .route("/pharmacies/search", get(search_pharmacies))
        .route("/pharmacies/filters/masks/count", get(filter_by_mask_count))
        .route(
            "/pharmacies/filters/masks/count_range",
            get(filter_by_mask_count_range),
        )
        .route("/pharmacies/{id}", get(get_pharmacy))
        .route("/pharmacies/{id}/masks", get(pharmacy_masks))
        .route("/pharmacies/{id}/transactions", get(sold_masks))
}

// =============================================================================
// Query Parameters
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct OpenAtQuery {
    pub query_time: String,
    #[serde(default)]
    pub day_of_week: DayOfWeek,
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct MasksQuery {
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct MaskCountQuery {
    #[serde(default)]
    pub comparison: Comparison,
    #[serde(default = "default_mask_count")]
    pub count: i64,
    pub min_price: i64,
    pub max_price: i64,
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct MaskCountRangeQuery {
    #[serde(default)]
    pub min_count: i64,
    pub max_count: i64,
    pub min_price: i64,
    pub max_price: i64,
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn price_range(min_price: i64, max_price: i64) -> ApiResult<PriceRange> {
    Ok(PriceRange::new(
        Money::from_cents(min_price),
        Money::from_cents(max_price),
    )?)
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_pharmacies(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<Vec<PharmacyWithHours>>> {
    page.validate()?;
    Ok(Json(state.db.pharmacies().list(page).await?))
}

async fn get_pharmacy(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<PharmacyWithHours>> {
    Ok(Json(state.db.pharmacies().get(id).await?))
}

async fn open_pharmacies(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OpenAtQuery>,
) -> ApiResult<Json<Vec<Pharmacy>>> {
    let time = parse_time(&query.query_time)?;
    let page = page(query.skip, query.limit)?;

    let open = state
        .db
        .pharmacies()
        .open_at(query.day_of_week, time, page)
        .await?;
    debug!(day = %query.day_of_week, %time, found = open.len(), "Open pharmacies");
    Ok(Json(open))
}

async fn pharmacy_masks(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<MasksQuery>,
) -> ApiResult<Json<Vec<MaskListing>>> {
    let page = page(query.skip, query.limit)?;
    Ok(Json(state.db.pharmacies().masks(id, query.sort_by, page).await?))
}

async fn sold_masks(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<Vec<TransactionDetail>>> {
    page.validate()?;
    Ok(Json(state.db.transactions().for_pharmacy(id, page).await?))
}

async fn filter_by_mask_count(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MaskCountQuery>,
) -> ApiResult<Json<Vec<PharmacyMaskCount>>> {
    validate_count(query.count)?;
    let price = price_range(query.min_price, query.max_price)?;
    let page = page(query.skip, query.limit)?;

    let rows = state
        .db
        .pharmacies()
        .by_mask_count(query.comparison, query.count, price, page)
        .await?;
    Ok(Json(rows))
}

async fn filter_by_mask_count_range(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MaskCountRangeQuery>,
) -> ApiResult<Json<Vec<PharmacyMaskCount>>> {
    let counts = CountRange::new(query.min_count, query.max_count)?;
    let price = price_range(query.min_price, query.max_price)?;
    let page = page(query.skip, query.limit)?;

    let rows = state
        .db
        .pharmacies()
        .by_mask_count_range(counts, price, page)
        .await?;
    Ok(Json(rows))
}

async fn search_pharmacies(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TermQuery>,
) -> ApiResult<Json<Vec<Pharmacy>>> {
    validate_search_term(&query.search_term)?;
    Ok(Json(state.db.search().pharmacies(&query.search_term).await?))
}

async fn create_pharmacy(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewPharmacy>,
) -> ApiResult<(StatusCode, Json<Pharmacy>)> {
    validate_name("name", &new.name)?;
    validate_balance_cents(new.cash_balance_cents)?;

    let pharmacy = state.db.pharmacies().insert(&new).await?;
    info!(pharmacy_id = pharmacy.id, "Pharmacy created via API");
    Ok((StatusCode::CREATED, Json(pharmacy)))
}

// =============================================================================
// Unit Tests
// =============================================================================
