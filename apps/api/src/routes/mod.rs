//! # HTTP Routes
//!
//! One module per resource; each exposes `routes()` which the top-level
//! router merges.
//!
//! ## Route Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET  /health                                                           │
//! │                                                                         │
//! │  GET  /pharmacies                          list with opening hours      │
//! │  POST /pharmacies                          create                       │
//! │  GET  /pharmacies/{id}                     detail                       │
//! │  GET  /pharmacies/{id}/masks               listings, sort_by name|price │
//! │  GET  /pharmacies/{id}/transactions        sold masks                   │
//! │  GET  /pharmacies/open/at                  open at day + time           │
//! │  GET  /pharmacies/search                   ranked pharmacies            │
//! │  GET  /pharmacies/filters/masks/count      more|less than N listings    │
//! │  GET  /pharmacies/filters/masks/count_range                             │
//! │                                                                         │
//! │  POST /masks                               create                       │
//! │  GET  /masks/{id}                          detail                       │
//! │  GET  /masks/search                        ranked masks                 │
//! │  GET  /masks/transactions/summary          per-mask sales               │
//! │                                                                         │
//! │  GET  /users/transaction_amount            top spenders                 │
//! │  GET  /search                              pharmacies + masks, ranked   │
//! │  GET  /transactions/summary                count + total                │
//! │  GET  /transactions/{id}                   detail with current price    │
//! │  POST /purchase                            atomic purchase              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Deserialize;

use pharmacy_core::validation::{parse_end_date, parse_start_date};
use pharmacy_core::{DateRange, PageRequest, DEFAULT_PAGE_LIMIT};

use crate::error::ApiResult;

pub mod masks;
pub mod pharmacies;
pub mod purchase;
pub mod search;
pub mod transactions;
pub mod users;

pub(crate) fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

/// Builds a validated page from `skip` / `limit` query values.
pub(crate) fn page(skip: u32, limit: u32) -> ApiResult<PageRequest> {
    let page = PageRequest::new(skip, limit);
    page.validate()?;
    Ok(page)
}

/// `start_date` / `end_date` query pair.
#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: String,
    pub end_date: String,
}

impl DateRangeQuery {
    pub fn range(&self) -> ApiResult<DateRange> {
        let start = parse_start_date(&self.start_date)?;
        let end = parse_end_date(&self.end_date)?;
        Ok(DateRange::new(start, end)?)
    }
}

/// `search_term` for the single-kind search endpoints.
#[derive(Debug, Deserialize)]
pub struct TermQuery {
    pub search_term: String,
}

// =============================================================================
// Test Support
// =============================================================================
