//! # Pharmacy Marketplace API
//!
//! HTTP service over the marketplace database: browse pharmacies and masks,
//! run reports, and purchase masks.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Marketplace API Server                           │
//! │                                                                         │
//! │  Client ───► axum Router (8000) ───► Repositories ───► SQLite          │
//! │                   │                        │                            │
//! │                   ▼                        ▼                            │
//! │             ApiQuery / ApiJson        PurchaseRepository               │
//! │             (400 on bad input)        (one sqlx::Transaction)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. Environment variables:
//! - `PHARMACY_PORT` - HTTP port (default: 8000)
//! - `PHARMACY_BIND_ADDR` - Interface (default: 0.0.0.0)
//! - `PHARMACY_DATABASE_PATH` - SQLite file (default: ./data/pharmacy.db)
//! - `PHARMACY_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `PHARMACY_BUSY_TIMEOUT_SECS` - Write lock wait (default: 5)
//! - `PHARMACY_LOG_LEVEL` - Log filter when `RUST_LOG` is unset (default: info)

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Builds the full router with all resource routes and `/health`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::pharmacies::routes())
        .merge(routes::masks::routes())
        .merge(routes::users::routes())
        .merge(routes::search::routes())
        .merge(routes::transactions::routes())
        .merge(routes::purchase::routes())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.db.health_check().await {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
    }
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{app, get};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health() {
        let (app, db) = app().await;

        let (status, body) = get(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");

        db.close().await;
        let (status, _) = get(&app, "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (app, _db) = app().await;
        let (status, _) = get(&app, "/pharmacy").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
