//! # Application State
//!
//! Shared by every handler through axum's `State` extractor.
//!
//! The database handle wraps a reference-counted pool, so cloning the state
//! per request is cheap and needs no extra locking.

use pharmacy_db::Database;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }
}
