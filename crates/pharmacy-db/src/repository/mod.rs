//! # Repository Module
//!
//! Database repository implementations for the marketplace.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.pharmacies().open_at(DayOfWeek::Mon, t, page)              │
//! │       ▼                                                                 │
//! │  PharmacyRepository                                                    │
//! │  ├── list / get / open_at                                              │
//! │  ├── masks (listings)                                                  │
//! │  └── by_mask_count / by_mask_count_range                               │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`PharmacyRepository`](pharmacy::PharmacyRepository) - Pharmacies, hours, listings
//! - [`MaskRepository`](mask::MaskRepository) - Masks, listing prices, sales summary
//! - [`UserRepository`](user::UserRepository) - Users and spending rankings
//! - [`TransactionRepository`](transaction::TransactionRepository) - Transaction reads and import
//! - [`SearchRepository`](search::SearchRepository) - Ranked name search
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - The atomic purchase
//!
//! ## Stored Text Formats
//! Times of day are `HH:MM:SS` and timestamps are RFC 3339 UTC with nine
//! fractional digits, so SQL string comparison matches chronological order.
//! All binds go through [`time_of_day`] and [`timestamp`].

use chrono::{DateTime, NaiveTime, SecondsFormat, Utc};

pub mod mask;
pub mod pharmacy;
pub mod purchase;
pub mod search;
pub mod transaction;
pub mod user;

/// Formats a time of day the way `pharmacy_hours` stores it.
pub(crate) fn time_of_day(t: NaiveTime) -> String {
    t.format("%H:%M:%S").to_string()
}

/// Formats a timestamp the way `transactions.transaction_date` stores it.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

// =============================================================================
// Test Fixtures
// =============================================================================
