//! # pharmacy-core: Pure Business Logic for the Mask Marketplace
//!
//! Everything in here is deterministic and free of I/O. The database crate
//! and the HTTP service both build on these types.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Mask Marketplace Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │    /pharmacies  /masks  /users  /search  /purchase             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ pharmacy-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  search   │  │ purchase  │  │   │
//! │  │   │ Pharmacy  │  │   Money   │  │ trigrams  │  │ Settlement│  │   │
//! │  │   │ Mask/User │  │           │  │ ranking   │  │ funds chk │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 pharmacy-db (Database Layer)                    │   │
//! │  │        SQLite queries, migrations, purchase transactor          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities, enums, query parameters and read projections
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation and parameter parsing
//! - [`search`] - Trigram similarity and ranked, paginated search
//! - [`purchase`] - Funds check and zero-sum settlement for a sale
//!
//! ## Example Usage
//!
//! ```rust
//! use pharmacy_core::money::Money;
//! use pharmacy_core::purchase::settle;
//!
//! let settlement = settle(
//!     Money::from_cents(30_000), // buyer has $300.00
//!     Money::from_cents(15_000), // pharmacy has $150.00
//!     Money::from_cents(5_000),  // mask costs $50.00
//! )
//! .unwrap();
//!
//! assert_eq!(settlement.buyer_balance_after.cents(), 25_000);
//! assert_eq!(settlement.seller_balance_after.cents(), 20_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod purchase;
pub mod search;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default page size when a caller does not pass `limit`.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page a caller may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Longest accepted pharmacy / mask / user name.
pub const MAX_NAME_LENGTH: usize = 200;
