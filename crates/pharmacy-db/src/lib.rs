//! # pharmacy-db: Storage Layer for the Mask Marketplace
//!
//! SQLite persistence for pharmacies, masks, users and transactions, using
//! sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Marketplace Data Flow                            │
//! │                                                                         │
//! │  HTTP handler (POST /purchase)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   pharmacy-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │   │   │
//! │  │   │               │    │ PharmacyRepo   │   │              │   │   │
//! │  │   │ SqlitePool    │◄───│ MaskRepo       │   │ 0001_initial │   │   │
//! │  │   │ WAL + FKs     │    │ UserRepo       │   │ _schema.sql  │   │   │
//! │  │   │               │    │ PurchaseRepo   │   │              │   │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ./data/pharmacy.db  (or :memory: in tests)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (pharmacy, purchase, etc.)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pharmacy_db::{Database, DbConfig};
//! use pharmacy_core::PurchaseRequest;
//!
//! let db = Database::new(DbConfig::new("./data/pharmacy.db")).await?;
//!
//! let receipt = db
//!     .purchases()
//!     .purchase(PurchaseRequest { user_id: 1, pharmacy_id: 2, mask_id: 3 })
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::mask::MaskRepository;
pub use repository::pharmacy::PharmacyRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::search::SearchRepository;
pub use repository::transaction::TransactionRepository;
pub use repository::user::UserRepository;
