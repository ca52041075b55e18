//! # Domain Types
//!
//! Entities, enums, query parameters and read projections shared by the
//! database layer and the HTTP service.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ┌────────────────┐ 1     * ┌────────────────┐ *     1 ┌──────────────┐ │
//! │  │   Pharmacy     │─────────│  PharmacyMask  │─────────│     Mask     │ │
//! │  │  id            │         │  pharmacy_id   │         │  id          │ │
//! │  │  name          │         │  mask_id       │         │  name        │ │
//! │  │  cash_balance  │         │  price_cents   │         └──────────────┘ │
//! │  └───────┬────────┘         └────────────────┘                ▲         │
//! │          │ 1                                                  │         │
//! │          │ *                                                  │         │
//! │  ┌───────┴────────┐         ┌────────────────┐                │         │
//! │  │  PharmacyHour  │         │  Transaction   │────────────────┘         │
//! │  │  day_of_week   │         │  user_id       │                          │
//! │  │  open / close  │         │  pharmacy_id   │         ┌──────────────┐ │
//! │  └────────────────┘         │  mask_id       │─────────│     User     │ │
//! │                             │  amount_cents  │         │ cash_balance │ │
//! │                             │  date          │         └──────────────┘ │
//! │                             └────────────────┘                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ids are SQLite integer keys. All currency fields are integer cents with a
//! [`Money`] accessor.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

// =============================================================================
// Entities
// =============================================================================

/// A pharmacy selling masks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Pharmacy {
    pub id: i64,
    pub name: String,
    /// Cash balance in cents. Grows with every sale.
    pub cash_balance_cents: i64,
}

impl Pharmacy {
    #[inline]
    pub fn cash_balance(&self) -> Money {
        Money::from_cents(self.cash_balance_cents)
    }
}

/// A mask product. Masks have no owner; pharmacies list them with a price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Mask {
    pub id: i64,
    pub name: String,
}

/// A buyer with a cash balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub name: String,
    pub cash_balance_cents: i64,
}

impl User {
    #[inline]
    pub fn cash_balance(&self) -> Money {
        Money::from_cents(self.cash_balance_cents)
    }
}

/// A mask listed by a pharmacy at a price. At most one per (pharmacy, mask).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PharmacyMask {
    pub id: i64,
    pub pharmacy_id: i64,
    pub mask_id: i64,
    pub price_cents: i64,
}

impl PharmacyMask {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// One opening window of a pharmacy on a given weekday.
///
/// `open_time <= close_time` is expected; windows crossing midnight are not
/// modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PharmacyHour {
    pub id: i64,
    pub pharmacy_id: i64,
    pub day_of_week: DayOfWeek,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
}

impl PharmacyHour {
    /// Whether this window covers `time` on `day`. Both ends are inclusive.
    pub fn is_open_at(&self, day: DayOfWeek, time: NaiveTime) -> bool {
        self.day_of_week == day && self.open_time <= time && time <= self.close_time
    }
}

/// A completed sale. Never updated or deleted once written.
///
/// `transaction_amount_cents` is the listing price at the moment of sale,
/// not a reference to the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub pharmacy_id: i64,
    pub mask_id: i64,
    pub transaction_amount_cents: i64,
    pub transaction_date: DateTime<Utc>,
}

impl Transaction {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.transaction_amount_cents)
    }
}

// =============================================================================
// Creation Inputs
// =============================================================================

/// Body of `POST /pharmacies`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPharmacy {
    pub name: String,
    #[serde(default)]
    pub cash_balance_cents: i64,
}

/// Body of `POST /masks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMask {
    pub name: String,
}

/// A user to insert (seeding and tests).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub cash_balance_cents: i64,
}

/// A historical transaction loaded by an import. Live sales go through the
/// purchase transactor instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub user_id: i64,
    pub pharmacy_id: i64,
    pub mask_id: i64,
    pub transaction_amount_cents: i64,
    pub transaction_date: DateTime<Utc>,
}

/// An opening window to attach to a pharmacy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPharmacyHour {
    pub day_of_week: DayOfWeek,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
}

// =============================================================================
// Enums
// =============================================================================

/// Weekday as stored in `pharmacy_hours.day_of_week`.
///
/// Thursday is spelled `Thur` in storage and on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum DayOfWeek {
    #[default]
    Mon,
    Tue,
    Wed,
    Thur,
    Fri,
    Sat,
    Sun,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Mon,
        DayOfWeek::Tue,
        DayOfWeek::Wed,
        DayOfWeek::Thur,
        DayOfWeek::Fri,
        DayOfWeek::Sat,
        DayOfWeek::Sun,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Mon => "Mon",
            DayOfWeek::Tue => "Tue",
            DayOfWeek::Wed => "Wed",
            DayOfWeek::Thur => "Thur",
            DayOfWeek::Fri => "Fri",
            DayOfWeek::Sat => "Sat",
            DayOfWeek::Sun => "Sun",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Mon,
            Weekday::Tue => DayOfWeek::Tue,
            Weekday::Wed => DayOfWeek::Wed,
            Weekday::Thu => DayOfWeek::Thur,
            Weekday::Fri => DayOfWeek::Fri,
            Weekday::Sat => DayOfWeek::Sat,
            Weekday::Sun => DayOfWeek::Sun,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DayOfWeek::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "day_of_week".to_string(),
                allowed: DayOfWeek::ALL.iter().map(|d| d.as_str().to_string()).collect(),
            })
    }
}

/// Ordering of a pharmacy's mask listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Name,
    Price,
}

/// Strict comparison against a count threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    /// `count > threshold`
    More,
    /// `count < threshold`
    #[default]
    Less,
}

impl Comparison {
    pub fn holds(&self, count: i64, threshold: i64) -> bool {
        match self {
            Comparison::More => count > threshold,
            Comparison::Less => count < threshold,
        }
    }
}

/// Which entity kinds a search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Pharmacy,
    Mask,
    #[default]
    All,
}

impl SearchType {
    pub fn includes(&self, kind: EntityKind) -> bool {
        match self {
            SearchType::All => true,
            SearchType::Pharmacy => kind == EntityKind::Pharmacy,
            SearchType::Mask => kind == EntityKind::Mask,
        }
    }
}

/// Tag on a search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Pharmacy,
    Mask,
}

// =============================================================================
// Query Parameters
// =============================================================================

/// Offset pagination. `skip` rows are dropped, then at most `limit` kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

impl PageRequest {
    pub const fn new(skip: u32, limit: u32) -> Self {
        PageRequest { skip, limit }
    }

    /// Rejects `limit` outside `1..=MAX_PAGE_LIMIT`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.limit == 0 || self.limit > MAX_PAGE_LIMIT {
            return Err(ValidationError::OutOfRange {
                field: "limit".to_string(),
                min: 1,
                max: MAX_PAGE_LIMIT as i64,
            });
        }
        Ok(())
    }

    /// SQL `OFFSET` value.
    #[inline]
    pub fn offset(&self) -> i64 {
        self.skip as i64
    }

    /// SQL `LIMIT` value.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(0, DEFAULT_PAGE_LIMIT)
    }
}

/// Inclusive `[start, end]` timestamp range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedRange {
                field: "date range".to_string(),
                min: start.to_rfc3339(),
                max: end.to_rfc3339(),
            });
        }
        Ok(DateRange { start, end })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Inclusive `[min, max]` price range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Money,
    pub max: Money,
}

impl PriceRange {
    pub fn new(min: Money, max: Money) -> Result<Self, ValidationError> {
        if min.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "min_price".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
        if min > max {
            return Err(ValidationError::InvertedRange {
                field: "price".to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(PriceRange { min, max })
    }

    pub fn contains(&self, price: Money) -> bool {
        self.min <= price && price <= self.max
    }
}

/// Inclusive `[min, max]` listing-count range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: i64,
    pub max: i64,
}

impl CountRange {
    pub fn new(min: i64, max: i64) -> Result<Self, ValidationError> {
        if min < 0 {
            return Err(ValidationError::OutOfRange {
                field: "min_count".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
        if min > max {
            return Err(ValidationError::InvertedRange {
                field: "count".to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(CountRange { min, max })
    }

    pub fn contains(&self, count: i64) -> bool {
        self.min <= count && count <= self.max
    }
}

// =============================================================================
// Read Projections
// =============================================================================

/// A pharmacy together with its opening windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PharmacyWithHours {
    pub id: i64,
    pub name: String,
    pub cash_balance_cents: i64,
    pub opening_hours: Vec<PharmacyHour>,
}

impl PharmacyWithHours {
    pub fn new(pharmacy: Pharmacy, opening_hours: Vec<PharmacyHour>) -> Self {
        PharmacyWithHours {
            id: pharmacy.id,
            name: pharmacy.name,
            cash_balance_cents: pharmacy.cash_balance_cents,
            opening_hours,
        }
    }
}

/// One listing of a pharmacy, joined with the mask name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MaskListing {
    /// Listing id (`pharmacy_masks.id`).
    pub id: i64,
    pub mask_id: i64,
    pub name: String,
    pub price_cents: i64,
}

/// A pharmacy with the number of its listings inside a price range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PharmacyMaskCount {
    pub id: i64,
    pub name: String,
    pub mask_count: i64,
}

/// A user's spending over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserSpending {
    pub id: i64,
    pub name: String,
    pub total_amount_cents: i64,
}

/// Count and sum of transactions over a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransactionTotals {
    pub transaction_count: i64,
    pub total_amount_cents: i64,
}

/// Per-mask sales over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MaskSalesSummary {
    pub mask_id: i64,
    pub mask_name: String,
    pub mask_count: i64,
    /// Sum of amounts in cents.
    pub total_value: i64,
}

/// The mask of a transaction with the listing price as it is now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskAtPrice {
    pub id: i64,
    pub name: String,
    /// `None` when the pharmacy no longer lists the mask.
    pub price_cents: Option<i64>,
}

/// A transaction with its mask name and the current listing price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub id: i64,
    pub user_id: i64,
    pub pharmacy_id: i64,
    pub mask_id: i64,
    pub transaction_amount_cents: i64,
    pub transaction_date: DateTime<Utc>,
    pub mask: MaskAtPrice,
}

/// A ranked search result. Serialized with a `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
}

/// Body of `POST /purchase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub user_id: i64,
    pub pharmacy_id: i64,
    pub mask_id: i64,
}

/// Result of a committed purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub transaction_id: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
