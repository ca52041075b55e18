//! # Validation Module
//!
//! Input validation and parameter parsing for the marketplace.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (serde)                                      │
//! │  ├── Type validation (query strings, JSON bodies)                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Names, prices, balances, search terms                             │
//! │  └── Dates and times given as text                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (pharmacy_id, mask_id)                                     │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pharmacy_core::validation::{parse_end_date, parse_time, validate_name};
//!
//! validate_name("name", "Carepoint").unwrap();
//! let t = parse_time("14:30").unwrap();
//! assert_eq!(t.to_string(), "14:30:00");
//!
//! let end = parse_end_date("2024-10-31").unwrap();
//! assert_eq!(end.to_rfc3339(), "2024-10-31T23:59:59.999999999+00:00");
//! ```

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};

use crate::error::ValidationError;
use crate::MAX_NAME_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted search term.
pub const MAX_SEARCH_TERM_LENGTH: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an entity name (pharmacy, mask, user).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_NAME_LENGTH`] characters
///
/// ```rust
/// use pharmacy_core::validation::validate_name;
///
/// assert!(validate_name("name", "True Barrier (green)").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates a search term.
///
/// An empty term is allowed (it simply matches nothing).
pub fn validate_search_term(term: &str) -> ValidationResult<()> {
    if term.chars().count() > MAX_SEARCH_TERM_LENGTH {
        return Err(ValidationError::TooLong {
            field: "search_term".to_string(),
            max: MAX_SEARCH_TERM_LENGTH,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a listing price. Listings are never free.
pub fn validate_price_cents(price_cents: i64) -> ValidationResult<()> {
    if price_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price_cents".to_string(),
        });
    }
    Ok(())
}

/// Validates an opening cash balance.
pub fn validate_balance_cents(balance_cents: i64) -> ValidationResult<()> {
    if balance_cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "cash_balance_cents".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a count threshold (`count` for the more/less filter).
pub fn validate_count(count: i64) -> ValidationResult<()> {
    if count < 0 {
        return Err(ValidationError::OutOfRange {
            field: "count".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a top-N limit.
pub fn validate_top_limit(limit: u32) -> ValidationResult<()> {
    if limit == 0 {
        return Err(ValidationError::MustBePositive {
            field: "limit".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Date / Time Parsing
// =============================================================================

/// Parses a time of day given as `HH:MM` or `HH:MM:SS`.
///
/// Fractional seconds are dropped so the value compares cleanly against
/// stored `HH:MM:SS` text.
pub fn parse_time(value: &str) -> ValidationResult<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map(|t| t.with_nanosecond(0).unwrap_or(t))
        .map_err(|_| ValidationError::InvalidFormat {
            field: "query_time".to_string(),
            reason: format!("expected HH:MM or HH:MM:SS, got '{value}'"),
        })
}

/// Parses the lower bound of a date range.
///
/// Accepts RFC 3339 (`2024-10-01T08:00:00Z`) or a bare date, which means
/// the start of that day in UTC.
pub fn parse_start_date(value: &str) -> ValidationResult<DateTime<Utc>> {
    parse_date_bound("start_date", value, |date| {
        date.and_hms_opt(0, 0, 0)
    })
}

/// Parses the upper bound of a date range.
///
/// A bare date means the last instant of that day in UTC, so the range stays
/// inclusive of the whole day.
pub fn parse_end_date(value: &str) -> ValidationResult<DateTime<Utc>> {
    parse_date_bound("end_date", value, |date| {
        date.and_hms_nano_opt(23, 59, 59, 999_999_999)
    })
}

fn parse_date_bound(
    field: &str,
    value: &str,
    day_bound: impl Fn(NaiveDate) -> Option<chrono::NaiveDateTime>,
) -> ValidationResult<DateTime<Utc>> {
    let value = value.trim();
    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: format!("expected RFC 3339 timestamp or YYYY-MM-DD, got '{value}'"),
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())?;
    day_bound(date)
        .map(|naive| naive.and_utc())
        .ok_or_else(invalid)
}

// =============================================================================
// Unit Tests
// =============================================================================
