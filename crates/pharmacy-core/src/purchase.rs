//! # Purchase Settlement
//!
//! The arithmetic half of a purchase: decides whether a buyer can afford a
//! listing and what both balances become. The database layer performs the
//! matching writes inside one transaction.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  buyer balance ─┐                                                       │
//! │                 ├──► settle() ──► InsufficientFunds  (nothing written)  │
//! │  listing price ─┤         │                                             │
//! │                 │         ▼                                             │
//! │  seller balance ┘   Settlement {                                        │
//! │                       amount:               price                       │
//! │                       buyer_balance_after:  buyer  - price              │
//! │                       seller_balance_after: seller + price              │
//! │                     }                                                   │
//! │                                                                         │
//! │  debit == credit == amount, always                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

/// Outcome of an affordable purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Amount moved from buyer to seller; recorded on the transaction.
    pub amount: Money,
    pub buyer_balance_after: Money,
    pub seller_balance_after: Money,
}

impl Settlement {
    /// Net change across both parties. Always zero.
    pub fn net(&self, buyer_before: Money, seller_before: Money) -> Money {
        (self.buyer_balance_after - buyer_before) + (self.seller_balance_after - seller_before)
    }
}

/// Checks funds and computes post-sale balances.
///
/// ## Rules
/// - `price` must be positive
/// - `buyer_balance >= price`, otherwise [`CoreError::InsufficientFunds`]
///
/// A balance exactly equal to the price is affordable and ends at zero.
pub fn settle(buyer_balance: Money, seller_balance: Money, price: Money) -> CoreResult<Settlement> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        }
        .into());
    }

    check_funds(buyer_balance, price)?;

    let seller_balance_after = seller_balance.checked_add(price).ok_or_else(|| {
        ValidationError::OutOfRange {
            field: "pharmacy cash balance".to_string(),
            min: 0,
            max: i64::MAX,
        }
    })?;

    Ok(Settlement {
        amount: price,
        buyer_balance_after: buyer_balance - price,
        seller_balance_after,
    })
}

/// Fails with [`CoreError::InsufficientFunds`] when `balance < price`.
pub fn check_funds(balance: Money, price: Money) -> CoreResult<()> {
    if balance < price {
        return Err(CoreError::InsufficientFunds {
            required: price,
            available: balance,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_moves_price_between_parties() {
        let buyer = Money::from_cents(30_000);
        let seller = Money::from_cents(15_000);
        let s = settle(buyer, seller, Money::from_cents(5_000)).unwrap();

        assert_eq!(s.amount.cents(), 5_000);
        assert_eq!(s.buyer_balance_after.cents(), 25_000);
        assert_eq!(s.seller_balance_after.cents(), 20_000);
        assert!(s.net(buyer, seller).is_zero());
    }

    #[test]
    fn test_exact_balance_is_affordable() {
        let s = settle(
            Money::from_cents(5_000),
            Money::zero(),
            Money::from_cents(5_000),
        )
        .unwrap();
        assert!(s.buyer_balance_after.is_zero());
    }

    #[test]
    fn test_insufficient_funds() {
        let err = settle(
            Money::from_cents(1_000),
            Money::from_cents(15_000),
            Money::from_cents(5_000),
        )
        .unwrap_err();

        match err {
            CoreError::InsufficientFunds {
                required,
                available,
            } => {
                assert_eq!(required.cents(), 5_000);
                assert_eq!(available.cents(), 1_000);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_positive_price_rejected() {
        assert!(matches!(
            settle(Money::from_cents(100), Money::zero(), Money::zero()),
            Err(CoreError::Validation(_))
        ));
    }
}
