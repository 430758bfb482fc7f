//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing 0.1 + 0.2 in floating point gives 0.30000000000000004.         │
//! │  Credit balances must reach exactly zero to be marked cleared,          │
//! │  so drift is not acceptable.                                            │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    price 12,500 ──► Money(12_500)                                       │
//! │    paid   5,000 ──► Money(5_000)                                        │
//! │    remaining = 7,500 exactly                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use spares_core::money::Money;
//!
//! let price = Money::from_minor(1_000);
//! let line = price * 2;
//! let discount = Money::from_minor(100) * 2;
//! assert_eq!((line - discount).minor(), 1_800);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::MAX_AMOUNT;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value counted in the smallest currency unit.
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price ──► CartItem.unit_price ──► SaleItem.subtotal            │
/// │                                                                         │
/// │  Sale.final_amount ──► PaymentBreakdown { cash, mobile_money, credit }  │
/// │                                              │                          │
/// │                                              ▼                          │
/// │                               Credit.remaining_balance                  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(#[ts(type = "number")] i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use spares_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(4_500);
    /// assert_eq!(unit_price.times(3).minor(), 13_500);
    /// ```
    #[inline]
    pub const fn times(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// `None` on overflow.
    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Like [`Money::times`], but `None` on overflow.
    ///
    /// ```rust
    /// use spares_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(4_500).checked_times(3), Some(Money::from_minor(13_500)));
    /// assert_eq!(Money::from_minor(i64::MAX / 2 + 1).checked_times(2), None);
    /// ```
    #[inline]
    pub const fn checked_times(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Returns the amount with the given number of decimal places rendered
    /// as a plain string, without separators (CSV friendly).
    ///
    /// ```rust
    /// use spares_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(12_500).to_plain(0), "12500");
    /// assert_eq!(Money::from_minor(1_099).to_plain(2), "10.99");
    /// assert_eq!(Money::from_minor(-5).to_plain(2), "-0.05");
    /// ```
    pub fn to_plain(&self, decimals: u8) -> String {
        if decimals == 0 {
            return self.0.to_string();
        }
        let divisor = 10_i64.pow(decimals as u32);
        let sign = if self.0 < 0 { "-" } else { "" };
        format!(
            "{}{}.{:0width$}",
            sign,
            (self.0 / divisor).abs(),
            (self.0 % divisor).abs(),
            width = decimals as usize
        )
    }

    /// Renders the amount with thousands separators.
    ///
    /// ```rust
    /// use spares_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(1_234_567).format_grouped(0), "1,234,567");
    /// assert_eq!(Money::from_minor(123_456).format_grouped(2), "1,234.56");
    /// assert_eq!(Money::from_minor(-2_500).format_grouped(0), "-2,500");
    /// ```
    pub fn format_grouped(&self, decimals: u8) -> String {
        let divisor = 10_i64.pow(decimals as u32);
        let whole = (self.0 / divisor).unsigned_abs().to_string();

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if self.0 < 0 { "-" } else { "" };
        if decimals == 0 {
            format!("{}{}", sign, grouped)
        } else {
            format!(
                "{}{}.{:0width$}",
                sign,
                grouped,
                (self.0 % divisor).abs(),
                width = decimals as usize
            )
        }
    }

    /// Parses an amount typed in major units. Thousands separators are
    /// ignored; more fraction digits than `decimals` is an error, and so is
    /// anything beyond [`MAX_AMOUNT`](crate::MAX_AMOUNT) in either direction.
    ///
    /// ```rust
    /// use spares_core::money::Money;
    ///
    /// assert_eq!(Money::parse("12,500", 0).unwrap().minor(), 12_500);
    /// assert_eq!(Money::parse("10.5", 2).unwrap().minor(), 1_050);
    /// assert!(Money::parse("10.5", 0).is_err());
    /// ```
    pub fn parse(text: &str, decimals: u8) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };

        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("expected a number"));
        }
        if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected digits"));
        }
        if fraction.len() > decimals as usize {
            return Err(invalid("too many decimal places"));
        }

        let scale = 10_i64.pow(decimals as u32);
        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount too large"))?
        };
        let fraction: i64 = if fraction.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", fraction, width = decimals as usize);
            padded.parse().map_err(|_| invalid("expected digits"))?
        };

        let minor = whole
            .checked_mul(scale)
            .and_then(|w| w.checked_add(fraction))
            .filter(|m| *m <= MAX_AMOUNT.0)
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -minor } else { minor }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Whole-unit display with grouping, e.g. `12,500`.
///
/// The shop's currency has no minor unit in practice; callers that need
/// decimals use [`Money::format_grouped`] with the configured precision.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_grouped(0))
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((a * 3).minor(), 3000);
        assert_eq!((-a).minor(), -1000);

        let mut c = a;
        c += b;
        c -= Money::from_minor(200);
        assert_eq!(c.minor(), 1300);
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_minor(0).to_string(), "0");
        assert_eq!(Money::from_minor(999).to_string(), "999");
        assert_eq!(Money::from_minor(1000).to_string(), "1,000");
        assert_eq!(Money::from_minor(12_500).to_string(), "12,500");
        assert_eq!(Money::from_minor(-1_000_000).to_string(), "-1,000,000");
    }

    #[test]
    fn test_format_with_decimals() {
        assert_eq!(Money::from_minor(5).format_grouped(2), "0.05");
        assert_eq!(Money::from_minor(100_000).format_grouped(2), "1,000.00");
        assert_eq!(Money::from_minor(-150).to_plain(2), "-1.50");
    }

    #[test]
    fn test_sum() {
        let amounts = vec![Money::from_minor(100), Money::from_minor(250)];
        let by_ref: Money = amounts.iter().sum();
        let by_value: Money = amounts.into_iter().sum();
        assert_eq!(by_ref.minor(), 350);
        assert_eq!(by_value, by_ref);
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_minor(1).is_positive());
        assert!(Money::from_minor(-1).is_negative());
        assert!(!Money::zero().is_positive());
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse(" 5000 ", 0).unwrap().minor(), 5_000);
        assert_eq!(Money::parse("1,234.5", 2).unwrap().minor(), 123_450);
        assert_eq!(Money::parse("-0.05", 2).unwrap().minor(), -5);
        assert_eq!(Money::parse(".5", 1).unwrap().minor(), 5);
        assert!(Money::parse("", 0).is_err());
        assert!(Money::parse("12a", 0).is_err());
        assert!(Money::parse("1.234", 2).is_err());
    }

    #[test]
    fn test_parse_rejects_amounts_over_ceiling() {
        assert_eq!(Money::parse("10,000,000,000", 0).unwrap(), MAX_AMOUNT);
        assert!(Money::parse("10,000,000,001", 0).is_err());
        assert!(Money::parse("-10,000,000,001", 0).is_err());
        assert!(Money::parse("9223372036854775807", 0).is_err());
        assert!(Money::parse("100,000,000.01", 2).is_err());
    }

    #[test]
    fn test_checked_arithmetic() {
        let max = Money::from_minor(i64::MAX);
        assert_eq!(max.checked_add(Money::from_minor(1)), None);
        assert_eq!(Money::from_minor(i64::MIN).checked_sub(Money::from_minor(1)), None);
        assert_eq!(Money::from_minor(i64::MAX / 2 + 1).checked_times(2), None);

        let a = Money::from_minor(1_000);
        assert_eq!(a.checked_add(a), Some(Money::from_minor(2_000)));
        assert_eq!(a.checked_sub(a), Some(Money::zero()));
        assert_eq!(a.checked_times(3), Some(Money::from_minor(3_000)));
    }

    #[test]
    fn test_typescript_binding_is_a_number() {
        use ts_rs::TS;
        // Matches the JSON: a plain number, not a bigint
        assert_eq!(Money::inline(), "number");
    }

    #[test]
    fn test_serializes_as_plain_number() {
        let json = serde_json::to_string(&Money::from_minor(1800)).unwrap();
        assert_eq!(json, "1800");
        let back: Money = serde_json::from_str("2000").unwrap();
        assert_eq!(back.minor(), 2000);
    }
}
