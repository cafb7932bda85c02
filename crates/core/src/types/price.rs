//! Type-safe price representation using decimal arithmetic.
//!
//! The shop sells in a single currency, so a price is a decimal amount in
//! dollars. The backend sends prices as JSON numbers; they are parsed into
//! `Decimal` so cart totals never accumulate floating-point error.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A price in the shop currency (USD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Parse a price typed into a form (`"1250"`, `"1,250.00"`, `"$89.5"`).
    ///
    /// Returns `None` for empty, negative or non-numeric input.
    #[must_use]
    pub fn parse_input(input: &str) -> Option<Self> {
        let cleaned: String = input
            .trim()
            .trim_start_matches('$')
            .chars()
            .filter(|c| *c != ',')
            .collect();
        let amount = cleaned.parse::<Decimal>().ok()?;
        if amount.is_sign_negative() {
            return None;
        }
        Some(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// True if the price is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Amount as `f64`, for chart scaling only.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    /// Format for display with thousands separators (e.g., `$1,250.00`).
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self.0.round_dp(2);
        let negative = rounded.is_sign_negative();
        let text = format!("{:.2}", rounded.abs());
        let (whole, cents) = text.split_once('.').unwrap_or((&text, "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        if negative {
            format!("-${grouped}.{cents}")
        } else {
            format!("${grouped}.{cents}")
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::from_cents(0).display(), "$0.00");
        assert_eq!(Price::from_cents(8_950).display(), "$89.50");
        assert_eq!(Price::from_cents(125_000).display(), "$1,250.00");
        assert_eq!(Price::from_cents(123_456_789).display(), "$1,234,567.89");
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(Price::parse_input("1,250"), Some(Price::from_cents(125_000)));
        assert_eq!(Price::parse_input(" $89.5 "), Some(Price::from_cents(8_950)));
        assert_eq!(Price::parse_input(""), None);
        assert_eq!(Price::parse_input("-4"), None);
        assert_eq!(Price::parse_input("abc"), None);
    }

    #[test]
    fn test_arithmetic() {
        let line = Price::from_cents(1_999) * 3;
        assert_eq!(line, Price::from_cents(5_997));
        let total: Price = [Price::from_cents(100), Price::from_cents(250)].into_iter().sum();
        assert_eq!(total, Price::from_cents(350));
    }

    #[test]
    fn test_deserializes_backend_numbers() {
        let price: Price = serde_json::from_str("1250.5").unwrap_or_default();
        assert_eq!(price, Price::from_cents(125_050));
    }
}
