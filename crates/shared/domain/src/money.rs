//! Monetary amounts as integer cents.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::constants::MAX_AMOUNT_CENTS;
use crate::error::{DomainError, DomainResult};

/// An amount of money in cents.
///
/// All ledger arithmetic is done on whole cents so that balance checks are
/// exact comparisons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    /// Clamp negative amounts to zero.
    pub fn clamp_non_negative(self) -> Self {
        Money(self.0.max(0))
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Reject an entered amount that is negative or above [`MAX_AMOUNT_CENTS`].
    pub fn ensure_entered(self, what: &str) -> DomainResult<Self> {
        if self.is_negative() {
            return Err(DomainError::validation(format!(
                "{} must be non-negative",
                what
            )));
        }
        if self.0 > MAX_AMOUNT_CENTS {
            return Err(DomainError::validation(format!(
                "{} exceeds the maximum of {}",
                what,
                format_cents(MAX_AMOUNT_CENTS)
            )));
        }
        Ok(self)
    }

    /// Amount as a float number of dollars (for ratios and trends only).
    pub fn as_dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parse a dollar amount such as `1,234.56`, `-12.5`, `$40` or `-$3.10`.
    pub fn parse(input: &str) -> DomainResult<Self> {
        let invalid = || DomainError::validation(format!("Invalid amount '{}'", input));

        let mut rest = input.trim();
        let mut negative = false;
        if let Some(stripped) = rest.strip_prefix('-') {
            negative = true;
            rest = stripped;
        }
        rest = rest.strip_prefix('$').unwrap_or(rest);
        if !negative {
            if let Some(stripped) = rest.strip_prefix('-') {
                negative = true;
                rest = stripped;
            }
        }

        let cleaned: String = rest.chars().filter(|c| *c != ',').collect();
        let (whole, fraction) = match cleaned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (cleaned.as_str(), ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if fraction.len() > 2
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let dollars: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        let total = dollars
            .checked_mul(100)
            .and_then(|d| d.checked_add(cents))
            .ok_or_else(invalid)?;

        Ok(Money(if negative { -total } else { total }))
    }

    /// Plain decimal representation without currency symbol or grouping (`-12.50`).
    pub fn to_decimal_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_cents(self.0))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Money(cents)
    }
}

/// Subtotal plus tax of a document, refusing amounts outside the accepted range.
pub fn document_total(subtotal: Money, tax: Money) -> DomainResult<Money> {
    subtotal.ensure_entered("Subtotal")?;
    tax.ensure_entered("Tax amount")?;
    subtotal
        .checked_add(tax)
        .ok_or_else(|| DomainError::validation("Total is out of range"))
}

/// Format cents as a dollar string with thousands separators (`25050` -> `$250.50`).
pub fn format_cents(cents: i64) -> String {
    let abs = cents.unsigned_abs();
    let dollars = (abs / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if cents < 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, abs % 100)
}

/// Format basis points as a percentage with one decimal (`1500` -> `15.0%`).
pub fn format_bps(bps: i64) -> String {
    format!("{:.1}%", bps as f64 / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(0), "$0.00");
        assert_eq!(format_cents(100), "$1.00");
        assert_eq!(format_cents(25050), "$250.50");
        assert_eq!(format_cents(123456789), "$1,234,567.89");
        assert_eq!(format_cents(-1250), "-$12.50");
    }

    #[test]
    fn test_format_bps() {
        assert_eq!(format_bps(1500), "15.0%");
        assert_eq!(format_bps(2000), "20.0%");
        assert_eq!(format_bps(500), "5.0%");
        assert_eq!(format_bps(10000), "100.0%");
    }

    #[test]
    fn test_parse_amounts() {
        assert_eq!(Money::parse("1,234.56").unwrap().cents(), 123456);
        assert_eq!(Money::parse("-12.5").unwrap().cents(), -1250);
        assert_eq!(Money::parse("$40").unwrap().cents(), 4000);
        assert_eq!(Money::parse("-$3.10").unwrap().cents(), -310);
        assert_eq!(Money::parse(".75").unwrap().cents(), 75);
        assert_eq!(Money::parse(" 0 ").unwrap(), Money::ZERO);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Money::parse("").is_err());
        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("1.234").is_err());
        assert!(Money::parse("12..3").is_err());
        assert!(Money::parse("99999999999999999999").is_err());
    }

    #[test]
    fn test_decimal_string() {
        assert_eq!(Money::from_cents(-1250).to_decimal_string(), "-12.50");
        assert_eq!(Money::from_cents(5).to_decimal_string(), "0.05");
    }

    #[test]
    fn test_arithmetic() {
        let total: Money = [Money::from_cents(150), Money::from_cents(-50)].iter().sum();
        assert_eq!(total.cents(), 100);
        assert_eq!((-total).cents(), -100);
        assert_eq!(Money::from_cents(-3).clamp_non_negative(), Money::ZERO);
    }

    #[test]
    fn test_checked_add_and_limits() {
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(2).checked_add(Money::from_cents(3)),
            Some(Money::from_cents(5))
        );

        assert!(Money::from_cents(MAX_AMOUNT_CENTS).ensure_entered("Subtotal").is_ok());
        assert!(Money::from_cents(MAX_AMOUNT_CENTS + 1).ensure_entered("Subtotal").is_err());
        assert!(Money::from_cents(-1).ensure_entered("Subtotal").is_err());
    }
}
