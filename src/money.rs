//! Fixed-point money and currency types.
//!
//! Amounts are counted in cents (two decimal places exactly) so that rollup
//! arithmetic is exact. Floats never enter the accumulation path; SQLite
//! stores amounts as INTEGER.

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub},
    str::FromStr,
};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::Error;

/// A monetary amount with exactly two decimal places.
///
/// The sign carries meaning: zero or positive amounts are income, negative
/// amounts are expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// An amount of zero.
    pub const ZERO: Money = Money(0);

    /// Create an amount from a signed number of cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount as a signed number of cents.
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Whether the amount counts as income (zero or positive).
    pub const fn is_income(self) -> bool {
        self.0 >= 0
    }

    /// The absolute value of the amount.
    pub const fn magnitude(self) -> Money {
        Money(self.0.abs())
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.abs();
        write!(f, "{sign}{}.{:02}", cents / 100, cents % 100)
    }
}

impl FromStr for Money {
    type Err = Error;

    /// Parse a decimal string such as `"-45.00"` or `"1200"`.
    ///
    /// # Errors
    /// Returns an [Error::InvalidAmount] if the string is not a plain decimal
    /// number with at most two fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidAmount(s.to_string());
        let text = s.trim();

        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        let (whole, fraction) = match unsigned.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (unsigned, ""),
        };

        if whole.is_empty()
            || fraction.len() > 2
            || !whole.bytes().all(|byte| byte.is_ascii_digit())
            || !fraction.bytes().all(|byte| byte.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let mut cents = whole.checked_mul(100).ok_or_else(invalid)?;

        if !fraction.is_empty() {
            let mut minor: i64 = fraction.parse().map_err(|_| invalid())?;
            if fraction.len() == 1 {
                minor *= 10;
            }
            cents = cents.checked_add(minor).ok_or_else(invalid)?;
        }

        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Money)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// A validated, upper-case three-letter currency code, e.g. `"USD"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a currency code.
    ///
    /// # Errors
    /// Returns an [Error::InvalidCurrency] if `code` is not three ASCII
    /// letters.
    pub fn new(code: &str) -> Result<Self, Error> {
        let code = code.trim();

        if code.len() == 3 && code.bytes().all(|byte| byte.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(Error::InvalidCurrency(code.to_string()))
        }
    }

    /// Create a currency code without validation.
    ///
    /// The caller should ensure that the string is a valid code, e.g. because
    /// it was read back from the database.
    pub fn new_unchecked(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl AsRef<str> for Currency {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::new(s)
    }
}

impl ToSql for Currency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for Currency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(Currency)
    }
}

#[cfg(test)]
mod money_tests {
    use crate::Error;

    use super::Money;

    #[test]
    fn parses_plain_and_fractional_amounts() {
        assert_eq!("1200".parse(), Ok(Money::from_cents(120_000)));
        assert_eq!("45.00".parse(), Ok(Money::from_cents(4_500)));
        assert_eq!("-45.00".parse(), Ok(Money::from_cents(-4_500)));
        assert_eq!("0.5".parse(), Ok(Money::from_cents(50)));
        assert_eq!("-0.05".parse(), Ok(Money::from_cents(-5)));
    }

    #[test]
    fn rejects_malformed_amounts() {
        for text in ["", "-", ".", "1.234", "12,34", "4 5", "1e3", "--1"] {
            assert_eq!(
                text.parse::<Money>(),
                Err(Error::InvalidAmount(text.to_string())),
                "expected \"{text}\" to be rejected"
            );
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        for cents in [0, 5, 99, 100, -100, 4_500, -123_456] {
            let amount = Money::from_cents(cents);
            let reparsed: Money = amount.to_string().parse().unwrap();

            assert_eq!(amount, reparsed, "round trip failed for {amount}");
        }
    }

    #[test]
    fn displays_with_two_decimal_places() {
        assert_eq!(Money::from_cents(4_500).to_string(), "45.00");
        assert_eq!(Money::from_cents(-4_500).to_string(), "-45.00");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn sign_convention_classifies_income() {
        assert!(Money::from_cents(100).is_income());
        assert!(Money::ZERO.is_income());
        assert!(!Money::from_cents(-1).is_income());
    }

    #[test]
    fn magnitude_strips_the_sign() {
        assert_eq!(Money::from_cents(-4_500).magnitude(), Money::from_cents(4_500));
        assert_eq!(Money::from_cents(4_500).magnitude(), Money::from_cents(4_500));
    }

    #[test]
    fn sums_exactly() {
        let total: Money = [10, -3, 93, -100]
            .into_iter()
            .map(Money::from_cents)
            .sum();

        assert_eq!(total, Money::ZERO);
    }
}
