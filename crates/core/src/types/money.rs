//! Type-safe monetary amounts using decimal arithmetic.
//!
//! The store trades in a single currency, so [`Money`] carries only the
//! amount. Arithmetic is exact; rounding to cents happens explicitly through
//! [`Money::round_cents`] wherever a displayed figure is produced.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount of money in the store currency.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount from a decimal value in currency units (e.g. dollars).
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create an amount from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Round to two decimal places, halves away from zero.
    #[must_use]
    pub fn round_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiply by a unitless rate (e.g. a tax rate of `0.08`).
    #[must_use]
    pub fn scale(self, rate: Decimal) -> Self {
        Self(self.0 * rate)
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.round_cents().0;
        if rounded.is_sign_negative() && !rounded.is_zero() {
            write!(f, "-${:.2}", rounded.abs())
        } else {
            write!(f, "${rounded:.2}")
        }
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        assert_eq!(Money::from_cents(1999).amount(), Decimal::new(1999, 2));
    }

    #[test]
    fn test_round_cents_half_away_from_zero() {
        assert_eq!(
            Money::new(Decimal::new(12_345, 3)).round_cents(),
            Money::from_cents(1235)
        );
        assert_eq!(
            Money::new(Decimal::new(12_344, 3)).round_cents(),
            Money::from_cents(1234)
        );
    }

    #[test]
    fn test_mul_and_sum() {
        let lines = [Money::from_cents(2000) * 2, Money::from_cents(1500) * 1];
        let total: Money = lines.into_iter().sum();
        assert_eq!(total, Money::from_cents(5500));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(5319).to_string(), "$53.19");
        assert_eq!(Money::ZERO.to_string(), "$0.00");
        assert_eq!(Money::from_cents(-250).to_string(), "-$2.50");
    }

    #[test]
    fn test_serde_accepts_numbers_and_strings() {
        let from_str: Money = serde_json::from_str("\"19.99\"").unwrap();
        let from_num: Money = serde_json::from_str("19.99").unwrap();
        assert_eq!(from_str, Money::from_cents(1999));
        assert_eq!(from_num, Money::from_cents(1999));
    }
}
