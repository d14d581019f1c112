//! Non-negative price representation using decimal arithmetic.
//!
//! The store sells in a single currency (cash on delivery), so a price is
//! just a non-negative [`Decimal`] amount in the currency's standard unit.
//!
//! Amounts that get written to a price column go through [`Price::stored`]
//! or [`Price::storable`], which hold them to the `NUMERIC(12, 2)` range.
//! Aggregates such as revenue are plain [`Price::new`] values.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),

    /// The amount does not fit a stored price column.
    #[error("price cannot exceed {max} (got {0})", max = Price::MAX_STORED)]
    TooLarge(Decimal),

    /// The amount has fractions of a cent.
    #[error("price can have at most 2 decimal places (got {0})")]
    TooPrecise(Decimal),
}

/// A non-negative amount of money.
///
/// ```
/// use bazaar_core::Price;
/// use rust_decimal::Decimal;
///
/// let unit = Price::new(Decimal::new(1999, 2)).unwrap();
/// assert_eq!(unit.line_total(3).amount(), Decimal::new(5997, 2));
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest amount a stored price holds: 9,999,999,999.99.
    pub const MAX_STORED: Self = Self(Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2));

    /// Decimal places kept for stored prices.
    pub const STORED_SCALE: u32 = 2;

    /// Create a price, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount < 0`.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount < Decimal::ZERO {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price that will be written to a price column.
    ///
    /// # Errors
    ///
    /// Returns `Negative`, `TooPrecise` for more than two decimal places,
    /// or `TooLarge` above [`Price::MAX_STORED`].
    pub fn stored(amount: Decimal) -> Result<Self, PriceError> {
        let price = Self::new(amount)?;
        if amount.normalize().scale() > Self::STORED_SCALE {
            return Err(PriceError::TooPrecise(amount));
        }
        price.storable()
    }

    /// Check that a computed amount, such as an order total, still fits a
    /// price column.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::TooLarge` above [`Price::MAX_STORED`].
    pub fn storable(self) -> Result<Self, PriceError> {
        if self > Self::MAX_STORED {
            return Err(PriceError::TooLarge(self.0));
        }
        Ok(self)
    }

    /// Subtract, stopping at zero.
    #[must_use]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self((self.0 - rhs.0).max(Decimal::ZERO))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn line_total(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Divide evenly across `count` items, or zero when there are none.
    #[must_use]
    pub fn average_over(self, count: u64) -> Self {
        if count == 0 {
            return Self::ZERO;
        }
        Self((self.0 / Decimal::from(count)).round_dp(2))
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
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

    fn price(cents: i64) -> Price {
        Price::new(Decimal::new(cents, 2)).unwrap()
    }

    #[test]
    fn test_rejects_negative() {
        assert!(matches!(
            Price::new(Decimal::new(-5, 1)),
            Err(PriceError::Negative(_))
        ));
        assert_eq!(Price::new(Decimal::ZERO).unwrap(), Price::ZERO);
    }

    #[test]
    fn test_line_total_and_sum() {
        let total: Price = [price(1000).line_total(3), price(250).line_total(2)]
            .into_iter()
            .sum();
        assert_eq!(total, price(3500));
    }

    #[test]
    fn test_average_over_zero_is_zero() {
        assert_eq!(price(9999).average_over(0), Price::ZERO);
        assert_eq!(price(1000).average_over(3).amount(), Decimal::new(333, 2));
    }

    #[test]
    fn test_stored_holds_column_range() {
        assert_eq!(Price::MAX_STORED.to_string(), "9999999999.99");
        assert_eq!(
            Price::stored(Decimal::new(999_999_999_999, 2)).unwrap(),
            Price::MAX_STORED
        );
        assert!(matches!(
            Price::stored(Decimal::new(10_000_000_000, 0)),
            Err(PriceError::TooLarge(_))
        ));
        assert!(matches!(
            Price::stored(Decimal::new(-1, 2)),
            Err(PriceError::Negative(_))
        ));
    }

    #[test]
    fn test_stored_rejects_fractions_of_a_cent() {
        assert!(matches!(
            Price::stored(Decimal::new(10_005, 3)),
            Err(PriceError::TooPrecise(_))
        ));
        // Trailing zeros are not extra precision.
        assert_eq!(
            Price::stored(Decimal::new(105_000, 4)).unwrap(),
            price(1050)
        );
    }

    #[test]
    fn test_computed_totals_can_outgrow_storage() {
        let total = price(600_000_000_000).line_total(2);
        assert!(Price::new(total.amount()).is_ok());
        assert!(matches!(total.storable(), Err(PriceError::TooLarge(_))));
        assert_eq!(Price::MAX_STORED.saturating_sub(total), Price::ZERO);
        assert_eq!(price(1000).saturating_sub(price(250)), price(750));
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Price>("\"-1.00\"").is_err());
        let parsed: Price = serde_json::from_str("12.5").unwrap();
        assert_eq!(parsed.to_string(), "12.50");
    }
}
