//! Item price using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(10, 2)` and travel over JSON as strings
//! (`"50.00"`). Clients may send either a string or a number.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price must be a decimal number")]
    Invalid,
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount has more than two decimal places.
    #[error("price can have at most 2 decimal places")]
    TooPrecise,
}

/// A non-negative item price with at most two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Maximum number of decimal places accepted.
    pub const SCALE: u32 = 2;

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] or [`PriceError::TooPrecise`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        let normalized = amount.normalize();
        if normalized.scale() > Self::SCALE {
            return Err(PriceError::TooPrecise);
        }
        let mut rescaled = normalized;
        rescaled.rescale(Self::SCALE);
        Ok(Self(rescaled))
    }

    /// Parse a price from its decimal string form.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Invalid`] if the string is not a decimal.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::Invalid)?;
        Self::new(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
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

    #[test]
    fn test_parse_normalizes_to_two_places() {
        assert_eq!(Price::parse("50").unwrap().to_string(), "50.00");
        assert_eq!(Price::parse("19.9").unwrap().to_string(), "19.90");
        assert_eq!(Price::parse(" 0.50 ").unwrap().to_string(), "0.50");
    }

    #[test]
    fn test_parse_rejections() {
        assert_eq!(Price::parse("abc"), Err(PriceError::Invalid));
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
        assert_eq!(Price::parse("1.999"), Err(PriceError::TooPrecise));
    }

    #[test]
    fn test_trailing_zeros_are_not_precision() {
        assert_eq!(Price::parse("2.5000").unwrap().to_string(), "2.50");
    }

    #[test]
    fn test_deserialize_accepts_string_or_number() {
        let from_str: Price = serde_json::from_str("\"20.00\"").unwrap();
        let from_num: Price = serde_json::from_str("20").unwrap();
        assert_eq!(from_str, from_num);
        assert!(serde_json::from_str::<Price>("\"-3\"").is_err());
    }

    #[test]
    fn test_deserialize_enforces_price_rules() {
        let price: Price = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(price.to_string(), "12.50");
        assert!(serde_json::from_str::<Price>("\"-1\"").is_err());
        assert!(serde_json::from_str::<Price>("\"1.234\"").is_err());
        assert!(serde_json::from_str::<Price>("\"twelve\"").is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let price = Price::parse("50").unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"50.00\"");
    }
}
