//! Monetary values stored with two decimal places.
//!
//! Amounts are held as [Decimal] in memory and as integer cents in the database,
//! which keeps sums exact and lets SQLite aggregate them directly.

use std::fmt::{self, Display, Formatter};

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};

use crate::validation::InputError;

/// The number of decimal places kept for monetary values.
pub const DECIMAL_PLACES: u32 = 2;

/// The largest magnitude accepted for a monetary value (exclusive), i.e. at
/// most ten integer digits.
const LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

/// A non-negative amount of money for a transaction.
///
/// The only way to create an `Amount` outside the database layer is
/// [Amount::new], which rejects negative values, so every `Amount` is `>= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// Create an amount from `value`, rounded to two decimal places.
    ///
    /// Midpoints are rounded away from zero, e.g. `0.125` becomes `0.13`.
    ///
    /// # Errors
    /// Returns [InputError::NegativeAmount] if `value` is less than zero, or
    /// [InputError::AmountTooLarge] if it has more than ten integer digits.
    pub fn new(value: Decimal) -> Result<Self, InputError> {
        if value < Decimal::ZERO {
            return Err(InputError::NegativeAmount);
        }

        Ok(Self(round_money(value)?))
    }

    /// The decimal value of the amount.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The amount in cents.
    pub fn cents(&self) -> i64 {
        to_cents(self.0)
    }

    pub(crate) fn from_cents(cents: i64) -> Self {
        Self(from_cents(cents))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.cents()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Amount::from_cents)
    }
}

/// Round `value` to two decimal places, rejecting values too large to store.
///
/// # Errors
/// Returns [InputError::AmountTooLarge] if `value` has more than ten integer digits.
pub fn round_money(value: Decimal) -> Result<Decimal, InputError> {
    let rounded =
        value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);

    if rounded.abs() >= LIMIT {
        return Err(InputError::AmountTooLarge);
    }

    // Tiny negative values round to negative zero, which would display as "-0.00".
    if rounded.is_zero() {
        return Ok(Decimal::ZERO);
    }

    Ok(rounded)
}

/// Convert a value produced by [round_money] into cents.
pub(crate) fn to_cents(value: Decimal) -> i64 {
    let mut scaled = value;
    scaled.rescale(DECIMAL_PLACES);
    // round_money bounds the magnitude to ten integer digits, which fits in an i64.
    scaled.mantissa() as i64
}

/// Convert cents back into a decimal value with two decimal places.
pub(crate) fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, DECIMAL_PLACES)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::validation::InputError;

    use super::{Amount, round_money};

    #[test]
    fn rejects_negative_values() {
        assert_eq!(
            Amount::new(Decimal::new(-1, 2)),
            Err(InputError::NegativeAmount)
        );
    }

    #[test]
    fn accepts_zero() {
        assert_eq!(Amount::new(Decimal::ZERO).map(|a| a.cents()), Ok(0));
    }

    #[test]
    fn rounds_midpoint_away_from_zero() {
        let amount = Amount::new(Decimal::new(125, 3)).unwrap();

        assert_eq!(amount.value(), Decimal::new(13, 2));
        assert_eq!(amount.cents(), 13);
    }

    #[test]
    fn cents_round_trip_through_sql_representation() {
        let amount = Amount::new(Decimal::new(4250, 2)).unwrap();

        assert_eq!(Amount::from_cents(amount.cents()), amount);
    }

    #[test]
    fn displays_two_decimal_places() {
        let amount = Amount::new(Decimal::new(125, 1)).unwrap();

        assert_eq!(amount.to_string(), "12.50");
    }

    #[test]
    fn rejects_more_than_ten_integer_digits() {
        let too_large = Decimal::new(10_000_000_000, 0);
        let largest = Decimal::new(999_999_999_999, 2);

        assert_eq!(round_money(too_large), Err(InputError::AmountTooLarge));
        assert_eq!(round_money(largest), Ok(largest));
    }

    #[test]
    fn tiny_negative_rounds_to_plain_zero() {
        let rounded = round_money(Decimal::new(-1, 3)).unwrap();

        assert!(rounded.is_zero());
        assert!(!rounded.is_sign_negative());
    }
}
