//! Discounts

use std::{fmt, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a persisted discount kind code is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown discount kind: {0}")]
pub struct ParseDiscountKindError(pub String);

/// How the discount amount is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// The amount is a percentage of the order.
    Percentage,

    /// The amount is a fixed monetary value.
    FixedAmount,
}

impl DiscountKind {
    /// Single letter code used in storage.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Percentage => "P",
            Self::FixedAmount => "F",
        }
    }
}

impl FromStr for DiscountKind {
    type Err = ParseDiscountKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P" => Ok(Self::Percentage),
            "F" => Ok(Self::FixedAmount),
            other => Err(ParseDiscountKindError(other.to_string())),
        }
    }
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percentage => f.write_str("Percentage"),
            Self::FixedAmount => f.write_str("Fixed Amount"),
        }
    }
}

/// A discount granted by a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    /// Percentage or fixed amount.
    pub kind: DiscountKind,

    /// Non-negative discount amount.
    pub amount: Decimal,
}

impl Discount {
    /// Create a percentage discount.
    #[must_use]
    pub const fn percentage(amount: Decimal) -> Self {
        Self {
            kind: DiscountKind::Percentage,
            amount,
        }
    }

    /// Create a fixed amount discount.
    #[must_use]
    pub const fn fixed_amount(amount: Decimal) -> Self {
        Self {
            kind: DiscountKind::FixedAmount,
            amount,
        }
    }

    /// Whether this is a fixed amount discount.
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        matches!(self.kind, DiscountKind::FixedAmount)
    }

    /// Render the discount for listings.
    ///
    /// Percentages are rounded to a whole number and suffixed with `%`, fixed amounts are shown
    /// with two decimal places and `,` separated thousands.
    #[must_use]
    pub fn formatted(&self) -> String {
        match self.kind {
            DiscountKind::Percentage => {
                let rounded = self
                    .amount
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

                format!("{rounded}%")
            }
            DiscountKind::FixedAmount => format_fixed_two_places(self.amount),
        }
    }

    /// Render the discount as a negative line-item adjustment, e.g. `-10%` or `-5.5`.
    #[must_use]
    pub fn with_operand(&self) -> String {
        let amount = self.amount.normalize();

        match self.kind {
            DiscountKind::Percentage => format!("-{amount}%"),
            DiscountKind::FixedAmount => format!("-{amount}"),
        }
    }
}

/// Format with two decimal places and grouped thousands.
fn format_fixed_two_places(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let plain = format!("{rounded:.2}");

    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };

    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    format!("{sign}{}.{fraction}", group_thousands(whole))
}

/// Insert `,` between every group of three digits, counting from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.chars().count();
    let mut grouped = String::with_capacity(len + len / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i).is_multiple_of(3) {
            grouped.push(',');
        }

        grouped.push(c);
    }

    grouped
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn percentage_rounds_to_whole_number() {
        assert_eq!(Discount::percentage(dec!(10)).formatted(), "10%");
        assert_eq!(Discount::percentage(dec!(12.5)).formatted(), "13%");
        assert_eq!(Discount::percentage(dec!(12.49)).formatted(), "12%");
    }

    #[test]
    fn fixed_amount_has_two_places_and_grouping() {
        assert_eq!(Discount::fixed_amount(dec!(5)).formatted(), "5.00");
        assert_eq!(Discount::fixed_amount(dec!(5.255)).formatted(), "5.26");
        assert_eq!(Discount::fixed_amount(dec!(1234567.5)).formatted(), "1,234,567.50");
        assert_eq!(Discount::fixed_amount(dec!(999.999)).formatted(), "1,000.00");
        assert_eq!(Discount::fixed_amount(dec!(100000)).formatted(), "100,000.00");
        assert_eq!(Discount::fixed_amount(dec!(-1234.5)).formatted(), "-1,234.50");
    }

    #[test]
    fn with_operand_is_negative() {
        assert_eq!(Discount::percentage(dec!(10.00)).with_operand(), "-10%");
        assert_eq!(Discount::fixed_amount(dec!(5.50)).with_operand(), "-5.5");
    }

    #[test]
    fn kind_codes_round_trip_through_storage() -> TestResult {
        assert_eq!("P".parse::<DiscountKind>()?, DiscountKind::Percentage);
        assert_eq!("F".parse::<DiscountKind>()?, DiscountKind::FixedAmount);
        assert_eq!(
            "X".parse::<DiscountKind>(),
            Err(ParseDiscountKindError("X".to_string()))
        );

        Ok(())
    }
}
