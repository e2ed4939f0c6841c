//! Validity
//!
//! The time window in which a coupon can be used.

use std::{fmt, str::FromStr};

use jiff::{
    Zoned,
    civil::{Date, DateTime, Time, Weekday},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a weekday index is outside `0..=6`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("weekday index {0} is out of range, expected 0 (Sunday) to 6 (Saturday)")]
pub struct WeekdayIndexError(pub u8);

/// Returned when a persisted validity mode is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown validity mode: {0}")]
pub struct ParseValidityKindError(pub String);

/// A set of weekdays stored as a bitset, bit 0 being Sunday.
///
/// An empty set is treated as "every day".
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Weekdays(u8);

impl Weekdays {
    const ALL_BITS: u8 = 0b0111_1111;

    /// No weekday selected.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every weekday selected.
    #[must_use]
    pub const fn all() -> Self {
        Self(Self::ALL_BITS)
    }

    /// Build a set from Sunday-zero indexes.
    ///
    /// # Errors
    ///
    /// Returns [`WeekdayIndexError`] if any index is greater than 6.
    pub fn from_indexes<I>(indexes: I) -> Result<Self, WeekdayIndexError>
    where
        I: IntoIterator<Item = u8>,
    {
        indexes.into_iter().try_fold(Self::empty(), |set, index| {
            if index > 6 {
                return Err(WeekdayIndexError(index));
            }

            Ok(Self(set.0 | (1 << index)))
        })
    }

    /// Add a weekday to the set.
    #[must_use]
    pub fn with(self, weekday: Weekday) -> Self {
        Self(self.0 | Self::bit(weekday))
    }

    /// Whether no weekday has been selected.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether the weekday is allowed. An empty set allows every day.
    #[must_use]
    pub fn allows(self, weekday: Weekday) -> bool {
        self.is_empty() || self.0 & Self::bit(weekday) != 0
    }

    /// Sunday-zero indexes of the selected weekdays, in ascending order.
    pub fn indexes(self) -> impl Iterator<Item = u8> {
        (0..7_u8).filter(move |index| self.0 & (1 << index) != 0)
    }

    /// Raw bit representation, as stored.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Rebuild from the stored bit representation, ignoring unknown bits.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL_BITS)
    }

    #[expect(
        clippy::cast_sign_loss,
        reason = "sunday zero offsets are always within 0..=6"
    )]
    fn bit(weekday: Weekday) -> u8 {
        1 << (weekday.to_sunday_zero_offset() as u8)
    }
}

impl fmt::Debug for Weekdays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.indexes()).finish()
    }
}

impl TryFrom<Vec<u8>> for Weekdays {
    type Error = WeekdayIndexError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_indexes(value)
    }
}

impl From<Weekdays> for Vec<u8> {
    fn from(value: Weekdays) -> Self {
        value.indexes().collect()
    }
}

/// Validity mode discriminant, as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidityKind {
    /// Always valid.
    Forever,

    /// Valid within a time window on one date.
    Fixed,

    /// Valid between two dates.
    Period,

    /// Valid on selected weekdays within a daily time window.
    Recurring,
}

impl ValidityKind {
    /// Storage name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forever => "forever",
            Self::Fixed => "fixed",
            Self::Period => "period",
            Self::Recurring => "recurring",
        }
    }
}

impl FromStr for ValidityKind {
    type Err = ParseValidityKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forever" => Ok(Self::Forever),
            "fixed" => Ok(Self::Fixed),
            "period" => Ok(Self::Period),
            "recurring" => Ok(Self::Recurring),
            other => Err(ParseValidityKindError(other.to_string())),
        }
    }
}

impl fmt::Display for ValidityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a coupon may be used. Exactly one mode is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Validity {
    /// Always valid.
    #[default]
    Forever,

    /// Valid on `date` between `from` and `to`, inclusive.
    Fixed {
        /// Calendar date the coupon is valid on.
        date: Date,
        /// Start of the window.
        from: Time,
        /// End of the window.
        to: Time,
    },

    /// Valid on every date from `start` to `end`, inclusive.
    Period {
        /// First valid date.
        start: Date,
        /// Last valid date.
        end: Date,
    },

    /// Valid on `days` between `from` and `to`, inclusive, reapplied every qualifying day.
    Recurring {
        /// Allowed weekdays; empty means every day.
        #[serde(default)]
        days: Weekdays,
        /// Start of the daily window.
        from: Time,
        /// End of the daily window.
        to: Time,
    },
}

impl Validity {
    /// The mode discriminant.
    #[must_use]
    pub const fn kind(&self) -> ValidityKind {
        match self {
            Self::Forever => ValidityKind::Forever,
            Self::Fixed { .. } => ValidityKind::Fixed,
            Self::Period { .. } => ValidityKind::Period,
            Self::Recurring { .. } => ValidityKind::Recurring,
        }
    }

    /// Whether `at` falls outside the window.
    ///
    /// Bounds are inclusive; reversed bounds are swapped rather than producing an empty window.
    #[must_use]
    pub fn is_expired_at(&self, at: DateTime) -> bool {
        match *self {
            Self::Forever => false,
            Self::Fixed { date, from, to } => {
                !between(at, date.to_datetime(from), date.to_datetime(to))
            }
            Self::Period { start, end } => !between(at.date(), start, end),
            Self::Recurring { days, from, to } => {
                if !days.allows(at.weekday()) {
                    return true;
                }

                !between(at.time(), from, to)
            }
        }
    }

    /// Whether the current local date and time falls outside the window.
    #[must_use]
    pub fn is_expired_now(&self) -> bool {
        self.is_expired_at(Zoned::now().datetime())
    }
}

fn between<T: Ord + Copy>(value: T, a: T, b: T) -> bool {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };

    low <= value && value <= high
}
