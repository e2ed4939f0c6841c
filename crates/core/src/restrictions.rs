//! Order Type Restrictions

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when an order type name is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order type: {0}")]
pub struct ParseOrderTypeError(pub String);

/// How an order is fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Delivered to the customer.
    Delivery,

    /// Collected by the customer.
    Collection,
}

impl OrderType {
    /// Every known order type.
    pub const ALL: [Self; 2] = [Self::Delivery, Self::Collection];

    /// Storage name of the order type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delivery => "delivery",
            Self::Collection => "collection",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Delivery => 0b01,
            Self::Collection => 0b10,
        }
    }
}

impl FromStr for OrderType {
    type Err = ParseOrderTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delivery" => Ok(Self::Delivery),
            "collection" => Ok(Self::Collection),
            other => Err(ParseOrderTypeError(other.to_string())),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The order types a coupon is limited to. Empty means unrestricted.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<OrderType>", into = "Vec<OrderType>")]
pub struct OrderTypes(u8);

impl OrderTypes {
    /// No restriction.
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self(0)
    }

    /// Limit to a single order type.
    #[must_use]
    pub const fn only(order_type: OrderType) -> Self {
        Self(order_type.bit())
    }

    /// Add an order type to the set.
    #[must_use]
    pub const fn with(self, order_type: OrderType) -> Self {
        Self(self.0 | order_type.bit())
    }

    /// Whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether the order type is a member of the set.
    #[must_use]
    pub const fn contains(self, order_type: OrderType) -> bool {
        self.0 & order_type.bit() != 0
    }

    /// Whether an order of this type is excluded by the set.
    #[must_use]
    pub const fn excludes(self, order_type: OrderType) -> bool {
        !self.is_empty() && !self.contains(order_type)
    }

    /// Members of the set.
    pub fn iter(self) -> impl Iterator<Item = OrderType> {
        OrderType::ALL
            .into_iter()
            .filter(move |order_type| self.contains(*order_type))
    }
}

impl fmt::Debug for OrderTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<OrderType> for OrderTypes {
    fn from_iter<I: IntoIterator<Item = OrderType>>(iter: I) -> Self {
        iter.into_iter().fold(Self::unrestricted(), Self::with)
    }
}

impl From<Vec<OrderType>> for OrderTypes {
    fn from(value: Vec<OrderType>) -> Self {
        value.into_iter().collect()
    }
}

impl From<OrderTypes> for Vec<OrderType> {
    fn from(value: OrderTypes) -> Self {
        value.iter().collect()
    }
}
