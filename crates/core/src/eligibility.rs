//! Eligibility

use std::fmt;

use jiff::civil::DateTime;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::restrictions::OrderType;

/// The reason a coupon cannot be applied to an order.
///
/// Variants are listed in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Ineligible {
    /// The coupon has been switched off.
    #[error("coupon is disabled")]
    Disabled,

    /// The order falls outside the coupon's validity window.
    #[error("coupon has expired")]
    Expired,

    /// The order total is below the coupon's minimum.
    #[error("order total is below the minimum of {minimum}")]
    BelowMinimumTotal {
        /// The coupon's minimum order total.
        minimum: Decimal,
    },

    /// The coupon does not apply to this kind of order.
    #[error("coupon is not valid for {0} orders")]
    OrderTypeRestricted(OrderType),

    /// The coupon is not valid at the order's location.
    #[error("coupon is not valid at this location")]
    LocationRestricted,

    /// The coupon has been redeemed the maximum number of times.
    #[error("coupon has reached its maximum redemptions")]
    MaxRedemptionsReached,

    /// The customer has redeemed the coupon the maximum number of times.
    #[error("customer has reached the coupon's maximum redemptions")]
    CustomerMaxRedemptionsReached,
}

/// The order a coupon is being applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderDetails {
    /// Local date and time the order is for.
    pub placed_at: DateTime,

    /// How the order is fulfilled.
    pub order_type: OrderType,

    /// Order total the minimum is compared against.
    pub total: Decimal,
}

/// How an order's location relates to a coupon's location scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LocationMatch {
    /// The coupon is not scoped to any location.
    #[default]
    Unscoped,

    /// The order's location is in scope.
    Matched,

    /// The order's location is out of scope, or the order has none.
    Unmatched,
}

impl LocationMatch {
    /// Compare an order's location against a coupon's scoped locations.
    pub fn of<L: PartialEq>(locations: &[L], location: Option<&L>) -> Self {
        if locations.is_empty() {
            return Self::Unscoped;
        }

        match location {
            Some(location) if locations.contains(location) => Self::Matched,
            _ => Self::Unmatched,
        }
    }

    /// Whether the coupon is restricted away from the order's location.
    #[must_use]
    pub const fn is_restricted(self) -> bool {
        matches!(self, Self::Unmatched)
    }
}

impl fmt::Display for LocationMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unscoped => f.write_str("unscoped"),
            Self::Matched => f.write_str("matched"),
            Self::Unmatched => f.write_str("unmatched"),
        }
    }
}

/// Whether `location` is outside a non-empty set of scoped `locations`.
pub fn is_outside_locations<L: PartialEq>(locations: &[L], location: &L) -> bool {
    LocationMatch::of(locations, Some(location)).is_restricted()
}

/// Redemption counts and location scope read from collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    /// Enabled redemptions of the coupon.
    pub redemptions: u64,

    /// Enabled redemptions of the coupon by the ordering customer, if the order has one.
    pub customer_redemptions: Option<u64>,

    /// Location scope outcome for the order.
    pub location: LocationMatch,
}
