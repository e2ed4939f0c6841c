//! Coupon
//!
//! The rules a single coupon carries, and the checks made against them.

use jiff::civil::DateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    discount::Discount,
    eligibility::{Ineligible, OrderDetails, Usage},
    limits::RedemptionLimits,
    restrictions::{OrderType, OrderTypes},
    validity::Validity,
};

/// A coupon's rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// Code customers enter, matched case-sensitively.
    pub code: String,

    /// Discount granted.
    pub discount: Discount,

    /// When the coupon can be used.
    #[serde(default)]
    pub validity: Validity,

    /// Minimum order total, `None` meaning no minimum.
    #[serde(default)]
    pub min_total: Option<Decimal>,

    /// Redemption caps.
    #[serde(default)]
    pub limits: RedemptionLimits,

    /// Order types the coupon is limited to.
    #[serde(default)]
    pub order_types: OrderTypes,

    /// Applied without the customer entering the code.
    #[serde(default)]
    pub auto_apply: bool,

    /// Switched on.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

const fn enabled_by_default() -> bool {
    true
}

impl Coupon {
    /// Create an enabled, unrestricted, forever-valid coupon.
    #[must_use]
    pub fn new(code: impl Into<String>, discount: Discount) -> Self {
        Self {
            code: code.into(),
            discount,
            validity: Validity::Forever,
            min_total: None,
            limits: RedemptionLimits::unlimited(),
            order_types: OrderTypes::unrestricted(),
            auto_apply: false,
            enabled: true,
        }
    }

    /// Whether the coupon is expired at `at`, or now when `at` is `None`.
    #[must_use]
    pub fn is_expired(&self, at: Option<DateTime>) -> bool {
        match at {
            Some(at) => self.validity.is_expired_at(at),
            None => self.validity.is_expired_now(),
        }
    }

    /// Whether the coupon is limited to order types that exclude `order_type`.
    #[must_use]
    pub const fn has_restriction(&self, order_type: OrderType) -> bool {
        self.order_types.excludes(order_type)
    }

    /// Whether `redemptions` enabled redemptions have used up the total cap.
    #[must_use]
    pub fn has_reached_max_redemption(&self, redemptions: u64) -> bool {
        self.limits.total_reached(redemptions)
    }

    /// Whether a customer with `redemptions` enabled redemptions is past the per-customer cap.
    #[must_use]
    pub fn customer_has_max_redemption(&self, redemptions: u64) -> bool {
        self.limits.customer_exceeded(redemptions)
    }

    /// Minimum order total, zero when unset.
    #[must_use]
    pub fn minimum_order_total(&self) -> Decimal {
        self.min_total.unwrap_or(Decimal::ZERO)
    }

    /// Discount rendered for listings, see [`Discount::formatted`].
    #[must_use]
    pub fn formatted_discount(&self) -> String {
        self.discount.formatted()
    }

    /// Discount rendered as a line-item adjustment, see [`Discount::with_operand`].
    #[must_use]
    pub fn discount_with_operand(&self) -> String {
        self.discount.with_operand()
    }

    /// Check every rule against an order.
    ///
    /// # Errors
    ///
    /// Returns the first [`Ineligible`] reason found, in declaration order.
    pub fn check(&self, order: &OrderDetails, usage: &Usage) -> Result<(), Ineligible> {
        if !self.enabled {
            return Err(Ineligible::Disabled);
        }

        if self.is_expired(Some(order.placed_at)) {
            return Err(Ineligible::Expired);
        }

        let minimum = self.minimum_order_total();

        if order.total < minimum {
            return Err(Ineligible::BelowMinimumTotal { minimum });
        }

        if self.has_restriction(order.order_type) {
            return Err(Ineligible::OrderTypeRestricted(order.order_type));
        }

        if usage.location.is_restricted() {
            return Err(Ineligible::LocationRestricted);
        }

        if self.has_reached_max_redemption(usage.redemptions) {
            return Err(Ineligible::MaxRedemptionsReached);
        }

        if usage
            .customer_redemptions
            .is_some_and(|count| self.customer_has_max_redemption(count))
        {
            return Err(Ineligible::CustomerMaxRedemptionsReached);
        }

        Ok(())
    }
}
