//! Orders
//!
//! Orders and customers are owned elsewhere; coupons only hold references to them.

use coupons::{eligibility::OrderDetails, restrictions::OrderType};
use jiff::civil::DateTime;
use rust_decimal::Decimal;

use crate::{domain::locations::records::LocationUuid, uuids::TypedUuid};

/// Order reference.
#[derive(Debug)]
pub struct Order;

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Customer reference.
#[derive(Debug)]
pub struct Customer;

/// Customer UUID
pub type CustomerUuid = TypedUuid<Customer>;

/// The order a coupon is applied to.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderContext {
    pub uuid: OrderUuid,

    /// `None` for guest checkouts.
    pub customer: Option<CustomerUuid>,

    pub order_type: OrderType,

    /// Local date and time the order is for.
    pub placed_at: DateTime,

    pub total: Decimal,

    pub location: Option<LocationUuid>,
}

impl OrderContext {
    /// The parts of the order the coupon rules look at.
    #[must_use]
    pub fn details(&self) -> OrderDetails {
        OrderDetails {
            placed_at: self.placed_at,
            order_type: self.order_type,
            total: self.total,
        }
    }
}
