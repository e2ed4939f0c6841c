//! Redemption Records

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{
    domain::{
        coupons::records::CouponUuid,
        orders::{CustomerUuid, OrderUuid},
    },
    uuids::TypedUuid,
};

/// Redemption UUID
pub type RedemptionUuid = TypedUuid<RedemptionRecord>;

/// Redemption Record
#[derive(Debug, Clone, PartialEq)]
pub struct RedemptionRecord {
    pub uuid: RedemptionUuid,
    pub coupon_uuid: CouponUuid,
    pub order_uuid: OrderUuid,

    /// `None` for guest orders.
    pub customer_uuid: Option<CustomerUuid>,

    /// Coupon code at the time of use.
    pub code: String,

    /// Discount actually applied to the order.
    pub amount: Decimal,

    /// Coupon minimum total at the time of use.
    pub min_total: Decimal,

    pub enabled: bool,
    pub used_at: Timestamp,
}
