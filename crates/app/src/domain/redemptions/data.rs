//! Redemptions Data

use coupons::sorting::{SortDirection, SortField};
use rust_decimal::Decimal;

use crate::domain::{
    coupons::records::{CouponRecord, CouponUuid},
    listing::{PageRequest, SortColumn},
    orders::{CustomerUuid, OrderContext, OrderUuid},
    redemptions::records::RedemptionUuid,
};

/// A coupon applied to an order, with the discount it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountApplication {
    pub coupon: CouponUuid,
    pub amount: Decimal,
}

/// A history entry that has been built but not yet saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRedemption {
    pub uuid: RedemptionUuid,
    pub coupon: CouponUuid,
    pub order: OrderUuid,
    pub customer: Option<CustomerUuid>,
    pub code: String,
    pub amount: Decimal,
    pub min_total: Decimal,
}

impl PendingRedemption {
    pub(crate) fn new(
        coupon: &CouponRecord,
        application: &DiscountApplication,
        order: &OrderContext,
    ) -> Self {
        Self {
            uuid: RedemptionUuid::new(),
            coupon: coupon.uuid,
            order: order.uuid,
            customer: order.customer,
            code: coupon.rules.code.clone(),
            amount: application.amount,
            min_total: coupon.rules.minimum_order_total(),
        }
    }
}

/// Filters for the customer-facing history listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryListOptions {
    pub page: PageRequest,
    pub customer: Option<CustomerUuid>,
    pub order: Option<OrderUuid>,

    /// Sort keys; unknown keys are ignored.
    pub sort: Vec<String>,
}

impl Default for HistoryListOptions {
    fn default() -> Self {
        Self {
            page: PageRequest::default(),
            customer: None,
            order: None,
            sort: vec!["date_used desc".to_string()],
        }
    }
}

/// Fields history listings can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionSortField {
    DateUsed,
}

impl SortField for RedemptionSortField {
    const ALLOWED: &'static [(&'static str, Self, SortDirection)] = &[
        ("date_used desc", Self::DateUsed, SortDirection::Desc),
        ("date_used asc", Self::DateUsed, SortDirection::Asc),
    ];
}

impl SortColumn for RedemptionSortField {
    fn column(self) -> &'static str {
        match self {
            Self::DateUsed => "used_at",
        }
    }
}
