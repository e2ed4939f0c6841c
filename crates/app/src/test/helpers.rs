//! Test Helpers

use coupons::{coupon::Coupon, discount::Discount, restrictions::OrderType};
use jiff::civil::datetime;
use rust_decimal_macros::dec;

use crate::{
    domain::{
        coupons::{
            CouponsService, CouponsServiceError,
            data::NewCoupon,
            records::{CouponRecord, CouponUuid},
        },
        orders::{CustomerUuid, OrderContext, OrderUuid},
        redemptions::data::DiscountApplication,
    },
    test::TestContext,
};

/// Ten percent off, otherwise unrestricted.
pub(crate) fn rules(code: &str) -> Coupon {
    Coupon::new(code, Discount::percentage(dec!(10)))
}

pub(crate) async fn create_coupon(
    ctx: &TestContext,
    rules: Coupon,
) -> Result<CouponRecord, CouponsServiceError> {
    ctx.coupons
        .create_coupon(NewCoupon {
            uuid: CouponUuid::new(),
            name: format!("{} coupon", rules.code),
            description: None,
            rules,
        })
        .await
}

/// A guest delivery order on Monday 2024-06-03 at noon.
pub(crate) fn guest_order() -> OrderContext {
    OrderContext {
        uuid: OrderUuid::new(),
        customer: None,
        order_type: OrderType::Delivery,
        placed_at: datetime(2024, 6, 3, 12, 0, 0, 0),
        total: dec!(25),
        location: None,
    }
}

pub(crate) fn customer_order(customer: CustomerUuid) -> OrderContext {
    OrderContext {
        customer: Some(customer),
        ..guest_order()
    }
}

pub(crate) fn application(coupon: &CouponRecord) -> DiscountApplication {
    DiscountApplication {
        coupon: coupon.uuid,
        amount: dec!(2.50),
    }
}
