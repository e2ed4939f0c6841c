use clap::Args;
use coupons::restrictions::OrderType;
use coupons_app::domain::{
    coupons::{CouponsService, data::Eligibility},
    locations::records::LocationUuid,
    orders::{CustomerUuid, OrderContext, OrderUuid},
};
use jiff::{Zoned, civil::DateTime};
use rust_decimal::Decimal;

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Coupon code
    #[arg(long)]
    code: String,

    /// Order total
    #[arg(long)]
    total: Decimal,

    /// Order type (delivery, collection)
    #[arg(long, default_value = "delivery")]
    order_type: OrderType,

    /// Local date and time of the order; now when omitted
    #[arg(long)]
    at: Option<DateTime>,

    /// Customer placing the order; a guest when omitted
    #[arg(long)]
    customer: Option<CustomerUuid>,

    /// Location the order is placed at
    #[arg(long)]
    location: Option<LocationUuid>,
}

pub(crate) async fn run(args: CheckArgs) -> Result<(), String> {
    let context = crate::cli::connect(&args.database_url).await?;

    let order = OrderContext {
        uuid: OrderUuid::new(),
        customer: args.customer,
        order_type: args.order_type,
        placed_at: args.at.unwrap_or_else(|| Zoned::now().datetime()),
        total: args.total,
        location: args.location,
    };

    let outcome = check(context.coupons.as_ref(), args.code, order).await?;

    println!("{outcome}");

    Ok(())
}

async fn check(
    service: &dyn CouponsService,
    code: String,
    order: OrderContext,
) -> Result<String, String> {
    let coupon = service
        .lookup_coupon(code.clone())
        .await
        .map_err(|error| format!("failed to look up coupon {code}: {error}"))?;

    let eligibility = service
        .check_eligibility(coupon.uuid, order)
        .await
        .map_err(|error| format!("failed to check coupon {code}: {error}"))?;

    Ok(match eligibility {
        Eligibility::Eligible => {
            format!("{code}: eligible ({})", coupon.rules.discount_with_operand())
        }
        Eligibility::Ineligible(reason) => format!("{code}: ineligible, {reason}"),
    })
}

#[cfg(test)]
mod tests {
    use coupons::{coupon::Coupon, discount::Discount, eligibility::Ineligible};
    use coupons_app::domain::coupons::{
        CouponsServiceError, MockCouponsService,
        records::{CouponRecord, CouponUuid},
    };
    use jiff::{Timestamp, civil::datetime};
    use mockall::predicate::eq;
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    fn order() -> OrderContext {
        OrderContext {
            uuid: OrderUuid::new(),
            customer: None,
            order_type: OrderType::Delivery,
            placed_at: datetime(2024, 6, 3, 12, 0, 0, 0),
            total: dec!(20),
            location: None,
        }
    }

    fn service(uuid: CouponUuid, eligibility: Eligibility) -> MockCouponsService {
        let mut service = MockCouponsService::new();

        service
            .expect_lookup_coupon()
            .with(eq("SAVE10".to_string()))
            .times(1)
            .returning(move |code| {
                Ok(CouponRecord {
                    uuid,
                    name: "Save ten".to_string(),
                    description: None,
                    rules: Coupon::new(code, Discount::percentage(dec!(10))),
                    created_at: Timestamp::UNIX_EPOCH,
                    updated_at: Timestamp::UNIX_EPOCH,
                    deleted_at: None,
                })
            });

        service
            .expect_check_eligibility()
            .withf(move |coupon, order| *coupon == uuid && order.total == dec!(20))
            .times(1)
            .returning(move |_, _| Ok(eligibility));

        service
    }

    #[tokio::test]
    async fn eligible_shows_the_adjustment() -> TestResult {
        let uuid = CouponUuid::new();
        let service = service(uuid, Eligibility::Eligible);

        let outcome = check(&service, "SAVE10".to_string(), order()).await?;

        assert_eq!(outcome, "SAVE10: eligible (-10%)");

        Ok(())
    }

    #[tokio::test]
    async fn ineligible_shows_the_reason() -> TestResult {
        let uuid = CouponUuid::new();
        let service = service(
            uuid,
            Eligibility::Ineligible(Ineligible::BelowMinimumTotal { minimum: dec!(25) }),
        );

        let outcome = check(&service, "SAVE10".to_string(), order()).await?;

        assert_eq!(
            outcome,
            "SAVE10: ineligible, order total is below the minimum of 25"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unknown_code_is_an_error() {
        let mut service = MockCouponsService::new();

        service
            .expect_lookup_coupon()
            .times(1)
            .returning(|_| Err(CouponsServiceError::NotFound));

        service.expect_check_eligibility().never();

        let result = check(&service, "NOPE".to_string(), order()).await;

        assert!(
            matches!(&result, Err(message) if message.contains("NOPE")),
            "{result:?}"
        );
    }
}
