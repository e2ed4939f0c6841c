use std::fmt::{self, Write as _};

use clap::Args;
use coupons::{limits::RedemptionLimits, validity::Validity};
use coupons_app::{
    context::AppContext,
    domain::coupons::records::{CouponRecord, CouponUuid},
};

#[derive(Debug, Args)]
pub(crate) struct ShowArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Code of an enabled coupon
    #[arg(long, required_unless_present = "uuid", conflicts_with = "uuid")]
    code: Option<String>,

    /// Coupon UUID, enabled or not
    #[arg(long)]
    uuid: Option<CouponUuid>,
}

pub(crate) async fn run(args: ShowArgs) -> Result<(), String> {
    let context = crate::cli::connect(&args.database_url).await?;

    let coupon = find(&context, args.code, args.uuid).await?;

    let redemptions = context
        .redemptions
        .count_redemptions(coupon.uuid)
        .await
        .map_err(|error| format!("failed to count redemptions: {error}"))?;

    let locations = context
        .coupons
        .list_locations(coupon.uuid)
        .await
        .map_err(|error| format!("failed to list locations: {error}"))?;

    let rendered = render(&coupon, redemptions)
        .map_err(|error| format!("failed to render coupon: {error}"))?;

    print!("{rendered}");

    if locations.is_empty() {
        println!("locations: any");
    } else {
        for location in locations {
            println!("location: {location}");
        }
    }

    Ok(())
}

async fn find(
    context: &AppContext,
    code: Option<String>,
    uuid: Option<CouponUuid>,
) -> Result<CouponRecord, String> {
    match (code, uuid) {
        (_, Some(uuid)) => context
            .coupons
            .get_coupon(uuid)
            .await
            .map_err(|error| format!("failed to get coupon {uuid}: {error}")),
        (Some(code), None) => context
            .coupons
            .lookup_coupon(code.clone())
            .await
            .map_err(|error| format!("failed to look up coupon {code}: {error}")),
        (None, None) => Err("either --code or --uuid is required".to_string()),
    }
}

fn render(coupon: &CouponRecord, redemptions: u64) -> Result<String, fmt::Error> {
    let rules = &coupon.rules;
    let mut out = String::new();

    writeln!(out, "coupon_uuid: {}", coupon.uuid)?;
    writeln!(out, "name: {}", coupon.name)?;
    writeln!(out, "code: {}", rules.code)?;

    if let Some(description) = &coupon.description {
        writeln!(out, "description: {description}")?;
    }

    writeln!(
        out,
        "discount: {} ({})",
        rules.formatted_discount(),
        rules.discount.kind
    )?;
    writeln!(out, "adjustment: {}", rules.discount_with_operand())?;
    writeln!(out, "validity: {}", describe_validity(&rules.validity))?;
    writeln!(out, "minimum_total: {}", rules.minimum_order_total())?;

    let order_types = rules
        .order_types
        .iter()
        .map(|order_type| order_type.as_str())
        .collect::<Vec<_>>();

    writeln!(
        out,
        "order_types: {}",
        if order_types.is_empty() {
            "any".to_string()
        } else {
            order_types.join(", ")
        }
    )?;
    writeln!(
        out,
        "redemptions: {}",
        describe_usage(rules.limits, redemptions)
    )?;
    writeln!(out, "auto_apply: {}", rules.auto_apply)?;
    writeln!(out, "enabled: {}", rules.enabled)?;

    Ok(out)
}

fn describe_validity(validity: &Validity) -> String {
    match validity {
        Validity::Forever => "forever".to_string(),
        Validity::Fixed { date, from, to } => format!("fixed {date} {from} to {to}"),
        Validity::Period { start, end } => format!("period {start} to {end}"),
        Validity::Recurring { days, from, to } => {
            let days = if days.is_empty() {
                "every day".to_string()
            } else {
                days.indexes()
                    .map(|index| index.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            };

            format!("recurring on {days} {from} to {to}")
        }
    }
}

fn describe_usage(limits: RedemptionLimits, redemptions: u64) -> String {
    let total = limits
        .total
        .filter(|cap| *cap > 0)
        .map_or_else(|| "unlimited".to_string(), |cap| cap.to_string());

    let per_customer = limits
        .per_customer
        .filter(|cap| *cap > 0)
        .map_or_else(|| "unlimited".to_string(), |cap| cap.to_string());

    format!("{redemptions} of {total} ({per_customer} per customer)")
}

#[cfg(test)]
mod tests {
    use coupons::{
        coupon::Coupon,
        discount::Discount,
        restrictions::{OrderType, OrderTypes},
        validity::Weekdays,
    };
    use jiff::{
        Timestamp,
        civil::{date, time},
    };
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    fn record(rules: Coupon) -> CouponRecord {
        CouponRecord {
            uuid: CouponUuid::new(),
            name: "Big order".to_string(),
            description: None,
            rules,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
            deleted_at: None,
        }
    }

    #[test]
    fn render_lists_rules_and_usage() -> TestResult {
        let coupon = record(Coupon {
            min_total: Some(dec!(50)),
            limits: RedemptionLimits::with_total(10),
            order_types: OrderTypes::only(OrderType::Delivery),
            ..Coupon::new("BIG", Discount::fixed_amount(dec!(1250)))
        });

        let rendered = render(&coupon, 3)?;

        assert!(rendered.contains("code: BIG\n"), "{rendered}");
        assert!(
            rendered.contains("discount: 1,250.00 (Fixed Amount)\n"),
            "{rendered}"
        );
        assert!(rendered.contains("adjustment: -1250\n"), "{rendered}");
        assert!(rendered.contains("minimum_total: 50\n"), "{rendered}");
        assert!(rendered.contains("order_types: delivery\n"), "{rendered}");
        assert!(
            rendered.contains("redemptions: 3 of 10 (unlimited per customer)\n"),
            "{rendered}"
        );
        assert!(!rendered.contains("description:"), "{rendered}");

        Ok(())
    }

    #[test]
    fn render_includes_the_description_when_set() -> TestResult {
        let coupon = CouponRecord {
            description: Some("Weekday lunches".to_string()),
            ..record(Coupon::new("LUNCH", Discount::percentage(dec!(12.5))))
        };

        let rendered = render(&coupon, 0)?;

        assert!(
            rendered.contains("description: Weekday lunches\n"),
            "{rendered}"
        );
        assert!(rendered.contains("discount: 13% (Percentage)\n"), "{rendered}");
        assert!(rendered.contains("adjustment: -12.5%\n"), "{rendered}");
        assert!(
            rendered.contains("redemptions: 0 of unlimited (unlimited per customer)\n"),
            "{rendered}"
        );
        assert!(rendered.ends_with("enabled: true\n"), "{rendered}");

        Ok(())
    }

    #[test]
    fn validity_descriptions() -> TestResult {
        assert_eq!(describe_validity(&Validity::Forever), "forever");
        assert_eq!(
            describe_validity(&Validity::Period {
                start: date(2024, 6, 1),
                end: date(2024, 6, 30),
            }),
            "period 2024-06-01 to 2024-06-30"
        );
        assert_eq!(
            describe_validity(&Validity::Recurring {
                days: Weekdays::from_indexes([1, 5])?,
                from: time(11, 0, 0, 0),
                to: time(14, 0, 0, 0),
            }),
            "recurring on 1,5 11:00:00 to 14:00:00"
        );

        Ok(())
    }

    #[test]
    fn zero_caps_read_as_unlimited() {
        let limits = RedemptionLimits {
            total: Some(0),
            per_customer: Some(2),
        };

        assert_eq!(
            describe_usage(limits, 7),
            "7 of unlimited (2 per customer)"
        );
    }
}
