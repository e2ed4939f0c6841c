use std::{fs, path::PathBuf};

use clap::Args;
use coupons::coupon::Coupon;
use coupons_app::domain::coupons::{
    CouponsService, data::NewCoupon, records::CouponRecord,
};
use rustc_hash::FxHashSet;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct ImportArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// YAML file holding a list of coupon definitions
    #[arg(long)]
    file: PathBuf,
}

/// A coupon as written in an import file.
///
/// ```yaml
/// - name: Lunch deal
///   code: LUNCH10
///   discount: { kind: percentage, amount: 10 }
///   validity: { mode: recurring, days: [1, 2, 3, 4, 5], from: "11:00:00", to: "14:00:00" }
///   locations: [0190a1b2-0000-7000-8000-000000000001]
/// ```
#[derive(Debug, Deserialize)]
struct CouponDefinition {
    #[serde(default)]
    uuid: Option<Uuid>,

    name: String,

    #[serde(default)]
    description: Option<String>,

    #[serde(flatten)]
    rules: Coupon,

    #[serde(default)]
    categories: Vec<Uuid>,

    #[serde(default)]
    menus: Vec<Uuid>,

    #[serde(default)]
    locations: Vec<Uuid>,
}

pub(crate) async fn run(args: ImportArgs) -> Result<(), String> {
    let source = fs::read_to_string(&args.file)
        .map_err(|error| format!("failed to read {}: {error}", args.file.display()))?;

    let definitions = parse_definitions(&source)?;

    let context = crate::cli::connect(&args.database_url).await?;

    for definition in definitions {
        let coupon = import(context.coupons.as_ref(), definition).await?;

        println!("imported {} ({})", coupon.rules.code, coupon.uuid);
    }

    Ok(())
}

fn parse_definitions(source: &str) -> Result<Vec<CouponDefinition>, String> {
    let definitions: Vec<CouponDefinition> = serde_norway::from_str(source)
        .map_err(|error| format!("failed to parse coupon definitions: {error}"))?;

    let mut codes = FxHashSet::default();

    for definition in &definitions {
        if !codes.insert(definition.rules.code.as_str()) {
            return Err(format!(
                "coupon code {} is defined more than once",
                definition.rules.code
            ));
        }
    }

    Ok(definitions)
}

async fn import(
    service: &dyn CouponsService,
    definition: CouponDefinition,
) -> Result<CouponRecord, String> {
    let code = definition.rules.code.clone();

    let coupon = service
        .create_coupon(NewCoupon {
            uuid: definition.uuid.map_or_else(Default::default, Into::into),
            name: definition.name,
            description: definition.description,
            rules: definition.rules,
        })
        .await
        .map_err(|error| format!("failed to create coupon {code}: {error}"))?;

    if !definition.categories.is_empty() {
        service
            .sync_categories(
                coupon.uuid,
                definition.categories.into_iter().map(Into::into).collect(),
            )
            .await
            .map_err(|error| format!("failed to attach categories to {code}: {error}"))?;
    }

    if !definition.menus.is_empty() {
        service
            .sync_menus(
                coupon.uuid,
                definition.menus.into_iter().map(Into::into).collect(),
            )
            .await
            .map_err(|error| format!("failed to attach menus to {code}: {error}"))?;
    }

    if !definition.locations.is_empty() {
        service
            .sync_locations(
                coupon.uuid,
                definition.locations.into_iter().map(Into::into).collect(),
            )
            .await
            .map_err(|error| format!("failed to attach locations to {code}: {error}"))?;
    }

    Ok(coupon)
}

#[cfg(test)]
mod tests {
    use coupons::{
        discount::Discount,
        limits::RedemptionLimits,
        restrictions::{OrderType, OrderTypes},
        validity::{Validity, Weekdays},
    };
    use coupons_app::domain::{
        coupons::{CouponsServiceError, MockCouponsService},
        locations::records::LocationUuid,
    };
    use jiff::{Timestamp, civil::time};
    use mockall::predicate::{always, eq};
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    const DEFINITIONS: &str = r#"
- name: Lunch deal
  code: LUNCH10
  description: Weekday lunches
  discount:
    kind: percentage
    amount: 10
  validity:
    mode: recurring
    days: [1, 2, 3, 4, 5]
    from: "11:00:00"
    to: "14:00:00"
  min_total: 15
  limits:
    total: 100
    per_customer: 2
  order_types: [collection]
  locations: [0190a1b2-0000-7000-8000-000000000001]

- uuid: 0190a1b2-0000-7000-8000-0000000000ff
  name: Fiver
  code: FIVER
  discount: { kind: fixed_amount, amount: "5.00" }
  enabled: false
"#;

    fn record(coupon: NewCoupon) -> CouponRecord {
        CouponRecord {
            uuid: coupon.uuid,
            name: coupon.name,
            description: coupon.description,
            rules: coupon.rules,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
            deleted_at: None,
        }
    }

    #[test]
    fn definitions_parse_with_defaults() -> TestResult {
        let definitions = parse_definitions(DEFINITIONS)?;

        assert_eq!(definitions.len(), 2);

        let lunch = &definitions[0];

        assert_eq!(lunch.uuid, None);
        assert_eq!(lunch.description.as_deref(), Some("Weekday lunches"));
        assert_eq!(
            lunch.rules,
            Coupon {
                validity: Validity::Recurring {
                    days: Weekdays::from_indexes([1, 2, 3, 4, 5])?,
                    from: time(11, 0, 0, 0),
                    to: time(14, 0, 0, 0),
                },
                min_total: Some(dec!(15)),
                limits: RedemptionLimits {
                    total: Some(100),
                    per_customer: Some(2),
                },
                order_types: OrderTypes::only(OrderType::Collection),
                ..Coupon::new("LUNCH10", Discount::percentage(dec!(10)))
            }
        );
        assert_eq!(lunch.locations.len(), 1);

        let fiver = &definitions[1];

        assert_eq!(
            fiver.uuid,
            Some(Uuid::parse_str("0190a1b2-0000-7000-8000-0000000000ff")?)
        );
        assert_eq!(fiver.rules.discount, Discount::fixed_amount(dec!(5.00)));
        assert_eq!(fiver.rules.validity, Validity::Forever);
        assert!(!fiver.rules.enabled);
        assert!(fiver.categories.is_empty());

        Ok(())
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let source = r"
- { name: One, code: SAME, discount: { kind: percentage, amount: 5 } }
- { name: Two, code: SAME, discount: { kind: percentage, amount: 10 } }
";

        let result = parse_definitions(source);

        assert!(
            matches!(&result, Err(message) if message.contains("SAME")),
            "{result:?}"
        );
    }

    #[test]
    fn malformed_yaml_is_reported() {
        let result = parse_definitions("- name: Missing code\n");

        assert!(
            matches!(&result, Err(message) if message.starts_with("failed to parse")),
            "{result:?}"
        );
    }

    #[tokio::test]
    async fn import_creates_coupon_then_syncs_non_empty_scopes() -> TestResult {
        let mut definitions = parse_definitions(DEFINITIONS)?;
        let lunch = definitions.remove(0);
        let location = LocationUuid::from(lunch.locations[0]);

        let mut service = MockCouponsService::new();

        service
            .expect_create_coupon()
            .times(1)
            .returning(|coupon| Ok(record(coupon)));

        service.expect_sync_categories().never();
        service.expect_sync_menus().never();

        service
            .expect_sync_locations()
            .with(always(), eq(vec![location]))
            .times(1)
            .returning(|_, _| Ok(()));

        let coupon = import(&service, lunch).await?;

        assert_eq!(coupon.rules.code, "LUNCH10");
        assert_eq!(coupon.name, "Lunch deal");

        Ok(())
    }

    #[tokio::test]
    async fn import_keeps_the_given_uuid() -> TestResult {
        let mut definitions = parse_definitions(DEFINITIONS)?;
        let fiver = definitions.remove(1);
        let expected = fiver.uuid;

        let mut service = MockCouponsService::new();

        service
            .expect_create_coupon()
            .times(1)
            .returning(|coupon| Ok(record(coupon)));

        let coupon = import(&service, fiver).await?;

        assert_eq!(Some(coupon.uuid.into_uuid()), expected);

        Ok(())
    }

    #[tokio::test]
    async fn create_failure_names_the_code() -> TestResult {
        let mut definitions = parse_definitions(DEFINITIONS)?;
        let fiver = definitions.remove(1);

        let mut service = MockCouponsService::new();

        service
            .expect_create_coupon()
            .times(1)
            .returning(|_| Err(CouponsServiceError::AlreadyExists));

        let result = import(&service, fiver).await;

        assert!(
            matches!(&result, Err(message) if message.contains("FIVER")),
            "{result:?}"
        );

        Ok(())
    }
}
