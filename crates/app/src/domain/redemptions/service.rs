//! Redemptions Service

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use coupons::eligibility::{LocationMatch, Usage};
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::{
        coupons::{
            records::{CouponRecord, CouponUuid},
            repositories::coupons::PgCouponsRepository,
        },
        listing::Page,
        locations::PgLocationsRepository,
        orders::{CustomerUuid, OrderContext},
        redemptions::{
            RedemptionsServiceError,
            data::{DiscountApplication, HistoryListOptions, PendingRedemption},
            errors::coupon_reference,
            hooks::{HookDecision, RedemptionHook},
            records::{RedemptionRecord, RedemptionUuid},
            repository::PgRedemptionsRepository,
        },
    },
};

#[derive(Clone)]
pub struct PgRedemptionsService {
    db: Db,
    coupons: PgCouponsRepository,
    locations: PgLocationsRepository,
    redemptions: PgRedemptionsRepository,
    hooks: Vec<Arc<dyn RedemptionHook>>,
}

impl PgRedemptionsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            coupons: PgCouponsRepository::new(),
            locations: PgLocationsRepository::new(),
            redemptions: PgRedemptionsRepository::new(),
            hooks: Vec::new(),
        }
    }

    /// Register a hook to run before each history entry is written.
    #[must_use]
    pub fn with_hook(mut self, hook: impl RedemptionHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    fn run_hooks(
        &self,
        pending: &PendingRedemption,
        coupon: &CouponRecord,
        order: &OrderContext,
    ) -> Result<(), RedemptionsServiceError> {
        for (hook_index, hook) in self.hooks.iter().enumerate() {
            if hook.before_add_history(pending, coupon, order) == HookDecision::Deny {
                info!(hook_index, "redemption vetoed by hook");

                return Err(RedemptionsServiceError::Vetoed);
            }
        }

        Ok(())
    }

    /// Build the entry, let the hooks see it, then write it.
    async fn write_history(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: &CouponRecord,
        application: &DiscountApplication,
        order: &OrderContext,
    ) -> Result<RedemptionRecord, RedemptionsServiceError> {
        let pending = PendingRedemption::new(coupon, application, order);

        self.run_hooks(&pending, coupon, order)?;

        let record = self.redemptions.create_redemption(tx, &pending).await?;

        Ok(record)
    }
}

impl fmt::Debug for PgRedemptionsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgRedemptionsService")
            .field("db", &self.db)
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RedemptionsService for PgRedemptionsService {
    #[tracing::instrument(
        name = "redemptions.service.create_history",
        skip(self, application, order),
        fields(
            coupon_uuid = %application.coupon,
            order_uuid = %order.uuid,
            redemption_uuid = tracing::field::Empty
        ),
        err
    )]
    async fn create_history(
        &self,
        application: DiscountApplication,
        order: OrderContext,
    ) -> Result<RedemptionRecord, RedemptionsServiceError> {
        let mut tx = self.db.begin().await?;

        let coupon = self
            .coupons
            .lock_coupon(&mut tx, application.coupon)
            .await
            .map_err(coupon_reference)?;

        let record = self
            .write_history(&mut tx, &coupon, &application, &order)
            .await?;

        tx.commit().await?;

        Span::current().record("redemption_uuid", tracing::field::display(record.uuid));

        info!(code = %record.code, amount = %record.amount, "recorded coupon history");

        Ok(record)
    }

    #[tracing::instrument(
        name = "redemptions.service.redeem",
        skip(self, application, order),
        fields(
            coupon_uuid = %application.coupon,
            order_uuid = %order.uuid,
            redemptions = tracing::field::Empty,
            customer_redemptions = tracing::field::Empty,
            redemption_uuid = tracing::field::Empty
        ),
        err
    )]
    async fn redeem(
        &self,
        application: DiscountApplication,
        order: OrderContext,
    ) -> Result<RedemptionRecord, RedemptionsServiceError> {
        let mut tx = self.db.begin().await?;

        let coupon = self
            .coupons
            .lock_coupon(&mut tx, application.coupon)
            .await
            .map_err(coupon_reference)?;

        let redemptions = self
            .redemptions
            .count_redemptions(&mut tx, coupon.uuid)
            .await?;

        let customer_redemptions = match order.customer {
            Some(customer) => Some(
                self.redemptions
                    .count_customer_redemptions(&mut tx, coupon.uuid, customer)
                    .await?,
            ),
            None => None,
        };

        let locations = self.locations.list_locations(&mut tx, coupon.uuid).await?;

        let span = Span::current();

        span.record("redemptions", redemptions);

        if let Some(count) = customer_redemptions {
            span.record("customer_redemptions", count);
        }

        let usage = Usage {
            redemptions,
            customer_redemptions,
            location: LocationMatch::of(&locations, order.location.as_ref()),
        };

        coupon.rules.check(&order.details(), &usage)?;

        let record = self
            .write_history(&mut tx, &coupon, &application, &order)
            .await?;

        tx.commit().await?;

        span.record("redemption_uuid", tracing::field::display(record.uuid));

        info!(code = %record.code, amount = %record.amount, "redeemed coupon");

        Ok(record)
    }

    async fn get_redemption(
        &self,
        uuid: RedemptionUuid,
    ) -> Result<RedemptionRecord, RedemptionsServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.redemptions.get_redemption(&mut tx, uuid).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn count_redemptions(&self, coupon: CouponUuid) -> Result<u64, RedemptionsServiceError> {
        let mut tx = self.db.begin().await?;

        let count = self.redemptions.count_redemptions(&mut tx, coupon).await?;

        tx.commit().await?;

        Ok(count)
    }

    async fn count_customer_redemptions(
        &self,
        coupon: CouponUuid,
        customer: CustomerUuid,
    ) -> Result<u64, RedemptionsServiceError> {
        let mut tx = self.db.begin().await?;

        let count = self
            .redemptions
            .count_customer_redemptions(&mut tx, coupon, customer)
            .await?;

        tx.commit().await?;

        Ok(count)
    }

    #[tracing::instrument(
        name = "redemptions.service.toggle_status",
        skip(self),
        fields(redemption_uuid = %uuid, enabled = tracing::field::Empty),
        err
    )]
    async fn toggle_status(
        &self,
        uuid: RedemptionUuid,
    ) -> Result<RedemptionRecord, RedemptionsServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.redemptions.toggle_status(&mut tx, uuid).await?;

        tx.commit().await?;

        Span::current().record("enabled", record.enabled);

        info!(enabled = record.enabled, "toggled redemption status");

        Ok(record)
    }

    #[tracing::instrument(
        name = "redemptions.service.set_status",
        skip(self, uuids),
        fields(redemption_count = uuids.len()),
        err
    )]
    async fn set_status(
        &self,
        uuids: Vec<RedemptionUuid>,
        enabled: bool,
    ) -> Result<u64, RedemptionsServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self.redemptions.set_status(&mut tx, &uuids, enabled).await?;

        tx.commit().await?;

        info!(rows_affected, "set redemption status");

        Ok(rows_affected)
    }

    async fn list_history(
        &self,
        options: HistoryListOptions,
    ) -> Result<Page<RedemptionRecord>, RedemptionsServiceError> {
        let mut tx = self.db.begin().await?;

        let (entries, total) = self.redemptions.list_history(&mut tx, &options).await?;

        tx.commit().await?;

        Ok(Page::new(entries, options.page, total))
    }
}

#[automock]
#[async_trait]
pub trait RedemptionsService: Send + Sync {
    /// Records one use of a coupon. Every call writes a new entry.
    async fn create_history(
        &self,
        application: DiscountApplication,
        order: OrderContext,
    ) -> Result<RedemptionRecord, RedemptionsServiceError>;

    /// Checks the coupon against the order and records the use, holding the coupon's row lock
    /// throughout so concurrent redemptions cannot both pass the caps.
    async fn redeem(
        &self,
        application: DiscountApplication,
        order: OrderContext,
    ) -> Result<RedemptionRecord, RedemptionsServiceError>;

    async fn get_redemption(
        &self,
        uuid: RedemptionUuid,
    ) -> Result<RedemptionRecord, RedemptionsServiceError>;

    /// Counts a coupon's enabled entries.
    async fn count_redemptions(&self, coupon: CouponUuid) -> Result<u64, RedemptionsServiceError>;

    /// Counts a customer's enabled entries for a coupon.
    async fn count_customer_redemptions(
        &self,
        coupon: CouponUuid,
        customer: CustomerUuid,
    ) -> Result<u64, RedemptionsServiceError>;

    /// Flips an entry between enabled and voided.
    async fn toggle_status(
        &self,
        uuid: RedemptionUuid,
    ) -> Result<RedemptionRecord, RedemptionsServiceError>;

    /// Sets the status of several entries, returning how many were found.
    async fn set_status(
        &self,
        uuids: Vec<RedemptionUuid>,
        enabled: bool,
    ) -> Result<u64, RedemptionsServiceError>;

    /// Lists enabled entries a page at a time.
    async fn list_history(
        &self,
        options: HistoryListOptions,
    ) -> Result<Page<RedemptionRecord>, RedemptionsServiceError>;
}

#[cfg(test)]
mod tests {
    use coupons::{
        coupon::Coupon,
        eligibility::Ineligible,
        limits::RedemptionLimits,
        validity::Validity,
    };
    use jiff::civil::date;
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use crate::{
        domain::{
            coupons::CouponsService,
            listing::PageRequest,
            orders::OrderUuid,
            redemptions::hooks::MockRedemptionHook,
        },
        test::{
            TestContext,
            helpers::{application, create_coupon, customer_order, guest_order, rules},
        },
    };

    use super::*;

    #[tokio::test]
    async fn create_history_snapshots_the_coupon() -> TestResult {
        let ctx = TestContext::new().await;

        let coupon = create_coupon(
            &ctx,
            Coupon {
                min_total: Some(dec!(15)),
                ..rules("SNAP")
            },
        )
        .await?;

        let customer = CustomerUuid::new();
        let order = customer_order(customer);

        let record = ctx
            .redemptions
            .create_history(application(&coupon), order.clone())
            .await?;

        assert_eq!(record.coupon_uuid, coupon.uuid);
        assert_eq!(record.order_uuid, order.uuid);
        assert_eq!(record.customer_uuid, Some(customer));
        assert_eq!(record.code, "SNAP");
        assert_eq!(record.amount, dec!(2.50));
        assert_eq!(record.min_total, dec!(15));
        assert!(record.enabled);

        assert_eq!(ctx.redemptions.get_redemption(record.uuid).await?, record);

        Ok(())
    }

    #[tokio::test]
    async fn guest_history_has_no_customer() -> TestResult {
        let ctx = TestContext::new().await;

        let coupon = create_coupon(&ctx, rules("GUEST")).await?;

        let record = ctx
            .redemptions
            .create_history(application(&coupon), guest_order())
            .await?;

        assert_eq!(record.customer_uuid, None);
        assert_eq!(record.min_total, dec!(0));

        Ok(())
    }

    #[tokio::test]
    async fn each_create_history_adds_an_entry() -> TestResult {
        let ctx = TestContext::new().await;

        let coupon = create_coupon(&ctx, rules("TWICE")).await?;
        let order = guest_order();

        assert_eq!(ctx.redemptions.count_redemptions(coupon.uuid).await?, 0);

        let first = ctx
            .redemptions
            .create_history(application(&coupon), order.clone())
            .await?;

        assert_eq!(ctx.redemptions.count_redemptions(coupon.uuid).await?, 1);

        let second = ctx
            .redemptions
            .create_history(application(&coupon), order)
            .await?;

        assert_ne!(first.uuid, second.uuid);
        assert_eq!(ctx.redemptions.count_redemptions(coupon.uuid).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn create_history_unknown_coupon_returns_invalid_reference() {
        let ctx = TestContext::new().await;

        let result = ctx
            .redemptions
            .create_history(
                DiscountApplication {
                    coupon: CouponUuid::new(),
                    amount: dec!(1),
                },
                guest_order(),
            )
            .await;

        assert!(
            matches!(result, Err(RedemptionsServiceError::InvalidReference)),
            "expected InvalidReference, got {result:?}"
        );
    }

    #[tokio::test]
    async fn create_history_deleted_coupon_returns_invalid_reference() -> TestResult {
        let ctx = TestContext::new().await;

        let coupon = create_coupon(&ctx, rules("DELETED")).await?;

        ctx.coupons.delete_coupon(coupon.uuid).await?;

        let result = ctx
            .redemptions
            .create_history(application(&coupon), guest_order())
            .await;

        assert!(
            matches!(result, Err(RedemptionsServiceError::InvalidReference)),
            "expected InvalidReference, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn toggle_status_removes_and_restores_the_count() -> TestResult {
        let ctx = TestContext::new().await;

        let coupon = create_coupon(&ctx, rules("TOGGLE")).await?;

        let record = ctx
            .redemptions
            .create_history(application(&coupon), guest_order())
            .await?;

        let voided = ctx.redemptions.toggle_status(record.uuid).await?;

        assert!(!voided.enabled);
        assert_eq!(ctx.redemptions.count_redemptions(coupon.uuid).await?, 0);

        let restored = ctx.redemptions.toggle_status(record.uuid).await?;

        assert!(restored.enabled);
        assert_eq!(ctx.redemptions.count_redemptions(coupon.uuid).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn toggle_status_unknown_entry_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.redemptions.toggle_status(RedemptionUuid::new()).await;

        assert!(
            matches!(result, Err(RedemptionsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn set_status_updates_every_listed_entry() -> TestResult {
        let ctx = TestContext::new().await;

        let coupon = create_coupon(&ctx, rules("BULK")).await?;
        let customer = CustomerUuid::new();

        let mut uuids = Vec::new();

        for _ in 0..3 {
            let record = ctx
                .redemptions
                .create_history(application(&coupon), customer_order(customer))
                .await?;

            uuids.push(record.uuid);
        }

        uuids.push(RedemptionUuid::new());

        let affected = ctx.redemptions.set_status(uuids.clone(), false).await?;

        assert_eq!(affected, 3);
        assert_eq!(
            ctx.redemptions
                .count_customer_redemptions(coupon.uuid, customer)
                .await?,
            0
        );

        assert_eq!(ctx.redemptions.set_status(uuids, true).await?, 3);
        assert_eq!(ctx.redemptions.count_redemptions(coupon.uuid).await?, 3);

        Ok(())
    }

    #[tokio::test]
    async fn denying_hook_vetoes_without_writing() -> TestResult {
        let ctx = TestContext::new().await;

        let coupon = create_coupon(&ctx, rules("VETO")).await?;

        let mut allow = MockRedemptionHook::new();

        allow
            .expect_before_add_history()
            .times(1)
            .returning(|_, _, _| HookDecision::Allow);

        let mut deny = MockRedemptionHook::new();

        deny.expect_before_add_history()
            .withf(|pending, coupon, _| pending.code == "VETO" && pending.coupon == coupon.uuid)
            .times(1)
            .returning(|_, _, _| HookDecision::Deny);

        let mut never = MockRedemptionHook::new();

        never.expect_before_add_history().never();

        let redemptions = ctx
            .redemptions
            .clone()
            .with_hook(allow)
            .with_hook(deny)
            .with_hook(never);

        let result = redemptions
            .create_history(application(&coupon), guest_order())
            .await;

        assert!(
            matches!(result, Err(RedemptionsServiceError::Vetoed)),
            "expected Vetoed, got {result:?}"
        );

        assert_eq!(redemptions.count_redemptions(coupon.uuid).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn closure_hooks_see_the_order() -> TestResult {
        let ctx = TestContext::new().await;

        let coupon = create_coupon(&ctx, rules("CLOSURE")).await?;
        let blocked = OrderUuid::new();

        let redemptions = ctx.redemptions.clone().with_hook(
            move |_: &PendingRedemption, _: &CouponRecord, order: &OrderContext| {
                if order.uuid == blocked {
                    HookDecision::Deny
                } else {
                    HookDecision::Allow
                }
            },
        );

        let allowed = redemptions
            .create_history(application(&coupon), guest_order())
            .await;

        assert!(allowed.is_ok(), "expected entry, got {allowed:?}");

        let denied = redemptions
            .create_history(
                application(&coupon),
                OrderContext {
                    uuid: blocked,
                    ..guest_order()
                },
            )
            .await;

        assert!(
            matches!(denied, Err(RedemptionsServiceError::Vetoed)),
            "expected Vetoed, got {denied:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn redeem_stops_at_the_global_cap() -> TestResult {
        let ctx = TestContext::new().await;

        let coupon = create_coupon(
            &ctx,
            Coupon {
                limits: RedemptionLimits::with_total(2),
                ..rules("LIMITED")
            },
        )
        .await?;

        ctx.redemptions
            .redeem(application(&coupon), guest_order())
            .await?;
        ctx.redemptions
            .redeem(application(&coupon), guest_order())
            .await?;

        let result = ctx
            .redemptions
            .redeem(application(&coupon), guest_order())
            .await;

        assert!(
            matches!(
                result,
                Err(RedemptionsServiceError::Ineligible(
                    Ineligible::MaxRedemptionsReached
                ))
            ),
            "expected MaxRedemptionsReached, got {result:?}"
        );

        assert_eq!(ctx.redemptions.count_redemptions(coupon.uuid).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn redeem_checks_the_validity_window() -> TestResult {
        let ctx = TestContext::new().await;

        let coupon = create_coupon(
            &ctx,
            Coupon {
                validity: Validity::Period {
                    start: date(2024, 1, 1),
                    end: date(2024, 1, 31),
                },
                ..rules("JANUARY")
            },
        )
        .await?;

        let result = ctx
            .redemptions
            .redeem(application(&coupon), guest_order())
            .await;

        assert!(
            matches!(
                result,
                Err(RedemptionsServiceError::Ineligible(Ineligible::Expired))
            ),
            "expected Expired, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_redeems_respect_the_cap() -> TestResult {
        let ctx = TestContext::new().await;

        let coupon = create_coupon(
            &ctx,
            Coupon {
                limits: RedemptionLimits::with_total(3),
                ..rules("RUSH")
            },
        )
        .await?;

        let attempts = (0..8).map(|_| {
            let redemptions = ctx.redemptions.clone();
            let application = application(&coupon);

            tokio::spawn(async move { redemptions.redeem(application, guest_order()).await })
        });

        let mut succeeded = 0;

        for attempt in attempts.collect::<Vec<_>>() {
            if attempt.await?.is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 3);
        assert_eq!(ctx.redemptions.count_redemptions(coupon.uuid).await?, 3);

        Ok(())
    }

    #[tokio::test]
    async fn list_history_filters_sorts_and_pages() -> TestResult {
        let ctx = TestContext::new().await;

        let coupon = create_coupon(&ctx, rules("HISTORY")).await?;
        let customer = CustomerUuid::new();

        let mut mine = Vec::new();

        for _ in 0..3 {
            let record = ctx
                .redemptions
                .create_history(application(&coupon), customer_order(customer))
                .await?;

            mine.push(record.uuid);
        }

        ctx.redemptions
            .create_history(application(&coupon), guest_order())
            .await?;

        let voided = mine.remove(1);

        ctx.redemptions.toggle_status(voided).await?;

        let newest_first = ctx
            .redemptions
            .list_history(HistoryListOptions {
                customer: Some(customer),
                ..HistoryListOptions::default()
            })
            .await?;

        let uuids: Vec<RedemptionUuid> = newest_first.items.iter().map(|r| r.uuid).collect();

        assert_eq!(newest_first.total, 2);
        assert_eq!(uuids, mine.iter().rev().copied().collect::<Vec<_>>());

        let oldest_first = ctx
            .redemptions
            .list_history(HistoryListOptions {
                customer: Some(customer),
                page: PageRequest::new(1, 1),
                sort: vec!["date_used asc".to_string()],
                ..HistoryListOptions::default()
            })
            .await?;

        assert_eq!(
            oldest_first.items.first().map(|r| r.uuid),
            mine.first().copied()
        );
        assert_eq!(oldest_first.last_page(), 2);

        let everything = ctx
            .redemptions
            .list_history(HistoryListOptions {
                sort: vec!["amount desc".to_string()],
                ..HistoryListOptions::default()
            })
            .await?;

        assert_eq!(everything.total, 3);

        Ok(())
    }

    #[tokio::test]
    async fn list_history_filters_by_order() -> TestResult {
        let ctx = TestContext::new().await;

        let coupon = create_coupon(&ctx, rules("ORDER")).await?;
        let order = guest_order();

        let record = ctx
            .redemptions
            .create_history(application(&coupon), order.clone())
            .await?;

        ctx.redemptions
            .create_history(application(&coupon), guest_order())
            .await?;

        let page = ctx
            .redemptions
            .list_history(HistoryListOptions {
                order: Some(order.uuid),
                ..HistoryListOptions::default()
            })
            .await?;

        assert_eq!(page.items, vec![record]);

        Ok(())
    }
}
