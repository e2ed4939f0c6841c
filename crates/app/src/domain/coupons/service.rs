//! Coupons Service

use async_trait::async_trait;
use coupons::eligibility::{LocationMatch, Usage, is_outside_locations};
use mockall::automock;
use tracing::{Span, debug, info};

use crate::{
    database::Db,
    domain::{
        coupons::{
            CouponsServiceError,
            data::{CouponListOptions, CouponUpdate, Eligibility, NewCoupon},
            records::{Category, CategoryUuid, CouponRecord, CouponUuid, Menu, MenuUuid},
            repositories::{
                associations::PgCouponAssociationsRepository,
                coupons::{CouponColumns, PgCouponsRepository},
            },
        },
        listing::Page,
        locations::{PgLocationsRepository, records::LocationUuid},
        orders::{CustomerUuid, OrderContext},
        redemptions::repository::PgRedemptionsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgCouponsService {
    db: Db,
    coupons: PgCouponsRepository,
    associations: PgCouponAssociationsRepository,
    locations: PgLocationsRepository,
    redemptions: PgRedemptionsRepository,
}

impl PgCouponsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            coupons: PgCouponsRepository::new(),
            associations: PgCouponAssociationsRepository::new(),
            locations: PgLocationsRepository::new(),
            redemptions: PgRedemptionsRepository::new(),
        }
    }
}

#[async_trait]
impl CouponsService for PgCouponsService {
    #[tracing::instrument(
        name = "coupons.service.create_coupon",
        skip(self, coupon),
        fields(
            coupon_uuid = %coupon.uuid,
            coupon_code = %coupon.rules.code,
            validity = %coupon.rules.validity.kind()
        ),
        err
    )]
    async fn create_coupon(&self, coupon: NewCoupon) -> Result<CouponRecord, CouponsServiceError> {
        let columns = CouponColumns::new(coupon.name, coupon.description, &coupon.rules)?;

        let mut tx = self.db.begin().await?;

        let record = self
            .coupons
            .create_coupon(&mut tx, coupon.uuid, columns)
            .await?;

        tx.commit().await?;

        info!(coupon_uuid = %record.uuid, "created coupon");

        Ok(record)
    }

    #[tracing::instrument(
        name = "coupons.service.update_coupon",
        skip(self, update),
        fields(coupon_uuid = %uuid, validity = %update.rules.validity.kind()),
        err
    )]
    async fn update_coupon(
        &self,
        uuid: CouponUuid,
        update: CouponUpdate,
    ) -> Result<CouponRecord, CouponsServiceError> {
        let columns = CouponColumns::new(update.name, update.description, &update.rules)?;

        let mut tx = self.db.begin().await?;

        let record = self.coupons.update_coupon(&mut tx, uuid, columns).await?;

        tx.commit().await?;

        info!(coupon_uuid = %record.uuid, "updated coupon");

        Ok(record)
    }

    async fn get_coupon(&self, uuid: CouponUuid) -> Result<CouponRecord, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.coupons.get_coupon(&mut tx, uuid).await?;

        tx.commit().await?;

        Ok(record)
    }

    #[tracing::instrument(
        name = "coupons.service.delete_coupon",
        skip(self),
        fields(coupon_uuid = %uuid),
        err
    )]
    async fn delete_coupon(&self, uuid: CouponUuid) -> Result<(), CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        let categories = self.associations.detach_all::<Category>(&mut tx, uuid).await?;
        let menus = self.associations.detach_all::<Menu>(&mut tx, uuid).await?;
        let locations = self.locations.delete_locationables(&mut tx, &[uuid]).await?;

        let rows_affected = self.coupons.delete_coupon(&mut tx, uuid).await?;

        if rows_affected == 0 {
            return Err(CouponsServiceError::NotFound);
        }

        tx.commit().await?;

        info!(categories, menus, locations, "deleted coupon");

        Ok(())
    }

    #[tracing::instrument(
        name = "coupons.service.lookup_coupon",
        skip(self),
        fields(coupon_uuid = tracing::field::Empty),
        err
    )]
    async fn lookup_coupon(&self, code: String) -> Result<CouponRecord, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.coupons.lookup_coupon(&mut tx, &code).await?;

        tx.commit().await?;

        Span::current().record("coupon_uuid", tracing::field::display(record.uuid));

        Ok(record)
    }

    async fn list_coupons(
        &self,
        options: CouponListOptions,
    ) -> Result<Page<CouponRecord>, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        let (coupons, total) = self.coupons.list_coupons(&mut tx, &options).await?;

        tx.commit().await?;

        Ok(Page::new(coupons, options.page, total))
    }

    #[tracing::instrument(
        name = "coupons.service.sync_categories",
        skip(self, categories),
        fields(coupon_uuid = %uuid, category_count = categories.len()),
        err
    )]
    async fn sync_categories(
        &self,
        uuid: CouponUuid,
        categories: Vec<CategoryUuid>,
    ) -> Result<(), CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        self.coupons.lock_coupon(&mut tx, uuid).await?;
        self.associations.sync(&mut tx, uuid, &categories).await?;

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(
        name = "coupons.service.sync_menus",
        skip(self, menus),
        fields(coupon_uuid = %uuid, menu_count = menus.len()),
        err
    )]
    async fn sync_menus(
        &self,
        uuid: CouponUuid,
        menus: Vec<MenuUuid>,
    ) -> Result<(), CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        self.coupons.lock_coupon(&mut tx, uuid).await?;
        self.associations.sync(&mut tx, uuid, &menus).await?;

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(
        name = "coupons.service.sync_locations",
        skip(self, locations),
        fields(coupon_uuid = %uuid, location_count = locations.len()),
        err
    )]
    async fn sync_locations(
        &self,
        uuid: CouponUuid,
        locations: Vec<LocationUuid>,
    ) -> Result<(), CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        self.coupons.lock_coupon(&mut tx, uuid).await?;
        self.locations.sync_locations(&mut tx, uuid, &locations).await?;

        tx.commit().await?;

        Ok(())
    }

    async fn list_categories(
        &self,
        uuid: CouponUuid,
    ) -> Result<Vec<CategoryUuid>, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        self.coupons.get_coupon(&mut tx, uuid).await?;

        let categories = self.associations.list::<Category>(&mut tx, uuid).await?;

        tx.commit().await?;

        Ok(categories.into_vec())
    }

    async fn list_menus(&self, uuid: CouponUuid) -> Result<Vec<MenuUuid>, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        self.coupons.get_coupon(&mut tx, uuid).await?;

        let menus = self.associations.list::<Menu>(&mut tx, uuid).await?;

        tx.commit().await?;

        Ok(menus.into_vec())
    }

    async fn list_locations(
        &self,
        uuid: CouponUuid,
    ) -> Result<Vec<LocationUuid>, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        self.coupons.get_coupon(&mut tx, uuid).await?;

        let locations = self.locations.list_locations(&mut tx, uuid).await?;

        tx.commit().await?;

        Ok(locations.into_vec())
    }

    async fn has_location_restriction(
        &self,
        uuid: CouponUuid,
        location: LocationUuid,
    ) -> Result<bool, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        self.coupons.get_coupon(&mut tx, uuid).await?;

        let locations = self.locations.list_locations(&mut tx, uuid).await?;

        tx.commit().await?;

        Ok(is_outside_locations(&locations, &location))
    }

    async fn has_reached_max_redemption(
        &self,
        uuid: CouponUuid,
    ) -> Result<bool, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        let coupon = self.coupons.get_coupon(&mut tx, uuid).await?;
        let redemptions = self.redemptions.count_redemptions(&mut tx, uuid).await?;

        tx.commit().await?;

        Ok(coupon.rules.has_reached_max_redemption(redemptions))
    }

    async fn customer_has_max_redemption(
        &self,
        uuid: CouponUuid,
        customer: CustomerUuid,
    ) -> Result<bool, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        let coupon = self.coupons.get_coupon(&mut tx, uuid).await?;
        let redemptions = self
            .redemptions
            .count_customer_redemptions(&mut tx, uuid, customer)
            .await?;

        tx.commit().await?;

        Ok(coupon.rules.customer_has_max_redemption(redemptions))
    }

    #[tracing::instrument(
        name = "coupons.service.check_eligibility",
        skip(self, order),
        fields(
            coupon_uuid = %uuid,
            order_uuid = %order.uuid,
            redemptions = tracing::field::Empty,
            location = tracing::field::Empty,
            eligible = tracing::field::Empty
        ),
        err
    )]
    async fn check_eligibility(
        &self,
        uuid: CouponUuid,
        order: OrderContext,
    ) -> Result<Eligibility, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        let coupon = self.coupons.get_coupon(&mut tx, uuid).await?;
        let redemptions = self.redemptions.count_redemptions(&mut tx, uuid).await?;

        let customer_redemptions = match order.customer {
            Some(customer) => Some(
                self.redemptions
                    .count_customer_redemptions(&mut tx, uuid, customer)
                    .await?,
            ),
            None => None,
        };

        let locations = self.locations.list_locations(&mut tx, uuid).await?;

        tx.commit().await?;

        let usage = Usage {
            redemptions,
            customer_redemptions,
            location: LocationMatch::of(&locations, order.location.as_ref()),
        };

        let eligibility = Eligibility::from(coupon.rules.check(&order.details(), &usage));

        let span = Span::current();

        span.record("redemptions", redemptions);
        span.record("location", tracing::field::display(usage.location));
        span.record("eligible", eligibility.is_eligible());

        debug!(?eligibility, "checked coupon eligibility");

        Ok(eligibility)
    }
}

#[automock]
#[async_trait]
pub trait CouponsService: Send + Sync {
    /// Creates a coupon.
    async fn create_coupon(&self, coupon: NewCoupon) -> Result<CouponRecord, CouponsServiceError>;

    /// Replaces a coupon's details and rules.
    async fn update_coupon(
        &self,
        uuid: CouponUuid,
        update: CouponUpdate,
    ) -> Result<CouponRecord, CouponsServiceError>;

    /// Retrieves a coupon that has not been deleted, enabled or not.
    async fn get_coupon(&self, uuid: CouponUuid) -> Result<CouponRecord, CouponsServiceError>;

    /// Detaches a coupon's categories, menus and locations, then soft-deletes it.
    async fn delete_coupon(&self, uuid: CouponUuid) -> Result<(), CouponsServiceError>;

    /// Finds the enabled coupon with exactly this code.
    async fn lookup_coupon(&self, code: String) -> Result<CouponRecord, CouponsServiceError>;

    /// Lists enabled coupons a page at a time.
    async fn list_coupons(
        &self,
        options: CouponListOptions,
    ) -> Result<Page<CouponRecord>, CouponsServiceError>;

    /// Replaces the categories a coupon is scoped to.
    async fn sync_categories(
        &self,
        uuid: CouponUuid,
        categories: Vec<CategoryUuid>,
    ) -> Result<(), CouponsServiceError>;

    /// Replaces the menu items a coupon is scoped to.
    async fn sync_menus(
        &self,
        uuid: CouponUuid,
        menus: Vec<MenuUuid>,
    ) -> Result<(), CouponsServiceError>;

    /// Replaces the locations a coupon is valid at.
    async fn sync_locations(
        &self,
        uuid: CouponUuid,
        locations: Vec<LocationUuid>,
    ) -> Result<(), CouponsServiceError>;

    async fn list_categories(
        &self,
        uuid: CouponUuid,
    ) -> Result<Vec<CategoryUuid>, CouponsServiceError>;

    async fn list_menus(&self, uuid: CouponUuid) -> Result<Vec<MenuUuid>, CouponsServiceError>;

    async fn list_locations(
        &self,
        uuid: CouponUuid,
    ) -> Result<Vec<LocationUuid>, CouponsServiceError>;

    /// Whether the coupon is scoped to locations that do not include `location`.
    async fn has_location_restriction(
        &self,
        uuid: CouponUuid,
        location: LocationUuid,
    ) -> Result<bool, CouponsServiceError>;

    /// Whether enabled redemptions have used up the coupon's total cap.
    async fn has_reached_max_redemption(
        &self,
        uuid: CouponUuid,
    ) -> Result<bool, CouponsServiceError>;

    /// Whether the customer's enabled redemptions are past the per-customer cap.
    async fn customer_has_max_redemption(
        &self,
        uuid: CouponUuid,
        customer: CustomerUuid,
    ) -> Result<bool, CouponsServiceError>;

    /// Checks every coupon rule against an order.
    async fn check_eligibility(
        &self,
        uuid: CouponUuid,
        order: OrderContext,
    ) -> Result<Eligibility, CouponsServiceError>;
}
