//! Coupon Associations Repository
//!
//! Categories and menu items a coupon is scoped to.

use smallvec::SmallVec;
use sqlx::{Postgres, Transaction, query, query_scalar};
use tracing::debug;
use uuid::Uuid;

use crate::{
    domain::coupons::records::{Category, CouponUuid, Menu},
    uuids::TypedUuid,
};

/// A plain join table keyed by coupon.
pub(crate) trait CouponAssociation {
    const NAME: &'static str;
    const LIST_SQL: &'static str;
    const CREATE_SQL: &'static str;
    const DELETE_SQL: &'static str;
}

impl CouponAssociation for Category {
    const NAME: &'static str = "category";
    const LIST_SQL: &'static str = include_str!("../sql/list_coupon_categories.sql");
    const CREATE_SQL: &'static str = include_str!("../sql/create_coupon_categories.sql");
    const DELETE_SQL: &'static str = include_str!("../sql/delete_coupon_categories.sql");
}

impl CouponAssociation for Menu {
    const NAME: &'static str = "menu";
    const LIST_SQL: &'static str = include_str!("../sql/list_coupon_menus.sql");
    const CREATE_SQL: &'static str = include_str!("../sql/create_coupon_menus.sql");
    const DELETE_SQL: &'static str = include_str!("../sql/delete_coupon_menus.sql");
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCouponAssociationsRepository;

impl PgCouponAssociationsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Replace the set of `T` the coupon is scoped to.
    #[tracing::instrument(
        name = "coupons.repository.sync_associations",
        skip(self, tx, associated),
        fields(
            coupon_uuid = %coupon,
            association = T::NAME,
            associated_count = associated.len()
        ),
        err
    )]
    pub(crate) async fn sync<T: CouponAssociation>(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
        associated: &[TypedUuid<T>],
    ) -> Result<(), sqlx::Error> {
        let removed = self.detach_all::<T>(tx, coupon).await?;

        if !associated.is_empty() {
            let uuids: Vec<Uuid> = associated.iter().copied().map(Into::into).collect();

            query(T::CREATE_SQL)
                .bind(coupon.into_uuid())
                .bind(&uuids)
                .execute(&mut **tx)
                .await?;
        }

        debug!(
            association = T::NAME,
            removed,
            attached = associated.len(),
            "synced coupon associations"
        );

        Ok(())
    }

    pub(crate) async fn detach_all<T: CouponAssociation>(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(T::DELETE_SQL)
            .bind(coupon.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn list<T: CouponAssociation>(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<SmallVec<[TypedUuid<T>; 4]>, sqlx::Error> {
        let uuids = query_scalar::<Postgres, Uuid>(T::LIST_SQL)
            .bind(coupon.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        Ok(uuids.into_iter().map(TypedUuid::from_uuid).collect())
    }
}
