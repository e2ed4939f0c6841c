//! Redemptions Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{
    FromRow, Postgres, QueryBuilder, Row, Transaction, postgres::PgRow, query, query_as,
    query_scalar,
};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    coupons::records::CouponUuid,
    listing::{push_order_by, push_page},
    orders::{CustomerUuid, OrderUuid},
    redemptions::{
        data::{HistoryListOptions, PendingRedemption, RedemptionSortField},
        records::{RedemptionRecord, RedemptionUuid},
    },
};

const CREATE_REDEMPTION_SQL: &str = include_str!("sql/create_redemption.sql");
const GET_REDEMPTION_SQL: &str = include_str!("sql/get_redemption.sql");
const TOGGLE_REDEMPTION_STATUS_SQL: &str = include_str!("sql/toggle_redemption_status.sql");
const SET_REDEMPTION_STATUS_SQL: &str = include_str!("sql/set_redemption_status.sql");
const COUNT_REDEMPTIONS_SQL: &str = include_str!("sql/count_redemptions.sql");
const COUNT_CUSTOMER_REDEMPTIONS_SQL: &str = include_str!("sql/count_customer_redemptions.sql");
const LIST_REDEMPTIONS_SQL: &str = include_str!("sql/list_redemptions.sql");
const COUNT_LISTED_REDEMPTIONS_SQL: &str = include_str!("sql/count_listed_redemptions.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgRedemptionsRepository;

impl PgRedemptionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_redemption(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        redemption: &PendingRedemption,
    ) -> Result<RedemptionRecord, sqlx::Error> {
        query_as::<Postgres, RedemptionRecord>(CREATE_REDEMPTION_SQL)
            .bind(redemption.uuid.into_uuid())
            .bind(redemption.coupon.into_uuid())
            .bind(redemption.order.into_uuid())
            .bind(redemption.customer.map(CustomerUuid::into_uuid))
            .bind(&redemption.code)
            .bind(redemption.amount)
            .bind(redemption.min_total)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_redemption(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        redemption: RedemptionUuid,
    ) -> Result<RedemptionRecord, sqlx::Error> {
        query_as::<Postgres, RedemptionRecord>(GET_REDEMPTION_SQL)
            .bind(redemption.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn toggle_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        redemption: RedemptionUuid,
    ) -> Result<RedemptionRecord, sqlx::Error> {
        query_as::<Postgres, RedemptionRecord>(TOGGLE_REDEMPTION_STATUS_SQL)
            .bind(redemption.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        redemptions: &[RedemptionUuid],
        enabled: bool,
    ) -> Result<u64, sqlx::Error> {
        if redemptions.is_empty() {
            return Ok(0);
        }

        let uuids: Vec<Uuid> = redemptions.iter().copied().map(Into::into).collect();

        let rows_affected = query(SET_REDEMPTION_STATUS_SQL)
            .bind(&uuids)
            .bind(enabled)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Enabled entries for a coupon.
    pub(crate) async fn count_redemptions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<u64, sqlx::Error> {
        let count = query_scalar::<Postgres, i64>(COUNT_REDEMPTIONS_SQL)
            .bind(coupon.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        decode_count(count)
    }

    /// Enabled entries for a coupon made by one customer.
    pub(crate) async fn count_customer_redemptions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
        customer: CustomerUuid,
    ) -> Result<u64, sqlx::Error> {
        let count = query_scalar::<Postgres, i64>(COUNT_CUSTOMER_REDEMPTIONS_SQL)
            .bind(coupon.into_uuid())
            .bind(customer.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        decode_count(count)
    }

    #[tracing::instrument(
        name = "redemptions.repository.list_history",
        skip(self, tx, options),
        fields(
            page = options.page.page(),
            has_customer = options.customer.is_some(),
            has_order = options.order.is_some(),
            total = tracing::field::Empty
        ),
        err
    )]
    pub(crate) async fn list_history(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        options: &HistoryListOptions,
    ) -> Result<(Vec<RedemptionRecord>, u64), sqlx::Error> {
        let sorts = coupons::sorting::parse_sorts::<RedemptionSortField, _>(&options.sort);

        let mut count = QueryBuilder::<Postgres>::new(COUNT_LISTED_REDEMPTIONS_SQL);

        push_filters(&mut count, options.customer, options.order);

        let total = decode_count(count.build_query_scalar::<i64>().fetch_one(&mut **tx).await?)?;

        tracing::Span::current().record("total", total);

        let mut list = QueryBuilder::<Postgres>::new(LIST_REDEMPTIONS_SQL);

        push_filters(&mut list, options.customer, options.order);
        push_order_by(&mut list, &sorts, "uuid");
        push_page(&mut list, options.page);

        let entries = list
            .build_query_as::<RedemptionRecord>()
            .fetch_all(&mut **tx)
            .await?;

        debug!(returned = entries.len(), total, "listed redemption history");

        Ok((entries, total))
    }
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    customer: Option<CustomerUuid>,
    order: Option<OrderUuid>,
) {
    if let Some(customer) = customer {
        builder
            .push(" AND customer_uuid = ")
            .push_bind(customer.into_uuid());
    }

    if let Some(order) = order {
        builder.push(" AND order_uuid = ").push_bind(order.into_uuid());
    }
}

fn decode_count(count: i64) -> Result<u64, sqlx::Error> {
    u64::try_from(count).map_err(|e| sqlx::Error::ColumnDecode {
        index: "count".to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, PgRow> for RedemptionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: RedemptionUuid::from_uuid(row.try_get("uuid")?),
            coupon_uuid: CouponUuid::from_uuid(row.try_get("coupon_uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            customer_uuid: row
                .try_get::<Option<Uuid>, _>("customer_uuid")?
                .map(CustomerUuid::from_uuid),
            code: row.try_get("code")?,
            amount: row.try_get("amount")?,
            min_total: row.try_get("min_total")?,
            enabled: row.try_get("enabled")?,
            used_at: row.try_get::<SqlxTimestamp, _>("used_at")?.to_jiff(),
        })
    }
}
