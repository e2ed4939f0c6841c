//! Coupons Repository

use std::num::TryFromIntError;

use coupons::{
    coupon::Coupon,
    discount::{Discount, DiscountKind},
    limits::RedemptionLimits,
    restrictions::{OrderType, OrderTypes},
    validity::{Validity, ValidityKind, Weekdays},
};
use jiff_sqlx::{Date as SqlxDate, Time as SqlxTime, Timestamp as SqlxTimestamp};
use rust_decimal::Decimal;
use sqlx::{
    FromRow, Postgres, QueryBuilder, Row, Transaction,
    postgres::{PgArguments, PgRow},
    query::QueryAs,
    query_as,
};
use tracing::debug;

use crate::domain::{
    coupons::{
        data::{CouponListOptions, CouponSortField},
        records::{CouponRecord, CouponUuid},
    },
    listing::{push_order_by, push_page},
};

const CREATE_COUPON_SQL: &str = include_str!("../sql/create_coupon.sql");
const UPDATE_COUPON_SQL: &str = include_str!("../sql/update_coupon.sql");
const GET_COUPON_SQL: &str = include_str!("../sql/get_coupon.sql");
const LOCK_COUPON_SQL: &str = include_str!("../sql/lock_coupon.sql");
const LOOKUP_COUPON_SQL: &str = include_str!("../sql/lookup_coupon.sql");
const LIST_COUPONS_SQL: &str = include_str!("../sql/list_coupons.sql");
const COUNT_COUPONS_SQL: &str = include_str!("../sql/count_coupons.sql");
const DELETE_COUPON_SQL: &str = include_str!("../sql/delete_coupon.sql");

/// Column values written for a coupon.
#[derive(Debug, Clone)]
pub(crate) struct CouponColumns {
    name: String,
    code: String,
    description: Option<String>,
    discount_kind: &'static str,
    discount: Decimal,
    min_total: Option<Decimal>,
    redemptions: Option<i32>,
    customer_redemptions: Option<i32>,
    validity: &'static str,
    fixed_date: Option<SqlxDate>,
    fixed_from_time: Option<SqlxTime>,
    fixed_to_time: Option<SqlxTime>,
    period_start_date: Option<SqlxDate>,
    period_end_date: Option<SqlxDate>,
    recurring_every: Vec<i16>,
    recurring_from_time: Option<SqlxTime>,
    recurring_to_time: Option<SqlxTime>,
    order_restriction: Vec<String>,
    auto_apply: bool,
    enabled: bool,
}

impl CouponColumns {
    /// Flatten a coupon into columns.
    ///
    /// # Errors
    ///
    /// Returns an error when a redemption cap does not fit the column.
    pub(crate) fn new(
        name: String,
        description: Option<String>,
        rules: &Coupon,
    ) -> Result<Self, TryFromIntError> {
        let mut columns = Self {
            name,
            code: rules.code.clone(),
            description,
            discount_kind: rules.discount.kind.code(),
            discount: rules.discount.amount,
            min_total: rules.min_total,
            redemptions: rules.limits.total.map(i32::try_from).transpose()?,
            customer_redemptions: rules.limits.per_customer.map(i32::try_from).transpose()?,
            validity: rules.validity.kind().as_str(),
            fixed_date: None,
            fixed_from_time: None,
            fixed_to_time: None,
            period_start_date: None,
            period_end_date: None,
            recurring_every: Vec::new(),
            recurring_from_time: None,
            recurring_to_time: None,
            order_restriction: rules
                .order_types
                .iter()
                .map(|order_type| order_type.as_str().to_string())
                .collect(),
            auto_apply: rules.auto_apply,
            enabled: rules.enabled,
        };

        match rules.validity {
            Validity::Forever => {}
            Validity::Fixed { date, from, to } => {
                columns.fixed_date = Some(date.into());
                columns.fixed_from_time = Some(from.into());
                columns.fixed_to_time = Some(to.into());
            }
            Validity::Period { start, end } => {
                columns.period_start_date = Some(start.into());
                columns.period_end_date = Some(end.into());
            }
            Validity::Recurring { days, from, to } => {
                columns.recurring_every = days.indexes().map(i16::from).collect();
                columns.recurring_from_time = Some(from.into());
                columns.recurring_to_time = Some(to.into());
            }
        }

        Ok(columns)
    }

    fn bind<'q>(
        self,
        query: QueryAs<'q, Postgres, CouponRecord, PgArguments>,
    ) -> QueryAs<'q, Postgres, CouponRecord, PgArguments> {
        query
            .bind(self.name)
            .bind(self.code)
            .bind(self.description)
            .bind(self.discount_kind)
            .bind(self.discount)
            .bind(self.min_total)
            .bind(self.redemptions)
            .bind(self.customer_redemptions)
            .bind(self.validity)
            .bind(self.fixed_date)
            .bind(self.fixed_from_time)
            .bind(self.fixed_to_time)
            .bind(self.period_start_date)
            .bind(self.period_end_date)
            .bind(self.recurring_every)
            .bind(self.recurring_from_time)
            .bind(self.recurring_to_time)
            .bind(self.order_restriction)
            .bind(self.auto_apply)
            .bind(self.enabled)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCouponsRepository;

impl PgCouponsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
        columns: CouponColumns,
    ) -> Result<CouponRecord, sqlx::Error> {
        columns
            .bind(query_as::<Postgres, CouponRecord>(CREATE_COUPON_SQL).bind(coupon.into_uuid()))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
        columns: CouponColumns,
    ) -> Result<CouponRecord, sqlx::Error> {
        columns
            .bind(query_as::<Postgres, CouponRecord>(UPDATE_COUPON_SQL).bind(coupon.into_uuid()))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<CouponRecord, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(GET_COUPON_SQL)
            .bind(coupon.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Fetch a live coupon and hold its row lock until the transaction ends.
    pub(crate) async fn lock_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<CouponRecord, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(LOCK_COUPON_SQL)
            .bind(coupon.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn lookup_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<CouponRecord, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(LOOKUP_COUPON_SQL)
            .bind(code)
            .fetch_one(&mut **tx)
            .await
    }

    #[tracing::instrument(
        name = "coupons.repository.list_coupons",
        skip(self, tx, options),
        fields(
            page = options.page.page(),
            sort_count = tracing::field::Empty,
            total = tracing::field::Empty
        ),
        err
    )]
    pub(crate) async fn list_coupons(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        options: &CouponListOptions,
    ) -> Result<(Vec<CouponRecord>, u64), sqlx::Error> {
        let sorts = coupons::sorting::parse_sorts::<CouponSortField, _>(&options.sort);

        tracing::Span::current().record("sort_count", sorts.len());

        let mut count = QueryBuilder::<Postgres>::new(COUNT_COUPONS_SQL);

        push_filters(&mut count, options);

        let total: i64 = count.build_query_scalar().fetch_one(&mut **tx).await?;

        let total = u64::try_from(total).map_err(|e| sqlx::Error::ColumnDecode {
            index: "count".to_string(),
            source: Box::new(e),
        })?;

        tracing::Span::current().record("total", total);

        let mut list = QueryBuilder::<Postgres>::new(LIST_COUPONS_SQL);

        push_filters(&mut list, options);
        push_order_by(&mut list, &sorts, "uuid");
        push_page(&mut list, options.page);

        let coupons = list
            .build_query_as::<CouponRecord>()
            .fetch_all(&mut **tx)
            .await?;

        debug!(returned = coupons.len(), total, "listed coupons");

        Ok((coupons, total))
    }

    pub(crate) async fn delete_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = sqlx::query(DELETE_COUPON_SQL)
            .bind(coupon.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, options: &CouponListOptions) {
    if let Some(category) = options.category {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM coupon_categories \
                 WHERE coupon_categories.coupon_uuid = coupons.uuid \
                 AND coupon_categories.category_uuid = ",
            )
            .push_bind(category.into_uuid())
            .push(")");
    }

    if let Some(menu) = options.menu {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM coupon_menus \
                 WHERE coupon_menus.coupon_uuid = coupons.uuid \
                 AND coupon_menus.menu_uuid = ",
            )
            .push_bind(menu.into_uuid())
            .push(")");
    }

    if options.auto_apply_only {
        builder.push(" AND auto_apply");
    }
}

fn decode_error<E>(column: &'static str) -> impl FnOnce(E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    move |source| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

fn try_get_limit(row: &PgRow, column: &'static str) -> sqlx::Result<Option<u32>> {
    row.try_get::<Option<i32>, _>(column)?
        .map(u32::try_from)
        .transpose()
        .map_err(decode_error(column))
}

fn try_get_weekdays(row: &PgRow) -> sqlx::Result<Weekdays> {
    let indexes = row
        .try_get::<Vec<i16>, _>("recurring_every")?
        .into_iter()
        .map(u8::try_from)
        .collect::<Result<Vec<u8>, _>>()
        .map_err(decode_error("recurring_every"))?;

    Weekdays::from_indexes(indexes).map_err(decode_error("recurring_every"))
}

fn try_get_validity(row: &PgRow) -> sqlx::Result<Validity> {
    let kind = row
        .try_get::<Option<String>, _>("validity")?
        .map(|kind| kind.parse::<ValidityKind>())
        .transpose()
        .map_err(decode_error("validity"))?;

    // A coupon saved without a mode is treated as always valid.
    let validity = match kind.unwrap_or(ValidityKind::Forever) {
        ValidityKind::Forever => Validity::Forever,
        ValidityKind::Fixed => Validity::Fixed {
            date: row.try_get::<SqlxDate, _>("fixed_date")?.to_jiff(),
            from: row.try_get::<SqlxTime, _>("fixed_from_time")?.to_jiff(),
            to: row.try_get::<SqlxTime, _>("fixed_to_time")?.to_jiff(),
        },
        ValidityKind::Period => Validity::Period {
            start: row.try_get::<SqlxDate, _>("period_start_date")?.to_jiff(),
            end: row.try_get::<SqlxDate, _>("period_end_date")?.to_jiff(),
        },
        ValidityKind::Recurring => Validity::Recurring {
            days: try_get_weekdays(row)?,
            from: row.try_get::<SqlxTime, _>("recurring_from_time")?.to_jiff(),
            to: row.try_get::<SqlxTime, _>("recurring_to_time")?.to_jiff(),
        },
    };

    Ok(validity)
}

impl<'r> FromRow<'r, PgRow> for CouponRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let kind = row
            .try_get::<String, _>("discount_kind")?
            .parse::<DiscountKind>()
            .map_err(decode_error("discount_kind"))?;

        let order_types = row
            .try_get::<Vec<String>, _>("order_restriction")?
            .iter()
            .map(|order_type| order_type.parse::<OrderType>())
            .collect::<Result<OrderTypes, _>>()
            .map_err(decode_error("order_restriction"))?;

        let rules = Coupon {
            code: row.try_get("code")?,
            discount: Discount {
                kind,
                amount: row.try_get("discount")?,
            },
            validity: try_get_validity(row)?,
            min_total: row.try_get("min_total")?,
            limits: RedemptionLimits {
                total: try_get_limit(row, "redemptions")?,
                per_customer: try_get_limit(row, "customer_redemptions")?,
            },
            order_types,
            auto_apply: row.try_get("auto_apply")?,
            enabled: row.try_get("enabled")?,
        };

        Ok(Self {
            uuid: CouponUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            rules,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
