//! Paginated Listings

use coupons::sorting::{Sort, SortDirection, SortField};
use sqlx::{Postgres, QueryBuilder};

/// Default number of rows per page.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Which page of a listing to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_limit: u32,
}

impl PageRequest {
    /// Request a page. Pages are numbered from 1; zero values are raised to 1.
    #[must_use]
    pub fn new(page: u32, page_limit: u32) -> Self {
        Self {
            page: page.max(1),
            page_limit: page_limit.max(1),
        }
    }

    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn page_limit(self) -> u32 {
        self.page_limit
    }

    pub(crate) fn limit(self) -> i64 {
        i64::from(self.page_limit)
    }

    pub(crate) fn offset(self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_LIMIT)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_limit: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page(),
            page_limit: request.page_limit(),
            total,
        }
    }

    /// Number of the last page, at least 1.
    #[must_use]
    pub fn last_page(&self) -> u64 {
        self.total
            .div_ceil(u64::from(self.page_limit.max(1)))
            .max(1)
    }
}

/// A sort field backed by a table column.
pub(crate) trait SortColumn: SortField {
    fn column(self) -> &'static str;
}

/// Append `ORDER BY` for the resolved sorts, ending on `tiebreak` so paging is stable.
///
/// The tiebreak follows the direction of the first sort, descending when there is none.
pub(crate) fn push_order_by<F: SortColumn>(
    builder: &mut QueryBuilder<'_, Postgres>,
    sorts: &[Sort<F>],
    tiebreak: &'static str,
) {
    let direction = sorts
        .first()
        .map_or(SortDirection::Desc, |sort| sort.direction);

    builder.push(" ORDER BY ");

    for sort in sorts {
        builder
            .push(sort.field.column())
            .push(" ")
            .push(sort.direction.as_sql())
            .push(", ");
    }

    builder.push(tiebreak).push(" ").push(direction.as_sql());
}

/// Append `LIMIT`/`OFFSET` for a page.
pub(crate) fn push_page(builder: &mut QueryBuilder<'_, Postgres>, request: PageRequest) {
    builder
        .push(" LIMIT ")
        .push_bind(request.limit())
        .push(" OFFSET ")
        .push_bind(request.offset());
}
