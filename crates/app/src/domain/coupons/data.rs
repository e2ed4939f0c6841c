//! Coupons Data

use coupons::{
    coupon::Coupon,
    eligibility::Ineligible,
    sorting::{SortDirection, SortField},
};

use crate::domain::{
    coupons::records::{CategoryUuid, CouponUuid, MenuUuid},
    listing::{PageRequest, SortColumn},
};

/// New Coupon Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewCoupon {
    pub uuid: CouponUuid,
    pub name: String,
    pub description: Option<String>,
    pub rules: Coupon,
}

/// Coupon Update Data
#[derive(Debug, Clone, PartialEq)]
pub struct CouponUpdate {
    pub name: String,
    pub description: Option<String>,
    pub rules: Coupon,
}

/// Coupon listing filters.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponListOptions {
    pub page: PageRequest,

    /// Sort keys such as `"name asc"`; unknown keys are ignored.
    pub sort: Vec<String>,

    /// Only coupons scoped to this category.
    pub category: Option<CategoryUuid>,

    /// Only coupons scoped to this menu item.
    pub menu: Option<MenuUuid>,

    pub auto_apply_only: bool,
}

impl Default for CouponListOptions {
    fn default() -> Self {
        Self {
            page: PageRequest::default(),
            sort: vec!["coupon_id desc".to_string()],
            category: None,
            menu: None,
            auto_apply_only: false,
        }
    }
}

/// Fields coupon listings can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponSortField {
    Name,
    Id,
    Code,
}

impl SortField for CouponSortField {
    const ALLOWED: &'static [(&'static str, Self, SortDirection)] = &[
        ("name desc", Self::Name, SortDirection::Desc),
        ("name asc", Self::Name, SortDirection::Asc),
        ("coupon_id desc", Self::Id, SortDirection::Desc),
        ("coupon_id asc", Self::Id, SortDirection::Asc),
        ("code desc", Self::Code, SortDirection::Desc),
        ("code asc", Self::Code, SortDirection::Asc),
    ];
}

impl SortColumn for CouponSortField {
    fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Id => "uuid",
            Self::Code => "code",
        }
    }
}

/// Outcome of checking a coupon against an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Ineligible(Ineligible),
}

impl Eligibility {
    #[must_use]
    pub const fn is_eligible(self) -> bool {
        matches!(self, Self::Eligible)
    }
}

impl From<Result<(), Ineligible>> for Eligibility {
    fn from(result: Result<(), Ineligible>) -> Self {
        match result {
            Ok(()) => Self::Eligible,
            Err(reason) => Self::Ineligible(reason),
        }
    }
}
