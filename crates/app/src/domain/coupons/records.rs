//! Coupon Records

use coupons::coupon::Coupon;
use jiff::Timestamp;

use crate::{domain::locations::Locationable, uuids::TypedUuid};

/// Coupon UUID
pub type CouponUuid = TypedUuid<CouponRecord>;

/// Coupon Record
#[derive(Debug, Clone, PartialEq)]
pub struct CouponRecord {
    pub uuid: CouponUuid,
    pub name: String,
    pub description: Option<String>,
    pub rules: Coupon,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Locationable for CouponRecord {
    fn type_as_str() -> &'static str {
        "coupon"
    }
}

/// Menu category reference. Categories are owned by the menu catalogue.
#[derive(Debug)]
pub struct Category;

/// Category UUID
pub type CategoryUuid = TypedUuid<Category>;

/// Menu item reference.
#[derive(Debug)]
pub struct Menu;

/// Menu UUID
pub type MenuUuid = TypedUuid<Menu>;
