//! Coupons prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    coupon::Coupon,
    discount::{Discount, DiscountKind, ParseDiscountKindError},
    eligibility::{Ineligible, LocationMatch, OrderDetails, Usage, is_outside_locations},
    limits::RedemptionLimits,
    restrictions::{OrderType, OrderTypes, ParseOrderTypeError},
    sorting::{Sort, SortDirection, SortField, parse_sorts},
    validity::{
        ParseValidityKindError, Validity, ValidityKind, WeekdayIndexError, Weekdays,
    },
};
