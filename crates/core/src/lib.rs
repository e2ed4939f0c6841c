//! Coupons
//!
//! Coupons is the rules engine behind code-based discounts: it decides whether a coupon may be
//! applied to an order at a given moment, and renders the discount it grants. It performs no I/O;
//! redemption counts and location scopes are supplied by the caller.

pub mod coupon;
pub mod discount;
pub mod eligibility;
pub mod limits;
pub mod prelude;
pub mod restrictions;
pub mod sorting;
pub mod validity;
