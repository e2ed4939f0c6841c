//! Coupons Domain Concerns

pub mod coupons;
pub mod listing;
pub mod locations;
pub mod orders;
pub mod redemptions;
