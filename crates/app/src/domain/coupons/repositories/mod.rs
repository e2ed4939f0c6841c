//! Coupons Repositories

pub(crate) mod associations;
pub(crate) mod coupons;
