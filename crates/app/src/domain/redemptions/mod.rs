//! Redemptions
//!
//! The ledger of coupon uses. Entries are only ever inserted; afterwards just their status
//! changes.

pub mod data;
pub mod errors;
pub mod hooks;
pub mod records;
pub(crate) mod repository;
pub mod service;

pub use errors::RedemptionsServiceError;
pub use hooks::{HookDecision, RedemptionHook};
pub use service::*;
