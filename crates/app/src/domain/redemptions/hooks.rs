//! Redemption Hooks
//!
//! Hooks run, in registration order, before a history entry is written. Any hook can veto the
//! entry.

use mockall::automock;

use crate::domain::{
    coupons::records::CouponRecord, orders::OrderContext,
    redemptions::data::PendingRedemption,
};

/// Whether a pending history entry may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDecision {
    Allow,
    Deny,
}

#[automock]
pub trait RedemptionHook: Send + Sync {
    /// Inspect an entry before it is written.
    fn before_add_history(
        &self,
        redemption: &PendingRedemption,
        coupon: &CouponRecord,
        order: &OrderContext,
    ) -> HookDecision;
}

impl<F> RedemptionHook for F
where
    F: Fn(&PendingRedemption, &CouponRecord, &OrderContext) -> HookDecision + Send + Sync,
{
    fn before_add_history(
        &self,
        redemption: &PendingRedemption,
        coupon: &CouponRecord,
        order: &OrderContext,
    ) -> HookDecision {
        self(redemption, coupon, order)
    }
}
