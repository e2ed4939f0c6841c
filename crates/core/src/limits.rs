//! Redemption Limits

use serde::{Deserialize, Serialize};

/// Redemption caps for a coupon.
///
/// `None` and `Some(0)` both mean unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionLimits {
    /// Maximum redemptions across all customers.
    #[serde(default)]
    pub total: Option<u32>,

    /// Maximum redemptions by a single customer.
    #[serde(default)]
    pub per_customer: Option<u32>,
}

impl RedemptionLimits {
    /// Limits with no caps.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            total: None,
            per_customer: None,
        }
    }

    /// Limits with only a total cap.
    #[must_use]
    pub const fn with_total(total: u32) -> Self {
        Self {
            total: Some(total),
            per_customer: None,
        }
    }

    /// Limits with only a per-customer cap.
    #[must_use]
    pub const fn with_per_customer(per_customer: u32) -> Self {
        Self {
            total: None,
            per_customer: Some(per_customer),
        }
    }

    /// Whether `redemptions` has used up the total cap.
    ///
    /// A cap equal to the current count is already reached.
    #[must_use]
    pub fn total_reached(&self, redemptions: u64) -> bool {
        active_cap(self.total).is_some_and(|cap| cap <= redemptions)
    }

    /// Whether `redemptions` by one customer has gone past the per-customer cap.
    ///
    /// Unlike [`Self::total_reached`], a count equal to the cap is not yet over it.
    #[must_use]
    pub fn customer_exceeded(&self, redemptions: u64) -> bool {
        active_cap(self.per_customer).is_some_and(|cap| cap < redemptions)
    }

    /// Whether any cap is set.
    #[must_use]
    pub fn has_constraints(&self) -> bool {
        active_cap(self.total).is_some() || active_cap(self.per_customer).is_some()
    }
}

fn active_cap(cap: Option<u32>) -> Option<u64> {
    cap.filter(|cap| *cap != 0).map(u64::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_never_reached() {
        let limits = RedemptionLimits::unlimited();

        assert!(!limits.has_constraints());
        assert!(!limits.total_reached(u64::MAX));
        assert!(!limits.customer_exceeded(u64::MAX));
    }

    #[test]
    fn zero_cap_means_unlimited() {
        let limits = RedemptionLimits {
            total: Some(0),
            per_customer: Some(0),
        };

        assert!(!limits.has_constraints());
        assert!(!limits.total_reached(10));
        assert!(!limits.customer_exceeded(10));
    }

    #[test]
    fn total_cap_is_reached_at_equality() {
        let limits = RedemptionLimits::with_total(2);

        assert!(!limits.total_reached(1));
        assert!(limits.total_reached(2));
        assert!(limits.total_reached(3));
    }

    #[test]
    fn customer_cap_is_exceeded_only_past_equality() {
        let limits = RedemptionLimits::with_per_customer(1);

        assert!(!limits.customer_exceeded(0));
        assert!(!limits.customer_exceeded(1));
        assert!(limits.customer_exceeded(2));
    }
}
