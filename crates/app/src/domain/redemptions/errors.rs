//! Redemptions service errors.

use coupons::eligibility::Ineligible;
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RedemptionsServiceError {
    #[error("redemption not found")]
    NotFound,

    #[error("coupon not found")]
    InvalidReference,

    #[error("redemption vetoed by hook")]
    Vetoed,

    #[error("coupon cannot be redeemed: {0}")]
    Ineligible(#[from] Ineligible),

    #[error("redemption violates a constraint")]
    ConstraintViolation,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for RedemptionsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(
                ErrorKind::UniqueViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation,
            ) => Self::ConstraintViolation,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

/// Map a failed coupon lookup to a dangling reference.
pub(crate) fn coupon_reference(error: Error) -> RedemptionsServiceError {
    match error {
        Error::RowNotFound => RedemptionsServiceError::InvalidReference,
        error => error.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_coupon_is_an_invalid_reference() {
        assert!(matches!(
            coupon_reference(Error::RowNotFound),
            RedemptionsServiceError::InvalidReference
        ));
        assert!(matches!(
            RedemptionsServiceError::from(Error::RowNotFound),
            RedemptionsServiceError::NotFound
        ));
    }

    #[test]
    fn ineligible_reason_is_shown() {
        let error = RedemptionsServiceError::from(Ineligible::MaxRedemptionsReached);

        assert_eq!(
            error.to_string(),
            "coupon cannot be redeemed: coupon has reached its maximum redemptions"
        );
    }
}
