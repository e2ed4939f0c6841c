//! Coupons service errors.

use std::num::TryFromIntError;

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CouponsServiceError {
    #[error("coupon already exists")]
    AlreadyExists,

    #[error("coupon not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("redemption limit out of range")]
    InvalidLimit(#[from] TryFromIntError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CouponsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            CouponsServiceError::from(Error::RowNotFound),
            CouponsServiceError::NotFound
        ));
    }

    #[test]
    fn other_errors_are_kept_as_source() {
        assert!(matches!(
            CouponsServiceError::from(Error::PoolTimedOut),
            CouponsServiceError::Sql(Error::PoolTimedOut)
        ));
    }

    #[test]
    fn oversized_limit_is_rejected() {
        let error = i32::try_from(u32::MAX).map(|_| ());

        assert!(matches!(
            error.map_err(CouponsServiceError::from),
            Err(CouponsServiceError::InvalidLimit(_))
        ));
    }
}
