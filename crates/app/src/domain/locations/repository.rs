//! Locations Repository

use smallvec::SmallVec;
use sqlx::{Postgres, Transaction, query, query_scalar};
use tracing::debug;
use uuid::Uuid;

use super::{Locationable, records::LocationUuid};

const CREATE_LOCATIONABLES_SQL: &str = include_str!("sql/create_locationables.sql");
const DELETE_LOCATIONABLES_SQL: &str = include_str!("sql/delete_locationables.sql");
const LIST_LOCATIONABLE_LOCATIONS_SQL: &str =
    include_str!("sql/list_locationable_locations.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgLocationsRepository;

impl PgLocationsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Replace the locations `locationable` is scoped to.
    #[tracing::instrument(
        name = "locations.repository.sync_locations",
        skip(self, tx, locationable, locations),
        fields(
            locationable_uuid = %Into::<Uuid>::into(locationable),
            locationable_type = tracing::field::Empty,
            location_count = tracing::field::Empty
        ),
        err
    )]
    pub(crate) async fn sync_locations<T>(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        locationable: T,
        locations: &[LocationUuid],
    ) -> Result<(), sqlx::Error>
    where
        T: Locationable + Copy + Into<Uuid>,
    {
        let location_count = locations.len();

        tracing::Span::current().record("locationable_type", T::type_as_str());
        tracing::Span::current().record("location_count", location_count);

        self.delete_locationables(tx, &[locationable]).await?;

        if locations.is_empty() {
            return Ok(());
        }

        let location_uuids: Vec<Uuid> = locations.iter().copied().map(Into::into).collect();

        query(CREATE_LOCATIONABLES_SQL)
            .bind(&location_uuids)
            .bind(T::type_as_str())
            .bind(Into::<Uuid>::into(locationable))
            .execute(&mut **tx)
            .await?;

        debug!(
            location_count,
            locationable_type = T::type_as_str(),
            "synced locations"
        );

        Ok(())
    }

    #[tracing::instrument(
        name = "locations.repository.delete_locationables",
        skip(self, tx, locationables),
        fields(
            locationable_type = tracing::field::Empty,
            locationable_count = tracing::field::Empty
        ),
        err
    )]
    pub(crate) async fn delete_locationables<T>(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        locationables: &[T],
    ) -> Result<u64, sqlx::Error>
    where
        T: Locationable + Copy + Into<Uuid>,
    {
        let locationable_count = locationables.len();

        tracing::Span::current().record("locationable_type", T::type_as_str());
        tracing::Span::current().record("locationable_count", locationable_count);

        if locationables.is_empty() {
            return Ok(0);
        }

        let uuids: Vec<Uuid> = locationables.iter().copied().map(Into::into).collect();

        let rows_affected = query(DELETE_LOCATIONABLES_SQL)
            .bind(T::type_as_str())
            .bind(&uuids)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        debug!(
            locationable_type = T::type_as_str(),
            locationable_count, rows_affected, "deleted locationables"
        );

        Ok(rows_affected)
    }

    pub(crate) async fn list_locations<T>(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        locationable: T,
    ) -> Result<SmallVec<[LocationUuid; 4]>, sqlx::Error>
    where
        T: Locationable + Copy + Into<Uuid>,
    {
        let uuids = query_scalar::<Postgres, Uuid>(LIST_LOCATIONABLE_LOCATIONS_SQL)
            .bind(T::type_as_str())
            .bind(Into::<Uuid>::into(locationable))
            .fetch_all(&mut **tx)
            .await?;

        Ok(uuids.into_iter().map(LocationUuid::from_uuid).collect())
    }
}
