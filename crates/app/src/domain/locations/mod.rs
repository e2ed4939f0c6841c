//! Locations

mod locationable;
pub mod records;
mod repository;

pub(crate) use locationable::Locationable;
pub(crate) use repository::PgLocationsRepository;
