//! Location Records

use crate::uuids::TypedUuid;

/// Location reference. Locations are owned elsewhere.
#[derive(Debug)]
pub struct Location;

/// Location UUID
pub type LocationUuid = TypedUuid<Location>;
