//! Locationable

use crate::uuids::TypedUuid;

/// An entity that can be scoped to locations.
pub(crate) trait Locationable {
    fn type_as_str() -> &'static str;
}

impl<T> Locationable for TypedUuid<T>
where
    T: Locationable,
{
    fn type_as_str() -> &'static str {
        T::type_as_str()
    }
}
