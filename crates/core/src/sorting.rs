//! Listing Sort Orders
//!
//! Listings accept sort keys such as `"date_used desc"`. Only keys on the listing's allow-list are
//! honoured; anything else is dropped without error.

use std::fmt;

use smallvec::SmallVec;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    /// Ascending.
    Asc,

    /// Descending.
    Desc,
}

impl SortDirection {
    /// SQL keyword for the direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

/// A field a listing can be sorted by.
pub trait SortField: Copy + fmt::Debug + 'static {
    /// Accepted sort keys and what they resolve to.
    const ALLOWED: &'static [(&'static str, Self, SortDirection)];
}

/// A resolved sort instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<F> {
    /// Field to sort by.
    pub field: F,

    /// Direction to sort in.
    pub direction: SortDirection,
}

impl<F: SortField> Sort<F> {
    /// Resolve a single key against the allow-list.
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();

        F::ALLOWED
            .iter()
            .find(|(allowed, _, _)| *allowed == key)
            .map(|(_, field, direction)| Self {
                field: *field,
                direction: *direction,
            })
    }
}

/// Resolve keys in order, dropping the ones that are not allowed.
pub fn parse_sorts<F, S>(keys: &[S]) -> SmallVec<[Sort<F>; 2]>
where
    F: SortField,
    S: AsRef<str>,
{
    keys.iter()
        .filter_map(|key| Sort::parse(key.as_ref()))
        .collect()
}
