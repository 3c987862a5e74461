//! Error types for strict map lookups.

use thiserror::Error;

/// Errors returned by strict accessors such as
/// [`PersistentHamt::try_get`](crate::PersistentHamt::try_get).
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum HamtError {
    /// The key is not present in the map.
    #[error("key not found: {key}")]
    NotFound { key: String },
}

impl HamtError {
    pub(crate) fn not_found(key: &(impl std::fmt::Debug + ?Sized)) -> Self {
        Self::NotFound {
            key: format!("{key:?}"),
        }
    }
}

/// Convenience type alias for strict map operations.
pub type Result<T> = std::result::Result<T, HamtError>;
