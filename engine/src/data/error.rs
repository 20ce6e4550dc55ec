//! Backing Store Errors

use thiserror::Error;

/// Failure to load or persist data through a [`DataStore`](super::DataStore).
///
/// `Clone` so a single failed load can be handed to every waiter sharing it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadFailure {
    /// The backend could not be reached or the I/O failed.
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// Data was present but could not be decoded or violated an invariant.
    #[error("Malformed data for {key}: {reason}")]
    Malformed {
        /// Subject or ladder the data belongs to.
        key: String,
        /// What was wrong with it.
        reason: String,
    },
}
