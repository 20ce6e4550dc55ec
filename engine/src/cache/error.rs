//! Cache Errors

use thiserror::Error;

use crate::data::LoadFailure;

/// Errors surfaced by the subject and rank ladder caches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The identifier cannot name a subject. Raised before any backend work.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] perm_common::Error),

    /// Rank ladder names must not be empty.
    #[error("Rank ladder name must not be empty")]
    EmptyLadderName,

    /// The backing store failed to load or persist.
    #[error(transparent)]
    Load(#[from] LoadFailure),
}

impl CacheError {
    /// Whether retrying later could succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Load(LoadFailure::Unreachable(_)))
    }
}
