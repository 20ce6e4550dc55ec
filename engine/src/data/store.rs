//! Backing store contract.

use futures::future::BoxFuture;
use perm_common::SubjectRef;

use super::error::LoadFailure;
use super::subject_data::SubjectData;
use crate::ladder::RankLadder;

/// Persistent storage for subject data and rank ladders.
///
/// Implementations own their timeout and retry policy; the engine only
/// distinguishes unreachable backends from malformed data.
pub trait DataStore: Send + Sync {
    /// Load a subject's data, `None` if the subject has never been stored.
    ///
    /// Decoded data need not be normalized; the cache validates it.
    fn get_data<'a>(
        &'a self,
        subject: &'a SubjectRef,
    ) -> BoxFuture<'a, Result<Option<SubjectData>, LoadFailure>>;

    /// Persist a subject's data. `None` deletes it.
    fn set_data<'a>(
        &'a self,
        subject: &'a SubjectRef,
        data: Option<&'a SubjectData>,
    ) -> BoxFuture<'a, Result<(), LoadFailure>>;

    /// Whether data is stored for `subject`.
    fn is_registered<'a>(&'a self, subject: &'a SubjectRef)
        -> BoxFuture<'a, Result<bool, LoadFailure>>;

    /// Identifiers stored for a subject type.
    fn identifiers<'a>(&'a self, subject_type: &'a str)
        -> BoxFuture<'a, Result<Vec<String>, LoadFailure>>;

    /// Load a rank ladder, `None` if it has never been stored.
    fn get_rank_ladder<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<RankLadder>, LoadFailure>>;

    /// Persist a rank ladder. `None` deletes it.
    fn set_rank_ladder<'a>(
        &'a self,
        name: &'a str,
        ladder: Option<&'a RankLadder>,
    ) -> BoxFuture<'a, Result<(), LoadFailure>>;

    /// Names of all stored rank ladders.
    fn rank_ladders(&self) -> BoxFuture<'_, Result<Vec<String>, LoadFailure>>;
}
