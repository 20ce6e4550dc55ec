//! Rank ladders.
//!
//! A ladder is an ordered promotion chain of subjects, lowest rank first.
//! A subject holds a rank by listing it as a parent in some context set.

use perm_common::{ContextSet, SubjectRef};
use serde::{Deserialize, Serialize};

use crate::data::SubjectData;

/// Named, ordered list of ranks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankLadder {
    name: String,
    #[serde(default)]
    ranks: Vec<SubjectRef>,
}

impl RankLadder {
    /// An empty ladder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ranks: Vec::new(),
        }
    }

    /// A ladder with the given ranks, lowest first. Repeats are dropped.
    pub fn with_ranks(name: impl Into<String>, ranks: Vec<SubjectRef>) -> Self {
        ranks
            .into_iter()
            .fold(Self::new(name), |ladder, rank| ladder.with_rank(rank))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ranks, lowest first.
    #[must_use]
    pub fn ranks(&self) -> &[SubjectRef] {
        &self.ranks
    }

    #[must_use]
    pub fn index_of(&self, rank: &SubjectRef) -> Option<usize> {
        self.ranks.iter().position(|r| r == rank)
    }

    /// Put `rank` at the top of the ladder, moving it if already present.
    #[must_use]
    pub fn with_rank(&self, rank: SubjectRef) -> Self {
        let mut ranks = self.ranks.clone();
        ranks.retain(|r| *r != rank);
        ranks.push(rank);
        Self {
            name: self.name.clone(),
            ranks,
        }
    }

    /// Put `rank` at `index` (clamped to the ladder length), moving it if already present.
    #[must_use]
    pub fn with_rank_at(&self, rank: SubjectRef, index: usize) -> Self {
        let mut ranks = self.ranks.clone();
        ranks.retain(|r| *r != rank);
        let index = index.min(ranks.len());
        ranks.insert(index, rank);
        Self {
            name: self.name.clone(),
            ranks,
        }
    }

    #[must_use]
    pub fn without_rank(&self, rank: &SubjectRef) -> Self {
        let mut ranks = self.ranks.clone();
        ranks.retain(|r| r != rank);
        Self {
            name: self.name.clone(),
            ranks,
        }
    }

    /// Whether `data` holds any rank of this ladder under `contexts`.
    #[must_use]
    pub fn is_on_ladder(&self, data: &SubjectData, contexts: &ContextSet) -> bool {
        self.highest_held(data, contexts).is_some()
    }

    /// Move `data` one rank up.
    ///
    /// A subject holding no rank gets the lowest one. The highest held rank
    /// is replaced in place by the next one; at the top nothing changes.
    #[must_use]
    pub fn promote(&self, data: &SubjectData, contexts: &ContextSet) -> SubjectData {
        match self.highest_held(data, contexts) {
            None => match self.ranks.first() {
                Some(lowest) => data.add_parent(contexts, lowest.clone()),
                None => data.clone(),
            },
            Some(idx) if idx + 1 < self.ranks.len() => {
                self.replace_rank(data, contexts, idx, Some(&self.ranks[idx + 1]))
            }
            Some(_) => data.clone(),
        }
    }

    /// Move `data` one rank down, dropping off the ladder from the bottom rank.
    #[must_use]
    pub fn demote(&self, data: &SubjectData, contexts: &ContextSet) -> SubjectData {
        match self.highest_held(data, contexts) {
            None => data.clone(),
            Some(0) => self.replace_rank(data, contexts, 0, None),
            Some(idx) => self.replace_rank(data, contexts, idx, Some(&self.ranks[idx - 1])),
        }
    }

    fn highest_held(&self, data: &SubjectData, contexts: &ContextSet) -> Option<usize> {
        data.parents(contexts)
            .iter()
            .filter_map(|parent| self.index_of(parent))
            .max()
    }

    fn replace_rank(
        &self,
        data: &SubjectData,
        contexts: &ContextSet,
        idx: usize,
        replacement: Option<&SubjectRef>,
    ) -> SubjectData {
        let current = &self.ranks[idx];
        let parents = data
            .parents(contexts)
            .iter()
            .filter_map(|parent| {
                if parent == current {
                    replacement.cloned()
                } else {
                    Some(parent.clone())
                }
            })
            .collect();
        data.with_parents(contexts, parents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(s: &str) -> SubjectRef {
        s.parse().unwrap()
    }

    fn staff() -> RankLadder {
        RankLadder::with_ranks(
            "staff",
            vec![
                subject("group:helper"),
                subject("group:mod"),
                subject("group:admin"),
            ],
        )
    }

    #[test]
    fn test_with_rank_moves_existing_to_top() {
        let ladder = staff().with_rank(subject("group:helper"));
        assert_eq!(ladder.index_of(&subject("group:helper")), Some(2));
        assert_eq!(ladder.ranks().len(), 3);
    }

    #[test]
    fn test_with_rank_at_clamps() {
        let ladder = staff().with_rank_at(subject("group:owner"), 99);
        assert_eq!(ladder.index_of(&subject("group:owner")), Some(3));

        let ladder = staff().with_rank_at(subject("group:guest"), 0);
        assert_eq!(ladder.index_of(&subject("group:guest")), Some(0));
    }

    #[test]
    fn test_without_rank() {
        let ladder = staff().without_rank(&subject("group:mod"));
        assert_eq!(ladder.index_of(&subject("group:mod")), None);
        assert_eq!(ladder.index_of(&subject("group:admin")), Some(1));
    }

    #[test]
    fn test_promote_from_nothing_adds_lowest() {
        let global = ContextSet::empty();
        let data = staff().promote(&SubjectData::empty(), &global);

        assert_eq!(data.parents(&global), &[subject("group:helper")]);
        assert!(staff().is_on_ladder(&data, &global));
    }

    #[test]
    fn test_promote_replaces_in_place() {
        let global = ContextSet::empty();
        let data = SubjectData::empty().with_parents(
            &global,
            vec![subject("group:vip"), subject("group:helper")],
        );

        let data = staff().promote(&data, &global);
        assert_eq!(
            data.parents(&global),
            &[subject("group:vip"), subject("group:mod")]
        );
    }

    #[test]
    fn test_promote_at_top_is_noop() {
        let global = ContextSet::empty();
        let data = SubjectData::empty().add_parent(&global, subject("group:admin"));

        assert_eq!(staff().promote(&data, &global), data);
    }

    #[test]
    fn test_demote_walks_down_and_off() {
        let global = ContextSet::empty();
        let data = SubjectData::empty().add_parent(&global, subject("group:mod"));

        let data = staff().demote(&data, &global);
        assert_eq!(data.parents(&global), &[subject("group:helper")]);

        let data = staff().demote(&data, &global);
        assert!(data.parents(&global).is_empty());
        assert!(!staff().is_on_ladder(&data, &global));
    }

    #[test]
    fn test_ladder_is_per_context() {
        let global = ContextSet::empty();
        let nether = ContextSet::parse(["world=nether"]).unwrap();
        let data = SubjectData::empty().add_parent(&nether, subject("group:admin"));

        assert!(!staff().is_on_ladder(&data, &global));
        let promoted = staff().promote(&data, &global);
        assert_eq!(promoted.parents(&global), &[subject("group:helper")]);
        assert_eq!(promoted.parents(&nether), &[subject("group:admin")]);
    }

    #[test]
    fn test_empty_ladder_promote_is_noop() {
        let global = ContextSet::empty();
        let ladder = RankLadder::new("empty");
        assert_eq!(
            ladder.promote(&SubjectData::empty(), &global),
            SubjectData::empty()
        );
    }
}
