//! In-memory backing store.
//!
//! Values are kept as serialized JSON so decoding failures surface exactly
//! as they would from a persistent backend.

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use perm_common::SubjectRef;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::LoadFailure;
use super::store::DataStore;
use super::subject_data::SubjectData;
use crate::ladder::RankLadder;

/// Concurrent in-memory [`DataStore`].
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    subjects: DashMap<SubjectRef, String>,
    ladders: DashMap<String, String>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw JSON for a subject, bypassing serialization.
    pub fn insert_raw(&self, subject: SubjectRef, json: impl Into<String>) {
        self.subjects.insert(subject, json.into());
    }

    /// Store raw JSON for a ladder, bypassing serialization.
    pub fn insert_raw_ladder(&self, name: impl Into<String>, json: impl Into<String>) {
        self.ladders.insert(name.into(), json.into());
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<String, LoadFailure> {
    serde_json::to_string(value).map_err(|e| LoadFailure::Malformed {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(key: &str, json: &str) -> Result<T, LoadFailure> {
    serde_json::from_str(json).map_err(|e| LoadFailure::Malformed {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

impl DataStore for MemoryDataStore {
    fn get_data<'a>(
        &'a self,
        subject: &'a SubjectRef,
    ) -> BoxFuture<'a, Result<Option<SubjectData>, LoadFailure>> {
        async move {
            let Some(json) = self.subjects.get(subject).map(|v| v.clone()) else {
                return Ok(None);
            };
            let key = subject.to_string();
            let data: SubjectData = decode(&key, &json)?;
            data.validate(&key).map(Some)
        }
        .boxed()
    }

    fn set_data<'a>(
        &'a self,
        subject: &'a SubjectRef,
        data: Option<&'a SubjectData>,
    ) -> BoxFuture<'a, Result<(), LoadFailure>> {
        async move {
            match data {
                Some(data) => {
                    let json = encode(&subject.to_string(), data)?;
                    self.subjects.insert(subject.clone(), json);
                }
                None => {
                    self.subjects.remove(subject);
                }
            }
            Ok(())
        }
        .boxed()
    }

    fn is_registered<'a>(
        &'a self,
        subject: &'a SubjectRef,
    ) -> BoxFuture<'a, Result<bool, LoadFailure>> {
        async move { Ok(self.subjects.contains_key(subject)) }.boxed()
    }

    fn identifiers<'a>(
        &'a self,
        subject_type: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>, LoadFailure>> {
        async move {
            let mut ids: Vec<String> = self
                .subjects
                .iter()
                .filter(|e| e.key().subject_type() == subject_type)
                .map(|e| e.key().identifier().to_string())
                .collect();
            ids.sort();
            Ok(ids)
        }
        .boxed()
    }

    fn get_rank_ladder<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<RankLadder>, LoadFailure>> {
        async move {
            let Some(json) = self.ladders.get(name).map(|v| v.clone()) else {
                return Ok(None);
            };
            decode(name, &json).map(Some)
        }
        .boxed()
    }

    fn set_rank_ladder<'a>(
        &'a self,
        name: &'a str,
        ladder: Option<&'a RankLadder>,
    ) -> BoxFuture<'a, Result<(), LoadFailure>> {
        async move {
            match ladder {
                Some(ladder) => {
                    let json = encode(name, ladder)?;
                    self.ladders.insert(name.to_string(), json);
                }
                None => {
                    self.ladders.remove(name);
                }
            }
            Ok(())
        }
        .boxed()
    }

    fn rank_ladders(&self) -> BoxFuture<'_, Result<Vec<String>, LoadFailure>> {
        async move {
            let mut names: Vec<String> = self.ladders.iter().map(|e| e.key().clone()).collect();
            names.sort();
            Ok(names)
        }
        .boxed()
    }
}
