//! Context Types
//!
//! A context scopes a grant: a segment of subject data only applies while all
//! of its contexts are active.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single scoping tag such as `world=nether` or `server=lobby`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContextValue {
    key: String,
    value: String,
}

impl ContextValue {
    /// Create a context value. The key must not be empty.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::EmptyContextKey);
        }
        Ok(Self {
            key,
            value: value.into(),
        })
    }

    /// Context key (e.g. `world`).
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Context value (e.g. `nether`).
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl FromStr for ContextValue {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| Error::MalformedContext(s.to_string()))?;
        Self::new(key, value)
    }
}

impl TryFrom<String> for ContextValue {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ContextValue> for String {
    fn from(value: ContextValue) -> Self {
        value.to_string()
    }
}

/// Ordered set of active or required contexts.
///
/// The empty set is "unconditioned": it is a subset of every set.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextSet(BTreeSet<ContextValue>);

impl ContextSet {
    /// The empty (global) context set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Parse a list of `key=value` strings.
    pub fn parse<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        values
            .into_iter()
            .map(|v| v.as_ref().parse::<ContextValue>())
            .collect()
    }

    /// Return a copy with `value` added.
    #[must_use]
    pub fn with(&self, value: ContextValue) -> Self {
        let mut set = self.0.clone();
        set.insert(value);
        Self(set)
    }

    /// Whether every context in `self` is also in `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Whether the set contains `value`.
    #[must_use]
    pub fn contains(&self, value: &ContextValue) -> bool {
        self.0.contains(value)
    }

    /// Number of contexts in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty (global).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate contexts in order.
    pub fn iter(&self) -> impl Iterator<Item = &ContextValue> {
        self.0.iter()
    }
}

impl FromIterator<ContextValue> for ContextSet {
    fn from_iter<T: IntoIterator<Item = ContextValue>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ContextSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, ctx) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ctx}")?;
        }
        f.write_str("]")
    }
}
