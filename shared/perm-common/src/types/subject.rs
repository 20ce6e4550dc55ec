//! Subject Identity

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Reference to a subject by `(type, identifier)`.
///
/// Both parts are validated non-empty on construction, so a `SubjectRef` in
/// hand is always a usable cache key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectRef {
    subject_type: String,
    identifier: String,
}

impl SubjectRef {
    /// Create a subject reference.
    pub fn new(subject_type: impl Into<String>, identifier: impl Into<String>) -> Result<Self> {
        let subject_type = subject_type.into();
        let identifier = identifier.into();
        if subject_type.is_empty() {
            return Err(Error::EmptySubjectType);
        }
        if identifier.is_empty() {
            return Err(Error::EmptyIdentifier(subject_type));
        }
        Ok(Self {
            subject_type,
            identifier,
        })
    }

    /// Subject type (e.g. `user`, `group`).
    #[must_use]
    pub fn subject_type(&self) -> &str {
        &self.subject_type
    }

    /// Identifier within the type.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subject_type, self.identifier)
    }
}

impl FromStr for SubjectRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (subject_type, identifier) = s
            .split_once(':')
            .ok_or_else(|| Error::MalformedSubject(s.to_string()))?;
        Self::new(subject_type, identifier)
    }
}

impl TryFrom<String> for SubjectRef {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SubjectRef> for String {
    fn from(value: SubjectRef) -> Self {
        value.to_string()
    }
}
