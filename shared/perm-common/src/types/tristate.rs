//! Three-valued permission results.

use serde::{Deserialize, Serialize};

/// Result of a permission lookup.
///
/// `Undefined` means "no opinion" and never overrides a defined value seen
/// earlier during resolution. `True` and `False` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tristate {
    /// Explicitly granted.
    True,
    /// Explicitly denied.
    False,
    /// No value assigned.
    #[default]
    Undefined,
}

impl Tristate {
    /// Convert a boolean into a defined value.
    #[must_use]
    pub const fn from_bool(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }

    /// Convert an integer weight: positive grants, negative denies, zero is undefined.
    #[must_use]
    pub const fn from_int(value: i32) -> Self {
        if value > 0 {
            Self::True
        } else if value < 0 {
            Self::False
        } else {
            Self::Undefined
        }
    }

    /// Integer weight of this value, the inverse of [`Tristate::from_int`].
    #[must_use]
    pub const fn as_int(self) -> i32 {
        match self {
            Self::True => 1,
            Self::False => -1,
            Self::Undefined => 0,
        }
    }

    /// Whether this value carries an opinion.
    #[must_use]
    pub const fn is_defined(self) -> bool {
        !matches!(self, Self::Undefined)
    }

    /// Boolean view of this value, using `default` when undefined.
    #[must_use]
    pub const fn as_bool_or(self, default: bool) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Undefined => default,
        }
    }

    /// This value if defined, otherwise `other`.
    #[must_use]
    pub const fn or_else(self, other: Self) -> Self {
        match self {
            Self::Undefined => other,
            defined => defined,
        }
    }
}

impl From<bool> for Tristate {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl From<Option<bool>> for Tristate {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Undefined, Self::from_bool)
    }
}

impl std::fmt::Display for Tristate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::True => f.write_str("true"),
            Self::False => f.write_str("false"),
            Self::Undefined => f.write_str("undefined"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_int_sign() {
        assert_eq!(Tristate::from_int(5), Tristate::True);
        assert_eq!(Tristate::from_int(-2), Tristate::False);
        assert_eq!(Tristate::from_int(0), Tristate::Undefined);
    }

    #[test]
    fn test_or_else_keeps_defined_value() {
        assert_eq!(Tristate::False.or_else(Tristate::True), Tristate::False);
        assert_eq!(Tristate::Undefined.or_else(Tristate::True), Tristate::True);
        assert_eq!(
            Tristate::Undefined.or_else(Tristate::Undefined),
            Tristate::Undefined
        );
    }

    #[test]
    fn test_as_bool_or_default() {
        assert!(Tristate::True.as_bool_or(false));
        assert!(!Tristate::False.as_bool_or(true));
        assert!(Tristate::Undefined.as_bool_or(true));
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Tristate::Undefined).unwrap();
        assert_eq!(json, "\"undefined\"");
        let back: Tristate = serde_json::from_str("\"false\"").unwrap();
        assert_eq!(back, Tristate::False);
    }
}
