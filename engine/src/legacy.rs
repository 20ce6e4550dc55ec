//! Legacy permission conversion.
//!
//! Older permission data used regex-flavoured wildcards: a trailing `.*`
//! meant "this node and everything below" and `(a|b)` groups listed
//! alternatives. Trees already apply a node's value to all of its
//! descendants, so the suffix is dropped and groups become brace
//! alternations.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use perm_common::Tristate;
use regex::{Captures, Regex};

use crate::glob::{self, GlobParseError};

/// A balanced `(a|b|c)` group containing at least one `|`.
static LEGACY_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^()|]*(?:\|[^()|]*)+)\)").expect("valid regex"));

/// Convert one legacy permission string into pattern syntax.
///
/// Unbalanced or otherwise unrecognised input passes through unchanged apart
/// from the `.*` suffix, e.g. `a.(b.*` becomes `a.(b`.
///
/// # Examples
///
/// ```
/// use perm_engine::legacy::convert_legacy_permission;
///
/// assert_eq!(convert_legacy_permission("permissions.*"), "permissions");
/// assert_eq!(
///     convert_legacy_permission("worldedit.navigation.(jumpto|thru).*"),
///     "worldedit.navigation.{jumpto,thru}"
/// );
/// ```
pub fn convert_legacy_permission(permission: &str) -> String {
    if permission == "*" {
        return String::new();
    }
    let converted = LEGACY_GROUP.replace_all(permission, |caps: &Captures<'_>| {
        format!("{{{}}}", caps[1].replace('|', ","))
    });
    if let Some(stripped) = converted.strip_suffix(".*") {
        return stripped.to_string();
    }
    converted.into_owned()
}

/// Import a legacy permission list into a `permission -> value` map.
///
/// A leading `-` marks a denied entry. Every entry is converted, parsed as a
/// pattern and expanded; later entries override earlier ones for the same
/// permission.
pub fn import_legacy_permissions<I, S>(
    entries: I,
) -> Result<BTreeMap<String, Tristate>, GlobParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut permissions = BTreeMap::new();
    for entry in entries {
        let entry = entry.as_ref().trim();
        let (raw, value) = match entry.strip_prefix('-') {
            Some(rest) => (rest, Tristate::False),
            None => (entry, Tristate::True),
        };
        let pattern = glob::parse(&convert_legacy_permission(raw))?;
        for permission in &pattern {
            permissions.insert(permission, value);
        }
    }
    Ok(permissions)
}
