//! Pattern tree and expansion.

use std::fmt;
use std::str::FromStr;

use super::error::GlobParseError;

/// Characters that must be escaped to appear literally in a pattern.
const SPECIAL: &[char] = &['{', '}', '[', ']', ',', '\\'];

/// A parsed pattern.
///
/// Values built through [`literal`], [`seq`], [`or`], [`chars`] or
/// [`parse`](super::parse) are normalized: sequences never nest, adjacent
/// literals are merged and single-element groups collapse to their element.
/// Equality compares that normalized shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GlobNode {
    /// A literal run of characters.
    Literal(String),
    /// Concatenation of parts.
    Sequence(Vec<GlobNode>),
    /// Choice between branches, in source order.
    Alternation(Vec<GlobNode>),
}

/// A literal node.
pub fn literal(value: impl Into<String>) -> GlobNode {
    GlobNode::Literal(value.into())
}

/// A normalized sequence of parts.
pub fn seq<I, N>(parts: I) -> GlobNode
where
    I: IntoIterator<Item = N>,
    N: Into<GlobNode>,
{
    let mut out = Vec::new();
    for part in parts {
        push_part(&mut out, part.into());
    }
    match out.len() {
        0 => GlobNode::Literal(String::new()),
        1 => out.remove(0),
        _ => GlobNode::Sequence(out),
    }
}

/// An alternation between branches.
pub fn or<I, N>(options: I) -> GlobNode
where
    I: IntoIterator<Item = N>,
    N: Into<GlobNode>,
{
    let mut options: Vec<GlobNode> = options.into_iter().map(Into::into).collect();
    if options.len() == 1 {
        options.remove(0)
    } else {
        GlobNode::Alternation(options)
    }
}

/// An alternation between the single characters of `set`.
pub fn chars(set: &str) -> GlobNode {
    or(set.chars().map(|c| GlobNode::Literal(c.to_string())))
}

fn push_part(out: &mut Vec<GlobNode>, node: GlobNode) {
    match node {
        GlobNode::Literal(value) if value.is_empty() => {}
        GlobNode::Literal(value) => {
            if let Some(GlobNode::Literal(prev)) = out.last_mut() {
                prev.push_str(&value);
            } else {
                out.push(GlobNode::Literal(value));
            }
        }
        GlobNode::Sequence(children) => {
            for child in children {
                push_part(out, child);
            }
        }
        alternation @ GlobNode::Alternation(_) => out.push(alternation),
    }
}

impl GlobNode {
    /// Lazily enumerate every string this pattern matches.
    ///
    /// Order is left to right, depth first through alternation branches in
    /// source order. Each call starts a fresh enumeration.
    pub fn iter(&self) -> GlobIter<'_> {
        GlobIter {
            inner: self.expansions(),
        }
    }

    /// Collect the expansion into a vector.
    pub fn expand(&self) -> Vec<String> {
        self.iter().collect()
    }

    fn expansions(&self) -> Box<dyn Iterator<Item = String> + '_> {
        match self {
            Self::Literal(value) => Box::new(std::iter::once(value.clone())),
            Self::Alternation(options) => Box::new(options.iter().flat_map(Self::expansions)),
            Self::Sequence(parts) => parts.iter().fold(
                Box::new(std::iter::once(String::new())) as Box<dyn Iterator<Item = String> + '_>,
                |acc, part| {
                    Box::new(acc.flat_map(move |prefix| {
                        part.expansions().map(move |suffix| {
                            let mut joined = String::with_capacity(prefix.len() + suffix.len());
                            joined.push_str(&prefix);
                            joined.push_str(&suffix);
                            joined
                        })
                    }))
                },
            ),
        }
    }

    /// Whether `input` is one of the strings this pattern expands to.
    ///
    /// Runs without enumerating the expansion.
    pub fn matches(&self, input: &str) -> bool {
        self.match_ends(input, 0).contains(&input.len())
    }

    /// Byte offsets at which a match of `self` starting at `start` can end.
    fn match_ends(&self, input: &str, start: usize) -> Vec<usize> {
        match self {
            Self::Literal(value) => {
                if input[start..].starts_with(value.as_str()) {
                    vec![start + value.len()]
                } else {
                    Vec::new()
                }
            }
            Self::Alternation(options) => {
                let mut ends = Vec::new();
                for option in options {
                    for end in option.match_ends(input, start) {
                        if !ends.contains(&end) {
                            ends.push(end);
                        }
                    }
                }
                ends
            }
            Self::Sequence(parts) => {
                let mut positions = vec![start];
                for part in parts {
                    let mut next = Vec::new();
                    for pos in positions {
                        for end in part.match_ends(input, pos) {
                            if !next.contains(&end) {
                                next.push(end);
                            }
                        }
                    }
                    if next.is_empty() {
                        return next;
                    }
                    positions = next;
                }
                positions
            }
        }
    }
}

/// Lazy iterator over a pattern's expansion.
pub struct GlobIter<'a> {
    inner: Box<dyn Iterator<Item = String> + 'a>,
}

impl Iterator for GlobIter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner.next()
    }
}

impl<'a> IntoIterator for &'a GlobNode {
    type Item = String;
    type IntoIter = GlobIter<'a>;

    fn into_iter(self) -> GlobIter<'a> {
        self.iter()
    }
}

impl From<&str> for GlobNode {
    fn from(value: &str) -> Self {
        literal(value)
    }
}

impl From<String> for GlobNode {
    fn from(value: String) -> Self {
        literal(value)
    }
}

impl FromStr for GlobNode {
    type Err = GlobParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        super::parse(s)
    }
}

/// Renders the node back to pattern syntax.
impl fmt::Display for GlobNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => {
                for c in value.chars() {
                    if SPECIAL.contains(&c) {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                Ok(())
            }
            Self::Sequence(parts) => parts.iter().try_for_each(|part| write!(f, "{part}")),
            Self::Alternation(options) => {
                f.write_str("{")?;
                for (i, option) in options.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{option}")?;
                }
                f.write_str("}")
            }
        }
    }
}
