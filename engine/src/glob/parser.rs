//! Recursive-descent pattern parser.

use std::iter::Peekable;
use std::str::CharIndices;

use super::error::GlobParseError;
use super::node::{chars, literal, or, seq, GlobNode};

/// How a sequence ended.
enum Terminator {
    /// End of input.
    End,
    /// `,` inside an alternation.
    Comma,
    /// `}` closing an alternation.
    Close,
}

struct Parser<'a> {
    chars: Peekable<CharIndices<'a>>,
}

/// Parse a pattern expression.
///
/// # Examples
///
/// ```
/// use perm_engine::glob::{self, chars, literal, or};
///
/// assert_eq!(glob::parse("some.node.here").unwrap(), literal("some.node.here"));
/// assert_eq!(glob::parse("{a,b}").unwrap(), or(["a", "b"]));
/// assert_eq!(glob::parse("[hbc]").unwrap(), chars("hbc"));
/// ```
pub fn parse(input: &str) -> Result<GlobNode, GlobParseError> {
    let mut parser = Parser {
        chars: input.char_indices().peekable(),
    };
    let (node, _) = parser.sequence(0)?;
    Ok(node)
}

impl Parser<'_> {
    /// Parse until end of input or, when nested, until `,` / `}`.
    fn sequence(&mut self, depth: usize) -> Result<(GlobNode, Terminator), GlobParseError> {
        let mut parts = Vec::new();
        let mut run = String::new();

        while let Some((pos, c)) = self.chars.next() {
            match c {
                '\\' => match self.chars.next() {
                    Some((_, escaped)) => run.push(escaped),
                    None => return Err(GlobParseError::DanglingEscape { position: pos }),
                },
                '{' => {
                    parts.push(literal(std::mem::take(&mut run)));
                    parts.push(self.alternation(pos, depth + 1)?);
                }
                '[' => {
                    parts.push(literal(std::mem::take(&mut run)));
                    parts.push(self.char_class(pos)?);
                }
                ',' if depth > 0 => {
                    parts.push(literal(run));
                    return Ok((seq(parts), Terminator::Comma));
                }
                '}' if depth > 0 => {
                    parts.push(literal(run));
                    return Ok((seq(parts), Terminator::Close));
                }
                '}' => return Err(GlobParseError::UnexpectedClose { position: pos }),
                other => run.push(other),
            }
        }

        parts.push(literal(run));
        Ok((seq(parts), Terminator::End))
    }

    /// Parse the branches of `{...}`; the opening brace is already consumed.
    fn alternation(&mut self, open: usize, depth: usize) -> Result<GlobNode, GlobParseError> {
        let mut options = Vec::new();
        loop {
            let (branch, terminator) = self.sequence(depth)?;
            options.push(branch);
            match terminator {
                Terminator::Comma => {}
                Terminator::Close => return Ok(or(options)),
                Terminator::End => {
                    return Err(GlobParseError::UnterminatedAlternation { position: open })
                }
            }
        }
    }

    /// Parse the characters of `[...]`; the opening bracket is already consumed.
    fn char_class(&mut self, open: usize) -> Result<GlobNode, GlobParseError> {
        let mut set = String::new();
        while let Some((pos, c)) = self.chars.next() {
            match c {
                ']' if set.is_empty() => {
                    return Err(GlobParseError::EmptyCharClass { position: open })
                }
                ']' => return Ok(chars(&set)),
                '\\' => match self.chars.next() {
                    Some((_, escaped)) => set.push(escaped),
                    None => return Err(GlobParseError::DanglingEscape { position: pos }),
                },
                other => set.push(other),
            }
        }
        Err(GlobParseError::UnterminatedCharClass { position: open })
    }
}
