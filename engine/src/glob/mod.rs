//! Brace/bracket permission patterns.
//!
//! A pattern describes a finite, ordered set of literal strings:
//!
//! ```text
//! pattern := ( literal | "{" pattern ( "," pattern )* "}" | "[" chars "]" | "\" any )*
//! ```
//!
//! `{a,b}` alternates between sub-patterns, `[abc]` between single
//! characters, and `\x` takes `x` literally. There is no repetition or
//! wildcard operator, so every pattern expands to a finite list.

pub mod error;
mod node;
mod parser;

pub use error::GlobParseError;
pub use node::{chars, literal, or, seq, GlobIter, GlobNode};
pub use parser::parse;
