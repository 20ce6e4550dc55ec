//! Pattern Parse Errors

use thiserror::Error;

/// Errors raised while parsing a pattern expression.
///
/// Positions are byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlobParseError {
    /// `{` without a matching `}`.
    #[error("Unterminated alternation starting at position {position}")]
    UnterminatedAlternation {
        /// Offset of the opening brace.
        position: usize,
    },

    /// `[` without a matching `]`.
    #[error("Unterminated character class starting at position {position}")]
    UnterminatedCharClass {
        /// Offset of the opening bracket.
        position: usize,
    },

    /// `[]` with nothing inside.
    #[error("Empty character class at position {position}")]
    EmptyCharClass {
        /// Offset of the opening bracket.
        position: usize,
    },

    /// `\` at the end of the input.
    #[error("Dangling escape at position {position}")]
    DanglingEscape {
        /// Offset of the backslash.
        position: usize,
    },

    /// `}` outside of any alternation.
    #[error("Unexpected '}}' at position {position}")]
    UnexpectedClose {
        /// Offset of the closing brace.
        position: usize,
    },
}
