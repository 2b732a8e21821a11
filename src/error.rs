//! Error types.
//!
//! Three classes of failure exist:
//!
//! - [`ParseError`]: the expression text could not be turned into a tree. No
//!   expression is created.
//! - [`AtomError`]: a provider callback failed. At parse time it is wrapped
//!   into [`ParseError::AtomRejected`]; at evaluation time it is recovered
//!   locally (the atom counts as `0`).
//! - [`EvalError`]: a caller asked to evaluate something that was never built.

use std::fmt;
use thiserror::Error;

/// Error reported by an [`AtomProvider`](crate::AtomProvider) callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AtomError {
    message: String,
}

impl AtomError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Which operand of an operator is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Failure to build an expression tree.
///
/// Every variant carries the byte offset in the expression text where the
/// problem was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("syntax error: empty expression")]
    Empty,

    #[error("syntax error at offset {offset}: operator '{op}' is missing its {side} operand")]
    MissingOperand { offset: usize, op: &'static str, side: Side },

    #[error("syntax error at offset {offset}: empty group '()'")]
    EmptyGroup { offset: usize },

    #[error("syntax error at offset {offset}: unmatched '('")]
    UnclosedGroup { offset: usize },

    #[error("syntax error at offset {offset}: unmatched ')'")]
    UnexpectedClose { offset: usize },

    #[error("syntax error at offset {offset}: unexpected trailing input '{rest}'")]
    TrailingInput { offset: usize, rest: String },

    #[error("syntax error at offset {offset}: expression nests deeper than {limit} levels")]
    TooDeep { offset: usize, limit: usize },

    #[error("atom rejected by provider at offset {offset}: {source}")]
    AtomRejected {
        offset: usize,
        #[source]
        source: AtomError,
    },
}

impl ParseError {
    /// `true` for grammar errors, `false` when the provider refused an atom.
    pub fn is_syntax(&self) -> bool {
        !matches!(self, ParseError::AtomRejected { .. })
    }

    /// Byte offset where the error was detected.
    pub fn offset(&self) -> usize {
        match self {
            ParseError::Empty => 0,
            ParseError::MissingOperand { offset, .. }
            | ParseError::EmptyGroup { offset }
            | ParseError::UnclosedGroup { offset }
            | ParseError::UnexpectedClose { offset }
            | ParseError::TrailingInput { offset, .. }
            | ParseError::TooDeep { offset, .. }
            | ParseError::AtomRejected { offset, .. } => *offset,
        }
    }
}

/// Misuse of an expression handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The named rule has no built expression: it was never inserted, or its
    /// text failed to parse.
    #[error("rule '{rule}' has no built expression")]
    NotBuilt { rule: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_and_provider_errors_are_distinguished() {
        let syntax = ParseError::MissingOperand { offset: 3, op: "&", side: Side::Right };
        let rejected = ParseError::AtomRejected { offset: 0, source: AtomError::new("bad regexp") };

        assert!(syntax.is_syntax());
        assert!(!rejected.is_syntax());
        assert_eq!(syntax.offset(), 3);
        assert_eq!(syntax.to_string(), "syntax error at offset 3: operator '&' is missing its right operand");
        assert_eq!(rejected.to_string(), "atom rejected by provider at offset 0: bad regexp");
    }
}
