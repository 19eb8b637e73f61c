//! Parse errors.
//!
//! An input that simply does not match is not an error inside the engine: it
//! shows up as missing successes and, when failures are tracked, as
//! [`Failure`](crate::Failure) records. `ParseError` covers the cases that
//! abort a parse and the driver-level verdicts that ask for exactly one
//! answer.

use thiserror::Error;

/// Result type used throughout the framework.
pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No success was found; `expected` is the rendered failure list.
    #[error("expected {expected}")]
    NoMatch { expected: String },

    #[error("ambiguous input: {count} parses ending at {positions}")]
    Ambiguous { count: usize, positions: String },

    #[error("forward reference `{name}` is used before it is bound")]
    UnboundReference { name: String },

    #[error("forward reference `{name}` is already bound")]
    AlreadyBound { name: String },

    /// Raised by a grammar that detected a broken contract.
    #[error("invariant violated in {grammar}: {message}")]
    InvariantViolation { grammar: String, message: String },

    #[error("internal engine error: {message}")]
    Internal { message: String },
}

impl ParseError {
    pub fn invariant(grammar: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            grammar: grammar.into(),
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
