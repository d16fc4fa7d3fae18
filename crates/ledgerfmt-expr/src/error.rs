//! Expression error types.

use ledgerfmt_core::AmountError;
use thiserror::Error;

/// Error returned when parsing an expression fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at position {position}: {kind}")]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// Byte offset in the expression text where the error occurred.
    pub position: usize,
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// The expression ended where an operand or delimiter was required.
    #[error("unexpected end of expression")]
    UnexpectedEof,
    /// A token that cannot appear here.
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    /// The tokenizer could not read the input.
    #[error("{0}")]
    Lexical(String),
    /// A complete expression was followed by more input.
    #[error("unexpected '{0}' after end of expression")]
    TrailingInput(String),
    /// A `/.../` mask is not a valid regular expression.
    #[error("invalid mask: {0}")]
    InvalidMask(String),
    /// A call to a function that does not exist.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    /// Parentheses, operators or conditionals nest too deeply.
    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),
}

impl ParseError {
    /// Create a new parse error.
    pub const fn new(kind: ParseErrorKind, position: usize) -> Self {
        Self { kind, position }
    }

    /// Shift the position by `offset`, for expressions embedded in a larger text.
    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.position += offset;
        self
    }
}

/// Error returned when evaluating an expression fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The scope has no value for an identifier.
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),
    /// Type error (incompatible types in operation).
    #[error("type error: {0}")]
    Type(String),
    /// Arithmetic failure in the value model.
    #[error(transparent)]
    Amount(#[from] AmountError),
    /// A string used as a pattern is not a valid regular expression.
    #[error("invalid regular expression: {0}")]
    InvalidRegex(String),
    /// Wrong number of arguments to a built-in function.
    #[error("{function}() takes {expected} argument(s), got {found}")]
    Arity {
        /// Function name.
        function: &'static str,
        /// Number of arguments the function accepts.
        expected: usize,
        /// Number of arguments supplied.
        found: usize,
    },
}
