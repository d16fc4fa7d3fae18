//! Report error types.

use ledgerfmt_core::AmountError;
use ledgerfmt_expr::{EvalError, ParseError};
use std::io;
use std::ops::Range;
use thiserror::Error;

/// Error returned when compiling a format string fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("format error at position {}: {kind}", .span.start)]
pub struct FormatError {
    /// The kind of error.
    pub kind: FormatErrorKind,
    /// Byte range of the offending directive in the format string.
    pub span: Range<usize>,
}

/// The kind of format error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatErrorKind {
    /// A `%(` or `%[` directive is not closed.
    #[error("missing '{0}'")]
    MissingDelimiter(char),
    /// A directive character that names no field.
    #[error("unknown directive '%{0}'")]
    UnknownDirective(char),
    /// The format string ends in the middle of a directive.
    #[error("incomplete directive at end of format")]
    IncompleteDirective,
    /// A field width at or above the supported maximum.
    #[error("field width {0} is too large (maximum is 255)")]
    WidthTooLarge(usize),
    /// A `%[...]` pattern chrono cannot format with.
    #[error("invalid date pattern '{0}'")]
    InvalidDatePattern(String),
    /// The expression inside `%(...)` does not parse.
    #[error("{}", .0.kind)]
    Expression(ParseError),
}

impl FormatError {
    /// Create a new format error.
    pub const fn new(kind: FormatErrorKind, span: Range<usize>) -> Self {
        Self { kind, span }
    }

    /// Byte offset where the error starts.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.span.start
    }
}

/// Error returned while rendering rows.
#[derive(Debug, Error)]
pub enum RenderError {
    /// `%t` or account summation needs a value expression and none is set.
    #[error("no value expression is configured")]
    MissingValueExpression,
    /// `%T` needs a total expression and none is set.
    #[error("no total expression is configured")]
    MissingTotalExpression,
    /// A value or total expression produced something that is not a number.
    #[error("expected a numeric value, got {0}")]
    NonNumeric(&'static str),
    /// Evaluating an embedded expression failed.
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
    /// Arithmetic failure (for example a unit cost over a zero amount).
    #[error(transparent)]
    Amount(#[from] AmountError),
    /// Writing to the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Error returned when report options do not compile.
#[derive(Debug, Error)]
pub enum OptionsError {
    /// One of the format strings is invalid.
    #[error("invalid {option}: {source}")]
    Format {
        /// Which option held the format.
        option: &'static str,
        /// The compile error.
        source: FormatError,
    },
    /// One of the expressions is invalid.
    #[error("invalid {option}: {source}")]
    Expression {
        /// Which option held the expression.
        option: &'static str,
        /// The parse error.
        source: ParseError,
    },
}

/// Error returned by the report entry points.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The options did not compile.
    #[error(transparent)]
    Options(#[from] OptionsError),
    /// Rendering failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}
