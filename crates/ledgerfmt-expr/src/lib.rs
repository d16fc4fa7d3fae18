//! Value expressions for ledgerfmt report formats.
//!
//! A value expression is the small language embedded in `%(...)` format
//! directives and used for report predicates:
//!
//! ```text
//! amount * 2 > 100 and cleared
//! account =~ /^Expenses:/ ? -amount : amount
//! ```
//!
//! Parsing goes through a Logos-based [`token::Lexer`] and a
//! recursive-descent [`parser`]; evaluation reads identifiers from a
//! [`Scope`] and delegates every arithmetic operation to the
//! [`ledgerfmt_core`] value model.
//!
//! # Example
//!
//! ```
//! use ledgerfmt_core::Amount;
//! use ledgerfmt_expr::{Expression, Value};
//! use rust_decimal_macros::dec;
//! use std::collections::HashMap;
//!
//! let expr = Expression::parse("amount * 2 > 100 and cleared").unwrap();
//!
//! let mut row = HashMap::new();
//! row.insert("amount".to_string(), Value::Amount(Amount::new(dec!(60), "$")));
//! row.insert("cleared".to_string(), Value::Bool(true));
//!
//! assert_eq!(expr.evaluate(&row).unwrap(), Value::Bool(true));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
pub mod error;
pub mod eval;
pub mod parser;
pub mod token;
pub mod value;

use std::fmt;
use std::str::FromStr;

pub use ast::{BinaryOperator, Expr, Function, Mask, UnaryOperator};
pub use error::{EvalError, ParseError, ParseErrorKind};
pub use parser::parse;
pub use token::{LexFlags, Lexer, Token, TokenKind};
pub use value::{Scope, Value};

/// A parsed expression together with the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Expr,
}

impl Expression {
    /// Parse an expression.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when `source` is not a well-formed expression.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let root = parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// Evaluate against a scope.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] when an identifier is unbound or an operation
    /// does not apply to its operands.
    pub fn evaluate(&self, scope: &dyn Scope) -> Result<Value, EvalError> {
        eval::evaluate(&self.root, scope)
    }

    /// Evaluate as a predicate.
    ///
    /// # Errors
    ///
    /// Same as [`Expression::evaluate`].
    pub fn matches(&self, scope: &dyn Scope) -> Result<bool, EvalError> {
        Ok(self.evaluate(scope)?.is_truthy())
    }

    /// The syntax tree.
    #[must_use]
    pub const fn root(&self) -> &Expr {
        &self.root
    }

    /// The text the expression was parsed from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FromStr for Expression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
