//! Runtime values and the scope expressions read identifiers from.

use chrono::NaiveDate;
use ledgerfmt_core::{Amount, Balance};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;

/// A value produced by a literal or by evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    /// No value; numerically zero.
    #[default]
    Null,
    /// Boolean; numerically 1 or 0.
    Bool(bool),
    /// A single amount.
    Amount(Amount),
    /// A multi-commodity balance.
    Balance(Balance),
    /// Text.
    String(String),
    /// Calendar date.
    Date(NaiveDate),
}

impl Value {
    /// Name of the value's type, for error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Amount(_) => "amount",
            Self::Balance(_) => "balance",
            Self::String(_) => "string",
            Self::Date(_) => "date",
        }
    }

    /// Truthiness: non-zero numbers, non-empty strings, dates and `true`.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Amount(a) => !a.is_zero(),
            Self::Balance(b) => !b.is_zero(),
            Self::String(s) => !s.is_empty(),
            Self::Date(_) => true,
        }
    }

    /// Check whether the value takes part in arithmetic.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Bool(_) | Self::Amount(_) | Self::Balance(_)
        )
    }

    /// The value as a balance, if it is numeric.
    #[must_use]
    pub fn to_balance(&self) -> Option<Balance> {
        match self {
            Self::Null => Some(Balance::new()),
            Self::Bool(b) => Some(Balance::from(Amount::bare(Decimal::from(u8::from(*b))))),
            Self::Amount(a) => Some(Balance::from(a.clone())),
            Self::Balance(b) => Some(b.clone()),
            Self::String(_) | Self::Date(_) => None,
        }
    }

    /// The value as a single amount, if it is numeric and has at most one
    /// commodity. Zero becomes a bare zero.
    #[must_use]
    pub fn to_amount(&self) -> Option<Amount> {
        match self {
            Self::Null => Some(Amount::bare(Decimal::ZERO)),
            Self::Bool(b) => Some(Amount::bare(Decimal::from(u8::from(*b)))),
            Self::Amount(a) => Some(a.clone()),
            Self::Balance(b) if b.is_zero() => Some(Amount::bare(Decimal::ZERO)),
            Self::Balance(b) => b.single_amount().cloned(),
            Self::String(_) | Self::Date(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Amount(a) => write!(f, "{a}"),
            Self::Balance(b) => write!(f, "{b}"),
            Self::String(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format("%Y/%m/%d")),
        }
    }
}

impl From<Amount> for Value {
    fn from(amount: Amount) -> Self {
        Self::Amount(amount)
    }
}

impl From<Balance> for Value {
    fn from(balance: Balance) -> Self {
        Self::Balance(balance)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

/// Source of identifier values during evaluation.
///
/// A report row implements this to expose its amount, total, payee and so
/// on to value expressions.
pub trait Scope {
    /// Look up the value bound to `name`.
    fn lookup(&self, name: &str) -> Option<Value>;

    /// The text a bare `/mask/` is matched against; the account name by default.
    fn mask_subject(&self) -> Option<String> {
        self.lookup("account").map(|v| v.to_string())
    }
}

impl<S: BuildHasher> Scope for HashMap<String, Value, S> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl<T: Scope + ?Sized> Scope for &T {
    fn lookup(&self, name: &str) -> Option<Value> {
        (**self).lookup(name)
    }

    fn mask_subject(&self) -> Option<String> {
        (**self).mask_subject()
    }
}
