//! Value expression syntax tree.

use regex::Regex;
use std::fmt;

use crate::value::Value;

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value.
    Literal(Value),
    /// Identifier resolved against the evaluation scope.
    Ident(String),
    /// `/regex/` mask.
    Mask(Mask),
    /// Built-in function call.
    Call(Call),
    /// Unary operation.
    Unary(Box<UnaryOp>),
    /// Binary operation.
    Binary(Box<BinaryOp>),
    /// `condition ? then : otherwise`.
    Conditional(Box<Conditional>),
}

impl Expr {
    /// Create an identifier reference.
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    /// Create a literal.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Create a binary operation.
    pub fn binary(left: Self, op: BinaryOperator, right: Self) -> Self {
        Self::Binary(Box::new(BinaryOp { left, op, right }))
    }

    /// Create a unary operation.
    pub fn unary(op: UnaryOperator, operand: Self) -> Self {
        Self::Unary(Box::new(UnaryOp { op, operand }))
    }

    /// Create a conditional.
    pub fn conditional(condition: Self, then: Self, otherwise: Self) -> Self {
        Self::Conditional(Box::new(Conditional {
            condition,
            then,
            otherwise,
        }))
    }
}

/// A compiled `/regex/` mask.
#[derive(Debug, Clone)]
pub struct Mask {
    pattern: String,
    regex: Regex,
}

impl Mask {
    /// Compile a mask pattern.
    pub fn new(pattern: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = pattern.into();
        let regex = Regex::new(&pattern)?;
        Ok(Self { pattern, regex })
    }

    /// The source pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check whether `text` matches anywhere.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Mask {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

/// Built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// `abs(x)`
    Abs,
    /// `min(a, b)`
    Min,
    /// `max(a, b)`
    Max,
}

impl Function {
    /// Look up a built-in by name (case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "abs" => Some(Self::Abs),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    /// Canonical name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Abs => "abs",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Number of arguments taken.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Abs => 1,
            Self::Min | Self::Max => 2,
        }
    }
}

/// A function call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Function.
    pub function: Function,
    /// Arguments.
    pub args: Vec<Expr>,
}

/// A binary operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    /// Left operand.
    pub left: Expr,
    /// Operator.
    pub op: BinaryOperator,
    /// Right operand.
    pub right: Expr,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    /// Equal (`==` or `=`).
    Eq,
    /// Not equal (`!=`).
    Ne,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Le,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Ge,
    /// Regular expression match (`=~`).
    Match,
    /// Negated regular expression match (`!~`).
    NotMatch,

    // Logical
    /// Logical AND.
    And,
    /// Logical OR.
    Or,

    // Arithmetic
    /// Addition (`+`).
    Add,
    /// Subtraction (`-`).
    Sub,
    /// Multiplication (`*`).
    Mul,
    /// Division (`/`).
    Div,
    /// Remainder (`%`).
    Mod,
}

impl BinaryOperator {
    /// Operator spelling.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Match => "=~",
            Self::NotMatch => "!~",
            Self::And => "&",
            Self::Or => "|",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        }
    }
}

/// A unary operation.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOp {
    /// Operator.
    pub op: UnaryOperator,
    /// Operand.
    pub operand: Expr,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Logical NOT.
    Not,
    /// Negation (-).
    Neg,
}

/// A ternary conditional.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    /// Tested value.
    pub condition: Expr,
    /// Result when the condition is truthy.
    pub then: Expr,
    /// Result otherwise.
    pub otherwise: Expr,
}

/// Fully parenthesised rendering, mostly for logs and tests.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(Value::String(s)) => write!(f, "{s:?}"),
            Self::Literal(Value::Date(d)) => write!(f, "[{}]", d.format("%Y/%m/%d")),
            Self::Literal(v) => write!(f, "{v}"),
            Self::Ident(name) => f.write_str(name),
            Self::Mask(mask) => write!(f, "/{}/", mask.pattern()),
            Self::Call(call) => {
                write!(f, "{}(", call.function.name())?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Self::Unary(unary) => match unary.op {
                UnaryOperator::Not => write!(f, "!{}", unary.operand),
                UnaryOperator::Neg => write!(f, "-{}", unary.operand),
            },
            Self::Binary(binary) => write!(
                f,
                "({} {} {})",
                binary.left,
                binary.op.symbol(),
                binary.right
            ),
            Self::Conditional(c) => write!(f, "({} ? {} : {})", c.condition, c.then, c.otherwise),
        }
    }
}
