//! Expression evaluation.
//!
//! All arithmetic is delegated to [`Amount`] and [`Balance`]; this module
//! only decides which of their operations applies to a pair of values.

use ledgerfmt_core::{Amount, AmountError, Balance};
use regex::Regex;
use std::cmp::Ordering;

use crate::ast::{BinaryOperator, Call, Expr, Function, UnaryOperator};
use crate::error::EvalError;
use crate::value::{Scope, Value};

/// Evaluate an expression against a scope.
///
/// # Errors
///
/// Returns an [`EvalError`] for unknown identifiers, operands of the wrong
/// type and arithmetic failures such as division by zero.
pub fn evaluate(expr: &Expr, scope: &dyn Scope) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Ident(name) => scope
            .lookup(name)
            .ok_or_else(|| EvalError::UnknownIdentifier(name.clone())),
        Expr::Mask(mask) => Ok(Value::Bool(
            scope.mask_subject().is_some_and(|s| mask.is_match(&s)),
        )),
        Expr::Call(call) => evaluate_call(call, scope),
        Expr::Unary(unary) => {
            let operand = evaluate(&unary.operand, scope)?;
            match unary.op {
                UnaryOperator::Not => Ok(Value::Bool(!operand.is_truthy())),
                UnaryOperator::Neg => negate(&operand),
            }
        }
        Expr::Binary(binary) => match binary.op {
            BinaryOperator::And => {
                let left = evaluate(&binary.left, scope)?;
                if !left.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(evaluate(&binary.right, scope)?.is_truthy()))
            }
            BinaryOperator::Or => {
                let left = evaluate(&binary.left, scope)?;
                if left.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(evaluate(&binary.right, scope)?.is_truthy()))
            }
            BinaryOperator::Match | BinaryOperator::NotMatch => {
                let Expr::Mask(mask) = &binary.right else {
                    let left = evaluate(&binary.left, scope)?;
                    let right = evaluate(&binary.right, scope)?;
                    return binary_op(&left, binary.op, &right);
                };
                let subject = evaluate(&binary.left, scope)?.to_string();
                Ok(Value::Bool(
                    mask.is_match(&subject) == (binary.op == BinaryOperator::Match),
                ))
            }
            op => {
                let left = evaluate(&binary.left, scope)?;
                let right = evaluate(&binary.right, scope)?;
                binary_op(&left, op, &right)
            }
        },
        Expr::Conditional(c) => {
            if evaluate(&c.condition, scope)?.is_truthy() {
                evaluate(&c.then, scope)
            } else {
                evaluate(&c.otherwise, scope)
            }
        }
    }
}

fn evaluate_call(call: &Call, scope: &dyn Scope) -> Result<Value, EvalError> {
    let function = call.function;
    if call.args.len() != function.arity() {
        return Err(EvalError::Arity {
            function: function.name(),
            expected: function.arity(),
            found: call.args.len(),
        });
    }
    let mut args = call
        .args
        .iter()
        .map(|arg| evaluate(arg, scope))
        .collect::<Result<Vec<_>, _>>()?;

    match function {
        Function::Abs => match &args[0] {
            Value::Balance(b) => Ok(Value::Balance(Balance::from_amounts(
                b.amounts().map(Amount::abs),
            )?)),
            other => Ok(Value::Amount(numeric_amount(other, "abs")?.abs())),
        },
        Function::Min | Function::Max => {
            let ordering = compare(&args[0], &args[1])?;
            let take_first = match function {
                Function::Min => ordering != Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(args.swap_remove(usize::from(!take_first)))
        }
    }
}

fn negate(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Balance(b) => Ok(Value::Balance(-b)),
        other => Ok(Value::Amount(-numeric_amount(other, "negate")?)),
    }
}

fn binary_op(left: &Value, op: BinaryOperator, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinaryOperator::Eq => Ok(Value::Bool(equals(left, right))),
        BinaryOperator::Ne => Ok(Value::Bool(!equals(left, right))),
        BinaryOperator::Lt => Ok(Value::Bool(compare(left, right)? == Ordering::Less)),
        BinaryOperator::Le => Ok(Value::Bool(compare(left, right)? != Ordering::Greater)),
        BinaryOperator::Gt => Ok(Value::Bool(compare(left, right)? == Ordering::Greater)),
        BinaryOperator::Ge => Ok(Value::Bool(compare(left, right)? != Ordering::Less)),
        BinaryOperator::Add => add(left, right, false),
        BinaryOperator::Sub => add(left, right, true),
        BinaryOperator::Mul => scale(left, right, Amount::checked_mul, Balance::checked_mul),
        BinaryOperator::Div => scale(left, right, Amount::checked_div, Balance::checked_div),
        BinaryOperator::Mod => {
            let a = numeric_amount(left, "%")?;
            let b = numeric_amount(right, "%")?;
            if b.is_zero() {
                return Err(AmountError::DivideByZero.into());
            }
            let number = a.number.checked_rem(b.number).ok_or(AmountError::Overflow)?;
            let commodity = if a.is_bare() { b.commodity } else { a.commodity };
            Ok(Value::Amount(Amount::new(number, commodity)))
        }
        BinaryOperator::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        BinaryOperator::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
        BinaryOperator::Match | BinaryOperator::NotMatch => {
            let matched = Regex::new(&right.to_string())
                .map_err(|e| EvalError::InvalidRegex(e.to_string()))?
                .is_match(&left.to_string());
            Ok(Value::Bool(matched == (op == BinaryOperator::Match)))
        }
    }
}

/// Addition or subtraction. Amounts stay amounts while their commodities
/// agree; anything else widens to a balance.
fn add(left: &Value, right: &Value, subtract: bool) -> Result<Value, EvalError> {
    if let (Value::Amount(a), Value::Amount(b)) = (left, right) {
        let result = if subtract {
            a.checked_sub(b)
        } else {
            a.checked_add(b)
        };
        match result {
            Ok(amount) => return Ok(Value::Amount(amount)),
            Err(AmountError::CommodityMismatch { .. }) => {}
            Err(err) => return Err(err.into()),
        }
    }

    let op = if subtract { "-" } else { "+" };
    let left = numeric_balance(left, op)?;
    let right = numeric_balance(right, op)?;
    let sum = if subtract {
        left.checked_sub(&right)?
    } else {
        left.checked_add(&right)?
    };
    Ok(Value::Balance(sum))
}

fn scale(
    left: &Value,
    right: &Value,
    amount_op: fn(&Amount, &Amount) -> Result<Amount, AmountError>,
    balance_op: fn(&Balance, &Amount) -> Result<Balance, AmountError>,
) -> Result<Value, EvalError> {
    let operand = numeric_amount(right, "scale")?;
    match left {
        Value::Balance(b) if b.len() > 1 => Ok(Value::Balance(balance_op(b, &operand)?)),
        other => {
            let amount = numeric_amount(other, "scale")?;
            Ok(Value::Amount(amount_op(&amount, &operand)?))
        }
    }
}

fn numeric_amount(value: &Value, op: &str) -> Result<Amount, EvalError> {
    value.to_amount().ok_or_else(|| {
        EvalError::Type(format!(
            "cannot apply {op} to {} {value}",
            value.type_name()
        ))
    })
}

fn numeric_balance(value: &Value, op: &str) -> Result<Balance, EvalError> {
    value.to_balance().ok_or_else(|| {
        EvalError::Type(format!(
            "cannot apply {op} to {} {value}",
            value.type_name()
        ))
    })
}

/// Equality across types: numbers compare by value (a bare number equals
/// a single-commodity amount with the same quantity), other types only
/// equal their own kind.
fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Date(a), Value::Date(b)) => a == b,
        (a, b) if a.is_numeric() && b.is_numeric() => {
            match (a.to_amount(), b.to_amount()) {
                (Some(x), Some(y)) if x.is_bare() || y.is_bare() => x.number == y.number,
                _ => a.to_balance() == b.to_balance(),
            }
        }
        _ => false,
    }
}

fn compare(left: &Value, right: &Value) -> Result<Ordering, EvalError> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Ok(a.cmp(b)),
        (a, b) if a.is_numeric() && b.is_numeric() => {
            let x = numeric_amount(a, "<")?;
            let y = numeric_amount(b, "<")?;
            if x.commodity != y.commodity && !x.is_bare() && !y.is_bare() {
                return Err(AmountError::CommodityMismatch {
                    left: x.commodity,
                    right: y.commodity,
                }
                .into());
            }
            Ok(x.number.cmp(&y.number))
        }
        (a, b) => Err(EvalError::Type(format!(
            "cannot compare {} with {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}
