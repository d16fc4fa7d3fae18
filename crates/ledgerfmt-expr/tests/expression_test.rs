//! Integration tests for value expressions.
//!
//! Tests cover parsing into the public AST, evaluation against a row-like
//! scope, and error positions.

use ledgerfmt_core::{Amount, Balance, NaiveDate};
use ledgerfmt_expr::{Expr, Expression, ParseErrorKind, Scope, Value};
use proptest::prelude::*;
use rust_decimal_macros::dec;

// ============================================================================
// Helper Functions
// ============================================================================

/// A posting row with a few fixed fields.
struct Row {
    amount: Amount,
    total: Balance,
    account: &'static str,
}

impl Scope for Row {
    fn lookup(&self, name: &str) -> Option<Value> {
        match name {
            "amount" | "a" => Some(Value::Amount(self.amount.clone())),
            "total" | "O" => Some(Value::Balance(self.total.clone())),
            "account" | "A" => Some(Value::from(self.account)),
            "date" | "d" => Some(Value::Date(NaiveDate::from_ymd_opt(2024, 3, 5)?)),
            _ => None,
        }
    }
}

fn row() -> Row {
    let total =
        Balance::from_amounts([Amount::new(dec!(100), "$"), Amount::new(dec!(7), "EUR")]).unwrap();
    Row {
        amount: Amount::new(dec!(25), "$"),
        total,
        account: "Assets:Bank:Checking",
    }
}

fn eval(source: &str) -> Value {
    Expression::parse(source).unwrap().evaluate(&row()).unwrap()
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_shapes() {
    insta::assert_snapshot!(
        Expression::parse("a + b * c - d").unwrap().root().to_string(),
        @"((a + (b * c)) - d)"
    );
    insta::assert_snapshot!(
        Expression::parse("x < 1 | y >= 2 & !z").unwrap().root().to_string(),
        @"((x < 1) | ((y >= 2) & !z))"
    );
    insta::assert_snapshot!(
        Expression::parse("d > [2024-01-01] ? 'new' : \"old\"").unwrap().root().to_string(),
        @r#"((d > [2024/01/01]) ? "new" : "old")"#
    );
}

#[test]
fn test_expression_keeps_source() {
    let expr: Expression = "amount div 2".parse().unwrap();
    assert_eq!(expr.source(), "amount div 2");
    assert_eq!(expr.to_string(), "amount div 2");
    assert!(matches!(expr.root(), Expr::Binary(_)));
}

#[test]
fn test_error_positions() {
    let err = Expression::parse("amount + (total").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
    assert_eq!(err.position, 15);

    let err = Expression::parse("amount # 2").unwrap_err();
    assert_eq!(err.position, 7);
    assert!(matches!(err.kind, ParseErrorKind::TrailingInput(_) | ParseErrorKind::Lexical(_)));

    let shifted = err.offset(10);
    assert_eq!(shifted.position, 17);
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn test_eval_against_row() {
    assert_eq!(eval("a * 4"), Value::Amount(Amount::new(dec!(100), "$")));
    assert_eq!(eval("a / {$5}"), Value::Amount(Amount::new(dec!(5), "$")));
    assert_eq!(eval("/Bank/ and a > 20"), Value::Bool(true));
    assert_eq!(eval("A =~ /^Expenses/"), Value::Bool(false));
    assert_eq!(eval("d == [2024/03/05]"), Value::Bool(true));
    assert_eq!(eval("d < [2024/03/04]"), Value::Bool(false));
}

#[test]
fn test_eval_balance_total() {
    let Value::Balance(doubled) = eval("O * 2") else {
        panic!("expected a balance");
    };
    assert_eq!(doubled.amount("$"), Some(&Amount::new(dec!(200), "$")));
    assert_eq!(doubled.amount("EUR"), Some(&Amount::new(dec!(14), "EUR")));

    let Value::Balance(reduced) = eval("O - a") else {
        panic!("expected a balance");
    };
    assert_eq!(reduced.amount("$"), Some(&Amount::new(dec!(75), "$")));
}

#[test]
fn test_unknown_identifier_is_eval_error() {
    let expr = Expression::parse("payee").unwrap();
    assert!(expr.evaluate(&row()).is_err());
    assert!(Expression::parse("!a").unwrap().matches(&row()).is_ok());
}

proptest! {
    #[test]
    fn parse_never_panics(source in "[ -~]{0,40}") {
        let _ = Expression::parse(&source);
    }

    #[test]
    fn integer_arithmetic_matches_decimal(a in -10_000i64..10_000, b in -10_000i64..10_000) {
        // Negative literals go through unary minus.
        let source = format!("({a}) + ({b}) * 3");
        let value = Expression::parse(&source).unwrap().evaluate(&row()).unwrap();
        let expected = rust_decimal::Decimal::from(a + b * 3);
        prop_assert_eq!(value.to_amount().map(|x| x.number), Some(expected));
    }
}
