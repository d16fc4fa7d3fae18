//! Recursive-descent parser for value expressions.
//!
//! Precedence, lowest first:
//!
//! | level          | operators                          |
//! |----------------|------------------------------------|
//! | ternary        | `? :`                              |
//! | or             | `\|` `\|\|` `or`                   |
//! | and            | `&` `&&` `and`                     |
//! | equality       | `=` `==` `!=` `=~` `!~`            |
//! | relational     | `<` `<=` `>` `>=`                  |
//! | additive       | `+` `-`                            |
//! | multiplicative | `*` `/` `div` `%` `mod`            |
//! | unary          | `-` `!` `not`                      |
//! | primary        | literal, identifier, call, mask, `( )` |

use crate::ast::{BinaryOperator, Call, Expr, Function, Mask, UnaryOperator};
use crate::error::{ParseError, ParseErrorKind};
use crate::token::{LexFlags, Lexer, TokenKind};
use crate::value::Value;

/// Deepest nesting of parentheses, operators and conditionals accepted.
pub const MAX_DEPTH: usize = 256;

/// Parse a complete expression.
///
/// # Errors
///
/// Returns a [`ParseError`] if the text is not a single well-formed
/// expression or nests deeper than [`MAX_DEPTH`]. Positions are byte
/// offsets into `source`.
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser {
        lexer: Lexer::new(source),
        depth: 0,
    };
    let expr = parser.parse_expr()?;

    let token = parser.lexer.next(LexFlags::OPERATOR);
    match token.kind {
        TokenKind::Eof => Ok(expr),
        _ => Err(ParseError::new(
            ParseErrorKind::TrailingInput(token.symbol.clone()),
            parser.lexer.token_start(),
        )),
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    depth: usize,
}

impl Parser<'_> {
    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let condition = self.parse_or()?;
        if self.lexer.next(LexFlags::OPERATOR).kind != TokenKind::Query {
            self.lexer.rewind();
            self.depth -= 1;
            return Ok(condition);
        }
        let then = self.parse_expr()?;
        self.expect(TokenKind::Colon)?;
        let otherwise = self.parse_expr()?;
        self.depth -= 1;
        Ok(Expr::conditional(condition, then, otherwise))
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(Self::parse_and, |kind| match kind {
            TokenKind::Or => Some(BinaryOperator::Or),
            _ => None,
        })
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(Self::parse_equality, |kind| match kind {
            TokenKind::And => Some(BinaryOperator::And),
            _ => None,
        })
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(Self::parse_relational, |kind| match kind {
            TokenKind::Equal | TokenKind::Assign => Some(BinaryOperator::Eq),
            TokenKind::NotEqual => Some(BinaryOperator::Ne),
            TokenKind::Match => Some(BinaryOperator::Match),
            TokenKind::NotMatch => Some(BinaryOperator::NotMatch),
            _ => None,
        })
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(Self::parse_additive, |kind| match kind {
            TokenKind::Less => Some(BinaryOperator::Lt),
            TokenKind::LessEq => Some(BinaryOperator::Le),
            TokenKind::Greater => Some(BinaryOperator::Gt),
            TokenKind::GreaterEq => Some(BinaryOperator::Ge),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(Self::parse_multiplicative, |kind| match kind {
            TokenKind::Plus => Some(BinaryOperator::Add),
            TokenKind::Minus => Some(BinaryOperator::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(Self::parse_unary, |kind| match kind {
            TokenKind::Star => Some(BinaryOperator::Mul),
            TokenKind::Div => Some(BinaryOperator::Div),
            TokenKind::Mod => Some(BinaryOperator::Mod),
            _ => None,
        })
    }

    /// One left-associative precedence level. Every operator applied deepens
    /// the tree by one, so a long chain counts against the nesting limit.
    fn parse_binary(
        &mut self,
        operand: fn(&mut Self) -> Result<Expr, ParseError>,
        operator: fn(TokenKind) -> Option<BinaryOperator>,
    ) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut left = operand(self)?;
        loop {
            let Some(op) = operator(self.lexer.next(LexFlags::OPERATOR).kind) else {
                self.lexer.rewind();
                self.depth = depth;
                return Ok(left);
            };
            self.enter()?;
            let right = operand(self)?;
            left = Expr::binary(left, op, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.lexer.next(LexFlags::OPERAND).kind {
            TokenKind::Minus => UnaryOperator::Neg,
            TokenKind::Not => UnaryOperator::Not,
            _ => {
                self.lexer.rewind();
                return self.parse_primary();
            }
        };
        self.enter()?;
        let operand = self.parse_unary()?;
        self.depth -= 1;
        Ok(Expr::unary(op, operand))
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let kind = self.lexer.next(LexFlags::OPERAND).kind;
        let start = self.lexer.token_start();
        match kind {
            TokenKind::Value => Ok(Expr::Literal(self.lexer.take_value())),
            TokenKind::Ident => {
                let name = self.take_text();
                if self.accept(TokenKind::LParen) {
                    let function = Function::from_name(&name).ok_or_else(|| {
                        ParseError::new(ParseErrorKind::UnknownFunction(name.clone()), start)
                    })?;
                    let args = self.parse_args()?;
                    Ok(Expr::Call(Call { function, args }))
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            TokenKind::Mask => {
                let pattern = self.take_text();
                Mask::new(pattern).map(Expr::Mask).map_err(|err| {
                    ParseError::new(ParseErrorKind::InvalidMask(err.to_string()), start)
                })
            }
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Arguments after the opening parenthesis, through the closing one.
    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.accept(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.accept(TokenKind::Comma) {
                continue;
            }
            self.expect(TokenKind::RParen)?;
            return Ok(args);
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::new(
                ParseErrorKind::TooDeep(MAX_DEPTH),
                self.lexer.token_start(),
            ));
        }
        Ok(())
    }

    /// Consume the next operator-context token if it has the given kind.
    fn accept(&mut self, kind: TokenKind) -> bool {
        if self.lexer.next(LexFlags::OPERATOR).kind == kind {
            true
        } else {
            self.lexer.rewind();
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.lexer.next(LexFlags::OPERATOR).kind == kind {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn take_text(&mut self) -> String {
        match self.lexer.take_value() {
            Value::String(s) => s,
            other => other.to_string(),
        }
    }

    /// Error describing the current token.
    fn unexpected(&self) -> ParseError {
        let token = self.lexer.token();
        let kind = match token.kind {
            TokenKind::Eof => ParseErrorKind::UnexpectedEof,
            TokenKind::Error => ParseErrorKind::Lexical(token.text().to_string()),
            _ => ParseErrorKind::UnexpectedToken(token.symbol.clone()),
        };
        ParseError::new(kind, self.lexer.token_start())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerfmt_core::Amount;
    use rust_decimal_macros::dec;

    fn num(n: rust_decimal::Decimal) -> Expr {
        Expr::literal(Amount::bare(n))
    }

    #[test]
    fn test_single_identifier() {
        assert_eq!(parse("amount").unwrap(), Expr::ident("amount"));
        assert_eq!(parse("  (amount) ").unwrap(), Expr::ident("amount"));
    }

    #[test]
    fn test_precedence() {
        let expr = parse("amount * 2 > 100 and cleared").unwrap();
        let expected = Expr::binary(
            Expr::binary(
                Expr::binary(Expr::ident("amount"), BinaryOperator::Mul, num(dec!(2))),
                BinaryOperator::Gt,
                num(dec!(100)),
            ),
            BinaryOperator::And,
            Expr::ident("cleared"),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(parse("10 - 3 - 2").unwrap().to_string(), "((10 - 3) - 2)");
        assert_eq!(parse("a / b / c").unwrap().to_string(), "((a / b) / c)");
    }

    #[test]
    fn test_unary_and_ternary() {
        assert_eq!(
            parse("!cleared ? -amount : amount").unwrap().to_string(),
            "(!cleared ? -amount : amount)"
        );
        assert_eq!(parse("not a or b").unwrap().to_string(), "(!a | b)");
    }

    #[test]
    fn test_mask_in_operand_position() {
        let expr = parse("account =~ /^Expenses:/ | /Food/").unwrap();
        assert_eq!(expr.to_string(), "((account =~ /^Expenses:/) | /Food/)");
    }

    #[test]
    fn test_assign_is_equality() {
        assert_eq!(parse("payee = 'Shop'").unwrap(), parse("payee == \"Shop\"").unwrap());
    }

    #[test]
    fn test_function_call() {
        let expr = parse("max(abs(amount), 5)").unwrap();
        assert_eq!(expr.to_string(), "max(abs(amount), 5)");
    }

    #[test]
    fn test_errors() {
        let err = parse("(amount").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
        assert_eq!(err.position, 7);

        let err = parse("amount amount").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TrailingInput("am".to_string()));
        assert_eq!(err.position, 7);

        let err = parse("amount * ").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);

        let err = parse("1 + )").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken(")".to_string()));
        assert_eq!(err.position, 4);

        let err = parse("sqrt(4)").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownFunction("sqrt".to_string()));

        let err = parse("/[unclosed/").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidMask(_)));

        let err = parse("a == \"open").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::Lexical("unterminated string literal".to_string())
        );
        assert_eq!(err.position, 5);
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |n: usize| format!("{}1{}", "(".repeat(n), ")".repeat(n));
        assert!(parse(&nested(MAX_DEPTH - 1)).is_ok());

        let err = parse(&nested(100_000)).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeep(MAX_DEPTH));
        assert_eq!(err.position, MAX_DEPTH - 1);

        let err = parse(&format!("{}1", "-".repeat(100_000))).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeep(MAX_DEPTH));

        let chain = vec!["1"; 100_000].join(" + ");
        let err = parse(&chain).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeep(MAX_DEPTH));
        assert!(parse(&vec!["1"; 100].join(" + ")).is_ok());
    }
}
