//! Format-string compiler.
//!
//! A format string is literal text with `%` directives:
//!
//! ```text
//! %[-][min][.max]spec
//! ```
//!
//! `-` left-aligns the field, `min` is the padded width and `max` the
//! truncation width. A `.max` with no `min` uses `max` for both. `spec` is
//! one of:
//!
//! | spec      | field                                           |
//! |-----------|-------------------------------------------------|
//! | `%`       | a literal `%`                                   |
//! | `(expr)`  | value of an embedded expression                 |
//! | `[fmt]`   | entry date formatted with a strftime pattern    |
//! | `d`       | entry date as `%Y/%m/%d`                        |
//! | `X`       | `* ` when the entry is cleared                  |
//! | `C`       | `(code) ` when the entry has a code             |
//! | `p`       | payee                                           |
//! | `n`       | account name relative to the last shown parent  |
//! | `N`       | full account name                               |
//! | `o`       | amount, with unit cost or elided when implicit  |
//! | `t`       | row value (value expression)                    |
//! | `T`       | row total (total expression)                    |
//! | `_`       | one space per displayed ancestor                |

use chrono::format::{Item, StrftimeItems};
use ledgerfmt_expr::{Expression, LexFlags, Lexer, TokenKind};
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{FormatError, FormatErrorKind};
use crate::render::MAX_FIELD_WIDTH;

/// Date pattern used by `%d`.
pub const DEFAULT_DATE_FORMAT: &str = "%Y/%m/%d";

/// What an element renders.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// Literal text.
    String(String),
    /// Embedded expression, `%(...)`.
    ValueExpr(Expression),
    /// Entry date with a strftime pattern, `%[...]` or `%d`.
    DateString(String),
    /// Cleared marker, `%X`.
    Cleared,
    /// Entry code, `%C`.
    Code,
    /// Payee, `%p`.
    Payee,
    /// Partial account name, `%n`.
    AccountName,
    /// Full account name, `%N`.
    AccountFullname,
    /// Amount with optional unit cost, `%o`.
    OptAmount,
    /// Row value, `%t`.
    Value,
    /// Row total, `%T`.
    Total,
    /// Indentation by displayed ancestors, `%_`.
    Spacer,
}

/// One compiled rendering instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// What to render.
    pub kind: ElementKind,
    /// Pad on the right instead of the left.
    pub align_left: bool,
    /// Minimum field width; 0 for natural width.
    pub min_width: usize,
    /// Truncation width; 0 for none.
    pub max_width: usize,
}

impl Element {
    /// Create a right-aligned element with natural width.
    #[must_use]
    pub const fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            align_left: false,
            min_width: 0,
            max_width: 0,
        }
    }

    /// Create a literal text element.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::new(ElementKind::String(text.into()))
    }

    /// Set left alignment.
    #[must_use]
    pub const fn with_align_left(mut self, align_left: bool) -> Self {
        self.align_left = align_left;
        self
    }

    /// Set the minimum and maximum widths.
    #[must_use]
    pub const fn with_widths(mut self, min_width: usize, max_width: usize) -> Self {
        self.min_width = min_width;
        self.max_width = max_width;
        self
    }
}

/// A compiled format string.
///
/// # Example
///
/// ```
/// use ledgerfmt_report::{ElementKind, Format};
///
/// let format = Format::compile("%-12.8(amount)").unwrap();
/// let element = &format.elements()[0];
/// assert!(element.align_left);
/// assert_eq!((element.min_width, element.max_width), (12, 8));
/// assert!(matches!(element.kind, ElementKind::ValueExpr(_)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Format {
    source: String,
    elements: Vec<Element>,
}

impl Format {
    /// Compile a format string.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] for an unclosed `%(` or `%[`, an unknown
    /// directive character, a directive cut off by the end of the string, a
    /// width of 256 or more, an invalid date pattern, or an embedded
    /// expression that does not parse. Positions are byte offsets into
    /// `source`.
    pub fn compile(source: &str) -> Result<Self, FormatError> {
        let mut elements = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((start, c)) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            if !literal.is_empty() {
                elements.push(Element::literal(std::mem::take(&mut literal)));
            }
            elements.push(compile_directive(source, start, &mut chars)?);
        }
        if !literal.is_empty() {
            elements.push(Element::literal(literal));
        }

        tracing::debug!(format = source, elements = elements.len(), "compiled format");
        Ok(Self {
            source: source.to_string(),
            elements,
        })
    }

    /// The compiled elements in rendering order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// The format string this was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Compile the directive whose `%` is at `start`; `chars` is positioned
/// just after the `%`.
fn compile_directive(
    source: &str,
    start: usize,
    chars: &mut Peekable<CharIndices<'_>>,
) -> Result<Element, FormatError> {
    let span_to = |chars: &mut Peekable<CharIndices<'_>>| {
        start..chars.peek().map_or(source.len(), |&(i, _)| i)
    };

    let align_left = chars.next_if(|&(_, c)| c == '-').is_some();
    let mut min_width = read_width(chars).unwrap_or(0);
    let mut max_width = 0;
    if chars.next_if(|&(_, c)| c == '.').is_some() {
        if let Some(max) = read_width(chars) {
            max_width = max;
            if min_width == 0 {
                min_width = max;
            }
        }
    }
    for width in [min_width, max_width] {
        if width >= MAX_FIELD_WIDTH {
            return Err(FormatError::new(
                FormatErrorKind::WidthTooLarge(width),
                span_to(chars),
            ));
        }
    }

    let Some((spec_at, spec)) = chars.next() else {
        return Err(FormatError::new(
            FormatErrorKind::IncompleteDirective,
            start..source.len(),
        ));
    };

    let kind = match spec {
        '%' => ElementKind::String("%".to_string()),
        '(' => {
            let body_start = spec_at + 1;
            let body_end = find_closing_paren(source, body_start).ok_or_else(|| {
                FormatError::new(FormatErrorKind::MissingDelimiter(')'), start..source.len())
            })?;
            skip_to(chars, body_end);
            let expr = Expression::parse(&source[body_start..body_end]).map_err(|err| {
                let err = err.offset(body_start);
                let at = err.position;
                FormatError::new(FormatErrorKind::Expression(err), at..body_end.max(at + 1))
            })?;
            ElementKind::ValueExpr(expr)
        }
        '[' => {
            let body_start = spec_at + 1;
            let body_end = source[body_start..]
                .find(']')
                .map(|i| body_start + i)
                .ok_or_else(|| {
                    FormatError::new(FormatErrorKind::MissingDelimiter(']'), start..source.len())
                })?;
            skip_to(chars, body_end);
            let pattern = &source[body_start..body_end];
            if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                return Err(FormatError::new(
                    FormatErrorKind::InvalidDatePattern(pattern.to_string()),
                    start..body_end + 1,
                ));
            }
            ElementKind::DateString(pattern.to_string())
        }
        'd' => ElementKind::DateString(DEFAULT_DATE_FORMAT.to_string()),
        'X' => ElementKind::Cleared,
        'C' => ElementKind::Code,
        'p' => ElementKind::Payee,
        'n' => ElementKind::AccountName,
        'N' => ElementKind::AccountFullname,
        'o' => ElementKind::OptAmount,
        't' => ElementKind::Value,
        'T' => ElementKind::Total,
        '_' => ElementKind::Spacer,
        other => {
            return Err(FormatError::new(
                FormatErrorKind::UnknownDirective(other),
                start..spec_at + other.len_utf8(),
            ));
        }
    };

    Ok(Element {
        kind,
        align_left,
        min_width,
        max_width,
    })
}

/// Read a run of decimal digits, saturating rather than overflowing.
fn read_width(chars: &mut Peekable<CharIndices<'_>>) -> Option<usize> {
    let mut width: Option<usize> = None;
    while let Some((_, c)) = chars.next_if(|&(_, c)| c.is_ascii_digit()) {
        let digit = c.to_digit(10).map_or(0, |d| d as usize);
        width = Some(width.unwrap_or(0).saturating_mul(10).saturating_add(digit));
    }
    width
}

/// Byte offset of the `)` closing an expression that starts at `from`.
///
/// The body is read with the expression lexer, so parentheses inside
/// strings, `/masks/` and `[dates]` do not count: `%(max(a, b))`,
/// `%(payee == ")")` and `%(account =~ /\)/)` close where expected.
fn find_closing_paren(source: &str, from: usize) -> Option<usize> {
    let mut lexer = Lexer::new(&source[from..]);
    let mut flags = LexFlags::OPERAND;
    let mut depth = 0usize;
    loop {
        let kind = lexer.next(flags).kind;
        flags = match kind {
            TokenKind::Eof => return None,
            TokenKind::RParen if depth == 0 => return Some(from + lexer.token_start()),
            TokenKind::RParen => {
                depth -= 1;
                LexFlags::OPERATOR
            }
            TokenKind::LParen => {
                depth += 1;
                LexFlags::OPERAND
            }
            TokenKind::Value | TokenKind::Ident | TokenKind::Mask | TokenKind::Error => {
                LexFlags::OPERATOR
            }
            _ => LexFlags::OPERAND,
        };
    }
}

/// Advance `chars` past the delimiter at byte offset `end`.
fn skip_to(chars: &mut Peekable<CharIndices<'_>>, end: usize) {
    while chars.next_if(|&(i, _)| i <= end).is_some() {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerfmt_expr::{Expr, ParseErrorKind};

    fn kinds(format: &Format) -> Vec<&ElementKind> {
        format.elements().iter().map(|e| &e.kind).collect()
    }

    #[test]
    fn test_literal_only() {
        let format = Format::compile("hello\n").unwrap();
        assert_eq!(kinds(&format), vec![&ElementKind::String("hello\n".into())]);
        assert!(Format::compile("").unwrap().elements().is_empty());
    }

    #[test]
    fn test_width_defaulting() {
        let format = Format::compile("%.10t").unwrap();
        let e = &format.elements()[0];
        assert_eq!((e.min_width, e.max_width), (10, 10));

        let format = Format::compile("%20.10t").unwrap();
        let e = &format.elements()[0];
        assert_eq!((e.min_width, e.max_width), (20, 10));

        let format = Format::compile("%8T").unwrap();
        let e = &format.elements()[0];
        assert_eq!((e.min_width, e.max_width), (8, 0));
        assert!(!e.align_left);
    }

    #[test]
    fn test_directive_with_expression() {
        let format = Format::compile("%-12.8(amount)").unwrap();
        assert_eq!(format.elements().len(), 1);
        let e = &format.elements()[0];
        assert!(e.align_left);
        assert_eq!((e.min_width, e.max_width), (12, 8));
        let ElementKind::ValueExpr(expr) = &e.kind else {
            panic!("expected an expression element");
        };
        assert_eq!(expr.root(), &Expr::ident("amount"));
    }

    #[test]
    fn test_literal_runs_split_by_directives() {
        let format = Format::compile("a%%b%dc").unwrap();
        assert_eq!(
            kinds(&format),
            vec![
                &ElementKind::String("a".into()),
                &ElementKind::String("%".into()),
                &ElementKind::String("b".into()),
                &ElementKind::DateString(DEFAULT_DATE_FORMAT.into()),
                &ElementKind::String("c".into()),
            ]
        );
    }

    #[test]
    fn test_all_builtin_kinds() {
        let format = Format::compile("%X%C%p%n%N%o%t%T%_%[%m-%d]").unwrap();
        assert_eq!(
            kinds(&format),
            vec![
                &ElementKind::Cleared,
                &ElementKind::Code,
                &ElementKind::Payee,
                &ElementKind::AccountName,
                &ElementKind::AccountFullname,
                &ElementKind::OptAmount,
                &ElementKind::Value,
                &ElementKind::Total,
                &ElementKind::Spacer,
                &ElementKind::DateString("%m-%d".into()),
            ]
        );
    }

    #[test]
    fn test_nested_parentheses_in_expression() {
        let format = Format::compile("%(max(a, b)) x").unwrap();
        assert_eq!(format.elements().len(), 2);
        assert_eq!(format.elements()[1].kind, ElementKind::String(" x".into()));
    }

    #[test]
    fn test_delimiters_inside_expression_literals() {
        for source in [
            r"%(account =~ /\)/)|",
            "%(payee == \")\")|",
            "%(date < [2024/01/01] ? 1 : 2)|",
            "%(amount / 2)|",
        ] {
            let format = Format::compile(source).unwrap();
            assert_eq!(format.elements().len(), 2, "{source}");
            assert_eq!(format.elements()[1].kind, ElementKind::String("|".into()));
        }
    }

    #[test]
    fn test_deeply_nested_expression_is_an_error() {
        let depth = 100_000;
        let source = format!("%({}1{})", "(".repeat(depth), ")".repeat(depth));
        let err = Format::compile(&source).unwrap_err();
        let FormatErrorKind::Expression(inner) = &err.kind else {
            panic!("expected an expression error, got {err:?}");
        };
        assert!(matches!(inner.kind, ParseErrorKind::TooDeep(_)));
    }

    #[test]
    fn test_missing_delimiters() {
        let err = Format::compile("%(amount").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::MissingDelimiter(')'));
        assert_eq!(err.position(), 0);

        let err = Format::compile("ab %[%Y").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::MissingDelimiter(']'));
        assert_eq!(err.position(), 3);
    }

    #[test]
    fn test_other_compile_errors() {
        let err = Format::compile("%10q").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::UnknownDirective('q'));
        assert_eq!(err.span, 0..4);

        let err = Format::compile("total: %-").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::IncompleteDirective);
        assert_eq!(err.position(), 7);

        let err = Format::compile("%300t").unwrap_err();
        assert_eq!(err.kind, FormatErrorKind::WidthTooLarge(300));

        let err = Format::compile("%[%Y %]").unwrap_err();
        assert!(matches!(err.kind, FormatErrorKind::InvalidDatePattern(_)));
    }

    #[test]
    fn test_expression_error_position_is_absolute() {
        let err = Format::compile("%d %(amount + )").unwrap_err();
        let FormatErrorKind::Expression(inner) = &err.kind else {
            panic!("expected an expression error, got {err:?}");
        };
        assert_eq!(inner.position, 14);
        assert_eq!(err.position(), 14);
    }
}
