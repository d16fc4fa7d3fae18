//! Report configuration and the report entry points.

use ledgerfmt_core::Journal;
use ledgerfmt_expr::Expression;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::accounts::AccountFormatter;
use crate::context::ReportContext;
use crate::error::{OptionsError, ReportError};
use crate::format::Format;
use crate::register::RegisterFormatter;

/// Default first line of a register entry.
pub const DEFAULT_FIRST_LINE_FORMAT: &str = "%10d %-.20p %-.22N %12.66t %12.80T\n";
/// Default line for the remaining transactions of an entry.
pub const DEFAULT_NEXT_LINES_FORMAT: &str =
    "                                %-.22N %12.66t %12.80T\n";
/// Default balance report line.
pub const DEFAULT_BALANCE_FORMAT: &str = "%20T  %2_%-n\n";

/// Everything that shapes a report.
///
/// Deserialises from JSON with every field optional:
///
/// ```
/// use ledgerfmt_report::ReportOptions;
///
/// let options: ReportOptions = serde_json::from_str(r#"{"collapsed": true}"#).unwrap();
/// assert!(options.collapsed);
/// assert_eq!(options.value_expr.as_deref(), Some("amount"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportOptions {
    /// Register format for the first transaction of an entry.
    pub first_line_format: String,
    /// Register format for the other transactions of an entry.
    pub next_lines_format: String,
    /// Balance report format.
    pub balance_format: String,
    /// Expression behind `%t` and the account sums.
    pub value_expr: Option<String>,
    /// Expression behind `%T`.
    pub total_expr: Option<String>,
    /// Rows failing this are not printed.
    pub display_predicate: Option<String>,
    /// Transactions failing this are left out of the report.
    pub limit_predicate: Option<String>,
    /// Negate amounts in the register.
    pub inverted: bool,
    /// One line per entry in the register.
    pub collapsed: bool,
    /// Deepest account level printed by the balance report; `0` for all.
    pub max_depth: usize,
    /// Print the root account in the balance report.
    pub report_top: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            first_line_format: DEFAULT_FIRST_LINE_FORMAT.to_string(),
            next_lines_format: DEFAULT_NEXT_LINES_FORMAT.to_string(),
            balance_format: DEFAULT_BALANCE_FORMAT.to_string(),
            value_expr: Some("amount".to_string()),
            total_expr: Some("total".to_string()),
            display_predicate: None,
            limit_predicate: None,
            inverted: false,
            collapsed: false,
            max_depth: 0,
            report_top: false,
        }
    }
}

impl ReportOptions {
    /// Build the rendering context, parsing every configured expression.
    ///
    /// # Errors
    ///
    /// Returns the first expression that fails to parse, tagged with the
    /// option it came from.
    pub fn context<'j>(&self, journal: &'j Journal) -> Result<ReportContext<'j>, OptionsError> {
        let mut ctx = ReportContext::new(journal);
        if let Some(expr) = parse_option("value_expr", self.value_expr.as_deref())? {
            ctx = ctx.with_value_expr(expr);
        }
        if let Some(expr) = parse_option("total_expr", self.total_expr.as_deref())? {
            ctx = ctx.with_total_expr(expr);
        }
        if let Some(expr) = parse_option("display_predicate", self.display_predicate.as_deref())? {
            ctx = ctx.with_display_predicate(expr);
        }
        if let Some(expr) = parse_option("limit_predicate", self.limit_predicate.as_deref())? {
            ctx = ctx.with_limit_predicate(expr);
        }
        Ok(ctx)
    }

    /// Compile the two register formats.
    ///
    /// # Errors
    ///
    /// Returns the first format that fails to compile.
    pub fn register_formats(&self) -> Result<(Format, Format), OptionsError> {
        Ok((
            compile_option("first_line_format", &self.first_line_format)?,
            compile_option("next_lines_format", &self.next_lines_format)?,
        ))
    }

    /// Compile the balance format.
    ///
    /// # Errors
    ///
    /// Fails when the format does not compile.
    pub fn balance_format(&self) -> Result<Format, OptionsError> {
        compile_option("balance_format", &self.balance_format)
    }
}

fn parse_option(
    option: &'static str,
    source: Option<&str>,
) -> Result<Option<Expression>, OptionsError> {
    source
        .map(|s| Expression::parse(s).map_err(|source| OptionsError::Expression { option, source }))
        .transpose()
}

fn compile_option(option: &'static str, source: &str) -> Result<Format, OptionsError> {
    Format::compile(source).map_err(|source| OptionsError::Format { option, source })
}

/// Print the register report for `journal` into `out`.
///
/// # Errors
///
/// Fails when the options do not compile or a row cannot be rendered.
pub fn register_report<W: Write>(
    journal: &Journal,
    options: &ReportOptions,
    out: W,
) -> Result<W, ReportError> {
    let ctx = options.context(journal)?;
    let (first, next) = options.register_formats()?;
    let mut formatter = RegisterFormatter::new(&ctx, &first, &next, out)
        .with_inverted(options.inverted)
        .with_collapsed(options.collapsed);
    formatter.format_journal()?;
    Ok(formatter.finish()?)
}

/// Print the balance report for `journal` into `out`.
///
/// # Errors
///
/// Fails when the options do not compile or a row cannot be rendered.
pub fn balance_report<W: Write>(
    journal: &Journal,
    options: &ReportOptions,
    out: W,
) -> Result<W, ReportError> {
    let ctx = options.context(journal)?;
    let format = options.balance_format()?;
    let mut formatter = AccountFormatter::new(&ctx, &format, out)
        .with_max_depth(options.max_depth)
        .with_report_top(options.report_top);
    formatter.format_journal()?;
    Ok(formatter.finish()?)
}
