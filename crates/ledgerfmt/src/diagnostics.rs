//! Error reporting for report options.
//!
//! Uses ariadne to point at the offending part of a format string or
//! expression given on the command line.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use ledgerfmt_report::{OptionsError, ReportOptions};
use std::io::Write;
use std::ops::Range;

/// The text an option holds, if it is set.
#[must_use]
pub fn option_source<'a>(options: &'a ReportOptions, option: &str) -> Option<&'a str> {
    match option {
        "first_line_format" => Some(&options.first_line_format),
        "next_lines_format" => Some(&options.next_lines_format),
        "balance_format" => Some(&options.balance_format),
        "value_expr" => options.value_expr.as_deref(),
        "total_expr" => options.total_expr.as_deref(),
        "display_predicate" => options.display_predicate.as_deref(),
        "limit_predicate" => options.limit_predicate.as_deref(),
        _ => None,
    }
}

/// Write a diagnostic for an option that failed to compile.
///
/// Colors are left out when `color` is false, as for output that is not a
/// terminal.
///
/// # Errors
///
/// Fails when writing fails.
pub fn report_options_error<W: Write + ?Sized>(
    error: &OptionsError,
    options: &ReportOptions,
    color: bool,
    writer: &mut W,
) -> std::io::Result<()> {
    let (option, span, label) = match error {
        OptionsError::Format { option, source } => {
            (*option, source.span.clone(), source.kind.to_string())
        }
        OptionsError::Expression { option, source } => (
            *option,
            source.position..source.position + 1,
            source.kind.to_string(),
        ),
    };
    let Some(text) = option_source(options, option) else {
        return writeln!(writer, "error: {error}");
    };
    let span = clamp(span, text.len());

    Report::build(ReportKind::Error, (option, span.clone()))
        .with_message(format!("invalid {option}"))
        .with_label(
            Label::new((option, span))
                .with_message(label)
                .with_color(Color::Red),
        )
        .with_config(Config::default().with_color(color).with_compact(false))
        .finish()
        .write((option, Source::from(text)), &mut *writer)
}

/// Keep a label inside the text; errors at the very end point at the last
/// character.
fn clamp(span: Range<usize>, len: usize) -> Range<usize> {
    let start = span.start.min(len.saturating_sub(1));
    let end = span.end.clamp(start + 1, len.max(start + 1));
    start..end
}
