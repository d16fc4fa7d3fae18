//! Rendering compiled formats against rows.
//!
//! Field padding follows output-stream semantics: an element's alignment
//! and minimum width apply to the *next* piece of text written, and a width
//! that nothing consumes carries over to the following element. Each row
//! is assembled in memory and handed to the writer in a single
//! `write_all`, so a row that fails to render leaves no partial output.

use ledgerfmt_core::Balance;
use std::fmt::Write as _;
use std::io::Write;

use crate::context::RowView;
use crate::error::RenderError;
use crate::format::{Element, ElementKind, Format};

/// Widths must stay below this.
pub const MAX_FIELD_WIDTH: usize = 256;

/// Cut `text` to at most `width` characters, marking the cut with `..`.
///
/// Text that fits is returned unchanged. Otherwise the result is exactly
/// `width` characters and its last two are `..`; with `width` below 2 the
/// marker fills the whole result.
///
/// # Panics
///
/// Panics if `width` is not below [`MAX_FIELD_WIDTH`].
///
/// # Example
///
/// ```
/// use ledgerfmt_report::truncate;
///
/// assert_eq!(truncate("hello", 10), "hello");
/// assert_eq!(truncate("1234567890", 5), "123..");
/// ```
#[must_use]
pub fn truncate(text: &str, width: usize) -> String {
    assert!(
        width < MAX_FIELD_WIDTH,
        "truncation width {width} exceeds {MAX_FIELD_WIDTH}"
    );
    if text.chars().count() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(2);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(&".."[..width - keep]);
    out
}

/// Row buffer with a pending field width.
#[derive(Debug, Default)]
struct FieldWriter {
    buf: String,
    align_left: bool,
    width: usize,
}

impl FieldWriter {
    /// Write `text` padded to the pending width, consuming it.
    fn write(&mut self, text: &str) {
        let pad = self.width.saturating_sub(text.chars().count());
        self.width = 0;
        if self.align_left {
            self.buf.push_str(text);
            self.pad(pad);
        } else {
            self.pad(pad);
            self.buf.push_str(text);
        }
    }

    /// Write a balance laid out by the value model, consuming the width.
    fn write_balance(&mut self, balance: &Balance, element: &Element) {
        self.width = 0;
        let latter = if element.max_width > 0 {
            element.max_width
        } else {
            element.min_width
        };
        self.buf.push_str(&balance.to_text(element.min_width, latter));
    }

    fn pad(&mut self, n: usize) {
        self.buf.extend(std::iter::repeat(' ').take(n));
    }
}

/// Apply the element's truncation width, if any.
fn clip(text: &str, element: &Element) -> String {
    if element.max_width == 0 {
        text.to_string()
    } else {
        truncate(text, element.max_width)
    }
}

impl Format {
    /// Render one row into a string.
    ///
    /// # Errors
    ///
    /// Fails when an expression cannot be evaluated for the row, when `%t`
    /// or `%T` has no expression configured, or when a unit cost cannot be
    /// computed.
    pub fn render_to_string(&self, view: &RowView<'_>) -> Result<String, RenderError> {
        let mut writer = FieldWriter::default();
        for element in self.elements() {
            writer.align_left = element.align_left;
            if element.min_width > 0 {
                writer.width = element.min_width;
            }
            render_element(&mut writer, element, view)?;
        }
        Ok(writer.buf)
    }

    /// Render one row and write it with a single `write_all`.
    ///
    /// # Errors
    ///
    /// Same as [`Format::render_to_string`], plus I/O errors from `out`.
    pub fn render<W: Write + ?Sized>(
        &self,
        out: &mut W,
        view: &RowView<'_>,
    ) -> Result<(), RenderError> {
        let text = self.render_to_string(view)?;
        tracing::trace!(row = ?view.row(), bytes = text.len(), "rendered row");
        out.write_all(text.as_bytes())?;
        Ok(())
    }
}

fn render_element(
    writer: &mut FieldWriter,
    element: &Element,
    view: &RowView<'_>,
) -> Result<(), RenderError> {
    match &element.kind {
        ElementKind::String(text) => writer.write(text),

        ElementKind::ValueExpr(expr) => {
            let value = expr.evaluate(view)?;
            match value.to_balance() {
                Some(balance) => writer.write_balance(&balance, element),
                None => writer.write(&clip(&value.to_string(), element)),
            }
        }

        ElementKind::DateString(pattern) => match view.entry().and_then(|e| e.date) {
            Some(date) => {
                let mut text = String::new();
                write!(text, "{}", date.format(pattern))
                    .map_err(|_| std::io::Error::other(format!("bad date pattern {pattern:?}")))?;
                writer.write(&clip(&text, element));
            }
            None => writer.write(" "),
        },

        ElementKind::Cleared => match view.entry() {
            Some(entry) if entry.is_cleared() => writer.write("* "),
            _ => writer.write(""),
        },

        ElementKind::Code => match view.entry() {
            Some(entry) if !entry.code.is_empty() => writer.write(&format!("({}) ", entry.code)),
            _ => writer.write(""),
        },

        ElementKind::Payee => {
            if let Some(entry) = view.entry() {
                writer.write(&clip(&entry.payee, element));
            }
        }

        ElementKind::AccountName | ElementKind::AccountFullname => {
            let name = if matches!(element.kind, ElementKind::AccountFullname) {
                view.account_fullname()
            } else {
                view.partial_account_name()
            };
            match name {
                Some(name) => {
                    let mut name = clip(&name, element);
                    if let Some(posting) = view.posting().filter(|p| p.flags.is_virtual) {
                        name = if posting.flags.balance {
                            format!("[{name}]")
                        } else {
                            format!("({name})")
                        };
                    }
                    writer.write(&name);
                }
                None => writer.write(" "),
            }
        }

        ElementKind::OptAmount => {
            if let Some((text, note)) = opt_amount(view)? {
                writer.write(&text);
                if !note.is_empty() {
                    writer.write("  ; ");
                    writer.write(note);
                }
            }
        }

        ElementKind::Value => writer.write_balance(&view.compute_value()?, element),

        ElementKind::Total => writer.write_balance(&view.compute_total()?, element),

        ElementKind::Spacer => {
            for _ in 0..view.displayed_ancestors() {
                if element.min_width > 0 || element.max_width > 0 {
                    writer.width = element.min_width.max(element.max_width);
                }
                writer.write(" ");
            }
        }
    }
    Ok(())
}

/// Text of `%o` and the posting's note, or `None` on rows without a
/// transaction.
///
/// A priced transaction shows `amount @ unit-cost`. The second of exactly
/// two hand-written transactions that cancel each other shows nothing,
/// since its amount is implied. Anything else shows the amount. Only the
/// amount text takes the field width; the note follows it unpadded.
fn opt_amount<'v>(view: &RowView<'v>) -> Result<Option<(String, &'v str)>, RenderError> {
    let Some(posting) = view.posting() else {
        return Ok(None);
    };

    let text = if posting.amount == posting.cost {
        if is_implied_balance(view) {
            String::new()
        } else {
            posting.amount.to_string()
        }
    } else {
        let unit_cost = posting.cost.checked_div(&posting.amount)?;
        format!("{} @ {}", posting.amount, unit_cost)
    };
    Ok(Some((text, &posting.note)))
}

/// Check whether the row is the last of exactly two non-automated
/// transactions in its entry and exactly cancels the first.
fn is_implied_balance(view: &RowView<'_>) -> bool {
    let (Some(entry), Some(id)) = (view.entry(), view.posting().and_then(|p| p.transaction))
    else {
        return false;
    };
    let journal = view.context().journal();
    let real: Vec<_> = entry
        .transactions
        .iter()
        .copied()
        .filter(|&t| !journal.transaction(t).flags.auto)
        .collect();

    match real.as_slice() {
        [first, last] if *last == id => {
            journal.transaction(*first).amount == -&journal.transaction(*last).amount
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ReportContext;
    use crate::row::Row;
    use crate::state::ReportState;
    use ledgerfmt_core::{Amount, Entry, EntryState, Journal, NaiveDate, Posting};
    use ledgerfmt_expr::Expression;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn usd(n: ledgerfmt_core::Decimal) -> Amount {
        Amount::new(n, "$")
    }

    fn journal() -> Journal {
        let mut journal = Journal::new();
        journal.add_entry(
            Entry::new(date(2024, 1, 15), "Grocery Store")
                .with_state(EntryState::Cleared)
                .with_code("1042"),
            vec![
                Posting::new("Expenses:Food", usd(dec!(100))).with_note("weekly"),
                Posting::new("Assets:Checking", usd(dec!(-100))),
            ],
        );
        journal.add_entry(
            Entry::new(date(2024, 1, 20), "Broker"),
            vec![
                Posting::new("Assets:Brokerage", Amount::new(dec!(10), "AAPL"))
                    .with_cost(usd(dec!(1500))),
                Posting::new("Assets:Checking", usd(dec!(-1500))),
                Posting::new("Budget:Savings", usd(dec!(1500))).virtual_posting(false),
            ],
        );
        journal
    }

    fn ctx(journal: &Journal) -> ReportContext<'_> {
        ReportContext::new(journal)
            .with_value_expr(Expression::parse("amount").unwrap())
            .with_total_expr(Expression::parse("total").unwrap())
    }

    fn render(format: &str, journal: &Journal, state: &ReportState, row: &Row) -> String {
        let ctx = ctx(journal);
        Format::compile(format)
            .unwrap()
            .render_to_string(&ctx.view(state, row))
            .unwrap()
    }

    fn xact_row(journal: &Journal, entry: usize, index: usize) -> Row {
        let (_, e) = journal.entries().nth(entry).unwrap();
        Row::transaction(journal, e.transactions[index])
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 5), "hello");
        assert_eq!(truncate("1234567890", 5), "123..");
        assert_eq!(truncate("abc", 2), "..");
        assert_eq!(truncate("abc", 1), ".");
        assert_eq!(truncate("abc", 0), "");
        assert_eq!(truncate("", 0), "");
    }

    #[test]
    #[should_panic(expected = "exceeds")]
    fn test_truncate_width_cap() {
        let _ = truncate("x", MAX_FIELD_WIDTH);
    }

    #[test]
    fn test_header_fields() {
        let journal = journal();
        let state = ReportState::new();
        let row = xact_row(&journal, 0, 0);
        insta::assert_snapshot!(
            render("%d %X%C%-.10p|", &journal, &state, &row),
            @"2024/01/15 * (1042) Grocery ..|"
        );
        assert_eq!(render("%[%m-%d]|%5.3p|", &journal, &state, &row), "01-15|  G..|");
    }

    #[test]
    fn test_not_cleared_consumes_width() {
        let journal = journal();
        let state = ReportState::new();
        let row = xact_row(&journal, 1, 0);
        assert_eq!(render("[%4X][%4C]", &journal, &state, &row), "[    ][    ]");
    }

    #[test]
    fn test_unconsumed_width_carries_over() {
        let journal = journal();
        let state = ReportState::new();
        let row = Row::account(journal.find_account("Assets").unwrap());
        // No entry, so %p writes nothing and its width pads the next text.
        assert_eq!(render("%6p|", &journal, &state, &row), "     |");
    }

    #[test]
    fn test_rows_without_entry_or_account() {
        let journal = journal();
        let state = ReportState::new();
        let row = Row::default();
        assert_eq!(render("<%d><%n><%N>", &journal, &state, &row), "< >< >< >");
    }

    #[test]
    fn test_value_and_total_columns() {
        let journal = journal();
        let state = ReportState::new();
        let row = xact_row(&journal, 0, 0);
        assert_eq!(render("%10t|%-10T|", &journal, &state, &row), "      $100|      $100|");
        assert_eq!(render("%8(amount * 2)", &journal, &state, &row), "    $200");
        assert_eq!(render("%-8.3(payee)|", &journal, &state, &row), "G..     |");
    }

    #[test]
    fn test_multi_commodity_value_uses_latter_width() {
        let journal = journal();
        let state = ReportState::new();
        let mut row = xact_row(&journal, 1, 0);
        if let Some(posting) = row.posting.as_mut() {
            posting.total.add_amount(&usd(dec!(5))).unwrap();
        }
        assert_eq!(render("%6.9T", &journal, &state, &row), "    $5\n  10 AAPL");
    }

    #[test]
    fn test_opt_amount() {
        let journal = journal();
        let state = ReportState::new();

        let first = xact_row(&journal, 0, 0);
        assert_eq!(render("%o", &journal, &state, &first), "$100  ; weekly");
        let second = xact_row(&journal, 0, 1);
        assert_eq!(render("%o", &journal, &state, &second), "");

        let priced = xact_row(&journal, 1, 0);
        assert_eq!(render("%o", &journal, &state, &priced), "10 AAPL @ $150");
        // Three real transactions: nothing is implied.
        let third = xact_row(&journal, 1, 2);
        assert_eq!(render("%o", &journal, &state, &third), "$1500");

        assert_eq!(render("[%o]", &journal, &state, &Row::default()), "[]");
    }

    #[test]
    fn test_opt_amount_width_skips_note() {
        let journal = journal();
        let state = ReportState::new();

        let first = xact_row(&journal, 0, 0);
        assert_eq!(
            render("%20o|", &journal, &state, &first),
            "                $100  ; weekly|"
        );
        assert_eq!(render("%-6o|", &journal, &state, &first), "$100    ; weekly|");
        let second = xact_row(&journal, 0, 1);
        assert_eq!(render("%4o|", &journal, &state, &second), "    |");
    }

    #[test]
    fn test_virtual_account_is_wrapped() {
        let journal = journal();
        let state = ReportState::new();
        let row = xact_row(&journal, 1, 2);
        assert_eq!(render("%N", &journal, &state, &row), "(Budget:Savings)");
        assert_eq!(render("%.6N", &journal, &state, &row), "(Budg..)");
    }

    #[test]
    fn test_partial_name_and_spacer() {
        let mut journal = journal();
        let leaf = journal.find_or_create_account("Assets:Bank:Checking");
        let bank = journal.find_or_create_account("Assets:Bank");
        let assets = journal.find_or_create_account("Assets");

        let mut state = ReportState::new();
        let row = Row::account(leaf);
        assert_eq!(render("%_%n", &journal, &state, &row), "Assets:Bank:Checking");

        state.mark_account_displayed(assets);
        state.mark_account_displayed(bank);
        assert_eq!(render("%2_|%n", &journal, &state, &row), "    |Checking");
        assert_eq!(render("%_|%N", &journal, &state, &row), "  |Assets:Bank:Checking");
    }

    #[test]
    fn test_missing_expressions_are_errors() {
        let journal = journal();
        let state = ReportState::new();
        let ctx = ReportContext::new(&journal);
        let row = xact_row(&journal, 0, 0);
        let view = ctx.view(&state, &row);

        let err = Format::compile("%t").unwrap().render_to_string(&view).unwrap_err();
        assert!(matches!(err, RenderError::MissingValueExpression));
        let err = Format::compile("%T").unwrap().render_to_string(&view).unwrap_err();
        assert!(matches!(err, RenderError::MissingTotalExpression));
    }

    #[test]
    fn test_render_writes_whole_row_or_nothing() {
        let journal = journal();
        let state = ReportState::new();
        let ctx = ctx(&journal);
        let row = xact_row(&journal, 0, 0);
        let view = ctx.view(&state, &row);

        let mut out = Vec::new();
        Format::compile("%p %(nope)\n")
            .unwrap()
            .render(&mut out, &view)
            .unwrap_err();
        assert!(out.is_empty());

        Format::compile("%p\n").unwrap().render(&mut out, &view).unwrap();
        assert_eq!(out, b"Grocery Store\n");
    }
}
