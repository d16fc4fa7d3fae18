//! Register report: one line per transaction with running totals.

use ledgerfmt_core::{Amount, Balance, Decimal, EntryId, TransactionId};
use std::io::Write;

use crate::context::ReportContext;
use crate::error::RenderError;
use crate::format::Format;
use crate::row::{PostingRow, Row, RowAccount};
use crate::state::ReportState;

/// Account name shown on collapsed subtotal lines.
pub const TOTAL_ACCOUNT: &str = "<Total>";

/// Streaming register fold.
///
/// Feed transactions in journal order with
/// [`format_transaction`](Self::format_transaction) and call
/// [`finish`](Self::finish) at the end. Running totals only advance on
/// displayed rows, so a transaction rejected by the display predicate
/// contributes nothing to later totals.
///
/// In collapsed mode each entry prints as one line: a single displayed
/// transaction prints as itself, several print as `<Total>` lines, one
/// per commodity of their sum.
pub struct RegisterFormatter<'a, 'j, W: Write> {
    ctx: &'a ReportContext<'j>,
    first_line: &'a Format,
    next_lines: &'a Format,
    out: W,
    state: ReportState,
    inverted: bool,
    collapsed: bool,
    last_entry: Option<EntryId>,
    last: Option<Row>,
    subtotal: Balance,
    count: usize,
    base_total: Balance,
}

impl<'a, 'j, W: Write> RegisterFormatter<'a, 'j, W> {
    /// Create a formatter printing the first transaction of each entry with
    /// `first_line` and the rest with `next_lines`.
    pub fn new(
        ctx: &'a ReportContext<'j>,
        first_line: &'a Format,
        next_lines: &'a Format,
        out: W,
    ) -> Self {
        Self {
            ctx,
            first_line,
            next_lines,
            out,
            state: ReportState::new(),
            inverted: false,
            collapsed: false,
            last_entry: None,
            last: None,
            subtotal: Balance::new(),
            count: 0,
            base_total: Balance::new(),
        }
    }

    /// Negate amounts and costs before they are totalled and shown.
    #[must_use]
    pub const fn with_inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    /// Print one subtotal line per entry.
    #[must_use]
    pub const fn with_collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = collapsed;
        self
    }

    /// The per-run state (displayed transactions and so on).
    #[must_use]
    pub const fn state(&self) -> &ReportState {
        &self.state
    }

    /// Process one transaction.
    ///
    /// # Errors
    ///
    /// Fails when a predicate or an embedded expression cannot be evaluated,
    /// or when writing fails.
    pub fn format_transaction(&mut self, id: TransactionId) -> Result<(), RenderError> {
        let journal = self.ctx.journal();
        if !self
            .ctx
            .is_within_limit(&self.state, &Row::transaction(journal, id))?
        {
            return Ok(());
        }

        let mut posting = PostingRow::from_transaction(journal, id);
        if self.inverted {
            posting.amount = -&posting.amount;
            posting.cost = -&posting.cost;
        }
        let previous = self.last.as_ref().and_then(|row| row.posting.as_ref());
        let (mut total, mut cost_total) = previous
            .map(|p| (p.total.clone(), p.cost_total.clone()))
            .unwrap_or_default();
        total.add_amount(&posting.amount)?;
        cost_total.add_amount(&posting.cost)?;
        posting.index = previous.map_or(0, |p| p.index + 1);
        posting.total = total;
        posting.cost_total = cost_total;

        let row = Row::with_posting(journal, posting);
        if !self.ctx.is_displayed(&self.state, &row)? {
            tracing::trace!(?id, "transaction filtered out");
            return Ok(());
        }
        self.state.mark_transaction_displayed(id);

        let entry = journal.transaction(id).entry;
        let new_entry = self.last_entry != Some(entry);
        if self.collapsed {
            if new_entry {
                if self.last_entry.is_some() {
                    self.report_cumulative_subtotal()?;
                }
                self.subtotal = Balance::new();
                self.count = 0;
                self.base_total = self
                    .last
                    .as_ref()
                    .and_then(|row| row.posting.as_ref())
                    .map(|p| p.total.clone())
                    .unwrap_or_default();
            }
            if let Some(posting) = &row.posting {
                self.subtotal.add_amount(&posting.amount)?;
            }
            self.count += 1;
        } else {
            let format = if new_entry {
                self.first_line
            } else {
                self.next_lines
            };
            emit(format, self.ctx, &self.state, &row, &mut self.out)?;
        }

        self.last_entry = Some(entry);
        self.last = Some(row);
        Ok(())
    }

    /// Process every transaction of the journal in order.
    ///
    /// # Errors
    ///
    /// See [`format_transaction`](Self::format_transaction).
    pub fn format_journal(&mut self) -> Result<(), RenderError> {
        let ids: Vec<_> = self.ctx.journal().transactions().map(|(id, _)| id).collect();
        for id in ids {
            self.format_transaction(id)?;
        }
        Ok(())
    }

    /// Flush the pending collapsed entry and the writer, returning it.
    ///
    /// # Errors
    ///
    /// Fails when the last subtotal cannot be rendered or flushing fails.
    pub fn finish(mut self) -> Result<W, RenderError> {
        if self.collapsed && self.last_entry.is_some() {
            self.report_cumulative_subtotal()?;
        }
        self.out.flush()?;
        tracing::debug!(
            displayed = self.state.displayed_transaction_count(),
            "register report finished"
        );
        Ok(self.out)
    }

    fn report_cumulative_subtotal(&mut self) -> Result<(), RenderError> {
        tracing::debug!(
            entry = ?self.last_entry,
            count = self.count,
            "flushing collapsed entry"
        );
        let Some(last) = &self.last else {
            return Ok(());
        };

        if self.count == 1 {
            return emit(self.first_line, self.ctx, &self.state, last, &mut self.out);
        }

        let index = last.posting.as_ref().map_or(0, |p| p.index);
        let probe = Row {
            account: RowAccount::Synthetic(TOTAL_ACCOUNT.to_string()),
            entry: self.last_entry,
            posting: Some(PostingRow::synthetic(
                Amount::bare(Decimal::ZERO),
                self.subtotal.clone(),
            )),
        };
        let value = self.ctx.compute_total(&self.state, &probe)?;

        let mut running = self.base_total.clone();
        for (i, amount) in value.amounts().enumerate() {
            running.add_amount(amount)?;
            let mut posting = PostingRow::synthetic(amount.clone(), running.clone());
            posting.index = index;
            let row = Row {
                posting: Some(posting),
                ..probe.clone()
            };
            let format = if i == 0 {
                self.first_line
            } else {
                self.next_lines
            };
            emit(format, self.ctx, &self.state, &row, &mut self.out)?;
        }
        Ok(())
    }
}

fn emit<W: Write + ?Sized>(
    format: &Format,
    ctx: &ReportContext<'_>,
    state: &ReportState,
    row: &Row,
    out: &mut W,
) -> Result<(), RenderError> {
    format.render(out, &ctx.view(state, row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerfmt_core::{Entry, Journal, NaiveDate, Posting};
    use ledgerfmt_expr::Expression;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn journal() -> Journal {
        let mut journal = Journal::new();
        journal.add_entry(
            Entry::new(date(2024, 1, 1), "Opening"),
            vec![
                Posting::new("Assets:Cash", Amount::new(dec!(50), "$")),
                Posting::new("Equity", Amount::new(dec!(-50), "$")),
            ],
        );
        journal.add_entry(
            Entry::new(date(2024, 1, 2), "Lunch"),
            vec![
                Posting::new("Expenses:Food", Amount::new(dec!(12), "$")),
                Posting::new("Assets:Cash", Amount::new(dec!(-12), "$")),
            ],
        );
        journal
    }

    fn run(ctx: &ReportContext<'_>, collapsed: bool) -> String {
        let first = Format::compile("%p|%N|%t|%T|%(index)\n").unwrap();
        let next = Format::compile("+|%N|%t|%T|%(index)\n").unwrap();
        let mut formatter =
            RegisterFormatter::new(ctx, &first, &next, Vec::new()).with_collapsed(collapsed);
        formatter.format_journal().unwrap();
        String::from_utf8(formatter.finish().unwrap()).unwrap()
    }

    fn ctx(journal: &Journal) -> ReportContext<'_> {
        ReportContext::new(journal)
            .with_value_expr(Expression::parse("amount").unwrap())
            .with_total_expr(Expression::parse("total").unwrap())
    }

    #[test]
    fn test_running_totals_and_index() {
        let journal = journal();
        assert_eq!(
            run(&ctx(&journal), false),
            "Opening|Assets:Cash|$50|$50|0\n\
             +|Equity|$-50|0|1\n\
             Lunch|Expenses:Food|$12|$12|2\n\
             +|Assets:Cash|$-12|0|3\n"
        );
    }

    #[test]
    fn test_hidden_rows_do_not_feed_totals() {
        let journal = journal();
        let ctx = ctx(&journal).with_display_predicate(Expression::parse("amount > 0").unwrap());
        assert_eq!(
            run(&ctx, false),
            "Opening|Assets:Cash|$50|$50|0\n\
             Lunch|Expenses:Food|$12|$62|1\n"
        );
    }

    #[test]
    fn test_collapsed_balanced_entries_print_nothing() {
        let journal = journal();
        assert_eq!(run(&ctx(&journal), true), "");
    }

    #[test]
    fn test_collapsed_single_row_prints_itself() {
        let journal = journal();
        let ctx = ctx(&journal).with_display_predicate(Expression::parse("amount > 0").unwrap());
        assert_eq!(
            run(&ctx, true),
            "Opening|Assets:Cash|$50|$50|0\n\
             Lunch|Expenses:Food|$12|$62|1\n"
        );
    }
}
