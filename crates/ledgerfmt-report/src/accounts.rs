//! Balance report: the account tree with subtree totals.

use ledgerfmt_core::{AccountId, Journal};
use std::io::Write;

use crate::context::ReportContext;
use crate::error::RenderError;
use crate::format::Format;
use crate::row::Row;
use crate::state::ReportState;

/// Visit `start` and its descendants in pre-order, children by name.
///
/// # Errors
///
/// Stops at and returns the first error from `visit`.
pub fn walk_accounts<E>(
    journal: &Journal,
    start: AccountId,
    mut visit: impl FnMut(AccountId) -> Result<(), E>,
) -> Result<(), E> {
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        visit(id)?;
        stack.extend(journal.account(id).children.values().rev().copied());
    }
    Ok(())
}

/// Sum the value expression into every account.
///
/// Each transaction accepted by the limit predicate adds its value to its
/// account's own sum and to the subtree total of the account and all of
/// its ancestors.
///
/// # Errors
///
/// Fails when no value expression is configured or evaluation fails.
pub fn sum_accounts(ctx: &ReportContext<'_>, state: &mut ReportState) -> Result<(), RenderError> {
    let journal = ctx.journal();
    for (id, xact) in journal.transactions() {
        let row = Row::transaction(journal, id);
        if !ctx.is_within_limit(state, &row)? {
            continue;
        }
        let value = ctx.compute_value(state, &row)?;
        state.sums_mut(xact.account).own.merge(&value)?;
        for ancestor in journal.ancestors(xact.account) {
            state.sums_mut(ancestor).total.merge(&value)?;
        }
    }
    Ok(())
}

/// Account tree fold.
///
/// An account is printed when it passes the display predicate, is not the
/// root (unless the root is requested), and is within the depth limit.
/// A parent whose only non-zero child carries the same total is skipped,
/// since the child's line already says everything; the child's name then
/// includes the parent's.
pub struct AccountFormatter<'a, 'j, W: Write> {
    ctx: &'a ReportContext<'j>,
    format: &'a Format,
    out: W,
    state: ReportState,
    max_depth: usize,
    report_top: bool,
}

impl<'a, 'j, W: Write> AccountFormatter<'a, 'j, W> {
    /// Create a formatter over `ctx` with fresh state.
    pub fn new(ctx: &'a ReportContext<'j>, format: &'a Format, out: W) -> Self {
        Self {
            ctx,
            format,
            out,
            state: ReportState::new(),
            max_depth: 0,
            report_top: false,
        }
    }

    /// Only print accounts at most this deep; `0` means unlimited.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Allow the root account to be printed.
    #[must_use]
    pub const fn with_report_top(mut self, report_top: bool) -> Self {
        self.report_top = report_top;
        self
    }

    /// The per-run state, including sums and displayed accounts.
    #[must_use]
    pub const fn state(&self) -> &ReportState {
        &self.state
    }

    /// Mutable per-run state, for callers that fill in sums themselves.
    pub fn state_mut(&mut self) -> &mut ReportState {
        &mut self.state
    }

    /// Decide whether an account is printed and print it.
    ///
    /// Sums must already be in the state.
    ///
    /// # Errors
    ///
    /// Fails when the predicate or the format cannot be evaluated, or when
    /// writing fails.
    pub fn format_account(&mut self, id: AccountId) -> Result<(), RenderError> {
        let account = self.ctx.journal().account(id);
        let row = Row::account(id);

        let mut output = (self.report_top || account.parent.is_some())
            && self.ctx.is_displayed(&self.state, &row)?;

        let own_total = self.state.total(id);
        let mut counted = 0;
        let mut display = false;
        for &child in account.children.values() {
            let Some(child_total) = self.state.total(child) else {
                continue;
            };
            if Some(child_total) != own_total || counted > 0 {
                display = true;
                break;
            }
            counted += 1;
        }
        if counted == 1 && !display {
            output = false;
        }

        if output && (self.max_depth == 0 || account.depth <= self.max_depth) {
            self.format.render(&mut self.out, &self.ctx.view(&self.state, &row))?;
            self.state.mark_account_displayed(id);
        }
        Ok(())
    }

    /// Sum the journal and print the whole tree.
    ///
    /// # Errors
    ///
    /// See [`sum_accounts`] and [`format_account`](Self::format_account).
    pub fn format_journal(&mut self) -> Result<(), RenderError> {
        sum_accounts(self.ctx, &mut self.state)?;
        let journal = self.ctx.journal();
        walk_accounts(journal, journal.root(), |id| self.format_account(id))
    }

    /// Flush the writer and return it.
    ///
    /// # Errors
    ///
    /// Fails when flushing fails.
    pub fn finish(mut self) -> Result<W, RenderError> {
        self.out.flush()?;
        tracing::debug!(
            accounts = self.ctx.journal().account_count(),
            "balance report finished"
        );
        Ok(self.out)
    }
}
