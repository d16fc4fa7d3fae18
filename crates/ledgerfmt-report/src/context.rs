//! Rendering context and the row scope expressions evaluate in.

use ledgerfmt_core::{Amount, Balance, Decimal, Entry, EntryState, Journal};
use ledgerfmt_expr::{Expression, Scope, Value};

use crate::error::RenderError;
use crate::row::{PostingRow, Row, RowAccount};
use crate::state::ReportState;

/// Everything a report needs besides its rows: the journal and the
/// configured expressions.
///
/// The value and total expressions back `%t` and `%T`; either may be left
/// unset, in which case using it is a [`RenderError`]. The display
/// predicate decides which rows are printed and the limit predicate which
/// transactions take part in the report at all.
#[derive(Debug, Clone)]
pub struct ReportContext<'j> {
    journal: &'j Journal,
    value_expr: Option<Expression>,
    total_expr: Option<Expression>,
    display_predicate: Option<Expression>,
    limit_predicate: Option<Expression>,
}

impl<'j> ReportContext<'j> {
    /// Create a context with no expressions configured.
    #[must_use]
    pub const fn new(journal: &'j Journal) -> Self {
        Self {
            journal,
            value_expr: None,
            total_expr: None,
            display_predicate: None,
            limit_predicate: None,
        }
    }

    /// Set the value expression used by `%t`.
    #[must_use]
    pub fn with_value_expr(mut self, expr: Expression) -> Self {
        self.value_expr = Some(expr);
        self
    }

    /// Set the total expression used by `%T`.
    #[must_use]
    pub fn with_total_expr(mut self, expr: Expression) -> Self {
        self.total_expr = Some(expr);
        self
    }

    /// Set the predicate rows must satisfy to be printed.
    #[must_use]
    pub fn with_display_predicate(mut self, expr: Expression) -> Self {
        self.display_predicate = Some(expr);
        self
    }

    /// Set the predicate transactions must satisfy to be reported on.
    #[must_use]
    pub fn with_limit_predicate(mut self, expr: Expression) -> Self {
        self.limit_predicate = Some(expr);
        self
    }

    /// The journal being reported on.
    #[must_use]
    pub const fn journal(&self) -> &'j Journal {
        self.journal
    }

    /// A scope over one row.
    #[must_use]
    pub const fn view<'a>(&'a self, state: &'a ReportState, row: &'a Row) -> RowView<'a> {
        RowView {
            ctx: self,
            state,
            row,
        }
    }

    /// Evaluate the value expression for a row.
    ///
    /// # Errors
    ///
    /// Fails when no value expression is set, when evaluation fails, or when
    /// the result is not numeric.
    pub fn compute_value(&self, state: &ReportState, row: &Row) -> Result<Balance, RenderError> {
        let expr = self
            .value_expr
            .as_ref()
            .ok_or(RenderError::MissingValueExpression)?;
        numeric(&expr.evaluate(&self.view(state, row))?)
    }

    /// Evaluate the total expression for a row.
    ///
    /// # Errors
    ///
    /// Fails when no total expression is set, when evaluation fails, or when
    /// the result is not numeric.
    pub fn compute_total(&self, state: &ReportState, row: &Row) -> Result<Balance, RenderError> {
        let expr = self
            .total_expr
            .as_ref()
            .ok_or(RenderError::MissingTotalExpression)?;
        numeric(&expr.evaluate(&self.view(state, row))?)
    }

    /// Check the display predicate; rows pass when none is set.
    ///
    /// # Errors
    ///
    /// Fails when the predicate cannot be evaluated for this row.
    pub fn is_displayed(&self, state: &ReportState, row: &Row) -> Result<bool, RenderError> {
        check(self.display_predicate.as_ref(), &self.view(state, row))
    }

    /// Check the limit predicate; rows pass when none is set.
    ///
    /// # Errors
    ///
    /// Fails when the predicate cannot be evaluated for this row.
    pub fn is_within_limit(&self, state: &ReportState, row: &Row) -> Result<bool, RenderError> {
        check(self.limit_predicate.as_ref(), &self.view(state, row))
    }
}

fn check(predicate: Option<&Expression>, view: &RowView<'_>) -> Result<bool, RenderError> {
    match predicate {
        Some(expr) => Ok(expr.matches(view)?),
        None => Ok(true),
    }
}

fn numeric(value: &Value) -> Result<Balance, RenderError> {
    value
        .to_balance()
        .ok_or(RenderError::NonNumeric(value.type_name()))
}

/// A row together with the context and state it is rendered in.
///
/// This is the [`Scope`] embedded expressions and predicates see. Account
/// rows expose the account's own sum as `amount` and its subtree sum as
/// `total`; register rows expose the transaction values computed by the
/// register fold.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    ctx: &'a ReportContext<'a>,
    state: &'a ReportState,
    row: &'a Row,
}

impl<'a> RowView<'a> {
    /// The context.
    #[must_use]
    pub const fn context(&self) -> &'a ReportContext<'a> {
        self.ctx
    }

    /// The per-run state.
    #[must_use]
    pub const fn state(&self) -> &'a ReportState {
        self.state
    }

    /// The row.
    #[must_use]
    pub const fn row(&self) -> &'a Row {
        self.row
    }

    /// The row's entry.
    #[must_use]
    pub fn entry(&self) -> Option<&'a Entry> {
        self.row.entry.map(|id| self.ctx.journal().entry(id))
    }

    /// The row's transaction values.
    #[must_use]
    pub const fn posting(&self) -> Option<&'a PostingRow> {
        self.row.posting.as_ref()
    }

    /// The fully qualified account name.
    #[must_use]
    pub fn account_fullname(&self) -> Option<String> {
        match &self.row.account {
            RowAccount::None => None,
            RowAccount::Journal(id) => Some(self.ctx.journal().fullname(*id)),
            RowAccount::Synthetic(name) => Some(name.clone()),
        }
    }

    /// The account name up to, not including, the nearest displayed
    /// ancestor.
    #[must_use]
    pub fn partial_account_name(&self) -> Option<String> {
        let id = match &self.row.account {
            RowAccount::None => return None,
            RowAccount::Synthetic(name) => return Some(name.clone()),
            RowAccount::Journal(id) => *id,
        };
        let journal = self.ctx.journal();
        let mut parts: Vec<&str> = journal
            .ancestors(id)
            .take_while(|&a| {
                journal.account(a).parent.is_some() && !self.state.is_account_displayed(a)
            })
            .map(|a| journal.account(a).name.as_str())
            .collect();
        parts.reverse();
        Some(parts.join(":"))
    }

    /// How many of the account and its ancestors have been displayed.
    #[must_use]
    pub fn displayed_ancestors(&self) -> usize {
        self.row.account_id().map_or(0, |id| {
            self.ctx
                .journal()
                .ancestors(id)
                .filter(|&a| self.state.is_account_displayed(a))
                .count()
        })
    }

    /// The row value, `%t`.
    ///
    /// # Errors
    ///
    /// See [`ReportContext::compute_value`].
    pub fn compute_value(&self) -> Result<Balance, RenderError> {
        self.ctx.compute_value(self.state, self.row)
    }

    /// The row total, `%T`.
    ///
    /// # Errors
    ///
    /// See [`ReportContext::compute_total`].
    pub fn compute_total(&self) -> Result<Balance, RenderError> {
        self.ctx.compute_total(self.state, self.row)
    }

    fn entry_field(&self, f: impl FnOnce(&Entry) -> Value) -> Value {
        self.entry().map_or(Value::Null, f)
    }

    fn posting_field(&self, f: impl FnOnce(&PostingRow) -> Value) -> Value {
        self.posting().map_or(Value::Null, f)
    }
}

impl Scope for RowView<'_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        let account_sums = || self.row.account_id().map(|id| self.state.sums(id));
        let value = match name {
            "amount" | "a" | "cost" | "b" => match self.posting() {
                Some(p) if matches!(name, "amount" | "a") => Value::Amount(p.amount.clone()),
                Some(p) => Value::Amount(p.cost.clone()),
                None => account_sums().map_or(Value::Null, |s| Value::Balance(s.own)),
            },
            "total" | "O" | "cost_total" | "B" => match self.posting() {
                Some(p) if matches!(name, "total" | "O") => Value::Balance(p.total.clone()),
                Some(p) => Value::Balance(p.cost_total.clone()),
                None => account_sums().map_or(Value::Null, |s| Value::Balance(s.total)),
            },
            "index" => self.posting_field(|p| Value::Amount(Amount::bare(Decimal::from(p.index)))),
            "date" | "d" => self.entry_field(|e| e.date.map_or(Value::Null, Value::Date)),
            "payee" | "P" => self.entry_field(|e| Value::from(e.payee.as_str())),
            "code" => self.entry_field(|e| Value::from(e.code.as_str())),
            "cleared" | "X" => self.entry_field(|e| Value::Bool(e.state == EntryState::Cleared)),
            "pending" => self.entry_field(|e| Value::Bool(e.state == EntryState::Pending)),
            "note" => self.posting_field(|p| Value::from(p.note.as_str())),
            "virtual" => self.posting_field(|p| Value::Bool(p.flags.is_virtual)),
            "real" | "R" => self.posting_field(|p| Value::Bool(!p.flags.is_virtual)),
            "auto" => self.posting_field(|p| Value::Bool(p.flags.auto)),
            "account" | "A" => self.account_fullname().map_or(Value::Null, Value::String),
            "depth" => self.row.account_id().map_or(Value::Null, |id| {
                let depth = self.ctx.journal().account(id).depth;
                Value::Amount(Amount::bare(Decimal::from(depth)))
            }),
            _ => return None,
        };
        Some(value)
    }
}
