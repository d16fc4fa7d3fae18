//! Report rows.
//!
//! A [`Row`] is what one rendering of a format is evaluated against: an
//! account-tree line, a register line for one transaction, or a synthetic
//! subtotal line. It refers into the journal by id and carries the values
//! a report fold computed for it (possibly inverted amount, running totals,
//! sequence index).

use ledgerfmt_core::{AccountId, Amount, Balance, EntryId, Journal, TransactionFlags, TransactionId};

/// Account a row is about.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RowAccount {
    /// No account.
    #[default]
    None,
    /// An account in the journal.
    Journal(AccountId),
    /// A made-up account such as `<Total>` on a collapsed subtotal line.
    Synthetic(String),
}

/// Transaction-level values of a register row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingRow {
    /// The journal transaction; `None` on synthetic subtotal lines.
    pub transaction: Option<TransactionId>,
    /// Amount as shown (negated in inverted reports).
    pub amount: Amount,
    /// Cost as shown.
    pub cost: Amount,
    /// Running total of amounts, this row included.
    pub total: Balance,
    /// Running total of costs, this row included.
    pub cost_total: Balance,
    /// Zero-based position among displayed rows.
    pub index: usize,
    /// Virtual/balance/auto flags.
    pub flags: TransactionFlags,
    /// Transaction note.
    pub note: String,
}

impl PostingRow {
    /// Values for a journal transaction, with totals equal to its own amount.
    #[must_use]
    pub fn from_transaction(journal: &Journal, id: TransactionId) -> Self {
        let xact = journal.transaction(id);
        Self {
            transaction: Some(id),
            amount: xact.amount.clone(),
            cost: xact.cost().clone(),
            total: Balance::from(xact.amount.clone()),
            cost_total: Balance::from(xact.cost().clone()),
            index: 0,
            flags: xact.flags,
            note: xact.note.clone(),
        }
    }

    /// A synthetic posting holding `amount`, as used for subtotal lines.
    #[must_use]
    pub fn synthetic(amount: Amount, total: Balance) -> Self {
        Self {
            transaction: None,
            cost: amount.clone(),
            amount,
            cost_total: total.clone(),
            total,
            index: 0,
            flags: TransactionFlags::default(),
            note: String::new(),
        }
    }
}

/// One unit a format is rendered against.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    /// Account, if any.
    pub account: RowAccount,
    /// Entry supplying date, payee, code and state, if any.
    pub entry: Option<EntryId>,
    /// Transaction values, if this is a register row.
    pub posting: Option<PostingRow>,
}

impl Row {
    /// An account-tree row.
    #[must_use]
    pub fn account(id: AccountId) -> Self {
        Self {
            account: RowAccount::Journal(id),
            ..Self::default()
        }
    }

    /// A register row for a journal transaction.
    #[must_use]
    pub fn transaction(journal: &Journal, id: TransactionId) -> Self {
        Self::with_posting(journal, PostingRow::from_transaction(journal, id))
    }

    /// A register row for already computed posting values.
    #[must_use]
    pub fn with_posting(journal: &Journal, posting: PostingRow) -> Self {
        let (account, entry) = posting.transaction.map_or((RowAccount::None, None), |id| {
            let xact = journal.transaction(id);
            (RowAccount::Journal(xact.account), Some(xact.entry))
        });
        Self {
            account,
            entry,
            posting: Some(posting),
        }
    }

    /// The journal account id, if the row has one.
    #[must_use]
    pub const fn account_id(&self) -> Option<AccountId> {
        match self.account {
            RowAccount::Journal(id) => Some(id),
            RowAccount::None | RowAccount::Synthetic(_) => None,
        }
    }
}
