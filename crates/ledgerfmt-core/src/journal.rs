//! The account/entry/transaction graph that reports are rendered from.
//!
//! The graph lives in an arena: accounts, entries and transactions are
//! stored in vectors and refer to each other through the [`AccountId`],
//! [`EntryId`] and [`TransactionId`] handles. Nothing in the journal changes
//! while a report runs; per-report flags such as "displayed" live in the
//! report's own state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::amount::Amount;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            /// Position of the item in its arena.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Handle to an [`Account`] in a [`Journal`].
    AccountId
);
arena_id!(
    /// Handle to an [`Entry`] in a [`Journal`].
    EntryId
);
arena_id!(
    /// Handle to a [`Transaction`] in a [`Journal`].
    TransactionId
);

/// A node in the `:`-separated account hierarchy.
#[derive(Debug, Clone)]
pub struct Account {
    /// Last path component (`Checking` for `Assets:Bank:Checking`).
    pub name: String,
    /// Parent account; `None` only for the root.
    pub parent: Option<AccountId>,
    /// Child accounts ordered by name.
    pub children: BTreeMap<String, AccountId>,
    /// Distance from the root (the root is 0, top-level accounts are 1).
    pub depth: usize,
}

/// Clearing state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    /// Not yet reconciled.
    #[default]
    Uncleared,
    /// Reconciled against a statement.
    Cleared,
    /// Awaiting reconciliation.
    Pending,
}

/// A dated record grouping transactions that balance to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entry {
    /// Posting date; undated entries render a blank date column.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Clearing state.
    #[serde(default)]
    pub state: EntryState,
    /// Check number or other reference code; empty when absent.
    #[serde(default)]
    pub code: String,
    /// Who the money went to or came from.
    pub payee: String,
    /// Transactions of this entry in source order.
    #[serde(skip)]
    pub transactions: Vec<TransactionId>,
}

impl Entry {
    /// Create a new uncleared entry.
    #[must_use]
    pub fn new(date: NaiveDate, payee: impl Into<String>) -> Self {
        Self {
            date: Some(date),
            payee: payee.into(),
            ..Self::default()
        }
    }

    /// Set the clearing state.
    #[must_use]
    pub const fn with_state(mut self, state: EntryState) -> Self {
        self.state = state;
        self
    }

    /// Set the reference code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Check if the entry is cleared.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.state == EntryState::Cleared
    }
}

/// Flags carried by a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionFlags {
    /// Posted to a virtual account (`(Account)` or `[Account]`).
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    /// A virtual posting that must still balance (`[Account]`).
    pub balance: bool,
    /// Generated automatically rather than written by the user.
    pub auto: bool,
}

/// One line of an entry, stored in the journal.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Owning entry.
    pub entry: EntryId,
    /// Account posted to.
    pub account: AccountId,
    /// Quantity moved.
    pub amount: Amount,
    /// Price paid for the quantity, when it differs from the amount.
    pub cost: Option<Amount>,
    /// Trailing comment text.
    pub note: String,
    /// Virtual/balance/auto flags.
    pub flags: TransactionFlags,
}

impl Transaction {
    /// The cost of this transaction; the amount itself when no cost was given.
    #[must_use]
    pub fn cost(&self) -> &Amount {
        self.cost.as_ref().unwrap_or(&self.amount)
    }
}

/// A transaction about to be added to a journal.
///
/// # Example
///
/// ```
/// use ledgerfmt_core::{Amount, Entry, Journal, NaiveDate, Posting};
/// use rust_decimal_macros::dec;
///
/// let mut journal = Journal::new();
/// let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// let entry = journal.add_entry(
///     Entry::new(date, "Grocery Store"),
///     vec![
///         Posting::new("Expenses:Food", Amount::new(dec!(42.10), "$")),
///         Posting::new("Assets:Checking", Amount::new(dec!(-42.10), "$")),
///     ],
/// );
///
/// assert_eq!(journal.entry(entry).transactions.len(), 2);
/// let food = journal.find_account("Expenses:Food").unwrap();
/// assert_eq!(journal.fullname(food), "Expenses:Food");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posting {
    /// Full account path.
    pub account: String,
    /// Quantity moved.
    pub amount: Amount,
    /// Optional total cost.
    #[serde(default)]
    pub cost: Option<Amount>,
    /// Optional comment.
    #[serde(default)]
    pub note: String,
    /// Flags.
    #[serde(default)]
    pub flags: TransactionFlags,
}

impl Posting {
    /// Create a posting of `amount` to `account`.
    #[must_use]
    pub fn new(account: impl Into<String>, amount: Amount) -> Self {
        Self {
            account: account.into(),
            amount,
            cost: None,
            note: String::new(),
            flags: TransactionFlags::default(),
        }
    }

    /// Set the total cost.
    #[must_use]
    pub fn with_cost(mut self, cost: Amount) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Set the note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Mark the posting virtual; `balance` selects `[...]` over `(...)`.
    #[must_use]
    pub const fn virtual_posting(mut self, balance: bool) -> Self {
        self.flags.is_virtual = true;
        self.flags.balance = balance;
        self
    }

    /// Mark the posting as automatically generated.
    #[must_use]
    pub const fn automated(mut self) -> Self {
        self.flags.auto = true;
        self
    }
}

/// The account tree plus every entry and transaction.
#[derive(Debug, Clone)]
pub struct Journal {
    accounts: Vec<Account>,
    entries: Vec<Entry>,
    transactions: Vec<Transaction>,
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}

impl Journal {
    /// Create a journal holding only the root account.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: vec![Account {
                name: String::new(),
                parent: None,
                children: BTreeMap::new(),
                depth: 0,
            }],
            entries: Vec::new(),
            transactions: Vec::new(),
        }
    }

    /// The synthetic root account.
    #[must_use]
    pub const fn root(&self) -> AccountId {
        AccountId(0)
    }

    /// Look up an account by its full `:`-separated path.
    #[must_use]
    pub fn find_account(&self, path: &str) -> Option<AccountId> {
        path.split(':').try_fold(self.root(), |id, part| {
            self.accounts[id.0].children.get(part).copied()
        })
    }

    /// Look up an account by path, creating any missing components.
    pub fn find_or_create_account(&mut self, path: &str) -> AccountId {
        let mut current = self.root();
        for part in path.split(':') {
            if let Some(&child) = self.accounts[current.0].children.get(part) {
                current = child;
                continue;
            }
            let child = AccountId(self.accounts.len());
            let depth = self.accounts[current.0].depth + 1;
            self.accounts.push(Account {
                name: part.to_string(),
                parent: Some(current),
                children: BTreeMap::new(),
                depth,
            });
            self.accounts[current.0]
                .children
                .insert(part.to_string(), child);
            current = child;
        }
        current
    }

    /// Add an entry together with its postings.
    pub fn add_entry(
        &mut self,
        mut entry: Entry,
        postings: impl IntoIterator<Item = Posting>,
    ) -> EntryId {
        let entry_id = EntryId(self.entries.len());
        entry.transactions.clear();
        for posting in postings {
            let account = self.find_or_create_account(&posting.account);
            let id = TransactionId(self.transactions.len());
            self.transactions.push(Transaction {
                entry: entry_id,
                account,
                amount: posting.amount,
                cost: posting.cost,
                note: posting.note,
                flags: posting.flags,
            });
            entry.transactions.push(id);
        }
        self.entries.push(entry);
        entry_id
    }

    /// Get an account.
    #[must_use]
    pub fn account(&self, id: AccountId) -> &Account {
        &self.accounts[id.0]
    }

    /// Get an entry.
    #[must_use]
    pub fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id.0]
    }

    /// Get a transaction.
    #[must_use]
    pub fn transaction(&self, id: TransactionId) -> &Transaction {
        &self.transactions[id.0]
    }

    /// Number of accounts, the root included.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Iterate over all entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (EntryId, &Entry)> {
        self.entries.iter().enumerate().map(|(i, e)| (EntryId(i), e))
    }

    /// Iterate over all transactions in journal order.
    pub fn transactions(&self) -> impl Iterator<Item = (TransactionId, &Transaction)> {
        self.transactions
            .iter()
            .enumerate()
            .map(|(i, t)| (TransactionId(i), t))
    }

    /// Walk from an account up to the root, starting with the account itself.
    pub fn ancestors(&self, id: AccountId) -> impl Iterator<Item = AccountId> + '_ {
        std::iter::successors(Some(id), |&current| self.accounts[current.0].parent)
    }

    /// The fully qualified `:`-joined name; empty for the root.
    #[must_use]
    pub fn fullname(&self, id: AccountId) -> String {
        let mut parts: Vec<&str> = self
            .ancestors(id)
            .filter(|&a| self.accounts[a.0].parent.is_some())
            .map(|a| self.accounts[a.0].name.as_str())
            .collect();
        parts.reverse();
        parts.join(":")
    }
}
