//! Per-run report state.
//!
//! A report marks accounts and transactions as displayed while it runs and
//! keeps per-account sums. None of that belongs to the journal, so it lives
//! here, keyed by id, and is thrown away with the report.

use ledgerfmt_core::{AccountId, Balance, TransactionId};
use std::collections::{HashMap, HashSet};

/// Sums of the value expression for one account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSums {
    /// Transactions posted directly to the account.
    pub own: Balance,
    /// The account and all of its descendants.
    pub total: Balance,
}

/// Side table of displayed flags and account sums for one report run.
#[derive(Debug, Default)]
pub struct ReportState {
    displayed_accounts: HashSet<AccountId>,
    displayed_transactions: HashSet<TransactionId>,
    sums: HashMap<AccountId, AccountSums>,
}

impl ReportState {
    /// Create empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag an account as printed.
    pub fn mark_account_displayed(&mut self, id: AccountId) {
        self.displayed_accounts.insert(id);
    }

    /// Check whether an account has been printed.
    #[must_use]
    pub fn is_account_displayed(&self, id: AccountId) -> bool {
        self.displayed_accounts.contains(&id)
    }

    /// Flag a transaction as printed.
    pub fn mark_transaction_displayed(&mut self, id: TransactionId) {
        self.displayed_transactions.insert(id);
    }

    /// Check whether a transaction has been printed.
    #[must_use]
    pub fn is_transaction_displayed(&self, id: TransactionId) -> bool {
        self.displayed_transactions.contains(&id)
    }

    /// Number of transactions printed so far.
    #[must_use]
    pub fn displayed_transaction_count(&self) -> usize {
        self.displayed_transactions.len()
    }

    /// Sums for an account; zero when nothing was posted under it.
    #[must_use]
    pub fn sums(&self, id: AccountId) -> AccountSums {
        self.sums.get(&id).cloned().unwrap_or_default()
    }

    /// Subtree total for an account, or `None` when it is zero.
    #[must_use]
    pub fn total(&self, id: AccountId) -> Option<&Balance> {
        self.sums.get(&id).map(|s| &s.total).filter(|b| !b.is_zero())
    }

    /// Mutable sums for an account, created on first use.
    pub fn sums_mut(&mut self, id: AccountId) -> &mut AccountSums {
        self.sums.entry(id).or_default()
    }
}
