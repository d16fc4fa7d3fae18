//! Core types for ledgerfmt
//!
//! This crate provides the value model that report formats are rendered from:
//!
//! - [`Amount`] - A decimal number with an optional commodity
//! - [`Balance`] - A sum of amounts across commodities
//! - [`Journal`] - The account tree with its entries and transactions
//!
//! # Example
//!
//! ```
//! use ledgerfmt_core::{Amount, Balance, Entry, Journal, NaiveDate, Posting};
//! use rust_decimal_macros::dec;
//!
//! let mut journal = Journal::new();
//! journal.add_entry(
//!     Entry::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), "Payroll"),
//!     vec![
//!         Posting::new("Assets:Checking", Amount::new(dec!(2000), "$")),
//!         Posting::new("Income:Salary", Amount::new(dec!(-2000), "$")),
//!     ],
//! );
//!
//! let total = Balance::from_amounts(journal.transactions().map(|(_, t)| &t.amount))?;
//! assert!(total.is_zero());
//! # Ok::<(), ledgerfmt_core::AmountError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod balance;
pub mod journal;

pub use amount::{Amount, AmountError};
pub use balance::Balance;
pub use journal::{
    Account, AccountId, Entry, EntryId, EntryState, Journal, Posting, Transaction,
    TransactionFlags, TransactionId,
};

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
