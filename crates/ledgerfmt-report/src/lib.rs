//! Report formatting for ledgerfmt.
//!
//! This crate turns a [`Journal`](ledgerfmt_core::Journal) into text
//! reports driven by printf-like format strings:
//!
//! - [`Format`] compiles a format string into a list of [`Element`]s
//! - [`Format::render`] lays one row out into padded, truncated columns
//! - [`RegisterFormatter`] folds transactions into register lines with
//!   running totals, optionally collapsing each entry into one line
//! - [`AccountFormatter`] prints the account tree with subtree totals
//!
//! # Example
//!
//! ```
//! use ledgerfmt_core::{Amount, Entry, Journal, NaiveDate, Posting};
//! use ledgerfmt_report::{register_report, ReportOptions};
//! use rust_decimal_macros::dec;
//!
//! let mut journal = Journal::new();
//! journal.add_entry(
//!     Entry::new(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), "Bakery"),
//!     vec![
//!         Posting::new("Expenses:Food", Amount::new(dec!(4.50), "$")),
//!         Posting::new("Assets:Cash", Amount::new(dec!(-4.50), "$")),
//!     ],
//! );
//!
//! let options = ReportOptions {
//!     first_line_format: "%d %-8p %-14N %6t\n".to_string(),
//!     next_lines_format: " ".repeat(20) + "%-14N %6t\n",
//!     ..ReportOptions::default()
//! };
//! let out = register_report(&journal, &options, Vec::new()).unwrap();
//! let lines: Vec<_> = std::str::from_utf8(&out).unwrap().lines().collect();
//! assert_eq!(lines[0], "2024/01/15 Bakery   Expenses:Food   $4.50");
//! assert_eq!(lines[1].trim_start(), "Assets:Cash    $-4.50");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod accounts;
pub mod context;
pub mod error;
pub mod format;
pub mod options;
pub mod register;
pub mod render;
pub mod row;
pub mod state;

pub use accounts::{sum_accounts, walk_accounts, AccountFormatter};
pub use context::{ReportContext, RowView};
pub use error::{FormatError, FormatErrorKind, OptionsError, RenderError, ReportError};
pub use format::{Element, ElementKind, Format, DEFAULT_DATE_FORMAT};
pub use options::{balance_report, register_report, ReportOptions};
pub use register::{RegisterFormatter, TOTAL_ACCOUNT};
pub use render::{truncate, MAX_FIELD_WIDTH};
pub use row::{PostingRow, Row, RowAccount};
pub use state::{AccountSums, ReportState};
