//! Command-line reports for ledgerfmt.
//!
//! This crate provides the `ledgerfmt-report` tool, which prints register
//! and balance reports for a JSON journal:
//!
//! ```bash
//! ledgerfmt-report journal.json register
//! ledgerfmt-report journal.json register --collapse -d 'account =~ /^Expenses/'
//! ledgerfmt-report journal.json balance --depth 2
//! ledgerfmt-report journal.json balance -F '%-30N %12T\n'
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
pub mod diagnostics;
pub mod journal_file;
