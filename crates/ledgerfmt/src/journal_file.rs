//! JSON journal files.
//!
//! A journal file is a list of entries, each with its postings:
//!
//! ```json
//! {
//!   "entries": [
//!     {
//!       "date": "2024-01-15",
//!       "payee": "Grocery Store",
//!       "state": "cleared",
//!       "code": "1042",
//!       "postings": [
//!         { "account": "Expenses:Food", "amount": "$42.10", "note": "weekly" },
//!         { "account": "Assets:Checking", "amount": "$-42.10" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Amounts are strings in display form (`$42.10`, `10 AAPL`, `7`). A
//! posting may also carry a total `cost` and `flags` with `virtual`,
//! `balance` and `auto`.

use anyhow::{Context, Result};
use ledgerfmt_core::{Entry, Journal, Posting};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JournalFile {
    entries: Vec<EntryRecord>,
}

#[derive(Debug, Deserialize)]
struct EntryRecord {
    #[serde(flatten)]
    entry: Entry,
    #[serde(default)]
    postings: Vec<Posting>,
}

/// Build a journal from JSON text.
///
/// # Errors
///
/// Fails when the text is not a valid journal file.
pub fn parse_journal(text: &str) -> Result<Journal> {
    let file: JournalFile = serde_json::from_str(text).context("invalid journal file")?;
    let mut journal = Journal::new();
    for record in file.entries {
        journal.add_entry(record.entry, record.postings);
    }
    tracing::debug!(
        entries = journal.entries().count(),
        accounts = journal.account_count(),
        "loaded journal"
    );
    Ok(journal)
}

/// Read and parse a journal file.
///
/// # Errors
///
/// Fails when the file cannot be read or parsed.
pub fn load_journal(path: &Path) -> Result<Journal> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_journal(&text).with_context(|| format!("failed to load {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerfmt_core::{Amount, EntryState, NaiveDate};
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_journal() {
        let journal = parse_journal(
            r#"{
                "entries": [
                    {
                        "date": "2024-01-15",
                        "payee": "Broker",
                        "state": "pending",
                        "postings": [
                            { "account": "Assets:Brokerage", "amount": "10 AAPL", "cost": "$1500" },
                            { "account": "Assets:Checking", "amount": "$-1500" },
                            { "account": "Budget", "amount": "$1500",
                              "flags": { "virtual": true, "balance": true } }
                        ]
                    },
                    { "payee": "Undated", "postings": [] }
                ]
            }"#,
        )
        .unwrap();

        let (_, entry) = journal.entries().next().unwrap();
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(entry.state, EntryState::Pending);
        assert_eq!(entry.transactions.len(), 3);

        let brokerage = journal.transaction(entry.transactions[0]);
        assert_eq!(brokerage.amount, Amount::new(dec!(10), "AAPL"));
        assert_eq!(brokerage.cost(), &Amount::new(dec!(1500), "$"));
        assert!(journal.transaction(entry.transactions[2]).flags.balance);

        let (_, undated) = journal.entries().nth(1).unwrap();
        assert_eq!(undated.date, None);
    }

    #[test]
    fn test_parse_journal_rejects_bad_amount() {
        let err = parse_journal(
            r#"{ "entries": [ { "payee": "x", "postings": [ { "account": "A", "amount": "$$" } ] } ] }"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").starts_with("invalid journal file"));
    }
}
