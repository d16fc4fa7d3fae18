//! Integration tests for the ledgerfmt-report command.

use clap::Parser;
use ledgerfmt::cmd::report_cmd::{run, Args};
use std::io::Write;
use tempfile::NamedTempFile;

const JOURNAL: &str = r#"{
  "entries": [
    {
      "date": "2024-02-01",
      "payee": "Employer",
      "state": "cleared",
      "postings": [
        { "account": "Assets:Checking", "amount": "$2000" },
        { "account": "Income:Salary", "amount": "$-2000" }
      ]
    },
    {
      "date": "2024-02-03",
      "payee": "Market",
      "code": "17",
      "postings": [
        { "account": "Expenses:Food", "amount": "$60", "note": "produce" },
        { "account": "Assets:Checking", "amount": "$-60" }
      ]
    }
  ]
}"#;

fn write_temp(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

fn run_cli(argv: &[&str]) -> (anyhow::Result<()>, String, String) {
    let journal = write_temp(JOURNAL);
    let path = journal.path().to_str().unwrap().to_string();
    let args = Args::try_parse_from(
        std::iter::once("ledgerfmt-report")
            .chain(std::iter::once(path.as_str()))
            .chain(argv.iter().copied()),
    )
    .unwrap();

    let mut out = Vec::new();
    let mut err = Vec::new();
    let result = run(&args, &mut out, &mut err, false);
    (
        result,
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
    )
}

#[test]
fn test_register_with_custom_format() {
    let (result, out, _) = run_cli(&["register", "-F", r"%X%C%p:%N %t\n", "--next-format", r"  %N %t\n"]);
    result.unwrap();
    assert_eq!(
        out,
        "* Employer:Assets:Checking $2000\n  \
         Income:Salary $-2000\n\
         (17) Market:Expenses:Food $60\n  \
         Assets:Checking $-60\n"
    );
}

#[test]
fn test_register_display_and_limit() {
    let (result, out, _) = run_cli(&[
        "register",
        "-F",
        r"%p %N %T\n",
        "--next-format",
        r"%p %N %T\n",
        "-l",
        "account =~ /Checking/",
        "-d",
        "amount < 0",
    ]);
    result.unwrap();
    assert_eq!(out, "Market Assets:Checking $-60\n");
}

#[test]
fn test_balance_report() {
    let (result, out, _) = run_cli(&["balance", "-F", r"%-18N|%8T\n"]);
    result.unwrap();
    assert_eq!(
        out,
        "Assets:Checking   |   $1940\n\
         Expenses:Food     |     $60\n\
         Income:Salary     |  $-2000\n"
    );
}

#[test]
fn test_options_file_and_override() {
    let options = write_temp(r#"{ "balance_format": "%N %T\n", "max_depth": 1 }"#);
    let path = options.path().to_str().unwrap();

    let (result, out, _) = run_cli(&["balance", "--options", path]);
    result.unwrap();
    assert_eq!(out, "");

    let (result, out, _) = run_cli(&["balance", "--options", path, "--depth", "0", "-F", r"%n\n"]);
    result.unwrap();
    assert_eq!(out, "Assets:Checking\nExpenses:Food\nIncome:Salary\n");
}

#[test]
fn test_bad_format_writes_diagnostic() {
    let (result, out, err) = run_cli(&["register", "-F", "%d %(amount"]);
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("invalid first_line_format"), "{message}");
    assert!(out.is_empty());
    assert!(err.contains("missing ')'"), "{err}");
}

#[test]
fn test_missing_journal() {
    let args = Args::try_parse_from(["ledgerfmt-report", "/nonexistent/journal.json", "balance"])
        .unwrap();
    let result = run(&args, &mut Vec::new(), &mut Vec::new(), false);
    assert!(format!("{:#}", result.unwrap_err()).contains("failed to read"));
}
