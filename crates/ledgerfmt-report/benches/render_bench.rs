//! Format compile and register rendering benchmarks.
//!
//! Run with: cargo bench -p ledgerfmt-report

#![allow(missing_docs)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use ledgerfmt_core::{Amount, Decimal, Entry, Journal, NaiveDate, Posting};
use ledgerfmt_report::{balance_report, register_report, Format, ReportOptions};
use rust_decimal_macros::dec;

/// Generate a journal of two-posting entries.
fn generate_journal(num_entries: usize) -> Journal {
    let categories = ["Food", "Coffee", "Groceries", "Transport"];
    let payees = ["Store A", "Store B", "Cafe", "Gas Station", "Supermarket"];
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let mut journal = Journal::new();
    for i in 0..num_entries {
        let amount = dec!(10.00) + Decimal::from(i % 100);
        let date = start + chrono::Days::new((i / 3) as u64);
        journal.add_entry(
            Entry::new(date, payees[i % payees.len()]),
            vec![
                Posting::new(
                    format!("Expenses:{}", categories[i % categories.len()]),
                    Amount::new(amount, "USD"),
                ),
                Posting::new("Assets:Bank:Checking", Amount::new(-amount, "USD")),
            ],
        );
    }
    journal
}

fn bench_compile(c: &mut Criterion) {
    let options = ReportOptions::default();
    c.bench_function("compile_register_format", |b| {
        b.iter(|| Format::compile(black_box(&options.first_line_format)));
    });
    c.bench_function("compile_expression_format", |b| {
        b.iter(|| Format::compile(black_box("%-20(account) %12(amount * 2 + total) %[%Y-%m]\n")));
    });
}

fn bench_reports(c: &mut Criterion) {
    let mut group = c.benchmark_group("reports");
    let options = ReportOptions::default();

    for size in [100, 1000] {
        let journal = generate_journal(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("register", size), &journal, |b, journal| {
            b.iter(|| register_report(journal, &options, Vec::new()));
        });
        group.bench_with_input(BenchmarkId::new("balance", size), &journal, |b, journal| {
            b.iter(|| balance_report(journal, &options, Vec::new()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compile, bench_reports);
criterion_main!(benches);
