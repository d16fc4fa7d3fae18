//! ledgerfmt-report - Print register and balance reports.
//!
//! Thin wrapper around the report command.

fn main() -> std::process::ExitCode {
    ledgerfmt::cmd::report_cmd::main()
}
