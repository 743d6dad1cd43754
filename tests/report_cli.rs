//! E2E tests driving the compiled binary against fixture ledgers.
//!
//! A fixed --today keeps the anti-application lifecycle fields stable.

use std::process::Command;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const LEDGER_ARGS: [&str; 6] = [
    "-t",
    "tests/data/transactions.csv",
    "-a",
    "tests/data/account.csv",
    "--today",
    "2030-01-01",
];

fn run(subcommand: &str, extra: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "--quiet", "--", subcommand])
        .args(LEDGER_ARGS)
        .args(extra)
        .output()
        .expect("failed to execute command")
}

fn decimal(value: &serde_json::Value) -> Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected decimal string, got {value}"))
        .parse()
        .unwrap()
}

#[test]
fn report_text_shows_years_and_blocked_note() {
    let output = run("report", &[]);
    assert!(output.status.success(), "command failed: {output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("EJERCICIO 2022"));
    assert!(stdout.contains("EJERCICIO 2023"));
    assert!(stdout.contains("BLOQ (2 Meses)"));
    assert!(stdout.contains("DIVIDENDOS"));
    assert!(stdout.contains("CARTERA A 31-12-2023"));
}

#[test]
fn report_json_matches_the_fixture_arithmetic() {
    let output = run("report", &["--json"]);
    assert!(output.status.success(), "command failed: {output:?}");

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("report --json must emit valid JSON");

    assert_eq!(report["global"]["years_list"], serde_json::json!([2022, 2023]));
    assert_eq!(decimal(&report["global"]["total_pnl"]), dec!(10));
    assert_eq!(decimal(&report["global"]["total_pnl_real"]), dec!(-10));
    assert_eq!(decimal(&report["global"]["total_divs_net"]), dec!(85));
    assert_eq!(decimal(&report["global"]["total_fees"]), dec!(9.5));
    assert_eq!(
        decimal(&report["global"]["current_portfolio_value"]),
        dec!(91)
    );

    let year = &report["years"]["2023"];
    assert_eq!(decimal(&year["blocked_loss"]), dec!(20));
    assert_eq!(year["wins"], 1);
    assert_eq!(year["losses"], 1);

    let blocked = &year["disposals"][0];
    assert_eq!(blocked["isin"], "ES0202020202");
    assert_eq!(blocked["blocked"], true);
    assert_eq!(blocked["blocked_status"], "released");
    assert_eq!(blocked["unlock_date"], "21-06-2023");
}

#[test]
fn summary_lists_both_years() {
    let output = run("summary", &[]);
    assert!(output.status.success(), "command failed: {output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RESUMEN POR EJERCICIO"));
    assert!(stdout.contains("2022"));
    assert!(stdout.contains("2023"));
    assert!(stdout.contains("CARTERA ACTUAL"));
}

#[test]
fn validate_passes_on_the_fixture() {
    let output = run("validate", &[]);
    assert!(output.status.success(), "command failed: {output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No issues found"));
}

#[test]
fn schema_emits_the_result_structure() {
    let output = Command::new("cargo")
        .args(["run", "--quiet", "--", "schema"])
        .output()
        .expect("failed to execute command");
    assert!(output.status.success(), "command failed: {output:?}");

    let schema: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("schema must emit valid JSON");
    assert_eq!(schema["title"], "TaxReport");
    assert!(schema["properties"]["global"].is_object());
    assert!(schema["properties"]["years"].is_object());
}
