//! Integration tests for the command-line interface

use std::process::{Command, Output};

use tabclean::CleaningReport;

use crate::common::TestContext;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tabclean"))
        .args(args)
        .output()
        .expect("Failed to run tabclean binary")
}

#[test]
fn test_no_arguments_prints_usage() {
    let output = run(&[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "stderr was: {}", stderr);
}

#[test]
fn test_clean_prints_text_report() {
    let ctx = TestContext::with_fixture("customers");
    let input = ctx.path("customers.csv");
    let output = run(&["clean", "--input", input.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Original Rows: 6"));
    assert!(stdout.contains("Cleaned data written to"));
    assert!(ctx.path("customers_cleaned.csv").exists());
}

#[test]
fn test_clean_json_report_on_stdout() {
    let ctx = TestContext::with_fixture("customers");
    let input = ctx.path("customers.csv");
    let target = ctx.path("clean.csv");
    let output = run(&[
        "clean",
        "--input",
        input.to_str().unwrap(),
        "--output",
        target.to_str().unwrap(),
        "--json",
    ]);

    assert!(output.status.success());
    let report: CleaningReport = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report.final_rows, 4);
    assert!(target.exists());
}

#[test]
fn test_clean_with_preview() {
    let ctx = TestContext::with_fixture("inventory");
    let input = ctx.path("inventory.csv");
    let output = run(&["clean", "--input", input.to_str().unwrap(), "--preview", "2"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sku"));
    assert!(stdout.contains("(2 more rows)"));
}

#[test]
fn test_clean_rejects_bad_threshold() {
    let ctx = TestContext::with_fixture("customers");
    let input = ctx.path("customers.csv");
    let output = run(&[
        "clean",
        "--input",
        input.to_str().unwrap(),
        "--column-null-threshold",
        "1.5",
    ]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("column_null_threshold"));
    assert!(!ctx.path("customers_cleaned.csv").exists());
}

#[test]
fn test_clean_missing_input_fails() {
    let output = run(&["clean", "--input", "/nonexistent/data.csv"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read input file"));
}

#[test]
fn test_inspect_lists_columns() {
    let ctx = TestContext::with_fixture("customers");
    let input = ctx.path("customers.csv");
    let output = run(&["inspect", "--input", input.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("6 rows x 7 columns"));
    assert!(stdout.contains("int64"));
    assert!(!ctx.path("customers_cleaned.csv").exists());
}

#[test]
fn test_batch_reports_failures_with_exit_code() {
    let ctx = TestContext::new();
    ctx.write_file("data/ok.csv", b"a,b\n1,x\n2,y\n");
    ctx.write_file("data/broken.csv", b"a,b\n1,2,3\n");
    let dir = ctx.path("data");
    let output = run(&["batch", "--dir", dir.to_str().unwrap()]);

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("OK   "));
    assert!(stdout.contains("FAIL "));
    assert!(stdout.contains("Cleaned 1 file(s), 1 failed"));
    assert!(ctx.path("data/ok_cleaned.csv").exists());
}
