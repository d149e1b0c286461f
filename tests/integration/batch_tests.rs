//! Integration tests for directory mode

use tabclean::{clean_directory, BatchOptions, CleaningReport};

use crate::common::{build_xlsx, TestContext};

const SMALL_CSV: &str = "Name,Score\n a ,1\nb,2\nc,3\n";

#[test]
fn test_batch_cleans_matching_files_in_place() {
    let ctx = TestContext::with_fixture("customers");
    ctx.write_file("nested/scores.csv", SMALL_CSV.as_bytes());
    ctx.write_file("readme.txt", b"not data");

    let summary = clean_directory(&BatchOptions::new(&ctx.work_dir)).unwrap();

    assert_eq!(summary.outcomes.len(), 2);
    assert_eq!(summary.succeeded(), 2);
    assert!(ctx.path("customers_cleaned.csv").exists());
    assert_eq!(
        ctx.read_to_string("nested/scores_cleaned.csv"),
        "name,score\na,1\nb,2\nc,3\n"
    );
}

#[test]
fn test_batch_output_dir_and_reports() {
    let ctx = TestContext::new();
    ctx.write_file("in/2024/jan.csv", SMALL_CSV.as_bytes());

    let mut options = BatchOptions::new(ctx.path("in"));
    options.output_dir = Some(ctx.path("out"));
    options.write_reports = true;
    let summary = clean_directory(&options).unwrap();

    assert_eq!(summary.succeeded(), 1);
    assert!(ctx.path("out/2024/jan_cleaned.csv").exists());
    let report: CleaningReport =
        serde_json::from_str(&ctx.read_to_string("out/2024/jan_report.json")).unwrap();
    assert_eq!(report.original_rows, 3);
    assert_eq!(report.trimmed_columns, vec!["name".to_string()]);
}

#[test]
fn test_batch_collects_failures() {
    let ctx = TestContext::new();
    ctx.write_file("good.csv", SMALL_CSV.as_bytes());
    ctx.write_file("bad.csv", b"a,b\n1,2,3\n");
    ctx.write_file("empty.csv", b"");

    let summary = clean_directory(&BatchOptions::new(&ctx.work_dir)).unwrap();

    assert_eq!(summary.succeeded(), 1);
    let failed: Vec<String> = summary
        .failed()
        .iter()
        .map(|o| o.input.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(failed, vec!["bad.csv", "empty.csv"]);
    assert!(summary.failed()[0]
        .result
        .as_ref()
        .unwrap_err()
        .contains("Malformed row"));
}

#[test]
fn test_batch_parallel_run() {
    let ctx = TestContext::new();
    for i in 0..12 {
        ctx.write_file(&format!("part_{:02}.csv", i), SMALL_CSV.as_bytes());
    }

    let summary = clean_directory(&BatchOptions::new(&ctx.work_dir)).unwrap();

    assert_eq!(summary.succeeded(), 12);
    let outputs = std::fs::read_dir(&ctx.work_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with("_cleaned.csv"))
        .count();
    assert_eq!(outputs, 12);
}

#[test]
fn test_batch_custom_pattern() {
    let ctx = TestContext::new();
    ctx.write_file("keep_1.csv", SMALL_CSV.as_bytes());
    ctx.write_file("skip_1.csv", SMALL_CSV.as_bytes());

    let mut options = BatchOptions::new(&ctx.work_dir);
    options.pattern = "keep_*.csv".to_string();
    let summary = clean_directory(&options).unwrap();

    assert_eq!(summary.outcomes.len(), 1);
    assert!(!ctx.path("skip_1_cleaned.csv").exists());
}

#[test]
fn test_batch_same_stem_does_not_overwrite() {
    let ctx = TestContext::new();
    ctx.write_file("a.csv", SMALL_CSV.as_bytes());
    ctx.write_file("a.xlsx", &build_xlsx(&[&["Other"], &["x"], &["y"]]));

    let mut options = BatchOptions::new(&ctx.work_dir);
    options.pattern = "a.*".to_string();
    let summary = clean_directory(&options).unwrap();

    assert_eq!(summary.outcomes.len(), 2);
    assert_eq!(summary.succeeded(), 1);
    let failed = summary.failed();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].input, ctx.path("a.xlsx"));
    assert!(failed[0]
        .result
        .as_ref()
        .unwrap_err()
        .contains("already written for"));
    assert_eq!(
        ctx.read_to_string("a_cleaned.csv"),
        "name,score\na,1\nb,2\nc,3\n"
    );
}

#[test]
fn test_batch_rerun_skips_reports_and_outputs() {
    let ctx = TestContext::new();
    ctx.write_file("data.csv", SMALL_CSV.as_bytes());

    let mut options = BatchOptions::new(&ctx.work_dir);
    options.pattern = "*".to_string();
    options.write_reports = true;

    let first = clean_directory(&options).unwrap();
    assert_eq!(first.succeeded(), 1);
    assert!(ctx.path("data_report.json").exists());

    let second = clean_directory(&options).unwrap();
    assert_eq!(second.outcomes.len(), 1);
    assert_eq!(second.outcomes[0].input, ctx.path("data.csv"));
    assert!(second.failed().is_empty());
    assert!(!ctx.path("data_report_cleaned.csv").exists());
}
