//! Unit tests for the cleaning pipeline
//!
//! These tests run individual steps and the full pipeline on loaded tables.

use pretty_assertions::assert_eq;

use tabclean::cleaner::{CleanOptions, DataCleaner};
use tabclean::loader::load_bytes;
use tabclean::report::ImputedColumn;
use tabclean::table::{CellValue, ColumnType};

fn cleaner_for(csv: &str, options: CleanOptions) -> DataCleaner {
    let loaded = load_bytes(csv.as_bytes(), "t.csv").unwrap();
    DataCleaner::new(loaded.table, options).unwrap()
}

// ============================================================================
// Threshold Tests
// ============================================================================

#[test]
fn test_column_threshold_is_strict() {
    // 7 of 10 cells missing is exactly 0.7 and is kept
    let mut csv = String::from("keep,sparse\n");
    for i in 0..10 {
        let sparse = if i < 3 { "v" } else { "" };
        csv.push_str(&format!("{},{}\n", i, sparse));
    }
    let mut cleaner = cleaner_for(&csv, CleanOptions::default());
    cleaner.drop_empty();
    assert!(cleaner.report().dropped_cols.is_empty());
}

#[test]
fn test_custom_thresholds() {
    let csv = "a,b,c\n1,,\n2,x,\n3,x,y\n";
    let options = CleanOptions {
        column_null_threshold: 0.5,
        row_fill_ratio: 1.0,
    };
    let mut cleaner = cleaner_for(csv, options);
    cleaner.drop_empty();
    // c is 2/3 missing; afterwards rows need both a and b
    assert_eq!(cleaner.report().dropped_cols, vec!["c".to_string()]);
    assert_eq!(cleaner.report().remaining_rows, 2);
}

#[test]
fn test_row_fill_ratio_zero_keeps_empty_rows() {
    let csv = "a,b\n1,2\n,\n";
    let options = CleanOptions {
        column_null_threshold: 1.0,
        row_fill_ratio: 0.0,
    };
    let mut cleaner = cleaner_for(csv, options);
    cleaner.drop_empty();
    assert!(cleaner.report().dropped_cols.is_empty());
    assert_eq!(cleaner.report().remaining_rows, 2);
}

// ============================================================================
// Type Conversion Tests
// ============================================================================

#[test]
fn test_numeric_strings_with_whitespace_convert_after_trim() {
    let csv = "code,amount\nx, 10 \ny,abc\nz,\n";
    let mut cleaner = cleaner_for(csv, CleanOptions::default());
    cleaner.remove_trims();
    cleaner.fix_data_types();
    // "abc" keeps the column as text
    assert!(cleaner.report().converted_to_numeric.is_empty());
}

#[test]
fn test_text_column_of_numbers_after_mixed_load() {
    let csv = "id,val\n1,\" 3.5\"\n2,4\n";
    let mut cleaner = cleaner_for(csv, CleanOptions::default());
    // Leading whitespace does not stop numeric inference at load time
    assert_eq!(cleaner.table().columns()[1].column_type, ColumnType::Float);
    cleaner.fix_data_types();
    assert!(cleaner.report().converted_to_numeric.is_empty());
}

#[test]
fn test_dates_are_imputed_with_mode() {
    let csv = "k,d,e,f\n1,2024-01-01,a,p\n2,2024-01-02,b,q\n3,2024-01-02,c,r\n4,,d,s\n";
    let (table, report) = cleaner_for(csv, CleanOptions::default()).auto_clean();
    assert_eq!(report.converted_to_datetime, vec!["d".to_string()]);
    assert_eq!(
        report.imputed_cols,
        vec![ImputedColumn {
            column: "d".to_string(),
            dtype: "datetime64[ns]".to_string()
        }]
    );
    assert_eq!(table.cell(3, 1), table.cell(1, 1));
}

// ============================================================================
// Duplicate Tests
// ============================================================================

#[test]
fn test_signed_zero_rows_are_duplicates() {
    let mut cleaner = cleaner_for("x,y\n0.0,1\n-0.0,1\n", CleanOptions::default());
    assert_eq!(cleaner.table().unique_count(0), 1);

    cleaner.handle_duplicates();
    assert_eq!(cleaner.report().duplicates_removed, 1);
    assert_eq!(cleaner.table().num_rows(), 1);
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

#[test]
fn test_auto_clean_inventory_like_table() {
    let csv = "\
SKU,Item,Qty,Bin
A-1,Widget , 12,b1
A-2, Gadget,,b2
A-3,Gizmo,3,b3
";
    let (table, report) = cleaner_for(csv, CleanOptions::default()).auto_clean();

    assert_eq!(report.renamed_columns, vec!["sku", "item", "qty", "bin"]);
    assert_eq!(report.trimmed_columns, vec!["sku", "item", "bin"]);
    assert_eq!(table.cell(1, 1), Some(&CellValue::Text("Gadget".to_string())));
    assert_eq!(table.cell(1, 2), Some(&CellValue::Float(7.5)));
    assert_eq!(table.columns()[2].column_type, ColumnType::Float);
}

#[test]
fn test_auto_clean_header_only() {
    let (table, report) = cleaner_for("a,b\n", CleanOptions::default()).auto_clean();
    assert_eq!(report.original_rows, 0);
    assert_eq!(report.remaining_rows, 0);
    assert_eq!(table.num_columns(), 2);
    assert!(report.converted_to_datetime.is_empty());
}

#[test]
fn test_report_counts_are_consistent() {
    let csv = "a,b\n1,x\n1,x\n2,y\n";
    let (table, report) = cleaner_for(csv, CleanOptions::default()).auto_clean();
    assert_eq!(report.original_rows, 3);
    assert_eq!(report.duplicates_removed, 1);
    assert_eq!(report.final_rows, table.num_rows());
    assert_eq!(report.final_cols, table.num_columns());
}
