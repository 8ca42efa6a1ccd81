//! CSV export to disk

use openarchive_console::export::{export_to_file, rows_to_export, CSV_HEADER};
use openarchive_console::selection::Selection;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use test_log::test;

use crate::common::fixtures::hit;
use crate::common::logging::{init_test_logging, log_test_step};

#[test]
fn test_export_selected_rows_to_file() {
    init_test_logging();
    log_test_step("Exporting the selected subset of a result page");

    let hits = vec![hit("m1", "Budget"), hit("m2", "Re: \"Budget\""), hit("m3", "Lunch")];
    let mut selection = Selection::new();
    selection.toggle("m2".to_string());
    selection.toggle("m3".to_string());

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("export.csv");
    let count = export_to_file(&path, &rows_to_export(&hits, &selection)).unwrap();
    assert_eq!(count, 2);

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(header, CSV_HEADER.to_vec());

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "m2");
    assert_eq!(&rows[0][1], "Re: \"Budget\"");
    assert_eq!(&rows[1][4], "1700000000");
    assert_eq!(&rows[1][5], "4096");
}

#[test]
fn test_export_empty_page_writes_header_only() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.csv");
    assert_eq!(export_to_file(&path, &[]).unwrap(), 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "ID,Subject,From,To,Date,Size\n");
}

#[test]
fn test_export_into_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("export.csv");
    assert!(export_to_file(&path, &[]).is_err());
}
