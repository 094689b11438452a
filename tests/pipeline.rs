//! End-to-end tests: returns file -> loader -> detector -> report.

use std::path::PathBuf;

use pra_outliers::data::LoaderError;
use pra_outliers::detect::ANOMALY_SCORE_COLUMN;
use pra_outliers::{report, AppConfig, DataLoader, DetectError, OutlierDetector};
use tempfile::TempDir;

const RETURNS_CSV: &str = "\
Firm,Year,NWP (£m),Net combined ratio
Acme General,2018,10,1
Bolt Mutual,2018,11,1
Crown Re,2018,1000,1
Dale Life,2018,0,1
Eden Insurance,2018,9,1
Fern Assurance,2019,5,2
Glen Marine,2019,7,
";

fn write_returns(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("returns.csv");
    std::fs::write(&path, RETURNS_CSV).unwrap();
    path
}

fn selection() -> Vec<String> {
    vec!["NWP (£m)".to_string(), "Net combined ratio".to_string()]
}

#[test]
fn test_detects_separated_firm() {
    let dir = tempfile::tempdir().unwrap();
    let loader = DataLoader::new(write_returns(&dir));
    let table = loader.table().unwrap();

    let detection = OutlierDetector::default()
        .detect(table, 2018, &selection())
        .unwrap();

    // Dale Life reported zero premium, so it is not a complete row.
    assert_eq!(detection.cleaned_rows, 4);
    assert_eq!(detection.row_indices(), vec![2]);
    let firm = detection.outliers.column("Firm").unwrap();
    assert_eq!(firm.str().unwrap().get(0), Some("Crown Re"));
    assert!(detection.outliers.column(ANOMALY_SCORE_COLUMN).is_ok());
}

#[test]
fn test_zero_is_read_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let loader = DataLoader::new(write_returns(&dir));
    let table = loader.table().unwrap();

    let nwp = table.column("NWP (£m)").unwrap();
    assert_eq!(nwp.null_count(), 1);
    assert_eq!(nwp.f64().unwrap().get(3), None);
}

#[test]
fn test_insufficient_year() {
    let dir = tempfile::tempdir().unwrap();
    let loader = DataLoader::new(write_returns(&dir));
    let table = loader.table().unwrap();

    let result = OutlierDetector::default().detect(table, 2019, &selection());
    match result {
        Err(err @ DetectError::InsufficientData { rows: 1, .. }) => {
            assert!(err.to_string().contains("Not enough data for this selection"));
        }
        other => panic!("expected insufficient data, got {other:?}"),
    }
}

#[test]
fn test_year_without_rows() {
    let dir = tempfile::tempdir().unwrap();
    let loader = DataLoader::new(write_returns(&dir));
    let table = loader.table().unwrap();

    let result = OutlierDetector::default().detect(table, 2016, &selection());
    assert!(matches!(result, Err(DetectError::InsufficientData { rows: 0, .. })));
}

#[test]
fn test_loader_lists_columns_and_years() {
    let dir = tempfile::tempdir().unwrap();
    let loader = DataLoader::new(write_returns(&dir));
    assert!(!loader.is_loaded());
    loader.table().unwrap();

    assert!(loader.is_loaded());
    assert_eq!(loader.get_row_count(), 7);
    assert_eq!(loader.get_years(), vec![2018, 2019]);
    assert_eq!(loader.get_numeric_columns(), selection());
}

#[test]
fn test_table_loaded_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_returns(&dir);
    let loader = DataLoader::new(&path);

    let first = loader.table().unwrap() as *const _;
    std::fs::remove_file(&path).unwrap();
    let second = loader.table().unwrap() as *const _;

    assert_eq!(first, second);
}

#[test]
fn test_missing_source() {
    let dir = tempfile::tempdir().unwrap();
    let loader = DataLoader::new(dir.path().join("PRA.xlsx"));

    let result = loader.table();
    assert!(matches!(result, Err(LoaderError::SourceUnavailable { .. })));
    assert!(!loader.is_loaded());
}

#[test]
fn test_unsupported_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("returns.txt");
    std::fs::write(&path, RETURNS_CSV).unwrap();

    let result = DataLoader::new(path).table().map(|_| ());
    assert!(matches!(result, Err(LoaderError::UnsupportedFormat(ext)) if ext == "txt"));
}

#[test]
fn test_configured_forest_and_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let loader = DataLoader::new(write_returns(&dir));
    let table = loader.table().unwrap();

    let config = AppConfig::default();
    let detector = OutlierDetector::new(config.forest.build());
    let detection = detector.detect(table, 2018, &selection()).unwrap();

    let json: serde_json::Value = serde_json::from_str(&report::to_json(&detection).unwrap()).unwrap();
    assert_eq!(json["year"], 2018);
    assert_eq!(json["cleaned_rows"], 4);
    assert_eq!(json["outliers"][0]["Firm"], "Crown Re");
    assert_eq!(json["outliers"][0]["row_index"], 2);
}

#[test]
fn test_not_available_marker_drops_only_that_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("returns.csv");
    let csv = RETURNS_CSV.replace("Dale Life,2018,0,1", "Dale Life,2018,n/a,1");
    std::fs::write(&path, csv).unwrap();

    let loader = DataLoader::new(path);
    let table = loader.table().unwrap();
    let detection = OutlierDetector::default()
        .detect(table, 2018, &selection())
        .unwrap();

    assert_eq!(detection.cleaned_rows, 4);
    assert_eq!(detection.row_indices(), vec![2]);
}
