//! Integration tests: raw table cleaning through preprocessing

use cardioml::data::{clean_data, prepare_features_target};
use cardioml::preprocessing::Preprocessor;
use polars::prelude::*;

fn raw_frame() -> DataFrame {
    DataFrame::new(vec![
        Column::new("age".into(), &[63.0, 41.0, -9.0, 55.0]),
        Column::new("chol".into(), &["233", "?", "250", "204"]),
        Column::new("target".into(), &[0i64, 1, 2, 3]),
        Column::new(
            "source".into(),
            &["cleveland", "cleveland", "hungarian", "hungarian"],
        ),
    ])
    .unwrap()
}

#[test]
fn test_clean_drops_source_and_keeps_rows() {
    let cleaned = clean_data(&raw_frame()).unwrap();
    assert!(cleaned.column("source").is_err());
    assert_eq!(cleaned.height(), 4);
}

#[test]
fn test_clean_binarizes_target() {
    let cleaned = clean_data(&raw_frame()).unwrap();
    let target: Vec<i32> = cleaned
        .column("target")
        .unwrap()
        .i32()
        .unwrap()
        .into_no_null_iter()
        .collect();
    // Severity 1-4 all collapse to "disease present"
    assert_eq!(target, vec![0, 1, 1, 1]);
}

#[test]
fn test_clean_normalizes_sentinels_to_null() {
    let cleaned = clean_data(&raw_frame()).unwrap();
    // -9.0 in age and "?" in chol both become null
    assert_eq!(cleaned.column("age").unwrap().null_count(), 1);
    assert_eq!(cleaned.column("chol").unwrap().null_count(), 1);
}

#[test]
fn test_clean_coerces_string_columns_to_numeric() {
    let cleaned = clean_data(&raw_frame()).unwrap();
    assert_eq!(cleaned.column("chol").unwrap().dtype(), &DataType::Float64);
}

#[test]
fn test_cleaned_table_flows_through_preprocessing() {
    let cleaned = clean_data(&raw_frame()).unwrap();
    let (features, y) = prepare_features_target(&cleaned).unwrap();
    assert_eq!(y.len(), 4);

    let mut preprocessor = Preprocessor::new();
    let transformed = preprocessor.fit_transform(&features).unwrap();

    // Imputation removed every null the sentinels introduced
    for col in transformed.get_columns() {
        assert_eq!(col.null_count(), 0);
    }
    assert_eq!(transformed.height(), 4);
}
