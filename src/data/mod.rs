//! Dataset schema, loading, and cleaning
//!
//! The pipeline works on the UCI heart disease table: 13 named clinical
//! features plus a binary `target` column. The schema is fixed and ordered;
//! everything downstream (preprocessing, models, serving) depends on it.

mod cleaning;

pub use cleaning::clean_data;

use crate::error::{CardioError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::path::Path;

/// The fixed, ordered feature schema. Order matters: raw matrices passed to
/// the loader are interpreted positionally against this list.
pub const FEATURE_NAMES: [&str; 13] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

/// Name of the target column in raw and processed tables.
pub const TARGET_COLUMN: &str = "target";

/// Optional grouping column present in raw multi-source dumps; dropped by cleaning.
pub const SOURCE_COLUMN: &str = "source";

/// Feature names as owned strings (handy for polars column lookups).
pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
}

/// Load a CSV file into a DataFrame.
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(CardioError::DataFileNotFound {
            path: path.to_path_buf(),
            hint: "check the path or run the preprocess step first".to_string(),
        });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    Ok(df)
}

/// Write a DataFrame to a CSV file.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file).finish(df)?;
    Ok(())
}

/// Separate the feature table from the target vector.
pub fn prepare_features_target(df: &DataFrame) -> Result<(DataFrame, Array1<f64>)> {
    let target = df
        .column(TARGET_COLUMN)
        .map_err(|_| CardioError::FeatureNotFound(TARGET_COLUMN.to_string()))?;

    let y: Array1<f64> = target
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();

    let x = df.drop(TARGET_COLUMN)?;
    Ok((x, y))
}

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`.
/// Nulls become NaN so the imputer can see them; fully-processed frames have
/// no nulls and convert losslessly.
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let series = df
                .column(col_name)
                .map_err(|_| CardioError::FeatureNotFound(col_name.clone()))?;
            let values: Vec<f64> = series
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_refs[c][r]
    }))
}
