//! Raw table cleaning
//!
//! Raw heart disease dumps carry a multi-valued target (0 = no disease,
//! 1-4 = increasing severity) and legacy missing-value markers (`-9`, `-9.0`,
//! `"?"`). Cleaning collapses the target to binary, normalizes all sentinels
//! to null, and coerces every feature column to numeric.

use super::{SOURCE_COLUMN, TARGET_COLUMN};
use crate::error::Result;
use polars::prelude::*;

/// Legacy numeric missing-value sentinel.
const MISSING_SENTINEL: f64 = -9.0;

/// Clean a raw table:
/// - drop the grouping/source column if present
/// - collapse the target to binary: 1 if original value > 0, else 0
/// - convert `-9` / `-9.0` / `"?"` sentinels to null
/// - coerce feature columns to Float64 (unparseable tokens become null)
///
/// Row count is never changed; severity levels 1-4 all map to "disease
/// present", which is a fixed business rule.
pub fn clean_data(df: &DataFrame) -> Result<DataFrame> {
    let mut result = df.clone();

    let has_source = result
        .get_column_names()
        .iter()
        .any(|name| name.as_str() == SOURCE_COLUMN);
    if has_source {
        result = result.drop(SOURCE_COLUMN)?;
    }

    let has_target = result
        .get_column_names()
        .iter()
        .any(|name| name.as_str() == TARGET_COLUMN);
    if has_target {
        let target = result.column(TARGET_COLUMN)?.cast(&DataType::Float64)?;
        let binary: Int32Chunked = target
            .f64()?
            .into_iter()
            .map(|opt| opt.map(|v| if v > 0.0 { 1i32 } else { 0 }))
            .collect();
        result = result
            .with_column(binary.with_name(TARGET_COLUMN.into()).into_series())?
            .clone();
    }

    // Coerce every non-target column to numeric with sentinels nulled.
    let feature_cols: Vec<String> = result
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .filter(|name| name != TARGET_COLUMN)
        .collect();

    for col_name in &feature_cols {
        let series = result.column(col_name)?.as_materialized_series().clone();
        // "?" and any other non-numeric token become null under a non-strict cast
        let numeric = series.cast(&DataType::Float64)?;
        let cleaned: Float64Chunked = numeric
            .f64()?
            .into_iter()
            .map(|opt| opt.filter(|v| *v != MISSING_SENTINEL))
            .collect();
        result = result
            .with_column(cleaned.with_name(col_name.as_str().into()).into_series())?
            .clone();
    }

    Ok(result)
}
