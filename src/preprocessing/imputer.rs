//! Missing value imputation

use crate::error::{CardioError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with column mean
    Mean,
    /// Replace with column median
    Median,
    /// Replace with a constant value
    Constant(f64),
}

/// Imputer for handling missing values. Fill values are learned per column
/// at fit time and applied unchanged afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: HashMap<String, f64>,
    is_fitted: bool,
}

impl Imputer {
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Fit the imputer to the data. Re-fitting overwrites prior state.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.fill_values.clear();
        for col_name in columns {
            let series = df
                .column(col_name)
                .map_err(|_| CardioError::FeatureNotFound(col_name.to_string()))?;

            let fill_value = self.compute_fill_value(series.as_materialized_series())?;
            self.fill_values.insert(col_name.to_string(), fill_value);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data by filling nulls with the learned values.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(CardioError::NotFitted);
        }

        let mut result = df.clone();
        for (col_name, fill_value) in &self.fill_values {
            if let Ok(col) = df.column(col_name) {
                let ca = col.as_materialized_series().f64()?.clone();
                let filled: Float64Chunked = ca
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(*fill_value)))
                    .collect();
                result = result
                    .with_column(filled.with_name(col_name.as_str().into()).into_series())?
                    .clone();
            }
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Learned fill value for a column, if fitted.
    pub fn fill_value(&self, column: &str) -> Option<f64> {
        self.fill_values.get(column).copied()
    }

    fn compute_fill_value(&self, series: &Series) -> Result<f64> {
        let ca = series.f64().map_err(|e| CardioError::DataError(e.to_string()))?;
        match &self.strategy {
            ImputeStrategy::Mean => Ok(ca.mean().unwrap_or(0.0)),
            ImputeStrategy::Median => Ok(ca.median().unwrap_or(0.0)),
            ImputeStrategy::Constant(val) => Ok(*val),
        }
    }
}
