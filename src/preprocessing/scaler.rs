//! Feature scaling

use crate::error::{CardioError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Type of scaler to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
}

/// Parameters for a fitted scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    center: f64, // mean or min
    scale: f64,  // std or range
}

/// Per-column feature scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: HashMap<String, ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Fit the scaler to the data. Re-fitting overwrites prior state.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.params.clear();
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| CardioError::FeatureNotFound(col_name.to_string()))?;
            let series = column.as_materialized_series();

            let params = self.compute_params(series)?;
            self.params.insert(col_name.to_string(), params);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data. Builds all replacement columns first, then applies
    /// them in a single pass.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(CardioError::NotFitted);
        }

        let replacements: Vec<Series> = self
            .params
            .iter()
            .filter_map(|(col_name, params)| {
                df.column(col_name).ok().map(|column| {
                    let series = column.as_materialized_series();
                    self.scale_series(series, params)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result = result.with_column(scaled)?.clone();
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    fn compute_params(&self, series: &Series) -> Result<ScalerParams> {
        let ca = series.f64().map_err(|e| CardioError::DataError(e.to_string()))?;

        match self.scaler_type {
            ScalerType::Standard => {
                let mean = ca.mean().unwrap_or(0.0);
                // Population std (ddof = 0), matching the usual z-score definition
                let std = ca.std(0).unwrap_or(1.0);
                Ok(ScalerParams {
                    center: mean,
                    scale: if std == 0.0 { 1.0 } else { std },
                })
            }
            ScalerType::MinMax => {
                let min = ca.min().unwrap_or(0.0);
                let max = ca.max().unwrap_or(1.0);
                let range = max - min;
                Ok(ScalerParams {
                    center: min,
                    scale: if range == 0.0 { 1.0 } else { range },
                })
            }
        }
    }

    fn scale_series(&self, series: &Series, params: &ScalerParams) -> Result<Series> {
        let ca = series.f64().map_err(|e| CardioError::DataError(e.to_string()))?;

        let scaled: Float64Chunked = ca
            .into_iter()
            .map(|opt| opt.map(|v| (v - params.center) / params.scale))
            .collect();

        Ok(scaled.with_name(series.name().clone()).into_series())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scaler_centers_data() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[1.0, 2.0, 3.0, 4.0, 5.0]).into(),
        ])
        .unwrap();

        let mut scaler = Scaler::new(ScalerType::Standard);
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        let mean: f64 = col.mean().unwrap();
        let std: f64 = col.std(0).unwrap();
        assert!(mean.abs() < 1e-10);
        assert!((std - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_minmax_scaler_bounds() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[1.0, 2.0, 3.0, 4.0, 5.0]).into(),
        ])
        .unwrap();

        let mut scaler = Scaler::new(ScalerType::MinMax);
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        assert!((col.min().unwrap() - 0.0).abs() < 1e-10);
        assert!((col.max().unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let df = DataFrame::new(vec![Series::new("a".into(), &[1.0]).into()]).unwrap();
        let scaler = Scaler::new(ScalerType::Standard);
        assert!(matches!(scaler.transform(&df), Err(CardioError::NotFitted)));
    }

    #[test]
    fn test_zero_variance_column_is_stable() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[5.0, 5.0, 5.0]).into(),
        ])
        .unwrap();

        let mut scaler = Scaler::new(ScalerType::Standard);
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        for v in col.into_iter().flatten() {
            assert!(v.is_finite());
        }
    }
}
