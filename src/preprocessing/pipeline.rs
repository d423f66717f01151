//! Fitted preprocessing pipeline: median imputation followed by z-score scaling

use super::{
    imputer::{ImputeStrategy, Imputer},
    scaler::{Scaler, ScalerType},
};
use crate::error::{CardioError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Preprocessing pipeline for the heart disease feature table.
///
/// Stateless until fitted. Fitting derives per-column median fill values
/// first, then mean/std scaling parameters from the already-imputed matrix.
/// Once fitted the transform is deterministic; re-fitting overwrites all
/// prior state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    imputer: Imputer,
    scaler: Scaler,
    columns: Vec<String>,
    is_fitted: bool,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self {
            imputer: Imputer::new(ImputeStrategy::Median),
            scaler: Scaler::new(ScalerType::Standard),
            columns: Vec::new(),
            is_fitted: false,
        }
    }

    /// Whether `fit` has been called.
    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Columns the pipeline was fitted on, in fit order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Cast integer and Float32 columns to Float64 for consistent processing.
    fn cast_numeric_to_f64(df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for col in df.get_columns() {
            match col.dtype() {
                DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Float32 => {
                    let casted = col.cast(&DataType::Float64)?;
                    result = result.with_column(casted)?.clone();
                }
                _ => {}
            }
        }
        Ok(result)
    }

    /// Fit imputation and scaling parameters on training features.
    ///
    /// Imputation values are derived first; scaling statistics come from the
    /// imputed matrix. Fails on an empty table.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        if df.height() == 0 || df.width() == 0 {
            return Err(CardioError::PreprocessingError(
                "cannot fit on an empty feature table".to_string(),
            ));
        }

        let df = Self::cast_numeric_to_f64(df)?;
        self.columns = df.get_column_names().iter().map(|s| s.to_string()).collect();
        let cols: Vec<&str> = self.columns.iter().map(|s| s.as_str()).collect();

        self.imputer.fit(&df, &cols)?;
        let imputed = self.imputer.transform(&df)?;
        self.scaler.fit(&imputed, &cols)?;

        self.is_fitted = true;
        Ok(self)
    }

    /// Apply stored imputation then stored scaling. Row and column counts are
    /// preserved. Fails if called before `fit`.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(CardioError::NotFitted);
        }

        let df = Self::cast_numeric_to_f64(df)?;
        let imputed = self.imputer.transform(&df)?;
        self.scaler.transform(&imputed)
    }

    /// Fit and transform the same data. Correct for training-set fitting
    /// only; held-out data must go through `transform` against an already
    /// fitted instance.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Save the fitted pipeline to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a pipeline from a JSON file. Restores transform behavior exactly.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let preprocessor: Self = serde_json::from_str(&json)?;
        Ok(preprocessor)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_nulls() -> DataFrame {
        DataFrame::new(vec![
            Column::new("age".into(), &[Some(40.0), None, Some(60.0), Some(50.0)]),
            Column::new("chol".into(), &[Some(200.0), Some(240.0), None, Some(220.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let p = Preprocessor::new();
        assert!(matches!(p.transform(&frame_with_nulls()), Err(CardioError::NotFitted)));

        let empty = DataFrame::empty();
        assert!(matches!(p.transform(&empty), Err(CardioError::NotFitted)));
    }

    #[test]
    fn test_fit_on_empty_table_fails() {
        let mut p = Preprocessor::new();
        assert!(p.fit(&DataFrame::empty()).is_err());
    }

    #[test]
    fn test_fit_transform_removes_nulls() {
        let mut p = Preprocessor::new();
        let out = p.fit_transform(&frame_with_nulls()).unwrap();
        assert_eq!(out.height(), 4);
        assert_eq!(out.width(), 2);
        for col in out.get_columns() {
            assert_eq!(col.null_count(), 0);
        }
    }

    #[test]
    fn test_transform_standardizes_clean_data() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[1.0, 2.0, 3.0, 4.0, 5.0]).into(),
        ])
        .unwrap();

        let mut p = Preprocessor::new();
        let out = p.fit_transform(&df).unwrap();
        let col = out.column("a").unwrap().f64().unwrap();
        assert!(col.mean().unwrap().abs() < 1e-10);
        assert!((col.std(0).unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_refit_overwrites_state() {
        let df1 = DataFrame::new(vec![Series::new("a".into(), &[0.0, 10.0]).into()]).unwrap();
        let df2 = DataFrame::new(vec![Series::new("a".into(), &[100.0, 200.0]).into()]).unwrap();

        let mut p = Preprocessor::new();
        p.fit(&df1).unwrap();
        p.fit(&df2).unwrap();

        let out = p.transform(&df2).unwrap();
        let col = out.column("a").unwrap().f64().unwrap();
        assert!(col.mean().unwrap().abs() < 1e-10);
    }

    #[test]
    fn test_save_load_roundtrip_transform_equivalence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preprocessor.json");

        let mut p = Preprocessor::new();
        p.fit(&frame_with_nulls()).unwrap();
        p.save(&path).unwrap();

        let restored = Preprocessor::load(&path).unwrap();
        let original = p.transform(&frame_with_nulls()).unwrap();
        let reloaded = restored.transform(&frame_with_nulls()).unwrap();

        for name in ["age", "chol"] {
            let a = original.column(name).unwrap().f64().unwrap();
            let b = reloaded.column(name).unwrap().f64().unwrap();
            for (x, y) in a.into_iter().zip(b.into_iter()) {
                assert_eq!(x, y);
            }
        }
    }
}
