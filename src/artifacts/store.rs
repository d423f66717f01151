//! Timestamped artifact directory
//!
//! A training run writes every output into a single directory using the
//! naming convention `{prefix}_{YYYYMMDD}_{HHMMSS}.json`. The directory is
//! the only registry: discovery works by listing files and comparing
//! modification times.

use crate::error::{CardioError, Result};
use crate::models::{ModelKind, ModelMetrics, TrainedModel};
use crate::preprocessing::Preprocessor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// File name prefix for persisted preprocessors
pub const PREPROCESSOR_PREFIX: &str = "preprocessor";
/// File name prefix for training summaries
pub const SUMMARY_PREFIX: &str = "training_summary";

/// Per-run evaluation report persisted as `training_summary_{ts}.json`.
/// Keys of `models` are display names ("Logistic Regression", "Random Forest").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub timestamp: String,
    pub models: BTreeMap<String, ModelMetrics>,
}

/// Handle to an artifact directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Timestamp string identifying one training run
    pub fn run_timestamp() -> String {
        chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
    }

    fn path_for(&self, prefix: &str, timestamp: &str) -> PathBuf {
        self.dir.join(format!("{prefix}_{timestamp}.json"))
    }

    /// Persist a model as `{kind}_{timestamp}.json`
    pub fn save_model(
        &self,
        model: &TrainedModel,
        kind: ModelKind,
        timestamp: &str,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(kind.as_str(), timestamp);
        model.save(&path)?;
        Ok(path)
    }

    /// Persist a preprocessor as `preprocessor_{timestamp}.json`
    pub fn save_preprocessor(&self, preprocessor: &Preprocessor, timestamp: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(PREPROCESSOR_PREFIX, timestamp);
        preprocessor.save(&path)?;
        Ok(path)
    }

    /// Persist a training summary as `training_summary_{timestamp}.json`
    pub fn save_summary(&self, summary: &TrainingSummary, timestamp: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(SUMMARY_PREFIX, timestamp);
        let json = serde_json::to_string_pretty(summary)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// Load the summary stored at `path`
    pub fn load_summary(path: &Path) -> Result<TrainingSummary> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// All files whose stem matches `{prefix}_*`, in unspecified order.
    /// An absent directory lists as empty rather than erroring.
    pub fn list(&self, prefix: &str) -> Result<Vec<PathBuf>> {
        let wanted = format!("{prefix}_");
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut matches = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            if stem.starts_with(&wanted) {
                matches.push(path);
            }
        }
        Ok(matches)
    }

    /// The `{prefix}_*` file with the latest modification time. Ties break
    /// lexicographically on the full path so selection stays deterministic.
    pub fn latest(&self, prefix: &str) -> Result<Option<PathBuf>> {
        let candidates = self.list(prefix)?;
        Ok(Self::newest_by_mtime(candidates))
    }

    /// Pick the most recently modified path, breaking mtime ties by path order
    pub fn newest_by_mtime(paths: Vec<PathBuf>) -> Option<PathBuf> {
        paths
            .into_iter()
            .map(|p| {
                let mtime = std::fs::metadata(&p)
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (mtime, p)
            })
            .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
            .map(|(_, p)| p)
    }

    /// Fail with a pattern-specific not-found error when `found` is `None`
    pub fn require(&self, found: Option<PathBuf>, prefix: &str) -> Result<PathBuf> {
        found.ok_or_else(|| CardioError::ArtifactNotFound {
            pattern: format!("{prefix}_*"),
            dir: self.dir.clone(),
        })
    }
}

/// Trailing timestamp token of an artifact: the substring of the file stem
/// after the last underscore. For `random_forest_20240101_123456.json` this
/// is `123456`, the time half of the run timestamp.
pub fn timestamp_token(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    stem.rsplit_once('_').map(|(_, token)| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_timestamp_token_is_time_half() {
        let path = Path::new("/tmp/random_forest_20240101_123456.json");
        assert_eq!(timestamp_token(path), Some("123456".to_string()));
    }

    #[test]
    fn test_timestamp_token_no_underscore() {
        let path = Path::new("/tmp/model.json");
        assert_eq!(timestamp_token(path), None);
    }

    #[test]
    fn test_list_filters_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        fs::write(dir.path().join("random_forest_20240101_000000.json"), "{}").unwrap();
        fs::write(dir.path().join("preprocessor_20240101_000000.json"), "{}").unwrap();

        let models = store.list("random_forest").unwrap();
        assert_eq!(models.len(), 1);
        let preps = store.list(PREPROCESSOR_PREFIX).unwrap();
        assert_eq!(preps.len(), 1);
        assert!(store.list("logistic_regression").unwrap().is_empty());
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let store = ArtifactStore::new("/nonexistent/artifact/dir");
        assert!(store.list("random_forest").unwrap().is_empty());
    }

    #[test]
    fn test_latest_picks_newest_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let old = dir.path().join("random_forest_20240101_000000.json");
        fs::write(&old, "{}").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let new = dir.path().join("random_forest_20240102_000000.json");
        fs::write(&new, "{}").unwrap();

        assert_eq!(store.latest("random_forest").unwrap(), Some(new));
    }

    #[test]
    fn test_summary_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let mut models = BTreeMap::new();
        models.insert(
            "Random Forest".to_string(),
            ModelMetrics {
                accuracy: 0.9,
                precision: 0.88,
                recall: 0.92,
                roc_auc: 0.95,
                cv_mean: 0.93,
                cv_std: 0.02,
                confusion_matrix: [[40, 5], [3, 52]],
            },
        );
        let summary = TrainingSummary {
            timestamp: "20240101_000000".to_string(),
            models,
        };

        let path = store.save_summary(&summary, "20240101_000000").unwrap();
        let loaded = ArtifactStore::load_summary(&path).unwrap();
        assert_eq!(loaded.timestamp, summary.timestamp);
        assert!(loaded.models.contains_key("Random Forest"));
    }
}
