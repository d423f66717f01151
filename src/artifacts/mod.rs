//! Artifact persistence and model resolution
//!
//! The artifact directory is the pipeline's only registry: training writes
//! timestamped JSON files, serving discovers them by listing the directory.

mod loader;
mod store;

pub use loader::{ModelLoader, PredictInput, Prediction, SinglePrediction};
pub use store::{
    timestamp_token, ArtifactStore, TrainingSummary, PREPROCESSOR_PREFIX, SUMMARY_PREFIX,
};
