//! cardioml: heart disease prediction pipeline
//!
//! End-to-end MLOps pipeline for the UCI heart disease dataset: data
//! cleaning, median-impute + z-score preprocessing, two hand-rolled
//! classifiers, a timestamped artifact store with convention-based model
//! resolution, and an axum REST serving layer.

pub mod artifacts;
pub mod cli;
pub mod data;
pub mod error;
pub mod models;
pub mod preprocessing;
pub mod server;
pub mod training;

pub use error::{CardioError, Result};
