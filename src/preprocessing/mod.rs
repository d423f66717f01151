//! Data preprocessing
//!
//! Median imputation and standard scaling, composed into a persistable
//! [`Preprocessor`] pipeline. Parameters are learned once on training data
//! and applied read-only everywhere else.

mod imputer;
mod pipeline;
mod scaler;

pub use imputer::{ImputeStrategy, Imputer};
pub use pipeline::Preprocessor;
pub use scaler::{Scaler, ScalerType};
