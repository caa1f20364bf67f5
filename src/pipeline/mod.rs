//! Request-validation, preprocessing and inference stages.

pub mod classifier;
pub mod imputer;
pub mod inference;
pub mod scaler;
pub mod schema;

pub use classifier::{Classifier, ClassifierArtifact, ClassifierError, LogisticRegression};
pub use imputer::MedianTable;
pub use inference::InferenceEngine;
pub use scaler::ScalerParams;

use ndarray::Array2;

use crate::models::{FeatureRecord, FEATURE_COUNT};

/// Stacks records into an `(n, FEATURE_COUNT)` matrix in column order.
pub fn to_matrix(records: &[FeatureRecord]) -> Array2<f64> {
    Array2::from_shape_fn((records.len(), FEATURE_COUNT), |(row, col)| records[row].values()[col])
}
