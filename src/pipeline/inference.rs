use ndarray::Array2;
use std::sync::Arc;

use super::classifier::Classifier;
use crate::error::PredictError;
use crate::models::{ClassProbability, PredictionResult};

pub struct InferenceEngine {
    classifier: Arc<dyn Classifier>,
}

impl InferenceEngine {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    /// One result per input row, in row order.
    pub fn predict(&self, rows: &Array2<f64>) -> Result<Vec<PredictionResult>, PredictError> {
        let labels = self.classifier.classify(rows).map_err(inference_error)?;
        let proba = self.classifier.classify_proba(rows).map_err(inference_error)?;

        let n = rows.nrows();
        if labels.len() != n || proba.dim() != (n, 2) {
            return Err(PredictError::Inference(format!(
                "classifier returned {} labels and {:?} probabilities for {} rows",
                labels.len(),
                proba.dim(),
                n
            )));
        }

        Ok(labels
            .into_iter()
            .zip(proba.rows())
            .map(|(prediction, p)| PredictionResult {
                prediction,
                probability: ClassProbability {
                    no_diabetes: p[0],
                    diabetes: p[1],
                },
            })
            .collect())
    }
}

fn inference_error(e: impl std::fmt::Display) -> PredictError {
    PredictError::Inference(e.to_string())
}
