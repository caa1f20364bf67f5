use std::sync::Arc;
use tracing::debug;

use crate::artifacts::ArtifactStore;
use crate::config::PipelineConfig;
use crate::error::{PredictError, ValidationError};
use crate::models::{PredictionResponse, FEATURE_NAMES};
use crate::pipeline::{imputer, schema, to_matrix, InferenceEngine, MedianTable, ScalerParams};

/// Runs one prediction request through validation, imputation, scaling and inference.
pub struct PredictionService {
    inference: Option<InferenceEngine>,
    scaler: Option<Arc<ScalerParams>>,
    medians: Option<Arc<MedianTable>>,
    options: PipelineConfig,
}

impl PredictionService {
    pub fn new(artifacts: ArtifactStore, options: PipelineConfig) -> Self {
        Self {
            inference: artifacts.classifier.map(InferenceEngine::new),
            scaler: artifacts.scaler,
            medians: artifacts.medians,
            options,
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.inference.is_some()
    }

    pub fn predict(&self, body: &[u8]) -> Result<PredictionResponse, PredictError> {
        let engine = self.inference.as_ref().ok_or(PredictError::ModelUnavailable)?;

        let raw = schema::parse_body(body)?;
        let records = schema::normalize(raw)?;

        let records = match &self.medians {
            Some(medians) => imputer::impute(records, medians),
            None if self.options.require_medians => return Err(PredictError::ImputerUnavailable),
            None => records,
        };

        let mut rows = to_matrix(&records);
        if self.options.scale_features {
            let scaler = self.scaler.as_ref().ok_or(PredictError::ScalerUnavailable)?;
            rows = scaler.standardize(&rows);
        }

        // Huge finite inputs can overflow once divided by a scale below one.
        if let Some(((index, col), _)) = rows.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ValidationError::InvalidFeatureValue {
                index,
                feature: FEATURE_NAMES[col],
            }
            .into());
        }

        debug!(
            records = records.len(),
            model = engine.classifier_name(),
            "Running inference"
        );
        let results = engine.predict(&rows)?;

        Ok(PredictionResponse { results })
    }
}
