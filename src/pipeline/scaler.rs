use ndarray::{Array1, Array2, Axis};
use serde::Deserialize;

use crate::artifacts::ArtifactError;
use crate::models::FEATURE_COUNT;

#[derive(Deserialize)]
struct RawScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

/// Fitted standardization parameters, one (mean, scale) pair per feature column.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawScaler")]
pub struct ScalerParams {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl ScalerParams {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ArtifactError> {
        if mean.len() != FEATURE_COUNT || scale.len() != FEATURE_COUNT {
            return Err(ArtifactError::Invalid(format!(
                "scaler expects {FEATURE_COUNT} means and scales, got {} and {}",
                mean.len(),
                scale.len()
            )));
        }
        if mean.iter().chain(&scale).any(|v| !v.is_finite()) {
            return Err(ArtifactError::Invalid("scaler parameters must be finite".into()));
        }

        // Constant columns were fitted with a zero scale; they pass through centered only.
        let scale = scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();

        Ok(Self {
            mean: Array1::from_vec(mean),
            scale,
        })
    }

    /// `(x - mean) / scale` per column, applied to every row of a `(n, FEATURE_COUNT)` batch.
    pub fn standardize(&self, rows: &Array2<f64>) -> Array2<f64> {
        let mean = self.mean.view().insert_axis(Axis(0));
        let scale = self.scale.view().insert_axis(Axis(0));
        (rows - &mean) / &scale
    }
}

impl TryFrom<RawScaler> for ScalerParams {
    type Error = ArtifactError;

    fn try_from(raw: RawScaler) -> Result<Self, Self::Error> {
        Self::new(raw.mean, raw.scale)
    }
}
