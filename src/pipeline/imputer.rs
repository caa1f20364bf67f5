use serde::Deserialize;
use std::collections::BTreeMap;

use crate::artifacts::ArtifactError;
use crate::models::{feature_index, FeatureRecord, IMPUTABLE_FEATURES};

/// Per-column medians computed at training time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>")]
pub struct MedianTable {
    medians: BTreeMap<String, f64>,
}

impl MedianTable {
    pub fn new(medians: BTreeMap<String, f64>) -> Result<Self, ArtifactError> {
        if let Some((column, _)) = medians.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ArtifactError::Invalid(format!("median for {column} is not finite")));
        }
        Ok(Self { medians })
    }

    /// Imputable columns with no median; zeros there reach the scaler unchanged.
    pub fn uncovered_columns(&self) -> Vec<&'static str> {
        IMPUTABLE_FEATURES
            .into_iter()
            .filter(|column| !self.medians.contains_key(*column))
            .collect()
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.medians.get(column).copied()
    }
}

impl TryFrom<BTreeMap<String, f64>> for MedianTable {
    type Error = ArtifactError;

    fn try_from(medians: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        Self::new(medians)
    }
}

/// Replaces sentinel zeros in the imputable columns with the fitted medians.
/// Pregnancies and Age keep their zeros, as do columns the table has no median for.
pub fn impute(mut records: Vec<FeatureRecord>, medians: &MedianTable) -> Vec<FeatureRecord> {
    for column in IMPUTABLE_FEATURES {
        let (Some(idx), Some(median)) = (feature_index(column), medians.get(column)) else {
            continue;
        };
        for record in &mut records {
            let value = &mut record.values_mut()[idx];
            if *value == 0.0 {
                *value = median;
            }
        }
    }
    records
}
