use serde::{Deserialize, Serialize};

/// Feature columns in the order the scaler and classifier were fitted on.
pub const FEATURE_NAMES: [&str; 8] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Columns where a zero means "not measured".
pub const IMPUTABLE_FEATURES: [&str; 5] = ["Glucose", "BloodPressure", "SkinThickness", "Insulin", "BMI"];

pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|f| *f == name)
}

/// One input row with all eight features, in `FEATURE_NAMES` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRecord {
    values: [f64; FEATURE_COUNT],
}

impl FeatureRecord {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64; FEATURE_COUNT] {
        &mut self.values
    }

    /// Value of a named feature, `None` for names outside the schema.
    pub fn get(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|idx| self.values[idx])
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClassProbability {
    pub no_diabetes: f64,
    pub diabetes: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub prediction: u8,
    pub probability: ClassProbability,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PredictionResponse {
    pub results: Vec<PredictionResult>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct StatusResponse {
    pub status: String,
}
