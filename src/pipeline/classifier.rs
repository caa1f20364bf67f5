use ndarray::{Array1, Array2, Axis};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("X has {got} features, but {model} is expecting {expected} features as input")]
    ShapeMismatch {
        model: &'static str,
        got: usize,
        expected: usize,
    },

    #[error("{0}")]
    Numerical(String),
}

/// A fitted binary classifier over standardized feature rows.
pub trait Classifier: Send + Sync {
    /// Name of the fitted estimator
    fn name(&self) -> &'static str;

    /// Class label (0 or 1) for each row.
    fn classify(&self, rows: &Array2<f64>) -> Result<Vec<u8>, ClassifierError>;

    /// `(n, 2)` matrix of class probabilities, column 0 for class 0.
    fn classify_proba(&self, rows: &Array2<f64>) -> Result<Array2<f64>, ClassifierError>;
}

/// On-disk classifier artifact.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind")]
pub enum ClassifierArtifact {
    #[serde(rename = "logistic_regression")]
    LogisticRegression(LogisticRegression),
}

impl ClassifierArtifact {
    pub fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            ClassifierArtifact::LogisticRegression(model) => Box::new(model),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogisticRegression {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    fn decision_function(&self, rows: &Array2<f64>) -> Result<Array1<f64>, ClassifierError> {
        if rows.ncols() != self.coefficients.len() {
            return Err(ClassifierError::ShapeMismatch {
                model: self.name(),
                got: rows.ncols(),
                expected: self.coefficients.len(),
            });
        }
        let weights = Array1::from_vec(self.coefficients.clone());
        let scores = rows.dot(&weights) + self.intercept;
        // Saturated scores are fine for the logistic link; NaN is not.
        if scores.iter().any(|s| s.is_nan()) {
            return Err(ClassifierError::Numerical(
                "decision function produced a NaN score".into(),
            ));
        }
        Ok(scores)
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &'static str {
        "LogisticRegression"
    }

    fn classify(&self, rows: &Array2<f64>) -> Result<Vec<u8>, ClassifierError> {
        let scores = self.decision_function(rows)?;
        Ok(scores.iter().map(|&s| u8::from(s > 0.0)).collect())
    }

    fn classify_proba(&self, rows: &Array2<f64>) -> Result<Array2<f64>, ClassifierError> {
        let positive = self.decision_function(rows)?.mapv(sigmoid);
        let negative = positive.mapv(|p| 1.0 - p);
        ndarray::stack(Axis(1), &[negative.view(), positive.view()])
            .map_err(|e| ClassifierError::Numerical(e.to_string()))
    }
}
