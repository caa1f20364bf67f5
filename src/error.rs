use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::models::FEATURE_NAMES;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid input: No JSON data provided")]
    NoData,

    #[error("Invalid input: Missing required features")]
    MissingFeatures,

    #[error("Invalid input: feature '{feature}' of record {index} is not a finite number")]
    InvalidFeatureValue { index: usize, feature: &'static str },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Scaler not loaded")]
    ScalerUnavailable,

    #[error("Median table not loaded")]
    ImputerUnavailable,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Prediction error: {0}")]
    Inference(String),
}

impl PredictError {
    pub fn status(&self) -> StatusCode {
        match self {
            PredictError::Validation(_) => StatusCode::BAD_REQUEST,
            PredictError::ModelUnavailable
            | PredictError::ScalerUnavailable
            | PredictError::ImputerUnavailable
            | PredictError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            PredictError::Validation(ValidationError::MissingFeatures) => json!({
                "error": self.to_string(),
                "required_features": FEATURE_NAMES,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Missing username or password")]
    MissingCredentials,

    /// Covers both unknown users and wrong passwords.
    #[error("Bad username or password")]
    BadCredentials,

    #[error("Missing Authorization Header")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Failed to issue token: {0}")]
    TokenIssue(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials => StatusCode::BAD_REQUEST,
            AuthError::BadCredentials | AuthError::MissingToken | AuthError::InvalidOrExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::TokenIssue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
