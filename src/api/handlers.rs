use axum::{
    body::Bytes,
    extract::{Extension, State},
    response::Json,
};
use tracing::{debug, error, warn};

use crate::auth::{Identity, LoginRequest};
use crate::error::{AuthError, PredictError};
use crate::models::{PredictionResponse, StatusResponse, TokenResponse};
use crate::state::AppState;

pub async fn predict(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, PredictError> {
    match state.predictor.predict(&body) {
        Ok(response) => {
            debug!(
                user = %identity.username,
                records = response.results.len(),
                "Prediction served"
            );
            Ok(Json(response))
        }
        Err(e) => {
            if e.status().is_server_error() {
                error!(user = %identity.username, "Prediction failed: {}", e);
            } else {
                warn!(user = %identity.username, "Rejected prediction request: {}", e);
            }
            Err(e)
        }
    }
}

pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "API is running".to_string(),
    })
}

pub async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<TokenResponse>, AuthError> {
    let request = LoginRequest::from_body(&body)?;
    let access_token = state
        .auth
        .login(request.username.as_deref(), request.password.as_deref())?;
    Ok(Json(TokenResponse { access_token }))
}
