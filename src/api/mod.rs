pub mod handlers;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::api::handlers::{login, predict, status};
use crate::auth::require_token;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/predict", post(predict))
        .route("/status", get(status))
        .route_layer(middleware::from_fn_with_state(state, require_token));

    Router::new()
        .route("/", get(|| async { "Diabetes Predictor API Online" }))
        .route("/auth/login", post(login))
        .merge(protected)
}
