//! HTTP service exposing a fitted diabetes risk classifier behind bearer-token auth.

pub mod api;
pub mod artifacts;
pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router with request tracing.
pub fn app(state: AppState) -> Router {
    api::routes(state.clone())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
