use std::sync::Arc;

use crate::artifacts::ArtifactStore;
use crate::auth::AuthGateway;
use crate::config::Config;
use crate::engine::PredictionService;

#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<PredictionService>,
    pub auth: Arc<AuthGateway>,
}

impl AppState {
    pub fn new(config: &Config, artifacts: ArtifactStore) -> Self {
        Self {
            predictor: Arc::new(PredictionService::new(artifacts, config.pipeline.clone())),
            auth: Arc::new(AuthGateway::new(&config.auth)),
        }
    }
}
