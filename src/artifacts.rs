//! Fitted artifacts loaded once at startup.
//!
//! Each artifact loads independently. A missing or malformed file leaves that
//! handle empty and the service keeps running in a degraded state.

use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ArtifactsConfig;
use crate::pipeline::{Classifier, ClassifierArtifact, MedianTable, ScalerParams};

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact: {0}")]
    Invalid(String),
}

/// Read-only handles shared by every request.
#[derive(Clone, Default)]
pub struct ArtifactStore {
    pub classifier: Option<Arc<dyn Classifier>>,
    pub scaler: Option<Arc<ScalerParams>>,
    pub medians: Option<Arc<MedianTable>>,
}

impl ArtifactStore {
    pub fn load(config: &ArtifactsConfig) -> Self {
        let classifier: Option<Arc<dyn Classifier>> =
            load_optional("classifier", &config.model_path(), |path| {
                read_json::<ClassifierArtifact>(path).map(|a| Arc::from(a.into_classifier()))
            });
        let scaler = load_optional("scaler", &config.scaler_path(), |path| {
            read_json::<ScalerParams>(path).map(Arc::new)
        });
        let medians = load_optional("median table", &config.medians_path(), |path| {
            read_json::<MedianTable>(path).map(Arc::new)
        });
        if let Some(table) = &medians {
            let uncovered = table.uncovered_columns();
            if !uncovered.is_empty() {
                warn!("No median for {:?}; zeros in those columns are not imputed", uncovered);
            }
        }

        Self {
            classifier,
            scaler,
            medians,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_scaler(mut self, scaler: ScalerParams) -> Self {
        self.scaler = Some(Arc::new(scaler));
        self
    }

    pub fn with_medians(mut self, medians: MedianTable) -> Self {
        self.medians = Some(Arc::new(medians));
        self
    }
}

fn load_optional<T>(
    label: &str,
    path: &Path,
    load: impl FnOnce(&Path) -> Result<T, ArtifactError>,
) -> Option<T> {
    match load(path) {
        Ok(artifact) => {
            info!("Loaded {} from {}", label, path.display());
            Some(artifact)
        }
        Err(e) => {
            warn!("{} unavailable: {}", label, e);
            None
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let content = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
