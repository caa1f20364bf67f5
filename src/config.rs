use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ArtifactsConfig {
    /// Directory holding the fitted artifacts
    #[serde(default = "default_artifacts_dir")]
    pub dir: String,
    /// Classifier file name, relative to `dir`
    #[serde(default = "default_model_file")]
    pub model: String,
    /// Scaler parameters file name, relative to `dir`
    #[serde(default = "default_scaler_file")]
    pub scaler: String,
    /// Median table file name, relative to `dir`
    #[serde(default = "default_medians_file")]
    pub medians: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfig {
    /// Standardize features before inference. A missing scaler is a hard error while enabled.
    #[serde(default = "default_true")]
    pub scale_features: bool,
    /// Fail requests when the median table is missing instead of passing raw values through
    #[serde(default)]
    pub require_medians: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AuthConfig {
    /// HMAC secret used to sign access tokens
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
    /// Username to password table
    #[serde(default = "default_users")]
    pub users: BTreeMap<String, String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_artifacts_dir() -> String {
    "artifacts".to_string()
}
fn default_model_file() -> String {
    "model.json".to_string()
}
fn default_scaler_file() -> String {
    "scaler.json".to_string()
}
fn default_medians_file() -> String {
    "medians.json".to_string()
}
fn default_true() -> bool {
    true
}
fn default_jwt_secret() -> String {
    "super-secret-key".to_string()
}
fn default_token_ttl() -> u64 {
    15 * 60
}
fn default_users() -> BTreeMap<String, String> {
    BTreeMap::from([("Caspar".to_string(), "gud123".to_string())])
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: default_artifacts_dir(),
            model: default_model_file(),
            scaler: default_scaler_file(),
            medians: default_medians_file(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scale_features: true,
            require_medians: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_secs: default_token_ttl(),
            users: default_users(),
        }
    }
}

impl ArtifactsConfig {
    pub fn model_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.model)
    }

    pub fn scaler_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.scaler)
    }

    pub fn medians_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.medians)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path =
            env::var("PREDICTOR_CONFIG").unwrap_or_else(|_| "predictor.toml".to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            Self::from_env()
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML config")
    }

    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let port = env::var("PORT")
            .unwrap_or_else(|_| default_port().to_string())
            .parse()
            .context("Invalid PORT")?;
        let host = env::var("HOST").unwrap_or_else(|_| default_host());

        let artifacts = ArtifactsConfig {
            dir: env::var("ARTIFACTS_DIR").unwrap_or_else(|_| default_artifacts_dir()),
            model: env::var("MODEL_FILE").unwrap_or_else(|_| default_model_file()),
            scaler: env::var("SCALER_FILE").unwrap_or_else(|_| default_scaler_file()),
            medians: env::var("MEDIANS_FILE").unwrap_or_else(|_| default_medians_file()),
        };

        let scale_features = env_flag("SCALE_FEATURES", true)?;
        let require_medians = env_flag("REQUIRE_MEDIANS", false)?;

        let token_ttl_secs = env::var("TOKEN_TTL_SECS")
            .unwrap_or_else(|_| default_token_ttl().to_string())
            .parse()
            .context("Invalid TOKEN_TTL_SECS")?;

        let mut users = default_users();
        if let Ok(username) = env::var("AUTH_USERNAME") {
            let password = env::var("AUTH_PASSWORD").context("AUTH_USERNAME requires AUTH_PASSWORD")?;
            users = BTreeMap::from([(username, password)]);
        }

        Ok(Config {
            server: ServerConfig { host, port },
            artifacts,
            pipeline: PipelineConfig {
                scale_features,
                require_medians,
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET_KEY").unwrap_or_else(|_| default_jwt_secret()),
                token_ttl_secs,
                users,
            },
        })
    }
}

fn env_flag(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(value) => parse_flag(&value).with_context(|| format!("Invalid {name}")),
        Err(_) => Ok(default),
    }
}

/// Accepts the usual spellings of a boolean switch, case-insensitively.
pub fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("not a boolean: {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Process environment is shared between test threads.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_VARS: [&str; 12] = [
        "PORT",
        "HOST",
        "ARTIFACTS_DIR",
        "MODEL_FILE",
        "SCALER_FILE",
        "MEDIANS_FILE",
        "SCALE_FEATURES",
        "REQUIRE_MEDIANS",
        "TOKEN_TTL_SECS",
        "AUTH_USERNAME",
        "AUTH_PASSWORD",
        "JWT_SECRET_KEY",
    ];

    fn clear_env() {
        for name in ENV_VARS {
            env::remove_var(name);
        }
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.artifacts.model_path(), Path::new("artifacts/model.json"));
        assert!(config.pipeline.scale_features);
        assert!(!config.pipeline.require_medians);
        assert_eq!(config.auth.token_ttl_secs, 900);
        assert_eq!(config.auth.users.get("Caspar").map(String::as_str), Some("gud123"));
    }

    #[test]
    fn partial_toml_overrides_only_given_fields() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 9100

            [pipeline]
            require_medians = true

            [auth.users]
            alice = "wonderland"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.pipeline.scale_features);
        assert!(config.pipeline.require_medians);
        assert_eq!(config.auth.users.len(), 1);
        assert!(config.auth.users.contains_key("alice"));
    }

    #[test]
    fn invalid_toml_is_rejected() {
        assert!(Config::from_toml("[server]\nport = \"eighty\"").is_err());
    }

    #[test]
    fn schema_lists_every_section() {
        let schema = serde_json::to_value(schemars::schema_for!(Config)).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        for section in ["server", "artifacts", "pipeline", "auth"] {
            assert!(properties.contains_key(section), "missing {section}");
        }
    }

    #[test]
    fn flags_accept_common_spellings() {
        for value in ["1", "true", "YES", " on "] {
            assert!(parse_flag(value).unwrap(), "{value}");
        }
        for value in ["0", "False", "no", "OFF"] {
            assert!(!parse_flag(value).unwrap(), "{value}");
        }
    }

    #[test]
    fn flags_reject_anything_else() {
        for value in ["", "2", "enabled", "y"] {
            assert!(parse_flag(value).is_err(), "{value}");
        }
    }

    #[test]
    fn unset_flag_falls_back_to_default() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        assert!(env_flag("SCALE_FEATURES", true).unwrap());
        assert!(!env_flag("REQUIRE_MEDIANS", false).unwrap());

        env::set_var("REQUIRE_MEDIANS", "maybe");
        let err = env_flag("REQUIRE_MEDIANS", false).unwrap_err();
        assert!(err.to_string().contains("REQUIRE_MEDIANS"));
        clear_env();
    }

    #[test]
    fn env_without_overrides_matches_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = Config::from_env().unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.artifacts.medians_path(), Path::new("artifacts/medians.json"));
        assert!(config.pipeline.scale_features);
        assert!(!config.pipeline.require_medians);
        assert_eq!(config.auth.jwt_secret, "super-secret-key");
        assert_eq!(config.auth.token_ttl_secs, 900);
        assert_eq!(config.auth.users, default_users());
    }

    #[test]
    fn env_overrides_replace_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("PORT", "9200");
        env::set_var("SCALE_FEATURES", "off");
        env::set_var("AUTH_USERNAME", "alice");
        env::set_var("AUTH_PASSWORD", "wonderland");

        let config = Config::from_env();
        clear_env();
        let config = config.unwrap();

        assert_eq!(config.server.port, 9200);
        assert!(!config.pipeline.scale_features);
        assert_eq!(config.auth.users.len(), 1);
        assert_eq!(config.auth.users.get("alice").map(String::as_str), Some("wonderland"));
    }

    #[test]
    fn auth_username_without_password_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("AUTH_USERNAME", "alice");

        let err = Config::from_env().unwrap_err();
        clear_env();
        assert!(err.to_string().contains("AUTH_PASSWORD"));
    }
}
