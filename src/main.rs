use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use diabetes_predictor::artifacts::ArtifactStore;
use diabetes_predictor::config::Config;
use diabetes_predictor::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "diabetes_predictor=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // CLI: Check for schema generation
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "config" && args.get(2).map(|s| s.as_str()) == Some("--schema")
    {
        let schema = schemars::schema_for!(Config);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let config = Config::load()?;

    tracing::info!("Loading artifacts from {}", config.artifacts.dir);
    let artifacts = ArtifactStore::load(&config.artifacts);

    let state = AppState::new(&config, artifacts);
    if !state.predictor.model_loaded() {
        tracing::error!("Classifier unavailable; /predict will answer 500 until restarted");
    }
    let app = diabetes_predictor::app(state);

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
