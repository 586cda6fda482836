use srt_bank_assistant::{
    api::{start_server, AppState},
    config::AppConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    info!("🏦 SRT Bank Assistant - API Server");
    info!("📍 Port: {}", config.port);
    info!("📄 Training source: {}", config.training_csv.display());

    let state = AppState::from_config(&config).await?;

    info!("✅ Assistant initialized");
    info!("📡 Starting API server...");

    start_server(state, config.port).await?;

    Ok(())
}
