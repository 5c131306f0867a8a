use portfolio_qa_gateway::{api::start_server, Gateway, Settings};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env()?;
    let configured = settings.configured();

    info!("🚀 Portfolio Q&A Gateway - API Server");
    info!("📍 Port: {}", settings.port);

    if !configured.openai {
        warn!("⚠️  OPENAI_API_KEY not set; transaction answers will degrade");
    }
    if !configured.mysql {
        warn!("⚠️  MYSQL_URI not set; only client questions can be answered");
    }

    let gateway = Arc::new(Gateway::from_settings(&settings)?);

    info!("✅ Gateway initialized");
    info!("📡 Starting API server...");

    start_server(gateway, configured, settings.port).await?;

    Ok(())
}
