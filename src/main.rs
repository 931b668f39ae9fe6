use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use crime_intel::{config::Config, routes::create_router, utils::init_logger, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let _log_guard = init_logger(config.logging.log_dir.as_deref());
    info!("Configuration loaded: {:?}", config.server);
    info!("Dataset storage: {:?}", config.storage.data_dir);

    // Create shared state
    let state = AppState::new(config.clone());

    // Create router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
