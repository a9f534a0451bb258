use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use marketsquare::config::{Cli, Config};
use marketsquare::market::yahoo::YahooProvider;
use marketsquare::state::AppState;
use marketsquare::{app, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    // Market data provider
    let provider = YahooProvider::new(
        &config.market.base_url,
        Duration::from_secs(config.market.timeout_secs),
    )?;
    tracing::info!(
        "Market data from {} (timeout {}s)",
        config.market.base_url,
        config.market.timeout_secs
    );

    let state = AppState {
        db: pool,
        config: config.clone(),
        market: Arc::new(provider),
    };

    let app = app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
