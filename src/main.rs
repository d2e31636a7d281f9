use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hivetower::config::{Cli, Config};
use hivetower::db;
use hivetower::routes;
use hivetower::state::AppState;

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
    let config = Config::load(&cli)?;
    let db_path = config.db_path();
    tracing::info!("Database: {}", db_path.display());

    if cli.init_schema {
        let pool = db::create_pool(&db_path)?;
        db::run_migrations(&pool)?;
    }

    let pool = db::open_read_only(&db_path, config.database.pool_size)?;

    let state = AppState {
        db: pool,
        config: config.clone(),
    };
    let app = routes::app(state)?;

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
