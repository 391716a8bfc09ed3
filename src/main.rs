//! CoinVault service entry point
//!
//! Wiring order: config → logging → database → schema → seed → HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};

use coinvault::api::{self, AppState};
use coinvault::config::AppConfig;
use coinvault::db::{schema, Database};
use coinvault::{bootstrap, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let env = std::env::var("CV_ENV").unwrap_or_else(|_| "dev".to_string());
    let config = AppConfig::load(&env)?;

    let _guard = logging::init_logging(&config);
    tracing::info!(env = %env, "Starting coinvault");

    let db = Arc::new(
        Database::connect(&config.database)
            .await
            .context("Failed to connect to PostgreSQL")?,
    );

    schema::init_schema(db.pool())
        .await
        .context("Failed to initialize schema")?;

    bootstrap::seed(&db, &config.seed)
        .await
        .context("Seed failed")?;

    let state = Arc::new(AppState::new(db));
    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!(addr = %addr, "Ledger service listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind")?;
    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
