//! Fiscus API Server
//!
//! Main entry point for the Fiscus ledger service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use fiscus_api::{AppState, create_router};
use fiscus_core::account::CodeGenerator;
use fiscus_core::reports::{BalanceVerifier, TrialBalanceAggregator};
use fiscus_db::connect_with_pool;
use fiscus_shared::{AppConfig, JwtService, TokenSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fiscus=debug,tower_http=debug".into());
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect_with_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await
    .context("Failed to connect to database")?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let account_codes = CodeGenerator::from_config(&config.accounts)
        .context("Invalid account code layout")?;
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(JwtService::new(&TokenSettings::from(&config.jwt))),
        account_codes,
        aggregator: TrialBalanceAggregator::from_config(&config.ledger),
        verifier: BalanceVerifier::from_config(&config.ledger),
    };
    info!(
        balance_tolerance = %config.ledger.balance_tolerance,
        "Ledger configured"
    );

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
