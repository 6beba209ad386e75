use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use persistence::repositories::{ConfigRepository, InvitedTeamRepository, TeamRepository};
use tracing::info;

use private_registration_api::{app, config, middleware, services::email::EmailService};

/// Interval between connection pool metric samples.
const POOL_METRICS_INTERVAL: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics().context("Failed to install Prometheus recorder")?;

    info!(
        "Starting private registration service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let db_config = persistence::db::DatabaseConfig::from(&config.database);
    let pool = persistence::db::create_pool(&db_config).await?;
    persistence::db::run_migrations(&pool).await?;

    let metrics_pool = pool.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(POOL_METRICS_INTERVAL);
        loop {
            interval.tick().await;
            persistence::metrics::record_pool_metrics(&metrics_pool);
        }
    });

    let addr = config
        .socket_addr()
        .context("Invalid server listen address")?;
    let mailer = Arc::new(EmailService::from_config(&config));

    let state = app::AppState::new(
        config,
        Arc::new(InvitedTeamRepository::new(pool.clone())),
        Arc::new(TeamRepository::new(pool.clone())),
        Arc::new(ConfigRepository::new(pool.clone())),
        mailer,
    )
    .with_pool(pool);

    app::initialize(&state).await?;
    let app = app::create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
