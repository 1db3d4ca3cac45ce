//! Restaurant table reservations web server
//!
//! (c) Softlandia 2025

use table_reservations_api::api;
use table_reservations_api::config::AppConfig;
use table_reservations_api::container;
use table_reservations_api::infrastructure::database::DatabaseConnection;

use anyhow::{Context, anyhow};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use log::info;
use tokio::runtime::{Builder, Runtime};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    // initialize tracing, RUST_LOG wins over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(web_server_task(config))
}

async fn web_server_task(config: AppConfig) -> anyhow::Result<()> {
    let database = DatabaseConnection::connect(&config)
        .await
        .context("failed to open database")?;

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .context("invalid CORS origin")?;
    let listen_addr = config.listen_addr.clone();

    let provider = container::build_provider(config, database)
        .map_err(|e| anyhow!("invalid service registrations: {e}"))?;

    let app = api::app(provider)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_methods([Method::GET, Method::POST, Method::PATCH])
                .allow_origin(origins),
        );

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {e}");
    }
}
