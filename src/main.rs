use anyhow::Context;
use axum::Server;
use config::Config;
use std::net::SocketAddr;

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod logging;
mod monitoring;
mod schema;
mod services;
mod state;
mod validation;

/// Result type for API
pub type Result<T> = std::result::Result<T, errors::ApiError>;

const DB_POOL_SIZE: usize = 20;

/// Static configuration instance for the API
static CONFIG: once_cell::sync::Lazy<Config> = once_cell::sync::Lazy::new(|| {
    dotenv::dotenv().ok();
    envy::from_env::<Config>().expect("Failed to load configuration")
});

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::setup_logging(&CONFIG.log_dir, CONFIG.json_logs)?;

    tokio::fs::create_dir_all(&CONFIG.upload_dir)
        .await
        .with_context(|| format!("Failed to create upload directory {}", CONFIG.upload_dir))?;

    // Connections are established on first use
    let db_client = db::DbClient::with_config(
        &CONFIG.database_url,
        &CONFIG.redis_url,
        DB_POOL_SIZE,
        CONFIG.cache_ttl_seconds,
    );
    let app_state = state::AppState::from_config(&CONFIG, db_client);

    if CONFIG.admin_emails.is_empty() {
        tracing::warn!("ADMIN_EMAILS is empty; no account can obtain the admin role");
    }

    let app = api::initialize_router(app_state);
    let addr = SocketAddr::from(([0, 0, 0, 0], CONFIG.port));
    tracing::info!("Server starting on {}", addr);

    Server::bind(&addr)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("Server error")?;

    Ok(())
}
