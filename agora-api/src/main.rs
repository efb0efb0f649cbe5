//! Agora API Server Entry Point
//!
//! Bootstraps configuration, applies the schema, and starts the Axum
//! HTTP server.

use std::net::SocketAddr;

use axum::Router;
use agora_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AppState, AuthConfig, DbClient, DbConfig,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ApiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db_config = DbConfig::from_env();
    let db = DbClient::from_config(&db_config)?;
    db.ensure_schema().await?;

    let api_config = ApiConfig::from_env();
    let auth_config = AuthConfig::from_env();

    let state = AppState::new(db, auth_config);
    let app: Router = create_api_router(state, &api_config);

    let addr = resolve_bind_addr(&api_config)?;
    tracing::info!(%addr, "Starting Agora API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr(config: &ApiConfig) -> ApiResult<SocketAddr> {
    let addr = format!("{}:{}", config.bind_host, config.bind_port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::internal_error(format!("Invalid bind address {}: {}", addr, e)))
}
