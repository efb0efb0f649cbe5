//! REST API Routes Module
//!
//! Route handlers organized by entity, plus the router assembly.
//!
//! All application routes live under `/api/v1` and pass through the auth
//! middleware: requests with a bearer token get an `AuthContext`, requests
//! without one proceed anonymously, and each handler states its own
//! requirement via the `CurrentUser` / `AdminUser` extractors. Health
//! endpoints sit outside `/api/v1`.

pub mod admin;
pub mod auth;
pub mod comment;
pub mod community;
pub mod feed;
pub mod health;
pub mod message;
pub mod notification;
pub mod post;
pub mod report;
pub mod search;
pub mod user;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use agora_core::SortMode;

use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::middleware::auth_middleware;
use crate::state::AppState;

// ============================================================================
// QUERY PARAM HELPERS
// ============================================================================

/// Parse an optional `sort` query parameter; absent means `hot`.
pub(crate) fn parse_sort(sort: &Option<String>) -> ApiResult<SortMode> {
    match sort {
        None => Ok(SortMode::default()),
        Some(s) => Ok(s.parse()?),
    }
}

/// Default an optional `page` query parameter to the first page.
pub(crate) fn page_number(page: Option<u32>) -> u32 {
    page.unwrap_or(1)
}

// ============================================================================
// ROUTER ASSEMBLY
// ============================================================================

/// Assemble the full application router.
pub fn create_api_router(state: AppState, api_config: &ApiConfig) -> Router {
    let api_routes = Router::new()
        .nest("/auth", auth::create_router())
        .nest("/feed", feed::create_router())
        .nest("/posts", post::create_router())
        .nest("/comments", comment::create_router())
        .nest("/communities", community::create_router())
        .nest("/users", user::create_router())
        .nest("/me", user::create_me_router())
        .nest("/messages", message::create_router())
        .nest("/notifications", notification::create_router())
        .nest("/search", search::create_router())
        .nest("/admin", admin::create_router())
        .layer(from_fn_with_state(state.auth.clone(), auth_middleware));

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health::create_router());

    #[cfg(feature = "openapi")]
    let router = router.route("/openapi.json", axum::routing::get(openapi_json));

    router
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(api_config))
}

/// Handler for /openapi.json endpoint.
#[cfg(feature = "openapi")]
async fn openapi_json() -> axum::Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;
    axum::Json(crate::openapi::ApiDoc::openapi())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(origins = ?config.cors_origins, "CORS: Production mode");
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}
