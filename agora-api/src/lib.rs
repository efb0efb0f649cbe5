//! Agora API - REST API Layer
//!
//! This crate provides the HTTP surface of the Agora discussion platform:
//! Axum route handlers, the PostgreSQL access layer, JWT authentication,
//! and structured error responses. Domain logic (the vote transition
//! table and the ranking function) lives in `agora-core`; this crate
//! wires it to the request/response world.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod macros;
pub mod middleware;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod state;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use auth::{
    generate_jwt_token, hash_password, validate_jwt_token, verify_password, AuthConfig,
    AuthContext, Claims, FixedClock, JwtClock, JwtSecret, SystemClock,
};
pub use config::ApiConfig;
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{auth_middleware, AdminUser, CurrentUser};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;
pub use types::*;
