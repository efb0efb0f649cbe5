//! Shared application state for Axum routers.

use std::sync::Arc;

use crate::auth::AuthConfig;
use crate::db::DbClient;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Database client wrapping the connection pool.
    pub db: DbClient,
    /// Authentication configuration (JWT secret, expiry, clock).
    pub auth: Arc<AuthConfig>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(db: DbClient, auth: AuthConfig) -> Self {
        Self {
            db,
            auth: Arc::new(auth),
            start_time: std::time::Instant::now(),
        }
    }
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(DbClient, db);
crate::impl_from_ref!(Arc<AuthConfig>, auth);
crate::impl_from_ref!(std::time::Instant, start_time);
