//! Axum Middleware and Extractors for Authentication
//!
//! The auth middleware runs on every `/api/v1` request:
//! - With an `Authorization: Bearer` header, it validates the token and
//!   injects an [`AuthContext`] into request extensions. An invalid or
//!   expired token is rejected with 401 immediately.
//! - Without the header, the request proceeds anonymously.
//!
//! Handlers state their requirement through extractors: [`CurrentUser`]
//! rejects anonymous requests with 401, [`AdminUser`] additionally
//! requires the admin role, and handlers without either extractor admit
//! anonymous requests. Ranked listings are anonymous; voting and every
//! other mutation require an authenticated actor.

use crate::auth::{extract_bearer_token, validate_jwt_token, AuthConfig, AuthContext};
use crate::error::ApiError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

// ============================================================================
// MIDDLEWARE
// ============================================================================

/// Authentication middleware.
///
/// Validates the bearer token when one is supplied and injects the
/// resulting [`AuthContext`] into request extensions. Anonymous requests
/// pass through untouched; enforcement happens at the extractor.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok());

    if let Some(header_value) = auth_header {
        let token = extract_bearer_token(header_value)?;
        let context = validate_jwt_token(&auth, token)?;
        tracing::debug!(user_id = %context.user_id, username = %context.username, "authenticated request");
        request.extensions_mut().insert(context);
    }

    Ok(next.run(request).await)
}

// ============================================================================
// EXTRACTORS
// ============================================================================

/// Extractor for the authenticated actor. Rejects with 401 when the
/// request carries no valid token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Extractor for an administrator. Rejects with 401 when anonymous and
/// 403 when the actor is not an admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(context) = CurrentUser::from_request_parts(parts, state).await?;
        if !context.is_admin() {
            return Err(ApiError::forbidden("Administrator role required"));
        }
        Ok(AdminUser(context))
    }
}
