//! Authentication REST Routes
//!
//! Registration and login. Both are anonymous endpoints; login refuses
//! banned accounts and returns a bearer token on success.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::auth::{generate_jwt_token, hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{LoginRequest, RegisterRequest, TokenResponse, UserResponse};
use crate::validation::{validate_email, validate_username, ValidateLength};

/// POST /api/v1/auth/register - Create a new account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = TokenResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 409, description = "Username or email taken", body = ApiError),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_username(&req.username)?;
    validate_email(&req.email)?;
    req.password.validate_length("password", 6, 128)?;

    // Friendly pre-checks; the UNIQUE constraints still catch races.
    if state.db.user_by_username(&req.username).await?.is_some() {
        return Err(ApiError::already_exists("Username", &req.username));
    }
    if state.db.user_by_email(&req.email).await?.is_some() {
        return Err(ApiError::already_exists("Email", &req.email));
    }

    let password_hash = hash_password(&req.password);
    let user = state
        .db
        .user_create(&req.username, &req.email, &password_hash)
        .await?;

    tracing::info!(username = %user.username, user_id = %user.user_id, "user registered");

    let token = generate_jwt_token(&state.auth, user.user_id, &user.username, user.role)?;
    let response = TokenResponse {
        token,
        user: UserResponse::from(user),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login - Exchange credentials for a token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Bad credentials", body = ApiError),
        (status = 403, description = "Account banned", body = ApiError),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state.db.user_by_username(&req.username).await?;

    // One error for both unknown user and wrong password.
    let user = match user {
        Some(user) if verify_password(&req.password, &user.password_hash) => user,
        _ => return Err(ApiError::unauthorized("Invalid username or password")),
    };

    if user.is_banned {
        return Err(ApiError::account_banned());
    }

    tracing::info!(username = %user.username, user_id = %user.user_id, "user logged in");

    let token = generate_jwt_token(&state.auth, user.user_id, &user.username, user.role)?;
    let response = TokenResponse {
        token,
        user: UserResponse::from(user),
    };
    Ok(Json(response))
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/register", axum::routing::post(register))
        .route("/login", axum::routing::post(login))
}
