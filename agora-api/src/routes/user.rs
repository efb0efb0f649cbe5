//! User REST Routes
//!
//! Public profiles and listings, plus the `/me` routes for the caller's
//! own profile, password and saved posts.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use agora_core::POSTS_PER_PAGE;

use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::routes::page_number;
use crate::state::AppState;
use crate::types::{
    ChangePasswordRequest, ListUsersQuery, PageQuery, UpdateProfileRequest, UserResponse, UserSort,
};
use crate::validation::{validate_email, ValidateLength};

/// GET /api/v1/users/{username} - Public profile
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}",
    tag = "Users",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found", body = ApiError),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .db
        .user_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::user_not_found(&username))?;
    Ok(Json(UserResponse::from(user)))
}

/// GET /api/v1/users - Ranked user listing (karma by default)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    params(
        ("sort" = Option<String>, Query, description = "karma | new (default karma)"),
        ("page" = Option<u32>, Query, description = "1-indexed page number"),
    ),
    responses(
        (status = 200, description = "One page of users"),
        (status = 400, description = "Invalid sort or page", body = ApiError),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListUsersQuery>,
) -> ApiResult<impl IntoResponse> {
    let sort = match &params.sort {
        None => UserSort::default(),
        Some(s) => s.parse::<UserSort>()?,
    };
    let page = page_number(params.page);

    let users = state.db.user_list(sort, page, POSTS_PER_PAGE).await?;
    Ok(Json(users.map(UserResponse::from)))
}

/// GET /api/v1/users/{username}/posts - Posts authored by a user
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}/posts",
    tag = "Users",
    params(
        ("username" = String, Path, description = "Username"),
        ("page" = Option<u32>, Query, description = "1-indexed page number"),
    ),
    responses(
        (status = 200, description = "One page of post summaries"),
        (status = 404, description = "User not found", body = ApiError),
    )
)]
pub async fn list_user_posts(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(params): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .db
        .user_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::user_not_found(&username))?;

    let posts = state
        .db
        .user_posts(user.user_id, page_number(params.page), POSTS_PER_PAGE)
        .await?;
    Ok(Json(posts))
}

/// GET /api/v1/users/{username}/upvoted - Posts the user has upvoted
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}/upvoted",
    tag = "Users",
    params(
        ("username" = String, Path, description = "Username"),
        ("page" = Option<u32>, Query, description = "1-indexed page number"),
    ),
    responses(
        (status = 200, description = "One page of post summaries"),
        (status = 404, description = "User not found", body = ApiError),
    )
)]
pub async fn list_user_upvoted(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(params): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .db
        .user_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::user_not_found(&username))?;

    let posts = state
        .db
        .upvoted_posts(user.user_id, page_number(params.page), POSTS_PER_PAGE)
        .await?;
    Ok(Json(posts))
}

/// PATCH /api/v1/me - Update the caller's profile
#[utoipa::path(
    patch,
    path = "/api/v1/me",
    tag = "Users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(bio) = &req.bio {
        bio.validate_length("bio", 0, 500)?;
    }
    if let Some(email) = &req.email {
        validate_email(email)?;
        if let Some(existing) = state.db.user_by_email(email).await? {
            if existing.user_id != actor.user_id {
                return Err(ApiError::already_exists("Email", email));
            }
        }
    }

    let user = state
        .db
        .user_update_profile(actor.user_id, req.bio.as_deref(), req.email.as_deref())
        .await?;
    Ok(Json(UserResponse::from(user)))
}

/// POST /api/v1/me/password - Change the caller's password
#[utoipa::path(
    post,
    path = "/api/v1/me/password",
    tag = "Users",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 401, description = "Unauthorized or wrong old password", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    req.new_password.validate_length("new_password", 6, 128)?;

    let user = state
        .db
        .user_by_id(actor.user_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(actor.user_id))?;
    if !verify_password(&req.old_password, &user.password_hash) {
        return Err(ApiError::unauthorized("Old password is incorrect"));
    }

    state
        .db
        .user_set_password(actor.user_id, &hash_password(&req.new_password))
        .await?;
    tracing::info!(username = %actor.username, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/me/saved - The caller's saved posts
#[utoipa::path(
    get,
    path = "/api/v1/me/saved",
    tag = "Users",
    params(("page" = Option<u32>, Query, description = "1-indexed page number")),
    responses(
        (status = 200, description = "One page of post summaries"),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_saved_posts(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(params): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let posts = state
        .db
        .saved_posts(actor.user_id, page_number(params.page), POSTS_PER_PAGE)
        .await?;
    Ok(Json(posts))
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::get(list_users))
        .route("/:username", axum::routing::get(get_user))
        .route("/:username/posts", axum::routing::get(list_user_posts))
        .route("/:username/upvoted", axum::routing::get(list_user_upvoted))
}

pub fn create_me_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::patch(update_profile))
        .route("/password", axum::routing::post(change_password))
        .route("/saved", axum::routing::get(list_saved_posts))
}
