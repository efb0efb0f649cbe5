//! Post REST Routes
//!
//! Post CRUD plus the vote endpoints. Reading a post is anonymous (and
//! bumps its view counter); everything else requires an authenticated
//! actor. Deletion is soft so the vote ledger stays intact.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use agora_core::{ContentKind, PostId, VoteKind};

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::routes::{comment, report};
use crate::state::AppState;
use crate::types::{CreatePostRequest, PostResponse, UpdatePostRequest};
use crate::validation::{ValidateLength, ValidateNonEmpty};

/// POST /api/v1/posts - Submit a post to a community
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    tag = "Posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Unknown community", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    req.title.validate_length("title", 3, 300)?;
    req.community.validate_non_empty("community")?;

    let content_kind = req.content_kind.unwrap_or_default();
    let url = req.url.unwrap_or_default();
    if content_kind != ContentKind::Text {
        url.validate_non_empty("url")?;
    }

    let community = state
        .db
        .community_by_name(&req.community)
        .await?
        .ok_or_else(|| ApiError::community_not_found(&req.community))?;

    let post = state
        .db
        .post_create(
            &req.title,
            req.body.as_deref().unwrap_or(""),
            &url,
            content_kind.as_str(),
            req.flair.as_deref().unwrap_or(""),
            actor.user_id,
            community.community_id,
        )
        .await?;

    tracing::info!(post_id = %post.post_id, community = %community.name, "post created");

    let response = PostResponse::from_parts(post, actor.username, community.name);
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/posts/{id} - Fetch a post (bumps the view counter)
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    tag = "Posts",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post details", body = PostResponse),
        (status = 404, description = "Post not found", body = ApiError),
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
) -> ApiResult<impl IntoResponse> {
    let (post, author, community) = state
        .db
        .post_view(post_id)
        .await?
        .ok_or_else(|| ApiError::post_not_found(post_id))?;
    Ok(Json(PostResponse::from_parts(post, author, community)))
}

/// PATCH /api/v1/posts/{id} - Edit a post (author or admin)
#[utoipa::path(
    patch,
    path = "/api/v1/posts/{id}",
    tag = "Posts",
    params(("id" = String, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Not the author", body = ApiError),
        (status = 404, description = "Post not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(post_id): Path<PostId>,
    Json(req): Json<UpdatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(title) = &req.title {
        title.validate_length("title", 3, 300)?;
    }

    let post = state
        .db
        .post_get(post_id)
        .await?
        .ok_or_else(|| ApiError::post_not_found(post_id))?;
    if post.author_id != actor.user_id && !actor.is_admin() {
        return Err(ApiError::forbidden("Only the author can edit this post"));
    }

    let updated = state
        .db
        .post_update(
            post_id,
            req.title.as_deref(),
            req.body.as_deref(),
            req.flair.as_deref(),
        )
        .await?;

    let (author, community) = post_names(&state, &updated).await?;
    Ok(Json(PostResponse::from_parts(updated, author, community)))
}

/// DELETE /api/v1/posts/{id} - Soft-delete a post (author or admin)
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    tag = "Posts",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Not the author", body = ApiError),
        (status = 404, description = "Post not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(post_id): Path<PostId>,
) -> ApiResult<impl IntoResponse> {
    let post = state
        .db
        .post_get(post_id)
        .await?
        .ok_or_else(|| ApiError::post_not_found(post_id))?;
    if post.author_id != actor.user_id && !actor.is_admin() {
        return Err(ApiError::forbidden("Only the author can delete this post"));
    }

    state.db.post_soft_delete(post_id).await?;
    tracing::info!(post_id = %post_id, by = %actor.username, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/posts/{id}/pin - Toggle pinning (community moderator or admin)
#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/pin",
    tag = "Posts",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Pin state toggled", body = PostResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Not the moderator", body = ApiError),
        (status = 404, description = "Post not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn pin_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(post_id): Path<PostId>,
) -> ApiResult<impl IntoResponse> {
    let post = state
        .db
        .post_get(post_id)
        .await?
        .ok_or_else(|| ApiError::post_not_found(post_id))?;

    let community = state
        .db
        .community_by_id(post.community_id)
        .await?
        .ok_or_else(|| ApiError::community_not_found(post.community_id))?;
    if community.moderator_id != actor.user_id && !actor.is_admin() {
        return Err(ApiError::forbidden(
            "Only the community moderator can pin posts",
        ));
    }

    let (author, _) = post_names(&state, &post).await?;
    let updated = state.db.post_toggle_pin(post_id).await?;
    Ok(Json(PostResponse::from_parts(updated, author, community.name)))
}

/// POST /api/v1/posts/{id}/save - Save a post to favorites
#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/save",
    tag = "Posts",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post saved"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Post not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn save_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(post_id): Path<PostId>,
) -> ApiResult<impl IntoResponse> {
    state
        .db
        .post_get(post_id)
        .await?
        .ok_or_else(|| ApiError::post_not_found(post_id))?;
    state.db.post_save(actor.user_id, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/posts/{id}/save - Remove a post from favorites
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}/save",
    tag = "Posts",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post unsaved"),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn unsave_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(post_id): Path<PostId>,
) -> ApiResult<impl IntoResponse> {
    state.db.post_unsave(actor.user_id, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/posts/{id}/upvote - Cast/toggle an upvote
///
/// Toggle semantics: upvoting an already-upvoted post retracts the vote.
#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/upvote",
    tag = "Votes",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "New counters", body = crate::types::VoteCountsResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Post not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn upvote_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(post_id): Path<PostId>,
) -> ApiResult<impl IntoResponse> {
    let counts = state
        .db
        .post_vote(post_id, actor.user_id, VoteKind::Up)
        .await?;
    Ok(Json(counts))
}

/// POST /api/v1/posts/{id}/downvote - Cast/toggle a downvote
#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/downvote",
    tag = "Votes",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "New counters", body = crate::types::VoteCountsResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Post not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn downvote_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(post_id): Path<PostId>,
) -> ApiResult<impl IntoResponse> {
    let counts = state
        .db
        .post_vote(post_id, actor.user_id, VoteKind::Down)
        .await?;
    Ok(Json(counts))
}

/// Resolve the author and community names for a post.
async fn post_names(state: &AppState, post: &agora_core::Post) -> ApiResult<(String, String)> {
    let author = state
        .db
        .user_by_id(post.author_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(post.author_id))?
        .username;
    let community = state
        .db
        .community_by_id(post.community_id)
        .await?
        .ok_or_else(|| ApiError::community_not_found(post.community_id))?
        .name;
    Ok((author, community))
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::post(create_post))
        .route("/:id", axum::routing::get(get_post))
        .route("/:id", axum::routing::patch(update_post))
        .route("/:id", axum::routing::delete(delete_post))
        .route("/:id/pin", axum::routing::post(pin_post))
        .route("/:id/save", axum::routing::post(save_post))
        .route("/:id/save", axum::routing::delete(unsave_post))
        .route("/:id/upvote", axum::routing::post(upvote_post))
        .route("/:id/downvote", axum::routing::post(downvote_post))
        .route("/:id/comments", axum::routing::post(comment::create_comment))
        .route("/:id/comments", axum::routing::get(comment::list_comments))
        .route("/:id/report", axum::routing::post(report::report_post))
}
