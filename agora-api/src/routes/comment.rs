//! Comment REST Routes
//!
//! Comment creation/listing live under `/posts/{id}/comments`; the
//! per-comment vote and delete endpoints live under `/comments/{id}`.
//! Listing is anonymous and paginated at 10 per page.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use agora_core::{CommentId, PostId, VoteKind, COMMENTS_PER_PAGE};

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::routes::{page_number, parse_sort, report};
use crate::state::AppState;
use crate::types::{CommentResponse, CreateCommentRequest, SortPageQuery};
use crate::validation::ValidateLength;

/// POST /api/v1/posts/{id}/comments - Comment on a post
///
/// A 10-second per-author cooldown applies. The post author is notified
/// unless they commented themselves.
#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/comments",
    tag = "Comments",
    params(("id" = String, Path, description = "Post ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Post not found", body = ApiError),
        (status = 429, description = "Commenting too fast", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(post_id): Path<PostId>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<impl IntoResponse> {
    req.body.validate_length("body", 1, 5000)?;

    let comment = state
        .db
        .comment_create(
            post_id,
            actor.user_id,
            &actor.username,
            &req.body,
            req.parent_comment_id,
        )
        .await?;

    let response = CommentResponse::from_parts(comment, actor.username);
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/posts/{id}/comments - Ranked comment listing
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}/comments",
    tag = "Comments",
    params(
        ("id" = String, Path, description = "Post ID"),
        ("sort" = Option<String>, Query, description = "new | top | hot (default hot)"),
        ("page" = Option<u32>, Query, description = "1-indexed page number"),
    ),
    responses(
        (status = 200, description = "One page of comments"),
        (status = 404, description = "Post not found", body = ApiError),
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
    Query(params): Query<SortPageQuery>,
) -> ApiResult<impl IntoResponse> {
    let sort = parse_sort(&params.sort)?;
    let page = page_number(params.page);

    state
        .db
        .post_get(post_id)
        .await?
        .ok_or_else(|| ApiError::post_not_found(post_id))?;

    let comments = state
        .db
        .comments_for_post(post_id, sort, page, COMMENTS_PER_PAGE)
        .await?;
    Ok(Json(comments))
}

/// DELETE /api/v1/comments/{id} - Soft-delete a comment (author or admin)
#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}",
    tag = "Comments",
    params(("id" = String, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Not the author", body = ApiError),
        (status = 404, description = "Comment not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(comment_id): Path<CommentId>,
) -> ApiResult<impl IntoResponse> {
    let comment = state
        .db
        .comment_get(comment_id)
        .await?
        .ok_or_else(|| ApiError::comment_not_found(comment_id))?;
    if comment.author_id != actor.user_id && !actor.is_admin() {
        return Err(ApiError::forbidden(
            "Only the author can delete this comment",
        ));
    }

    state.db.comment_soft_delete(comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/comments/{id}/upvote - Cast/toggle an upvote
#[utoipa::path(
    post,
    path = "/api/v1/comments/{id}/upvote",
    tag = "Votes",
    params(("id" = String, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "New counters", body = crate::types::VoteCountsResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Comment not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn upvote_comment(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(comment_id): Path<CommentId>,
) -> ApiResult<impl IntoResponse> {
    let counts = state
        .db
        .comment_vote(comment_id, actor.user_id, VoteKind::Up)
        .await?;
    Ok(Json(counts))
}

/// POST /api/v1/comments/{id}/downvote - Cast/toggle a downvote
#[utoipa::path(
    post,
    path = "/api/v1/comments/{id}/downvote",
    tag = "Votes",
    params(("id" = String, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "New counters", body = crate::types::VoteCountsResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Comment not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn downvote_comment(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(comment_id): Path<CommentId>,
) -> ApiResult<impl IntoResponse> {
    let counts = state
        .db
        .comment_vote(comment_id, actor.user_id, VoteKind::Down)
        .await?;
    Ok(Json(counts))
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/:id", axum::routing::delete(delete_comment))
        .route("/:id/upvote", axum::routing::post(upvote_comment))
        .route("/:id/downvote", axum::routing::post(downvote_comment))
        .route("/:id/report", axum::routing::post(report::report_comment))
}
