//! Report Handlers
//!
//! User-filed reports against posts and comments. The handlers are
//! mounted under the post and comment routers; the moderation queue
//! lives in the admin routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use agora_core::{CommentId, PostId};

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::state::AppState;
use crate::types::{CreateReportRequest, ReportResponse, REPORT_REASONS};

fn validate_reason(reason: &str) -> ApiResult<()> {
    if !REPORT_REASONS.contains(&reason) {
        return Err(ApiError::invalid_input(format!(
            "Unknown report reason '{}', expected one of: {}",
            reason,
            REPORT_REASONS.join(", ")
        )));
    }
    Ok(())
}

/// POST /api/v1/posts/{id}/report - Report a post
#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/report",
    tag = "Reports",
    params(("id" = String, Path, description = "Post ID")),
    request_body = CreateReportRequest,
    responses(
        (status = 201, description = "Report filed", body = ReportResponse),
        (status = 400, description = "Invalid reason", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Post not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn report_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(post_id): Path<PostId>,
    Json(req): Json<CreateReportRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_reason(&req.reason)?;
    state
        .db
        .post_get(post_id)
        .await?
        .ok_or_else(|| ApiError::post_not_found(post_id))?;

    let report = state
        .db
        .report_create(
            actor.user_id,
            Some(post_id),
            None,
            &req.reason,
            req.description.as_deref().unwrap_or(""),
        )
        .await?;

    tracing::info!(report_id = %report.report_id, post_id = %post_id, "post reported");
    let response = ReportResponse::from_parts(report, actor.username);
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/comments/{id}/report - Report a comment
#[utoipa::path(
    post,
    path = "/api/v1/comments/{id}/report",
    tag = "Reports",
    params(("id" = String, Path, description = "Comment ID")),
    request_body = CreateReportRequest,
    responses(
        (status = 201, description = "Report filed", body = ReportResponse),
        (status = 400, description = "Invalid reason", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Comment not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn report_comment(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(comment_id): Path<CommentId>,
    Json(req): Json<CreateReportRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_reason(&req.reason)?;
    state
        .db
        .comment_get(comment_id)
        .await?
        .ok_or_else(|| ApiError::comment_not_found(comment_id))?;

    let report = state
        .db
        .report_create(
            actor.user_id,
            None,
            Some(comment_id),
            &req.reason,
            req.description.as_deref().unwrap_or(""),
        )
        .await?;

    tracing::info!(report_id = %report.report_id, comment_id = %comment_id, "comment reported");
    let response = ReportResponse::from_parts(report, actor.username);
    Ok((StatusCode::CREATED, Json(response)))
}
