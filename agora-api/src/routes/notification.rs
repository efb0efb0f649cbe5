//! Notification REST Routes

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};

use agora_core::{NotificationId, POSTS_PER_PAGE};

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::routes::page_number;
use crate::state::AppState;
use crate::types::{NotificationResponse, PageQuery};

/// GET /api/v1/notifications - The caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    params(("page" = Option<u32>, Query, description = "1-indexed page number")),
    responses(
        (status = 200, description = "One page of notifications"),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(params): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let notifications = state
        .db
        .notifications_for(actor.user_id, page_number(params.page), POSTS_PER_PAGE)
        .await?;
    Ok(Json(notifications.map(NotificationResponse::from)))
}

/// POST /api/v1/notifications/{id}/read - Mark a notification read
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = String, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked read", body = NotificationResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Notification not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(notification_id): Path<NotificationId>,
) -> ApiResult<impl IntoResponse> {
    let notification = state
        .db
        .notification_mark_read(notification_id, actor.user_id)
        .await?;
    Ok(Json(NotificationResponse::from(notification)))
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::get(list_notifications))
        .route("/:id/read", axum::routing::post(mark_notification_read))
}
