//! Private Message REST Routes
//!
//! Inbox, read (which marks the message read), and send. Sending notifies
//! the recipient. All message routes require an authenticated actor.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use agora_core::{MessageId, POSTS_PER_PAGE};

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::routes::page_number;
use crate::state::AppState;
use crate::types::{MessageResponse, PageQuery, SendMessageRequest};
use crate::validation::ValidateLength;

/// GET /api/v1/messages - The caller's inbox, newest first
#[utoipa::path(
    get,
    path = "/api/v1/messages",
    tag = "Messages",
    params(("page" = Option<u32>, Query, description = "1-indexed page number")),
    responses(
        (status = 200, description = "One page of messages"),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn inbox(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(params): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let messages = state
        .db
        .inbox(
            actor.user_id,
            &actor.username,
            page_number(params.page),
            POSTS_PER_PAGE,
        )
        .await?;
    Ok(Json(messages))
}

/// GET /api/v1/messages/{id} - Read a message (recipient only; marks read)
#[utoipa::path(
    get,
    path = "/api/v1/messages/{id}",
    tag = "Messages",
    params(("id" = String, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Message details", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Message not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn read_message(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(message_id): Path<MessageId>,
) -> ApiResult<impl IntoResponse> {
    let message = state
        .db
        .message_read(message_id, actor.user_id, &actor.username)
        .await?;
    Ok(Json(message))
}

/// POST /api/v1/messages/send/{username} - Send a private message
#[utoipa::path(
    post,
    path = "/api/v1/messages/send/{username}",
    tag = "Messages",
    params(("username" = String, Path, description = "Recipient username")),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent", body = MessageResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Recipient not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(username): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    req.body.validate_length("body", 1, 10000)?;

    let recipient = state
        .db
        .user_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::user_not_found(&username))?;
    if recipient.user_id == actor.user_id {
        return Err(ApiError::invalid_input("You cannot message yourself"));
    }

    let message = state
        .db
        .message_send(
            actor.user_id,
            &actor.username,
            &recipient,
            req.subject.as_deref().unwrap_or(""),
            &req.body,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::get(inbox))
        .route("/:id", axum::routing::get(read_message))
        .route("/send/:username", axum::routing::post(send_message))
}
