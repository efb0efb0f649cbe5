//! Administration REST Routes
//!
//! Platform stats, the report moderation queue, user bans, and the
//! recompute-from-ledger reconciliation. Every route requires the admin
//! role.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};

use agora_core::{ReportId, ReportStatus, UserId, POSTS_PER_PAGE};

use crate::error::{ApiError, ApiResult};
use crate::middleware::AdminUser;
use crate::routes::page_number;
use crate::state::AppState;
use crate::types::{AdminStatsResponse, PageQuery, ReportResponse, UserResponse};

/// GET /api/v1/admin/stats - Aggregate entity counts
#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    tag = "Admin",
    responses(
        (status = 200, description = "Entity counts", body = AdminStatsResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Admin role required", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn stats(
    State(state): State<AppState>,
    AdminUser(_actor): AdminUser,
) -> ApiResult<impl IntoResponse> {
    let stats = state.db.admin_stats().await?;
    Ok(Json(stats))
}

/// GET /api/v1/admin/reports - The pending report queue, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/admin/reports",
    tag = "Admin",
    params(("page" = Option<u32>, Query, description = "1-indexed page number")),
    responses(
        (status = 200, description = "One page of pending reports"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Admin role required", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn pending_reports(
    State(state): State<AppState>,
    AdminUser(_actor): AdminUser,
    Query(params): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let reports = state
        .db
        .reports_pending(page_number(params.page), POSTS_PER_PAGE)
        .await?;
    Ok(Json(reports))
}

/// POST /api/v1/admin/reports/{id}/dismiss - Dismiss a report
#[utoipa::path(
    post,
    path = "/api/v1/admin/reports/{id}/dismiss",
    tag = "Admin",
    params(("id" = String, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report dismissed", body = ReportResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Admin role required", body = ApiError),
        (status = 404, description = "Report not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn dismiss_report(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(report_id): Path<ReportId>,
) -> ApiResult<impl IntoResponse> {
    let report = state
        .db
        .report_set_status(report_id, ReportStatus::Dismissed)
        .await?;
    tracing::info!(report_id = %report_id, by = %actor.username, "report dismissed");

    let reporter = state
        .db
        .user_by_id(report.reporter_id)
        .await?
        .map(|u| u.username)
        .unwrap_or_default();
    Ok(Json(ReportResponse::from_parts(report, reporter)))
}

/// POST /api/v1/admin/users/{id}/ban - Ban a user
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{id}/ban",
    tag = "Admin",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User banned", body = UserResponse),
        (status = 400, description = "Cannot ban yourself", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Admin role required", body = ApiError),
        (status = 404, description = "User not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn ban_user(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(user_id): Path<UserId>,
) -> ApiResult<impl IntoResponse> {
    if user_id == actor.user_id {
        return Err(ApiError::invalid_input("You cannot ban yourself"));
    }
    let user = state.db.user_set_banned(user_id, true).await?;
    tracing::info!(banned = %user.username, by = %actor.username, "user banned");
    Ok(Json(UserResponse::from(user)))
}

/// POST /api/v1/admin/users/{id}/unban - Lift a ban
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{id}/unban",
    tag = "Admin",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Ban lifted", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Admin role required", body = ApiError),
        (status = 404, description = "User not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn unban_user(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(user_id): Path<UserId>,
) -> ApiResult<impl IntoResponse> {
    let user = state.db.user_set_banned(user_id, false).await?;
    tracing::info!(unbanned = %user.username, by = %actor.username, "user unbanned");
    Ok(Json(UserResponse::from(user)))
}

/// POST /api/v1/admin/recount - Recompute counters from the vote ledger
///
/// The denormalized counters are pure accumulators; this reconciliation
/// is the audit path that rebuilds them (and karma) from the ledger and
/// reports how many rows had drifted.
#[utoipa::path(
    post,
    path = "/api/v1/admin/recount",
    tag = "Admin",
    responses(
        (status = 200, description = "Counters reconciled", body = crate::types::RecountResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Admin role required", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn recount(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
) -> ApiResult<impl IntoResponse> {
    let result = state.db.recount_votes().await?;
    tracing::info!(
        by = %actor.username,
        posts = result.posts_corrected,
        comments = result.comments_corrected,
        users = result.users_corrected,
        "vote counters reconciled"
    );
    Ok(Json(result))
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/stats", axum::routing::get(stats))
        .route("/reports", axum::routing::get(pending_reports))
        .route("/reports/:id/dismiss", axum::routing::post(dismiss_report))
        .route("/users/:id/ban", axum::routing::post(ban_user))
        .route("/users/:id/unban", axum::routing::post(unban_user))
        .route("/recount", axum::routing::post(recount))
}
