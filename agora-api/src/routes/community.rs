//! Community REST Routes
//!
//! Communities are looked up by name, as in `a/rustaceans`. Reads are
//! anonymous; creating, joining, leaving and editing require an actor.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use agora_core::POSTS_PER_PAGE;

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::routes::{page_number, parse_sort};
use crate::state::AppState;
use crate::types::{
    CommunityResponse, CreateCommunityRequest, SortPageQuery, UpdateCommunityRequest,
};
use crate::validation::{validate_community_name, ValidateLength};

/// POST /api/v1/communities - Create a community
///
/// The creator becomes moderator and first member.
#[utoipa::path(
    post,
    path = "/api/v1/communities",
    tag = "Communities",
    request_body = CreateCommunityRequest,
    responses(
        (status = 201, description = "Community created", body = CommunityResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 409, description = "Name taken", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_community(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(req): Json<CreateCommunityRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_community_name(&req.name)?;
    req.title.validate_length("title", 3, 100)?;

    if state.db.community_by_name(&req.name).await?.is_some() {
        return Err(ApiError::already_exists("Community", &req.name));
    }

    let community = state
        .db
        .community_create(
            &req.name,
            &req.title,
            req.description.as_deref().unwrap_or(""),
            actor.user_id,
        )
        .await?;

    tracing::info!(community = %community.name, moderator = %actor.username, "community created");
    Ok((
        StatusCode::CREATED,
        Json(CommunityResponse::from(community)),
    ))
}

/// GET /api/v1/communities/{name} - Community details
#[utoipa::path(
    get,
    path = "/api/v1/communities/{name}",
    tag = "Communities",
    params(("name" = String, Path, description = "Community name")),
    responses(
        (status = 200, description = "Community details", body = CommunityResponse),
        (status = 404, description = "Community not found", body = ApiError),
    )
)]
pub async fn get_community(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let community = state
        .db
        .community_by_name(&name)
        .await?
        .ok_or_else(|| ApiError::community_not_found(&name))?;
    Ok(Json(CommunityResponse::from(community)))
}

/// GET /api/v1/communities/{name}/posts - Ranked posts of a community
///
/// Community listings never apply the global feed's 7-day `top` window.
#[utoipa::path(
    get,
    path = "/api/v1/communities/{name}/posts",
    tag = "Communities",
    params(
        ("name" = String, Path, description = "Community name"),
        ("sort" = Option<String>, Query, description = "new | top | hot (default hot)"),
        ("page" = Option<u32>, Query, description = "1-indexed page number"),
    ),
    responses(
        (status = 200, description = "One page of post summaries"),
        (status = 404, description = "Community not found", body = ApiError),
    )
)]
pub async fn list_community_posts(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<SortPageQuery>,
) -> ApiResult<impl IntoResponse> {
    let sort = parse_sort(&params.sort)?;
    let page = page_number(params.page);

    let community = state
        .db
        .community_by_name(&name)
        .await?
        .ok_or_else(|| ApiError::community_not_found(&name))?;

    let posts = state
        .db
        .feed(sort, Some(community.community_id), page, POSTS_PER_PAGE)
        .await?;
    Ok(Json(posts))
}

/// POST /api/v1/communities/{name}/join - Join a community
#[utoipa::path(
    post,
    path = "/api/v1/communities/{name}/join",
    tag = "Communities",
    params(("name" = String, Path, description = "Community name")),
    responses(
        (status = 204, description = "Joined (or already a member)"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Community not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn join_community(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let community = state
        .db
        .community_by_name(&name)
        .await?
        .ok_or_else(|| ApiError::community_not_found(&name))?;
    state
        .db
        .community_join(community.community_id, actor.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/communities/{name}/leave - Leave a community
#[utoipa::path(
    post,
    path = "/api/v1/communities/{name}/leave",
    tag = "Communities",
    params(("name" = String, Path, description = "Community name")),
    responses(
        (status = 204, description = "Left (or was not a member)"),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Community not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn leave_community(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let community = state
        .db
        .community_by_name(&name)
        .await?
        .ok_or_else(|| ApiError::community_not_found(&name))?;
    state
        .db
        .community_leave(community.community_id, actor.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/communities/{name} - Edit a community (moderator or admin)
#[utoipa::path(
    patch,
    path = "/api/v1/communities/{name}",
    tag = "Communities",
    params(("name" = String, Path, description = "Community name")),
    request_body = UpdateCommunityRequest,
    responses(
        (status = 200, description = "Community updated", body = CommunityResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Not the moderator", body = ApiError),
        (status = 404, description = "Community not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_community(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(name): Path<String>,
    Json(req): Json<UpdateCommunityRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(title) = &req.title {
        title.validate_length("title", 3, 100)?;
    }

    let community = state
        .db
        .community_by_name(&name)
        .await?
        .ok_or_else(|| ApiError::community_not_found(&name))?;
    if community.moderator_id != actor.user_id && !actor.is_admin() {
        return Err(ApiError::forbidden(
            "Only the moderator can edit this community",
        ));
    }

    let updated = state
        .db
        .community_update(
            community.community_id,
            req.title.as_deref(),
            req.description.as_deref(),
        )
        .await?;
    Ok(Json(CommunityResponse::from(updated)))
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::post(create_community))
        .route("/:name", axum::routing::get(get_community))
        .route("/:name", axum::routing::patch(update_community))
        .route("/:name/posts", axum::routing::get(list_community_posts))
        .route("/:name/join", axum::routing::post(join_community))
        .route("/:name/leave", axum::routing::post(leave_community))
}
