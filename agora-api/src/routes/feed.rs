//! Ranked Feed Route
//!
//! The anonymous post feed: `new`, `top` and `hot` (default) sorts with
//! fixed-size pages. The `top` sort of the global feed is restricted to
//! the trailing 7 days; community feeds are unrestricted.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use agora_core::POSTS_PER_PAGE;

use crate::error::{ApiError, ApiResult};
use crate::routes::{page_number, parse_sort};
use crate::state::AppState;
use crate::types::FeedQuery;

/// GET /api/v1/feed - Ranked, paginated post listing
#[utoipa::path(
    get,
    path = "/api/v1/feed",
    tag = "Feed",
    params(
        ("sort" = Option<String>, Query, description = "new | top | hot (default hot)"),
        ("page" = Option<u32>, Query, description = "1-indexed page number"),
        ("community" = Option<String>, Query, description = "Restrict to one community"),
    ),
    responses(
        (status = 200, description = "One page of post summaries"),
        (status = 400, description = "Invalid sort or page", body = ApiError),
        (status = 404, description = "Unknown community", body = ApiError),
    )
)]
pub async fn get_feed(
    State(state): State<AppState>,
    Query(params): Query<FeedQuery>,
) -> ApiResult<impl IntoResponse> {
    let sort = parse_sort(&params.sort)?;
    let page = page_number(params.page);

    let community_id = match &params.community {
        Some(name) => Some(
            state
                .db
                .community_by_name(name)
                .await?
                .ok_or_else(|| ApiError::community_not_found(name))?
                .community_id,
        ),
        None => None,
    };

    let feed = state
        .db
        .feed(sort, community_id, page, POSTS_PER_PAGE)
        .await?;
    Ok(Json(feed))
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new().route("/", axum::routing::get(get_feed))
}
