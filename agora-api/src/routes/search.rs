//! Search REST Routes
//!
//! Case-insensitive substring search over posts, users and communities.
//! Post results are ordered with the core ranking function (hot).

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use agora_core::{compare, SortMode};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{
    CommunityResponse, PostSummary, SearchQuery, SearchResponse, UserResponse,
};
use crate::validation::ValidateNonEmpty;

/// GET /api/v1/search - Search posts, users or communities
#[utoipa::path(
    get,
    path = "/api/v1/search",
    tag = "Search",
    params(
        ("q" = String, Query, description = "Search query"),
        ("kind" = Option<String>, Query, description = "posts (default) | users | communities"),
    ),
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 400, description = "Invalid request", body = ApiError),
    )
)]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    params.q.validate_non_empty("q")?;

    let kind = params.kind.as_deref().unwrap_or("posts");
    let mut response = SearchResponse::default();

    match kind {
        "posts" => {
            let mut matches = state.db.search_posts(&params.q).await?;
            matches.sort_by(|a, b| compare(SortMode::Hot, &a.0, &b.0));
            response.posts = Some(
                matches
                    .into_iter()
                    .map(|(post, author, community)| PostSummary {
                        post_id: post.post_id,
                        title: post.title,
                        author,
                        community,
                        upvotes: post.upvotes,
                        downvotes: post.downvotes,
                        comment_count: post.comment_count,
                        created_at: post.created_at,
                    })
                    .collect(),
            );
        }
        "users" => {
            let users = state.db.search_users(&params.q).await?;
            response.users = Some(users.into_iter().map(UserResponse::from).collect());
        }
        "communities" => {
            let communities = state.db.search_communities(&params.q).await?;
            response.communities = Some(
                communities
                    .into_iter()
                    .map(CommunityResponse::from)
                    .collect(),
            );
        }
        other => {
            return Err(ApiError::invalid_input(format!(
                "Unknown search kind '{}', expected posts, users or communities",
                other
            )));
        }
    }

    Ok(Json(response))
}

pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new().route("/", axum::routing::get(search))
}
