//! Router Surface Tests
//!
//! Exercise the assembled router without a database: the connection pool
//! is lazy, so routing, the auth middleware, and handler-side validation
//! can all be driven with in-process requests. Anything that would touch
//! PostgreSQL is out of scope here and covered by the DB-backed tests.

use agora_api::{ApiConfig, AppState, AuthConfig, DbClient, DbConfig};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

fn test_router() -> Router {
    let db = DbClient::from_config(&DbConfig::default()).expect("pool config is valid");
    let state = AppState::new(db, AuthConfig::default());
    agora_api::create_api_router(state, &ApiConfig::default())
}

async fn send(router: Router, request: Request<Body>) -> StatusCode {
    let response = router.oneshot(request).await.expect("infallible service");
    response.status()
}

#[tokio::test]
async fn health_ping_is_open() {
    let status = send(
        test_router(),
        Request::builder()
            .uri("/health/ping")
            .body(Body::empty())
            .expect("request builds"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn voting_requires_authentication() {
    let status = send(
        test_router(),
        Request::builder()
            .method("POST")
            .uri("/api/v1/posts/0193d7a0-0000-7000-8000-000000000000/upvote")
            .body(Body::empty())
            .expect("request builds"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn downvote_requires_authentication() {
    let status = send(
        test_router(),
        Request::builder()
            .method("POST")
            .uri("/api/v1/comments/0193d7a0-0000-7000-8000-000000000000/downvote")
            .body(Body::empty())
            .expect("request builds"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_bearer_token_is_rejected() {
    let status = send(
        test_router(),
        Request::builder()
            .method("POST")
            .uri("/api/v1/posts/0193d7a0-0000-7000-8000-000000000000/upvote")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .expect("request builds"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected() {
    let status = send(
        test_router(),
        Request::builder()
            .method("POST")
            .uri("/api/v1/posts/0193d7a0-0000-7000-8000-000000000000/upvote")
            .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .expect("request builds"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn feed_rejects_unknown_sort() {
    let status = send(
        test_router(),
        Request::builder()
            .uri("/api/v1/feed?sort=bogus")
            .body(Body::empty())
            .expect("request builds"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_short_username() {
    let status = send(
        test_router(),
        Request::builder()
            .method("POST")
            .uri("/api/v1/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"username":"ab","email":"a@example.com","password":"secret1"}"#,
            ))
            .expect("request builds"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_invalid_email() {
    let status = send(
        test_router(),
        Request::builder()
            .method("POST")
            .uri("/api/v1/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"username":"alice","email":"nope","password":"secret1"}"#,
            ))
            .expect("request builds"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_requires_query() {
    let status = send(
        test_router(),
        Request::builder()
            .uri("/api/v1/search?q=%20")
            .body(Body::empty())
            .expect("request builds"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_routes_require_authentication() {
    let status = send(
        test_router(),
        Request::builder()
            .method("POST")
            .uri("/api/v1/admin/recount")
            .body(Body::empty())
            .expect("request builds"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[cfg(feature = "openapi")]
#[tokio::test]
async fn openapi_document_is_served() {
    let status = send(
        test_router(),
        Request::builder()
            .uri("/openapi.json")
            .body(Body::empty())
            .expect("request builds"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
