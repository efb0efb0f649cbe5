//! OpenAPI Specification for the Agora API
//!
//! Generated with utoipa from the route annotations and schema derives.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::types::{
    AdminStatsResponse, ChangePasswordRequest, CommentResponse, CommunityResponse,
    CreateCommentRequest, CreateCommunityRequest, CreatePostRequest, CreateReportRequest,
    LoginRequest, MessageResponse, NotificationResponse, PostResponse, PostSummary,
    RecountResponse, RegisterRequest, ReportResponse, SearchResponse, SendMessageRequest,
    TokenResponse, UpdateCommunityRequest, UpdatePostRequest, UpdateProfileRequest, UserResponse,
    VoteCountsResponse,
};

// Import route modules for path references
use crate::routes::{
    admin, auth, comment, community, feed, message, notification, post, report, search, user,
};

// Import domain enums from agora-core
use agora_core::{ContentKind, NotificationKind, ReportStatus, SortMode, UserRole, VoteKind};

/// OpenAPI document for the Agora API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Agora API",
        version = "0.3.0",
        description = "Community discussion platform: communities, posts, threaded comments, voting and karma, messaging, notifications, reports and administration",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Feed", description = "Ranked post listings"),
        (name = "Posts", description = "Post CRUD, pinning and saving"),
        (name = "Votes", description = "Vote transitions on posts and comments"),
        (name = "Comments", description = "Threaded comments"),
        (name = "Communities", description = "Community management and membership"),
        (name = "Users", description = "Profiles and user listings"),
        (name = "Messages", description = "Private messages"),
        (name = "Notifications", description = "Reply and message notifications"),
        (name = "Reports", description = "Content reports"),
        (name = "Admin", description = "Moderation and reconciliation")
    ),
    paths(
        // === Auth Routes ===
        auth::register,
        auth::login,

        // === Feed Routes ===
        feed::get_feed,

        // === Post Routes ===
        post::create_post,
        post::get_post,
        post::update_post,
        post::delete_post,
        post::pin_post,
        post::save_post,
        post::unsave_post,
        post::upvote_post,
        post::downvote_post,

        // === Comment Routes ===
        comment::create_comment,
        comment::list_comments,
        comment::delete_comment,
        comment::upvote_comment,
        comment::downvote_comment,

        // === Community Routes ===
        community::create_community,
        community::get_community,
        community::list_community_posts,
        community::join_community,
        community::leave_community,
        community::update_community,

        // === User Routes ===
        user::get_user,
        user::list_users,
        user::list_user_posts,
        user::list_user_upvoted,
        user::update_profile,
        user::change_password,
        user::list_saved_posts,

        // === Message Routes ===
        message::inbox,
        message::read_message,
        message::send_message,

        // === Notification Routes ===
        notification::list_notifications,
        notification::mark_notification_read,

        // === Report Routes ===
        report::report_post,
        report::report_comment,

        // === Admin Routes ===
        admin::stats,
        admin::pending_reports,
        admin::dismiss_report,
        admin::ban_user,
        admin::unban_user,
        admin::recount
    ),
    components(
        schemas(
            // === Error Types ===
            ApiError, ErrorCode,

            // === Auth Types ===
            RegisterRequest, LoginRequest, TokenResponse,

            // === User Types ===
            UserResponse, UpdateProfileRequest, ChangePasswordRequest,

            // === Community Types ===
            CreateCommunityRequest, UpdateCommunityRequest, CommunityResponse,

            // === Post Types ===
            CreatePostRequest, UpdatePostRequest, PostResponse, PostSummary,

            // === Vote Types ===
            VoteCountsResponse,

            // === Comment Types ===
            CreateCommentRequest, CommentResponse,

            // === Message Types ===
            SendMessageRequest, MessageResponse,

            // === Notification Types ===
            NotificationResponse,

            // === Report Types ===
            CreateReportRequest, ReportResponse,

            // === Search Types ===
            SearchResponse,

            // === Admin Types ===
            AdminStatsResponse, RecountResponse,

            // === Core Domain Types (from agora-core) ===
            VoteKind, SortMode, ContentKind, UserRole, NotificationKind, ReportStatus
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            // Bearer token authentication (JWT)
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        let openapi = Self::openapi();
        serde_json::to_string_pretty(&openapi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi;

    #[test]
    fn test_openapi_generation() -> Result<(), String> {
        let openapi = ApiDoc::openapi();

        assert_eq!(openapi.info.title, "Agora API");

        let tags = openapi
            .tags
            .as_ref()
            .ok_or_else(|| "OpenAPI tags missing".to_string())?;
        assert!(tags.len() >= 10);

        let components = openapi
            .components
            .as_ref()
            .ok_or_else(|| "OpenAPI components missing".to_string())?;
        assert!(components.security_schemes.contains_key("bearer_auth"));
        Ok(())
    }

    #[test]
    fn test_openapi_json_serialization() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| format!("Failed to serialize OpenAPI: {}", e))?;

        serde_json::from_str::<serde_json::Value>(&json)
            .map_err(|e| format!("Generated JSON invalid: {}", e))?;

        assert!(json.contains("Agora API"));
        assert!(json.contains("/api/v1/feed"));
        Ok(())
    }
}
