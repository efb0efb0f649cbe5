//! API Request and Response Types
//!
//! This module defines all request and response types for the Agora API.

use agora_core::{
    Comment, CommentId, Community, CommunityId, ContentKind, Message, MessageId, Notification,
    NotificationId, NotificationKind, PostId, Report, ReportId, ReportStatus, Timestamp, User,
    UserId, UserRole,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// AUTH TYPES
// ============================================================================

/// Request to register a new user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request to log in with username and password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response carrying a freshly issued access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TokenResponse {
    /// Bearer token for the Authorization header
    pub token: String,
    pub user: UserResponse,
}

// ============================================================================
// USER TYPES
// ============================================================================

/// Public view of a user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub username: String,
    pub bio: String,
    pub role: UserRole,
    pub karma: i32,
    pub is_banned: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            bio: user.bio,
            role: user.role,
            karma: user.karma,
            is_banned: user.is_banned,
            created_at: user.created_at,
        }
    }
}

/// Request to update the caller's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateProfileRequest {
    /// New bio (if changing)
    pub bio: Option<String>,
    /// New email (if changing)
    pub email: Option<String>,
}

/// Request to change the caller's password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Query parameters for the user listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListUsersQuery {
    /// `karma` (default) or `new`
    pub sort: Option<String>,
    pub page: Option<u32>,
}

/// Sort order for user listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSort {
    /// Karma descending (default)
    #[default]
    Karma,
    /// Account creation, newest first
    New,
}

impl std::str::FromStr for UserSort {
    type Err = agora_core::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "karma" => Ok(UserSort::Karma),
            "new" => Ok(UserSort::New),
            other => Err(agora_core::ParseEnumError::new("user sort", other)),
        }
    }
}

// ============================================================================
// COMMUNITY TYPES
// ============================================================================

/// Request to create a community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateCommunityRequest {
    /// Short unique name, as in `a/name`
    pub name: String,
    /// Display title
    pub title: String,
    pub description: Option<String>,
}

/// Request to update a community. Moderator or admin only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateCommunityRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Community details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CommunityResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub community_id: CommunityId,
    pub name: String,
    pub title: String,
    pub description: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub moderator_id: UserId,
    pub member_count: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl From<Community> for CommunityResponse {
    fn from(community: Community) -> Self {
        Self {
            community_id: community.community_id,
            name: community.name,
            title: community.title,
            description: community.description,
            moderator_id: community.moderator_id,
            member_count: community.member_count,
            created_at: community.created_at,
        }
    }
}

// ============================================================================
// POST TYPES
// ============================================================================

/// Request to create a post in a community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreatePostRequest {
    pub title: String,
    /// Community name the post belongs to
    pub community: String,
    pub body: Option<String>,
    pub url: Option<String>,
    pub content_kind: Option<ContentKind>,
    pub flair: Option<String>,
}

/// Request to edit a post. Author or admin only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub flair: Option<String>,
}

/// Full post details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PostResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub post_id: PostId,
    pub title: String,
    pub body: String,
    pub url: String,
    pub content_kind: ContentKind,
    pub flair: String,
    pub author: String,
    pub community: String,
    pub upvotes: i32,
    pub downvotes: i32,
    pub comment_count: i32,
    pub view_count: i32,
    pub is_pinned: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Post summary for ranked listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PostSummary {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub post_id: PostId,
    pub title: String,
    pub author: String,
    pub community: String,
    pub upvotes: i32,
    pub downvotes: i32,
    pub comment_count: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Query parameters for ranked post listings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeedQuery {
    /// `new`, `top` or `hot` (default)
    pub sort: Option<String>,
    /// 1-indexed page number
    pub page: Option<u32>,
    /// Restrict the feed to one community
    pub community: Option<String>,
}

/// Plain page-only query parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

// ============================================================================
// VOTE TYPES
// ============================================================================

/// Counters returned after a vote transition, and embedded in votable
/// responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VoteCountsResponse {
    pub upvotes: i32,
    pub downvotes: i32,
}

// ============================================================================
// COMMENT TYPES
// ============================================================================

/// Request to comment on a post, optionally under a parent comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateCommentRequest {
    pub body: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub parent_comment_id: Option<CommentId>,
}

/// Comment details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CommentResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub comment_id: CommentId,
    pub body: String,
    pub author: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub post_id: PostId,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub parent_comment_id: Option<CommentId>,
    pub upvotes: i32,
    pub downvotes: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Sort-and-page query parameters, shared by comment and community post
/// listings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SortPageQuery {
    /// `new`, `top` or `hot` (default)
    pub sort: Option<String>,
    pub page: Option<u32>,
}

// ============================================================================
// MESSAGE TYPES
// ============================================================================

/// Request to send a private message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SendMessageRequest {
    pub subject: Option<String>,
    pub body: String,
}

/// Private message details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub message_id: MessageId,
    pub sender: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub is_read: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

// ============================================================================
// NOTIFICATION TYPES
// ============================================================================

/// Notification details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NotificationResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub notification_id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub link: String,
    pub is_read: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            notification_id: n.notification_id,
            kind: n.kind,
            title: n.title,
            body: n.body,
            link: n.link,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

// ============================================================================
// REPORT TYPES
// ============================================================================

/// Request to report a post or comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateReportRequest {
    /// One of: spam, harassment, hate, misinformation, nsfw, other
    pub reason: String,
    pub description: Option<String>,
}

/// Report details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReportResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub report_id: ReportId,
    pub reporter: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub post_id: Option<PostId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub comment_id: Option<CommentId>,
    pub reason: String,
    pub description: String,
    pub status: ReportStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Accepted report reasons.
pub const REPORT_REASONS: &[&str] = &[
    "spam",
    "harassment",
    "hate",
    "misinformation",
    "nsfw",
    "other",
];

// ============================================================================
// SEARCH TYPES
// ============================================================================

/// Query parameters for search.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    /// `posts` (default), `users` or `communities`
    pub kind: Option<String>,
}

/// Search results; only the requested kind is populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SearchResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<PostSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<UserResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub communities: Option<Vec<CommunityResponse>>,
}

// ============================================================================
// ADMIN TYPES
// ============================================================================

/// Aggregate entity counts for the admin panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AdminStatsResponse {
    pub users: i64,
    pub posts: i64,
    pub comments: i64,
    pub communities: i64,
}

/// Result of the recompute-from-ledger reconciliation: how many rows had
/// drifted counters and were corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RecountResponse {
    pub posts_corrected: u64,
    pub comments_corrected: u64,
    pub users_corrected: u64,
}

// ============================================================================
// HELPERS USED BY DB ROW MAPPING
// ============================================================================

impl PostResponse {
    /// Assemble from a core post plus resolved author and community names.
    pub fn from_parts(post: agora_core::Post, author: String, community: String) -> Self {
        Self {
            post_id: post.post_id,
            title: post.title,
            body: post.body,
            url: post.url,
            content_kind: post.content_kind,
            flair: post.flair,
            author,
            community,
            upvotes: post.upvotes,
            downvotes: post.downvotes,
            comment_count: post.comment_count,
            view_count: post.view_count,
            is_pinned: post.is_pinned,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl MessageResponse {
    /// Assemble from a core message plus resolved usernames.
    pub fn from_parts(message: Message, sender: String, recipient: String) -> Self {
        Self {
            message_id: message.message_id,
            sender,
            recipient,
            subject: message.subject,
            body: message.body,
            is_read: message.is_read,
            created_at: message.created_at,
        }
    }
}

impl CommentResponse {
    /// Assemble from a core comment plus the resolved author username.
    pub fn from_parts(comment: Comment, author: String) -> Self {
        Self {
            comment_id: comment.comment_id,
            body: comment.body,
            author,
            post_id: comment.post_id,
            parent_comment_id: comment.parent_comment_id,
            upvotes: comment.upvotes,
            downvotes: comment.downvotes,
            created_at: comment.created_at,
        }
    }
}

impl ReportResponse {
    /// Assemble from a core report plus the resolved reporter username.
    pub fn from_parts(report: Report, reporter: String) -> Self {
        Self {
            report_id: report.report_id,
            reporter,
            post_id: report.post_id,
            comment_id: report.comment_id,
            reason: report.reason,
            description: report.description,
            status: report.status,
            created_at: report.created_at,
        }
    }
}
