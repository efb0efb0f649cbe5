//! Core entity structures

use crate::{
    CommentId, CommunityId, ContentKind, MessageId, NotificationId, NotificationKind, PostId,
    ReportId, ReportStatus, Timestamp, UserId, UserRole, VoteKind,
};
use serde::{Deserialize, Serialize};

/// User account. `karma` is a running total accumulated from votes cast on
/// the user's posts and comments; it is never recomputed inline, only by the
/// explicit reconciliation operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    /// Salted password hash, `salt$digest` hex form. Never serialized out.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub bio: String,
    pub role: UserRole,
    pub karma: i32,
    pub is_banned: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Community ("subreddit") — a named board that posts belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Community {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub community_id: CommunityId,
    pub name: String,
    pub title: String,
    pub description: String,
    /// The founding user moderates the community.
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub moderator_id: UserId,
    pub member_count: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Post — a votable submitted to a community.
///
/// `upvotes`/`downvotes` are denormalized accumulators maintained
/// transactionally with the vote ledger; they equal the number of ledger
/// rows of each kind referencing this post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Post {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub post_id: PostId,
    pub title: String,
    pub body: String,
    pub url: String,
    pub content_kind: ContentKind,
    pub flair: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub author_id: UserId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub community_id: CommunityId,
    pub upvotes: i32,
    pub downvotes: i32,
    pub comment_count: i32,
    pub view_count: i32,
    pub is_pinned: bool,
    pub is_deleted: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Post {
    /// Net score: upvotes minus downvotes. This is what `hot` orders by.
    pub fn net_score(&self) -> i32 {
        self.upvotes - self.downvotes
    }
}

/// Comment — a votable attached to a post, optionally threaded under a
/// parent comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Comment {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub comment_id: CommentId,
    pub body: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub author_id: UserId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub post_id: PostId,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub parent_comment_id: Option<CommentId>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub is_deleted: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Comment {
    pub fn net_score(&self) -> i32 {
        self.upvotes - self.downvotes
    }
}

/// One ledger fact: which voter cast which vote on which votable.
/// At most one record exists per (voter, votable) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VoteRecord {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub voter_id: UserId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub votable_id: crate::EntityId,
    pub kind: VoteKind,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Private message between two users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Message {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub message_id: MessageId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub sender_id: UserId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub recipient_id: UserId,
    pub subject: String,
    pub body: String,
    pub is_read: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Notification delivered to a user's inbox bell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Notification {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub notification_id: NotificationId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub link: String,
    pub is_read: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// User-filed report against a post or a comment (exactly one is set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Report {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub report_id: ReportId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub reporter_id: UserId,
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
