//! Enum types for Agora entities

use crate::error::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// VOTING
// ============================================================================

/// Direction of a cast vote, as recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Up,
    Down,
}

impl VoteKind {
    /// Database representation of the vote kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteKind::Up => "up",
            VoteKind::Down => "down",
        }
    }
}

impl FromStr for VoteKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(VoteKind::Up),
            "down" => Ok(VoteKind::Down),
            other => Err(ParseEnumError::new("vote kind", other)),
        }
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RANKING
// ============================================================================

/// Sort mode for ranked listings of posts and comments.
///
/// `Hot` is net-score ordering (upvotes − downvotes), not a time-decayed
/// score, despite the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    New,
    Top,
    #[default]
    Hot,
}

impl FromStr for SortMode {
    type Err = ParseEnumError;

    /// Parse a sort mode from a query parameter (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "new" => Ok(SortMode::New),
            "top" => Ok(SortMode::Top),
            "hot" => Ok(SortMode::Hot),
            other => Err(ParseEnumError::new("sort mode", other)),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortMode::New => "new",
            SortMode::Top => "top",
            SortMode::Hot => "hot",
        };
        f.write_str(s)
    }
}

// ============================================================================
// CONTENT & USERS
// ============================================================================

/// Kind of content a post carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Text,
    Link,
    Image,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Link => "link",
            ContentKind::Image => "image",
        }
    }
}

impl FromStr for ContentKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ContentKind::Text),
            "link" => Ok(ContentKind::Link),
            "image" => Ok(ContentKind::Image),
            other => Err(ParseEnumError::new("content kind", other)),
        }
    }
}

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl FromStr for UserRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(ParseEnumError::new("user role", other)),
        }
    }
}

// ============================================================================
// NOTIFICATIONS & REPORTS
// ============================================================================

/// Kind of notification delivered to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Someone commented on the user's post
    Reply,
    /// Someone sent the user a private message
    Message,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Reply => "reply",
            NotificationKind::Message => "message",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reply" => Ok(NotificationKind::Reply),
            "message" => Ok(NotificationKind::Message),
            other => Err(ParseEnumError::new("notification kind", other)),
        }
    }
}

/// Moderation status of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Dismissed,
    Acted,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Dismissed => "dismissed",
            ReportStatus::Acted => "acted",
        }
    }
}

impl FromStr for ReportStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "dismissed" => Ok(ReportStatus::Dismissed),
            "acted" => Ok(ReportStatus::Acted),
            other => Err(ParseEnumError::new("report status", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_mode_default_is_hot() {
        assert_eq!(SortMode::default(), SortMode::Hot);
    }

    #[test]
    fn test_sort_mode_round_trip() {
        for mode in [SortMode::New, SortMode::Top, SortMode::Hot] {
            assert_eq!(mode.to_string().parse::<SortMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_vote_kind_parse_rejects_unknown() {
        assert!("sideways".parse::<VoteKind>().is_err());
    }

    #[test]
    fn test_role_admin_check() {
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::User.is_admin());
    }
}
