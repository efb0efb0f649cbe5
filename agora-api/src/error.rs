//! Error Types for the Agora API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//!
//! All errors are serialized as JSON with appropriate HTTP status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code and represents
/// a category of error that can occur during API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Authentication Errors (401, 403)
    // ========================================================================
    /// Request lacks valid authentication credentials
    Unauthorized,

    /// Request is authenticated but lacks permission for the resource
    Forbidden,

    /// Authentication token is invalid or malformed
    InvalidToken,

    /// Authentication token has expired
    TokenExpired,

    /// Account is banned
    AccountBanned,

    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    /// Field value is out of valid range
    InvalidRange,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested entity does not exist
    EntityNotFound,

    /// Requested user does not exist
    UserNotFound,

    /// Requested community does not exist
    CommunityNotFound,

    /// Requested post does not exist
    PostNotFound,

    /// Requested comment does not exist
    CommentNotFound,

    /// Requested message does not exist
    MessageNotFound,

    /// Requested notification does not exist
    NotificationNotFound,

    /// Requested report does not exist
    ReportNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Entity with the same identifier already exists
    EntityAlreadyExists,

    /// Operation conflicts with current state
    StateConflict,

    // ========================================================================
    // Rate Limiting (429)
    // ========================================================================
    /// Request rate limit exceeded (e.g. the comment cooldown)
    TooManyRequests,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Database operation failed
    DatabaseError,

    /// Database connection pool exhausted
    ConnectionPoolExhausted,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Authentication errors
            ErrorCode::Unauthorized | ErrorCode::InvalidToken | ErrorCode::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }

            ErrorCode::Forbidden | ErrorCode::AccountBanned => StatusCode::FORBIDDEN,

            // Validation errors
            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingField
            | ErrorCode::InvalidRange => StatusCode::BAD_REQUEST,

            // Not found errors
            ErrorCode::EntityNotFound
            | ErrorCode::UserNotFound
            | ErrorCode::CommunityNotFound
            | ErrorCode::PostNotFound
            | ErrorCode::CommentNotFound
            | ErrorCode::MessageNotFound
            | ErrorCode::NotificationNotFound
            | ErrorCode::ReportNotFound => StatusCode::NOT_FOUND,

            // Conflict errors
            ErrorCode::EntityAlreadyExists | ErrorCode::StateConflict => StatusCode::CONFLICT,

            ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            // Server errors
            ErrorCode::ConnectionPoolExhausted => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::InternalError | ErrorCode::DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            // Authentication
            ErrorCode::Unauthorized => "Authentication required",
            ErrorCode::Forbidden => "Access forbidden",
            ErrorCode::InvalidToken => "Invalid authentication token",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::AccountBanned => "Account is banned",

            // Validation
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::InvalidRange => "Value is out of valid range",

            // Not Found
            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::CommunityNotFound => "Community not found",
            ErrorCode::PostNotFound => "Post not found",
            ErrorCode::CommentNotFound => "Comment not found",
            ErrorCode::MessageNotFound => "Message not found",
            ErrorCode::NotificationNotFound => "Notification not found",
            ErrorCode::ReportNotFound => "Report not found",

            // Conflict
            ErrorCode::EntityAlreadyExists => "Entity already exists",
            ErrorCode::StateConflict => "Operation conflicts with current state",

            ErrorCode::TooManyRequests => "Rate limit exceeded",

            // Server
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::ConnectionPoolExhausted => "Connection pool exhausted",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
///
/// This type is returned by all API endpoints when an error occurs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (field errors, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    /// Create an Unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create a Forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Create an InvalidToken error.
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidToken, message)
    }

    /// Create a TokenExpired error.
    pub fn token_expired() -> Self {
        Self::from_code(ErrorCode::TokenExpired)
    }

    /// Create an AccountBanned error.
    pub fn account_banned() -> Self {
        Self::from_code(ErrorCode::AccountBanned)
    }

    /// Create a ValidationFailed error.
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create a MissingField error.
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
    }

    /// Create an InvalidRange error.
    pub fn invalid_range(field: &str, min: impl fmt::Display, max: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidRange,
            format!("Field '{}' must be between {} and {}", field, min, max),
        )
    }

    /// Create a UserNotFound error.
    pub fn user_not_found(user: impl fmt::Display) -> Self {
        Self::new(ErrorCode::UserNotFound, format!("User {} not found", user))
    }

    /// Create a CommunityNotFound error.
    pub fn community_not_found(name: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::CommunityNotFound,
            format!("Community {} not found", name),
        )
    }

    /// Create a PostNotFound error.
    pub fn post_not_found(post_id: impl fmt::Display) -> Self {
        Self::new(ErrorCode::PostNotFound, format!("Post {} not found", post_id))
    }

    /// Create a CommentNotFound error.
    pub fn comment_not_found(comment_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::CommentNotFound,
            format!("Comment {} not found", comment_id),
        )
    }

    /// Create a MessageNotFound error.
    pub fn message_not_found(message_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::MessageNotFound,
            format!("Message {} not found", message_id),
        )
    }

    /// Create a NotificationNotFound error.
    pub fn notification_not_found(notification_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::NotificationNotFound,
            format!("Notification {} not found", notification_id),
        )
    }

    /// Create a ReportNotFound error.
    pub fn report_not_found(report_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ReportNotFound,
            format!("Report {} not found", report_id),
        )
    }

    /// Create an EntityAlreadyExists error.
    pub fn already_exists(entity_type: &str, key: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EntityAlreadyExists,
            format!("{} {} already exists", entity_type, key),
        )
    }

    /// Create a StateConflict error.
    pub fn state_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StateConflict, message)
    }

    /// Create a TooManyRequests error.
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TooManyRequests, message)
    }

    /// Create an InternalError.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create a DatabaseError.
    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        ApiError::new(
            ErrorCode::ConnectionPoolExhausted,
            format!("Failed to get database connection: {}", err),
        )
    }
}

impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        // Unique violations surface as Conflict; the vote ledger's
        // (voter, votable) constraint should never trip under row locking.
        if let Some(db_err) = err.as_db_error() {
            use tokio_postgres::error::SqlState;
            if db_err.code() == &SqlState::UNIQUE_VIOLATION {
                return ApiError::new(
                    ErrorCode::EntityAlreadyExists,
                    format!("Uniqueness constraint violated: {}", db_err.message()),
                );
            }
        }
        ApiError::database_error(format!("Database error: {}", err))
    }
}

impl From<agora_core::ParseEnumError> for ApiError {
    fn from(err: agora_core::ParseEnumError) -> Self {
        ApiError::invalid_input(err.to_string())
    }
}

impl From<agora_core::PageError> for ApiError {
    fn from(err: agora_core::PageError) -> Self {
        ApiError::invalid_input(err.to_string())
    }
}

// ============================================================================
// AXUM RESPONSE
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = %self.code, message = %self.message, "API error");
        } else {
            tracing::debug!(code = %self.code, message = %self.message, "API error");
        }
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            ApiError::unauthorized("no token").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::post_not_found(uuid::Uuid::nil()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::already_exists("user", "alice").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::too_many_requests("slow down").status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::database_error("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_default_message_used_by_from_code() {
        let err = ApiError::from_code(ErrorCode::Unauthorized);
        assert_eq!(err.message, "Authentication required");
    }

    #[test]
    fn test_details_round_trip() {
        let err = ApiError::missing_field("title")
            .with_details(serde_json::json!({"field": "title"}));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "MISSING_FIELD");
        assert_eq!(json["details"]["field"], "title");
    }
}
