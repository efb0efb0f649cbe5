//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, plus the
//! `DbClient` wrapper that exposes high-level operations to the route
//! handlers. Statements are plain SQL over tokio-postgres.
//!
//! The vote transition (the core of the platform) runs as a single
//! transaction: the votable row is locked with `SELECT ... FOR UPDATE`
//! before the ledger is read, so concurrent transitions on the same
//! votable serialize and counter updates cannot be lost. The ledger
//! mutation, both counters, and the author's karma commit together or
//! not at all.

use crate::error::{ApiError, ApiResult};
use crate::types::{
    AdminStatsResponse, CommentResponse, MessageResponse, PostSummary, RecountResponse,
    ReportResponse, UserSort, VoteCountsResponse,
};
use agora_core::{
    new_entity_id, transition, Comment, CommentId, Community, CommunityId, Message, MessageId,
    Notification, NotificationId, NotificationKind, Paginated, Post, PostId, Report, ReportId,
    ReportStatus, SortMode, Timestamp, User, UserId, VoteKind, VoteRecord, VoteState,
};
use chrono::Utc;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime, Transaction};
use std::time::Duration;
use tokio_postgres::{NoTls, Row};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "agora".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `AGORA_DB_HOST` (default: localhost)
    /// - `AGORA_DB_PORT` (default: 5432)
    /// - `AGORA_DB_NAME` (default: agora)
    /// - `AGORA_DB_USER` (default: postgres)
    /// - `AGORA_DB_PASSWORD` (default: empty)
    /// - `AGORA_DB_POOL_SIZE` (default: 16)
    /// - `AGORA_DB_TIMEOUT` (default: 30 seconds)
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("AGORA_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("AGORA_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("AGORA_DB_NAME").unwrap_or_else(|_| "agora".to_string()),
            user: std::env::var("AGORA_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("AGORA_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("AGORA_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("AGORA_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

/// Idempotent schema bootstrap, applied at startup.
///
/// The PRIMARY KEY on (voter_id, post_id) / (voter_id, comment_id) is the
/// vote ledger's uniqueness invariant: at most one record per
/// (voter, votable) pair. Votes cascade-delete with either side.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id       UUID PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    bio           TEXT NOT NULL DEFAULT '',
    role          TEXT NOT NULL DEFAULT 'user',
    karma         INT  NOT NULL DEFAULT 0,
    is_banned     BOOLEAN NOT NULL DEFAULT FALSE,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS communities (
    community_id UUID PRIMARY KEY,
    name         TEXT NOT NULL UNIQUE,
    title        TEXT NOT NULL,
    description  TEXT NOT NULL DEFAULT '',
    moderator_id UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    member_count INT  NOT NULL DEFAULT 0,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS memberships (
    user_id      UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    community_id UUID NOT NULL REFERENCES communities(community_id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, community_id)
);

CREATE TABLE IF NOT EXISTS posts (
    post_id       UUID PRIMARY KEY,
    title         TEXT NOT NULL,
    body          TEXT NOT NULL DEFAULT '',
    url           TEXT NOT NULL DEFAULT '',
    content_kind  TEXT NOT NULL DEFAULT 'text',
    flair         TEXT NOT NULL DEFAULT '',
    author_id     UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    community_id  UUID NOT NULL REFERENCES communities(community_id) ON DELETE CASCADE,
    upvotes       INT NOT NULL DEFAULT 0,
    downvotes     INT NOT NULL DEFAULT 0,
    comment_count INT NOT NULL DEFAULT 0,
    view_count    INT NOT NULL DEFAULT 0,
    is_pinned     BOOLEAN NOT NULL DEFAULT FALSE,
    is_deleted    BOOLEAN NOT NULL DEFAULT FALSE,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at    TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_posts_community ON posts (community_id);
CREATE INDEX IF NOT EXISTS idx_posts_author ON posts (author_id);
CREATE INDEX IF NOT EXISTS idx_posts_created ON posts (created_at);

CREATE TABLE IF NOT EXISTS comments (
    comment_id        UUID PRIMARY KEY,
    body              TEXT NOT NULL,
    author_id         UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    post_id           UUID NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    parent_comment_id UUID REFERENCES comments(comment_id) ON DELETE CASCADE,
    upvotes           INT NOT NULL DEFAULT 0,
    downvotes         INT NOT NULL DEFAULT 0,
    is_deleted        BOOLEAN NOT NULL DEFAULT FALSE,
    created_at        TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_comments_post ON comments (post_id);
CREATE INDEX IF NOT EXISTS idx_comments_author ON comments (author_id);

CREATE TABLE IF NOT EXISTS post_votes (
    voter_id   UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    post_id    UUID NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    kind       TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (voter_id, post_id)
);
CREATE INDEX IF NOT EXISTS idx_post_votes_post ON post_votes (post_id);

CREATE TABLE IF NOT EXISTS comment_votes (
    voter_id   UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    comment_id UUID NOT NULL REFERENCES comments(comment_id) ON DELETE CASCADE,
    kind       TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (voter_id, comment_id)
);
CREATE INDEX IF NOT EXISTS idx_comment_votes_comment ON comment_votes (comment_id);

CREATE TABLE IF NOT EXISTS saved_posts (
    user_id UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    post_id UUID NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, post_id)
);

CREATE TABLE IF NOT EXISTS messages (
    message_id   UUID PRIMARY KEY,
    sender_id    UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    recipient_id UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    subject      TEXT NOT NULL DEFAULT '',
    body         TEXT NOT NULL,
    is_read      BOOLEAN NOT NULL DEFAULT FALSE,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_messages_recipient_read ON messages (recipient_id, is_read);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id UUID PRIMARY KEY,
    user_id         UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    kind            TEXT NOT NULL,
    title           TEXT NOT NULL,
    body            TEXT NOT NULL DEFAULT '',
    link            TEXT NOT NULL DEFAULT '',
    is_read         BOOLEAN NOT NULL DEFAULT FALSE,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_notifications_user_read ON notifications (user_id, is_read);

CREATE TABLE IF NOT EXISTS reports (
    report_id   UUID PRIMARY KEY,
    reporter_id UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    post_id     UUID REFERENCES posts(post_id) ON DELETE CASCADE,
    comment_id  UUID REFERENCES comments(comment_id) ON DELETE CASCADE,
    reason      TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    status      TEXT NOT NULL DEFAULT 'pending',
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    CHECK ((post_id IS NULL) <> (comment_id IS NULL))
);
CREATE INDEX IF NOT EXISTS idx_reports_status ON reports (status);
"#;

/// Search result cap for each search kind.
const SEARCH_LIMIT: i64 = 50;

/// Minimum gap between two comments by the same author.
const COMMENT_COOLDOWN_SECS: i64 = 10;

// ============================================================================
// ROW MAPPING
// ============================================================================

fn user_from_row(row: &Row) -> ApiResult<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        bio: row.try_get("bio")?,
        role: role.parse()?,
        karma: row.try_get("karma")?,
        is_banned: row.try_get("is_banned")?,
        created_at: row.try_get("created_at")?,
    })
}

fn community_from_row(row: &Row) -> ApiResult<Community> {
    Ok(Community {
        community_id: row.try_get("community_id")?,
        name: row.try_get("name")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        moderator_id: row.try_get("moderator_id")?,
        member_count: row.try_get("member_count")?,
        created_at: row.try_get("created_at")?,
    })
}

fn post_from_row(row: &Row) -> ApiResult<Post> {
    let content_kind: String = row.try_get("content_kind")?;
    Ok(Post {
        post_id: row.try_get("post_id")?,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        url: row.try_get("url")?,
        content_kind: content_kind.parse()?,
        flair: row.try_get("flair")?,
        author_id: row.try_get("author_id")?,
        community_id: row.try_get("community_id")?,
        upvotes: row.try_get("upvotes")?,
        downvotes: row.try_get("downvotes")?,
        comment_count: row.try_get("comment_count")?,
        view_count: row.try_get("view_count")?,
        is_pinned: row.try_get("is_pinned")?,
        is_deleted: row.try_get("is_deleted")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn comment_from_row(row: &Row) -> ApiResult<Comment> {
    Ok(Comment {
        comment_id: row.try_get("comment_id")?,
        body: row.try_get("body")?,
        author_id: row.try_get("author_id")?,
        post_id: row.try_get("post_id")?,
        parent_comment_id: row.try_get("parent_comment_id")?,
        upvotes: row.try_get("upvotes")?,
        downvotes: row.try_get("downvotes")?,
        is_deleted: row.try_get("is_deleted")?,
        created_at: row.try_get("created_at")?,
    })
}

fn vote_record_from_row(row: &Row, votable_column: &str) -> ApiResult<VoteRecord> {
    let kind: String = row.try_get("kind")?;
    Ok(VoteRecord {
        voter_id: row.try_get("voter_id")?,
        votable_id: row.try_get(votable_column)?,
        kind: kind.parse()?,
        created_at: row.try_get("created_at")?,
    })
}

fn message_from_row(row: &Row) -> ApiResult<Message> {
    Ok(Message {
        message_id: row.try_get("message_id")?,
        sender_id: row.try_get("sender_id")?,
        recipient_id: row.try_get("recipient_id")?,
        subject: row.try_get("subject")?,
        body: row.try_get("body")?,
        is_read: row.try_get("is_read")?,
        created_at: row.try_get("created_at")?,
    })
}

fn notification_from_row(row: &Row) -> ApiResult<Notification> {
    let kind: String = row.try_get("kind")?;
    Ok(Notification {
        notification_id: row.try_get("notification_id")?,
        user_id: row.try_get("user_id")?,
        kind: kind.parse()?,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        link: row.try_get("link")?,
        is_read: row.try_get("is_read")?,
        created_at: row.try_get("created_at")?,
    })
}

fn report_from_row(row: &Row) -> ApiResult<Report> {
    let status: String = row.try_get("status")?;
    Ok(Report {
        report_id: row.try_get("report_id")?,
        reporter_id: row.try_get("reporter_id")?,
        post_id: row.try_get("post_id")?,
        comment_id: row.try_get("comment_id")?,
        reason: row.try_get("reason")?,
        description: row.try_get("description")?,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
    })
}

fn post_summary_from_row(row: &Row) -> ApiResult<PostSummary> {
    Ok(PostSummary {
        post_id: row.try_get("post_id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        community: row.try_get("community")?,
        upvotes: row.try_get("upvotes")?,
        downvotes: row.try_get("downvotes")?,
        comment_count: row.try_get("comment_count")?,
        created_at: row.try_get("created_at")?,
    })
}

/// ORDER BY clause mirroring `agora_core::rank::compare` for posts
/// (alias `p`). Ties break by id descending.
fn post_order_clause(sort: SortMode) -> &'static str {
    match sort {
        SortMode::New => "p.created_at DESC, p.post_id DESC",
        SortMode::Top => "p.upvotes DESC, p.post_id DESC",
        SortMode::Hot => "(p.upvotes - p.downvotes) DESC, p.post_id DESC",
    }
}

/// ORDER BY clause mirroring `agora_core::rank::compare` for comments
/// (alias `c`).
fn comment_order_clause(sort: SortMode) -> &'static str {
    match sort {
        SortMode::New => "c.created_at DESC, c.comment_id DESC",
        SortMode::Top => "c.upvotes DESC, c.comment_id DESC",
        SortMode::Hot => "(c.upvotes - c.downvotes) DESC, c.comment_id DESC",
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Database client that wraps a connection pool and provides high-level
/// operations for the route handlers.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> ApiResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// Apply the idempotent schema bootstrap.
    pub async fn ensure_schema(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.batch_execute(SCHEMA).await?;
        Ok(())
    }

    /// Liveness probe: round-trip a trivial statement.
    pub async fn ping(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[]).await?;
        Ok(())
    }

    // ========================================================================
    // USER OPERATIONS
    // ========================================================================

    /// Insert a new user account. The username/email UNIQUE constraints
    /// catch races past the handler's pre-checks.
    pub async fn user_create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> ApiResult<User> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "INSERT INTO users (user_id, username, email, password_hash, created_at) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING *",
                &[
                    &new_entity_id(),
                    &username,
                    &email,
                    &password_hash,
                    &Utc::now(),
                ],
            )
            .await?;
        user_from_row(&row)
    }

    pub async fn user_by_id(&self, user_id: UserId) -> ApiResult<Option<User>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt("SELECT * FROM users WHERE user_id = $1", &[&user_id])
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn user_by_username(&self, username: &str) -> ApiResult<Option<User>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt("SELECT * FROM users WHERE username = $1", &[&username])
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn user_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt("SELECT * FROM users WHERE email = $1", &[&email])
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    /// Update profile fields; `None` leaves a field unchanged.
    pub async fn user_update_profile(
        &self,
        user_id: UserId,
        bio: Option<&str>,
        email: Option<&str>,
    ) -> ApiResult<User> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "UPDATE users SET bio = COALESCE($2, bio), email = COALESCE($3, email) \
                 WHERE user_id = $1 RETURNING *",
                &[&user_id, &bio, &email],
            )
            .await?
            .ok_or_else(|| ApiError::user_not_found(user_id))?;
        user_from_row(&row)
    }

    pub async fn user_set_password(&self, user_id: UserId, password_hash: &str) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        let updated = conn
            .execute(
                "UPDATE users SET password_hash = $2 WHERE user_id = $1",
                &[&user_id, &password_hash],
            )
            .await?;
        if updated == 0 {
            return Err(ApiError::user_not_found(user_id));
        }
        Ok(())
    }

    pub async fn user_set_banned(&self, user_id: UserId, banned: bool) -> ApiResult<User> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "UPDATE users SET is_banned = $2 WHERE user_id = $1 RETURNING *",
                &[&user_id, &banned],
            )
            .await?
            .ok_or_else(|| ApiError::user_not_found(user_id))?;
        user_from_row(&row)
    }

    /// Ranked user listing: by karma (default) or account age.
    pub async fn user_list(
        &self,
        sort: UserSort,
        page: u32,
        per_page: u32,
    ) -> ApiResult<Paginated<User>> {
        let offset = agora_core::page_offset(page, per_page)?;
        let conn = self.get_conn().await?;

        let total: i64 = conn
            .query_one("SELECT COUNT(*) FROM users", &[])
            .await?
            .try_get(0)?;

        let order = match sort {
            UserSort::Karma => "karma DESC, user_id DESC",
            UserSort::New => "created_at DESC, user_id DESC",
        };
        let sql = format!("SELECT * FROM users ORDER BY {} LIMIT $1 OFFSET $2", order);
        let rows = conn
            .query(sql.as_str(), &[&i64::from(per_page), &offset])
            .await?;

        let users = rows
            .iter()
            .map(user_from_row)
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(Paginated::new(users, page, per_page, total))
    }

    // ========================================================================
    // COMMUNITY OPERATIONS
    // ========================================================================

    /// Create a community; the creator becomes moderator and first member.
    pub async fn community_create(
        &self,
        name: &str,
        title: &str,
        description: &str,
        moderator_id: UserId,
    ) -> ApiResult<Community> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let community_id = new_entity_id();
        let row = tx
            .query_one(
                "INSERT INTO communities \
                 (community_id, name, title, description, moderator_id, member_count, created_at) \
                 VALUES ($1, $2, $3, $4, $5, 1, $6) RETURNING *",
                &[
                    &community_id,
                    &name,
                    &title,
                    &description,
                    &moderator_id,
                    &Utc::now(),
                ],
            )
            .await?;
        tx.execute(
            "INSERT INTO memberships (user_id, community_id) VALUES ($1, $2)",
            &[&moderator_id, &community_id],
        )
        .await?;
        tx.commit().await?;

        community_from_row(&row)
    }

    pub async fn community_by_name(&self, name: &str) -> ApiResult<Option<Community>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt("SELECT * FROM communities WHERE name = $1", &[&name])
            .await?;
        row.as_ref().map(community_from_row).transpose()
    }

    pub async fn community_by_id(&self, community_id: CommunityId) -> ApiResult<Option<Community>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "SELECT * FROM communities WHERE community_id = $1",
                &[&community_id],
            )
            .await?;
        row.as_ref().map(community_from_row).transpose()
    }

    pub async fn community_update(
        &self,
        community_id: CommunityId,
        title: Option<&str>,
        description: Option<&str>,
    ) -> ApiResult<Community> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "UPDATE communities SET title = COALESCE($2, title), \
                 description = COALESCE($3, description) \
                 WHERE community_id = $1 RETURNING *",
                &[&community_id, &title, &description],
            )
            .await?
            .ok_or_else(|| ApiError::community_not_found(community_id))?;
        community_from_row(&row)
    }

    /// Join a community. Returns false when already a member.
    pub async fn community_join(
        &self,
        community_id: CommunityId,
        user_id: UserId,
    ) -> ApiResult<bool> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;
        let inserted = tx
            .execute(
                "INSERT INTO memberships (user_id, community_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
                &[&user_id, &community_id],
            )
            .await?;
        if inserted > 0 {
            tx.execute(
                "UPDATE communities SET member_count = member_count + 1 WHERE community_id = $1",
                &[&community_id],
            )
            .await?;
        }
        tx.commit().await?;
        Ok(inserted > 0)
    }

    /// Leave a community. Returns false when not a member.
    pub async fn community_leave(
        &self,
        community_id: CommunityId,
        user_id: UserId,
    ) -> ApiResult<bool> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;
        let deleted = tx
            .execute(
                "DELETE FROM memberships WHERE user_id = $1 AND community_id = $2",
                &[&user_id, &community_id],
            )
            .await?;
        if deleted > 0 {
            tx.execute(
                "UPDATE communities SET member_count = member_count - 1 WHERE community_id = $1",
                &[&community_id],
            )
            .await?;
        }
        tx.commit().await?;
        Ok(deleted > 0)
    }

    // ========================================================================
    // POST OPERATIONS
    // ========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn post_create(
        &self,
        title: &str,
        body: &str,
        url: &str,
        content_kind: &str,
        flair: &str,
        author_id: UserId,
        community_id: CommunityId,
    ) -> ApiResult<Post> {
        let conn = self.get_conn().await?;
        let now = Utc::now();
        let row = conn
            .query_one(
                "INSERT INTO posts \
                 (post_id, title, body, url, content_kind, flair, author_id, community_id, \
                  created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) RETURNING *",
                &[
                    &new_entity_id(),
                    &title,
                    &body,
                    &url,
                    &content_kind,
                    &flair,
                    &author_id,
                    &community_id,
                    &now,
                ],
            )
            .await?;
        post_from_row(&row)
    }

    /// Fetch a live post without side effects (for permission checks).
    pub async fn post_get(&self, post_id: PostId) -> ApiResult<Option<Post>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "SELECT * FROM posts WHERE post_id = $1 AND NOT is_deleted",
                &[&post_id],
            )
            .await?;
        row.as_ref().map(post_from_row).transpose()
    }

    /// Fetch a live post for display, bumping its view counter, together
    /// with the author and community names.
    pub async fn post_view(&self, post_id: PostId) -> ApiResult<Option<(Post, String, String)>> {
        let conn = self.get_conn().await?;
        let Some(row) = conn
            .query_opt(
                "UPDATE posts SET view_count = view_count + 1 \
                 WHERE post_id = $1 AND NOT is_deleted RETURNING *",
                &[&post_id],
            )
            .await?
        else {
            return Ok(None);
        };
        let post = post_from_row(&row)?;

        let names = conn
            .query_one(
                "SELECT u.username AS author, c.name AS community \
                 FROM users u, communities c \
                 WHERE u.user_id = $1 AND c.community_id = $2",
                &[&post.author_id, &post.community_id],
            )
            .await?;
        let author: String = names.try_get("author")?;
        let community: String = names.try_get("community")?;
        Ok(Some((post, author, community)))
    }

    pub async fn post_update(
        &self,
        post_id: PostId,
        title: Option<&str>,
        body: Option<&str>,
        flair: Option<&str>,
    ) -> ApiResult<Post> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "UPDATE posts SET title = COALESCE($2, title), body = COALESCE($3, body), \
                 flair = COALESCE($4, flair), updated_at = $5 \
                 WHERE post_id = $1 AND NOT is_deleted RETURNING *",
                &[&post_id, &title, &body, &flair, &Utc::now()],
            )
            .await?
            .ok_or_else(|| ApiError::post_not_found(post_id))?;
        post_from_row(&row)
    }

    /// Soft-delete: the row stays for ledger integrity, listings skip it.
    pub async fn post_soft_delete(&self, post_id: PostId) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        let updated = conn
            .execute(
                "UPDATE posts SET is_deleted = TRUE WHERE post_id = $1 AND NOT is_deleted",
                &[&post_id],
            )
            .await?;
        if updated == 0 {
            return Err(ApiError::post_not_found(post_id));
        }
        Ok(())
    }

    pub async fn post_toggle_pin(&self, post_id: PostId) -> ApiResult<Post> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "UPDATE posts SET is_pinned = NOT is_pinned \
                 WHERE post_id = $1 AND NOT is_deleted RETURNING *",
                &[&post_id],
            )
            .await?
            .ok_or_else(|| ApiError::post_not_found(post_id))?;
        post_from_row(&row)
    }

    /// Save a post to the caller's favorites. Returns false when already
    /// saved.
    pub async fn post_save(&self, user_id: UserId, post_id: PostId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        let inserted = conn
            .execute(
                "INSERT INTO saved_posts (user_id, post_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
                &[&user_id, &post_id],
            )
            .await?;
        Ok(inserted > 0)
    }

    pub async fn post_unsave(&self, user_id: UserId, post_id: PostId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute(
                "DELETE FROM saved_posts WHERE user_id = $1 AND post_id = $2",
                &[&user_id, &post_id],
            )
            .await?;
        Ok(deleted > 0)
    }

    // ========================================================================
    // RANKED POST LISTINGS
    // ========================================================================

    /// The ranked feed. `community = None` is the global feed; per the
    /// ranking policy, only the global `top` sort restricts to the
    /// trailing 7 days.
    pub async fn feed(
        &self,
        sort: SortMode,
        community_id: Option<CommunityId>,
        page: u32,
        per_page: u32,
    ) -> ApiResult<Paginated<PostSummary>> {
        let offset = agora_core::page_offset(page, per_page)?;
        let conn = self.get_conn().await?;

        let mut filter = String::from("NOT p.is_deleted");
        if community_id.is_some() {
            filter.push_str(" AND p.community_id = $1");
        }
        let window = sort == SortMode::Top && community_id.is_none();
        if window {
            filter.push_str(" AND p.created_at > now() - interval '7 days'");
        }

        let count_sql = format!("SELECT COUNT(*) FROM posts p WHERE {}", filter);
        let list_sql = format!(
            "SELECT p.post_id, p.title, u.username AS author, c.name AS community, \
                    p.upvotes, p.downvotes, p.comment_count, p.created_at \
             FROM posts p \
             JOIN users u ON u.user_id = p.author_id \
             JOIN communities c ON c.community_id = p.community_id \
             WHERE {} ORDER BY {} LIMIT {} OFFSET {}",
            filter,
            post_order_clause(sort),
            i64::from(per_page),
            offset,
        );

        let (total, rows) = match community_id {
            Some(id) => {
                let total: i64 = conn
                    .query_one(count_sql.as_str(), &[&id])
                    .await?
                    .try_get(0)?;
                (total, conn.query(list_sql.as_str(), &[&id]).await?)
            }
            None => {
                let total: i64 = conn
                    .query_one(count_sql.as_str(), &[])
                    .await?
                    .try_get(0)?;
                (total, conn.query(list_sql.as_str(), &[]).await?)
            }
        };

        let posts = rows
            .iter()
            .map(post_summary_from_row)
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(Paginated::new(posts, page, per_page, total))
    }

    /// Posts authored by a user, newest first.
    pub async fn user_posts(
        &self,
        author_id: UserId,
        page: u32,
        per_page: u32,
    ) -> ApiResult<Paginated<PostSummary>> {
        self.post_summaries_where(
            "p.author_id = $1 AND NOT p.is_deleted",
            "p.created_at DESC, p.post_id DESC",
            &author_id,
            page,
            per_page,
        )
        .await
    }

    /// Posts the user saved.
    pub async fn saved_posts(
        &self,
        user_id: UserId,
        page: u32,
        per_page: u32,
    ) -> ApiResult<Paginated<PostSummary>> {
        self.post_summaries_where(
            "NOT p.is_deleted AND EXISTS \
             (SELECT 1 FROM saved_posts s WHERE s.post_id = p.post_id AND s.user_id = $1)",
            "p.created_at DESC, p.post_id DESC",
            &user_id,
            page,
            per_page,
        )
        .await
    }

    /// Posts the user has a standing upvote on.
    pub async fn upvoted_posts(
        &self,
        user_id: UserId,
        page: u32,
        per_page: u32,
    ) -> ApiResult<Paginated<PostSummary>> {
        self.post_summaries_where(
            "NOT p.is_deleted AND EXISTS \
             (SELECT 1 FROM post_votes v \
              WHERE v.post_id = p.post_id AND v.voter_id = $1 AND v.kind = 'up')",
            "p.created_at DESC, p.post_id DESC",
            &user_id,
            page,
            per_page,
        )
        .await
    }

    /// Shared shape of the single-uuid-parameter post summary listings.
    async fn post_summaries_where(
        &self,
        filter: &str,
        order: &str,
        param: &UserId,
        page: u32,
        per_page: u32,
    ) -> ApiResult<Paginated<PostSummary>> {
        let offset = agora_core::page_offset(page, per_page)?;
        let conn = self.get_conn().await?;

        let count_sql = format!("SELECT COUNT(*) FROM posts p WHERE {}", filter);
        let total: i64 = conn
            .query_one(count_sql.as_str(), &[param])
            .await?
            .try_get(0)?;

        let list_sql = format!(
            "SELECT p.post_id, p.title, u.username AS author, c.name AS community, \
                    p.upvotes, p.downvotes, p.comment_count, p.created_at \
             FROM posts p \
             JOIN users u ON u.user_id = p.author_id \
             JOIN communities c ON c.community_id = p.community_id \
             WHERE {} ORDER BY {} LIMIT {} OFFSET {}",
            filter,
            order,
            i64::from(per_page),
            offset,
        );
        let rows = conn.query(list_sql.as_str(), &[param]).await?;

        let posts = rows
            .iter()
            .map(post_summary_from_row)
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(Paginated::new(posts, page, per_page, total))
    }

    // ========================================================================
    // VOTE OPERATIONS
    // ========================================================================

    /// Apply one vote transition on a post and return the new counters.
    ///
    /// Locks the post row first; every ledger read and counter update for
    /// this post happens under that lock, so concurrent votes serialize.
    pub async fn post_vote(
        &self,
        post_id: PostId,
        voter_id: UserId,
        action: VoteKind,
    ) -> ApiResult<VoteCountsResponse> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let votable = tx
            .query_opt(
                "SELECT author_id FROM posts WHERE post_id = $1 AND NOT is_deleted FOR UPDATE",
                &[&post_id],
            )
            .await?
            .ok_or_else(|| ApiError::post_not_found(post_id))?;
        let author_id: UserId = votable.try_get("author_id")?;

        let current: Option<VoteRecord> = tx
            .query_opt(
                "SELECT * FROM post_votes WHERE post_id = $1 AND voter_id = $2",
                &[&post_id, &voter_id],
            )
            .await?
            .as_ref()
            .map(|row| vote_record_from_row(row, "post_id"))
            .transpose()?;
        let current_kind = current.as_ref().map(|record| record.kind);

        let t = transition(VoteState::from(current_kind), action);

        match (current_kind.is_some(), t.next.record_kind()) {
            (false, Some(kind)) => {
                tx.execute(
                    "INSERT INTO post_votes (voter_id, post_id, kind, created_at) \
                     VALUES ($1, $2, $3, $4)",
                    &[&voter_id, &post_id, &kind.as_str(), &Utc::now()],
                )
                .await?;
            }
            (true, Some(kind)) => {
                tx.execute(
                    "UPDATE post_votes SET kind = $3 WHERE voter_id = $1 AND post_id = $2",
                    &[&voter_id, &post_id, &kind.as_str()],
                )
                .await?;
            }
            (true, None) => {
                tx.execute(
                    "DELETE FROM post_votes WHERE voter_id = $1 AND post_id = $2",
                    &[&voter_id, &post_id],
                )
                .await?;
            }
            // transition() never retracts from NoVote
            (false, None) => unreachable!("retraction without a ledger row"),
        }

        let counters = tx
            .query_one(
                "UPDATE posts SET upvotes = upvotes + $2, downvotes = downvotes + $3 \
                 WHERE post_id = $1 RETURNING upvotes, downvotes",
                &[&post_id, &t.upvote_delta, &t.downvote_delta],
            )
            .await?;

        if t.karma_delta != 0 {
            tx.execute(
                "UPDATE users SET karma = karma + $2 WHERE user_id = $1",
                &[&author_id, &t.karma_delta],
            )
            .await?;
        }

        tx.commit().await?;

        Ok(VoteCountsResponse {
            upvotes: counters.try_get("upvotes")?,
            downvotes: counters.try_get("downvotes")?,
        })
    }

    /// Apply one vote transition on a comment and return the new counters.
    /// Same locking discipline as [`DbClient::post_vote`].
    pub async fn comment_vote(
        &self,
        comment_id: CommentId,
        voter_id: UserId,
        action: VoteKind,
    ) -> ApiResult<VoteCountsResponse> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let votable = tx
            .query_opt(
                "SELECT author_id FROM comments \
                 WHERE comment_id = $1 AND NOT is_deleted FOR UPDATE",
                &[&comment_id],
            )
            .await?
            .ok_or_else(|| ApiError::comment_not_found(comment_id))?;
        let author_id: UserId = votable.try_get("author_id")?;

        let current: Option<VoteRecord> = tx
            .query_opt(
                "SELECT * FROM comment_votes WHERE comment_id = $1 AND voter_id = $2",
                &[&comment_id, &voter_id],
            )
            .await?
            .as_ref()
            .map(|row| vote_record_from_row(row, "comment_id"))
            .transpose()?;
        let current_kind = current.as_ref().map(|record| record.kind);

        let t = transition(VoteState::from(current_kind), action);

        match (current_kind.is_some(), t.next.record_kind()) {
            (false, Some(kind)) => {
                tx.execute(
                    "INSERT INTO comment_votes (voter_id, comment_id, kind, created_at) \
                     VALUES ($1, $2, $3, $4)",
                    &[&voter_id, &comment_id, &kind.as_str(), &Utc::now()],
                )
                .await?;
            }
            (true, Some(kind)) => {
                tx.execute(
                    "UPDATE comment_votes SET kind = $3 \
                     WHERE voter_id = $1 AND comment_id = $2",
                    &[&voter_id, &comment_id, &kind.as_str()],
                )
                .await?;
            }
            (true, None) => {
                tx.execute(
                    "DELETE FROM comment_votes WHERE voter_id = $1 AND comment_id = $2",
                    &[&voter_id, &comment_id],
                )
                .await?;
            }
            (false, None) => unreachable!("retraction without a ledger row"),
        }

        let counters = tx
            .query_one(
                "UPDATE comments SET upvotes = upvotes + $2, downvotes = downvotes + $3 \
                 WHERE comment_id = $1 RETURNING upvotes, downvotes",
                &[&comment_id, &t.upvote_delta, &t.downvote_delta],
            )
            .await?;

        if t.karma_delta != 0 {
            tx.execute(
                "UPDATE users SET karma = karma + $2 WHERE user_id = $1",
                &[&author_id, &t.karma_delta],
            )
            .await?;
        }

        tx.commit().await?;

        Ok(VoteCountsResponse {
            upvotes: counters.try_get("upvotes")?,
            downvotes: counters.try_get("downvotes")?,
        })
    }

    // ========================================================================
    // COMMENT OPERATIONS
    // ========================================================================

    /// Create a comment, bump the post's comment count, and notify the
    /// post author (unless they commented on their own post). A per-author
    /// cooldown rejects rapid-fire commenting.
    pub async fn comment_create(
        &self,
        post_id: PostId,
        author_id: UserId,
        author_username: &str,
        body: &str,
        parent_comment_id: Option<CommentId>,
    ) -> ApiResult<Comment> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let post = tx
            .query_opt(
                "SELECT author_id FROM posts WHERE post_id = $1 AND NOT is_deleted FOR UPDATE",
                &[&post_id],
            )
            .await?
            .ok_or_else(|| ApiError::post_not_found(post_id))?;
        let post_author_id: UserId = post.try_get("author_id")?;

        let last: Option<Timestamp> = tx
            .query_opt(
                "SELECT created_at FROM comments WHERE author_id = $1 \
                 ORDER BY created_at DESC LIMIT 1",
                &[&author_id],
            )
            .await?
            .map(|row| row.try_get("created_at"))
            .transpose()?;
        let now = Utc::now();
        if let Some(last) = last {
            if (now - last).num_seconds() < COMMENT_COOLDOWN_SECS {
                return Err(ApiError::too_many_requests(format!(
                    "Wait {} seconds between comments",
                    COMMENT_COOLDOWN_SECS
                )));
            }
        }

        if let Some(parent_id) = parent_comment_id {
            let parent = tx
                .query_opt(
                    "SELECT post_id FROM comments WHERE comment_id = $1 AND NOT is_deleted",
                    &[&parent_id],
                )
                .await?
                .ok_or_else(|| ApiError::comment_not_found(parent_id))?;
            let parent_post: PostId = parent.try_get("post_id")?;
            if parent_post != post_id {
                return Err(ApiError::invalid_input(
                    "Parent comment belongs to a different post",
                ));
            }
        }

        let row = tx
            .query_one(
                "INSERT INTO comments \
                 (comment_id, body, author_id, post_id, parent_comment_id, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
                &[
                    &new_entity_id(),
                    &body,
                    &author_id,
                    &post_id,
                    &parent_comment_id,
                    &now,
                ],
            )
            .await?;
        let comment = comment_from_row(&row)?;

        tx.execute(
            "UPDATE posts SET comment_count = comment_count + 1 WHERE post_id = $1",
            &[&post_id],
        )
        .await?;

        if post_author_id != author_id {
            insert_notification(
                &tx,
                post_author_id,
                NotificationKind::Reply,
                &format!("{} replied to your post", author_username),
                &preview(body, 100),
                &format!("/posts/{}", post_id),
            )
            .await?;
        }

        tx.commit().await?;
        Ok(comment)
    }

    pub async fn comment_get(&self, comment_id: CommentId) -> ApiResult<Option<Comment>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "SELECT * FROM comments WHERE comment_id = $1 AND NOT is_deleted",
                &[&comment_id],
            )
            .await?;
        row.as_ref().map(comment_from_row).transpose()
    }

    /// Ranked comment listing for a post.
    pub async fn comments_for_post(
        &self,
        post_id: PostId,
        sort: SortMode,
        page: u32,
        per_page: u32,
    ) -> ApiResult<Paginated<CommentResponse>> {
        let offset = agora_core::page_offset(page, per_page)?;
        let conn = self.get_conn().await?;

        let total: i64 = conn
            .query_one(
                "SELECT COUNT(*) FROM comments c WHERE c.post_id = $1 AND NOT c.is_deleted",
                &[&post_id],
            )
            .await?
            .try_get(0)?;

        let sql = format!(
            "SELECT c.*, u.username AS author \
             FROM comments c JOIN users u ON u.user_id = c.author_id \
             WHERE c.post_id = $1 AND NOT c.is_deleted \
             ORDER BY {} LIMIT {} OFFSET {}",
            comment_order_clause(sort),
            i64::from(per_page),
            offset,
        );
        let rows = conn.query(sql.as_str(), &[&post_id]).await?;

        let comments = rows
            .iter()
            .map(|row| {
                let comment = comment_from_row(row)?;
                let author: String = row.try_get("author")?;
                Ok(CommentResponse::from_parts(comment, author))
            })
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(Paginated::new(comments, page, per_page, total))
    }

    /// Soft-delete a comment and release its slot in the post's comment
    /// count.
    pub async fn comment_soft_delete(&self, comment_id: CommentId) -> ApiResult<()> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let row = tx
            .query_opt(
                "UPDATE comments SET is_deleted = TRUE \
                 WHERE comment_id = $1 AND NOT is_deleted RETURNING post_id",
                &[&comment_id],
            )
            .await?
            .ok_or_else(|| ApiError::comment_not_found(comment_id))?;
        let post_id: PostId = row.try_get("post_id")?;

        tx.execute(
            "UPDATE posts SET comment_count = comment_count - 1 \
             WHERE post_id = $1 AND comment_count > 0",
            &[&post_id],
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    // ========================================================================
    // MESSAGE OPERATIONS
    // ========================================================================

    /// Send a private message and notify the recipient.
    pub async fn message_send(
        &self,
        sender_id: UserId,
        sender_username: &str,
        recipient: &User,
        subject: &str,
        body: &str,
    ) -> ApiResult<MessageResponse> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let message_id = new_entity_id();
        let row = tx
            .query_one(
                "INSERT INTO messages (message_id, sender_id, recipient_id, subject, body, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
                &[
                    &message_id,
                    &sender_id,
                    &recipient.user_id,
                    &subject,
                    &body,
                    &Utc::now(),
                ],
            )
            .await?;
        let message = message_from_row(&row)?;

        insert_notification(
            &tx,
            recipient.user_id,
            NotificationKind::Message,
            &format!("New message from {}", sender_username),
            subject,
            &format!("/messages/{}", message_id),
        )
        .await?;

        tx.commit().await?;

        Ok(MessageResponse::from_parts(
            message,
            sender_username.to_string(),
            recipient.username.clone(),
        ))
    }

    /// The recipient's inbox, newest first.
    pub async fn inbox(
        &self,
        recipient_id: UserId,
        recipient_username: &str,
        page: u32,
        per_page: u32,
    ) -> ApiResult<Paginated<MessageResponse>> {
        let offset = agora_core::page_offset(page, per_page)?;
        let conn = self.get_conn().await?;

        let total: i64 = conn
            .query_one(
                "SELECT COUNT(*) FROM messages WHERE recipient_id = $1",
                &[&recipient_id],
            )
            .await?
            .try_get(0)?;

        let sql = format!(
            "SELECT m.*, u.username AS sender \
             FROM messages m JOIN users u ON u.user_id = m.sender_id \
             WHERE m.recipient_id = $1 \
             ORDER BY m.created_at DESC, m.message_id DESC LIMIT {} OFFSET {}",
            i64::from(per_page),
            offset,
        );
        let rows = conn.query(sql.as_str(), &[&recipient_id]).await?;

        let messages = rows
            .iter()
            .map(|row| {
                let message = message_from_row(row)?;
                let sender: String = row.try_get("sender")?;
                Ok(MessageResponse::from_parts(
                    message,
                    sender,
                    recipient_username.to_string(),
                ))
            })
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(Paginated::new(messages, page, per_page, total))
    }

    /// Fetch a message (recipient only) and mark it read.
    pub async fn message_read(
        &self,
        message_id: MessageId,
        recipient_id: UserId,
        recipient_username: &str,
    ) -> ApiResult<MessageResponse> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "UPDATE messages SET is_read = TRUE \
                 WHERE message_id = $1 AND recipient_id = $2 RETURNING *",
                &[&message_id, &recipient_id],
            )
            .await?
            .ok_or_else(|| ApiError::message_not_found(message_id))?;
        let message = message_from_row(&row)?;

        let sender_row = conn
            .query_one(
                "SELECT username FROM users WHERE user_id = $1",
                &[&message.sender_id],
            )
            .await?;
        let sender: String = sender_row.try_get("username")?;

        Ok(MessageResponse::from_parts(
            message,
            sender,
            recipient_username.to_string(),
        ))
    }

    // ========================================================================
    // NOTIFICATION OPERATIONS
    // ========================================================================

    /// The user's notifications, newest first.
    pub async fn notifications_for(
        &self,
        user_id: UserId,
        page: u32,
        per_page: u32,
    ) -> ApiResult<Paginated<Notification>> {
        let offset = agora_core::page_offset(page, per_page)?;
        let conn = self.get_conn().await?;

        let total: i64 = conn
            .query_one(
                "SELECT COUNT(*) FROM notifications WHERE user_id = $1",
                &[&user_id],
            )
            .await?
            .try_get(0)?;

        let sql = format!(
            "SELECT * FROM notifications WHERE user_id = $1 \
             ORDER BY created_at DESC, notification_id DESC LIMIT {} OFFSET {}",
            i64::from(per_page),
            offset,
        );
        let rows = conn.query(sql.as_str(), &[&user_id]).await?;

        let notifications = rows
            .iter()
            .map(notification_from_row)
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(Paginated::new(notifications, page, per_page, total))
    }

    /// Mark one of the user's notifications read.
    pub async fn notification_mark_read(
        &self,
        notification_id: NotificationId,
        user_id: UserId,
    ) -> ApiResult<Notification> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "UPDATE notifications SET is_read = TRUE \
                 WHERE notification_id = $1 AND user_id = $2 RETURNING *",
                &[&notification_id, &user_id],
            )
            .await?
            .ok_or_else(|| ApiError::notification_not_found(notification_id))?;
        notification_from_row(&row)
    }

    // ========================================================================
    // REPORT OPERATIONS
    // ========================================================================

    /// File a report against a post or a comment.
    pub async fn report_create(
        &self,
        reporter_id: UserId,
        post_id: Option<PostId>,
        comment_id: Option<CommentId>,
        reason: &str,
        description: &str,
    ) -> ApiResult<Report> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "INSERT INTO reports \
                 (report_id, reporter_id, post_id, comment_id, reason, description, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
                &[
                    &new_entity_id(),
                    &reporter_id,
                    &post_id,
                    &comment_id,
                    &reason,
                    &description,
                    &Utc::now(),
                ],
            )
            .await?;
        report_from_row(&row)
    }

    /// The moderation queue: pending reports, oldest first.
    pub async fn reports_pending(
        &self,
        page: u32,
        per_page: u32,
    ) -> ApiResult<Paginated<ReportResponse>> {
        let offset = agora_core::page_offset(page, per_page)?;
        let conn = self.get_conn().await?;

        let total: i64 = conn
            .query_one("SELECT COUNT(*) FROM reports WHERE status = 'pending'", &[])
            .await?
            .try_get(0)?;

        let sql = format!(
            "SELECT r.*, u.username AS reporter \
             FROM reports r JOIN users u ON u.user_id = r.reporter_id \
             WHERE r.status = 'pending' \
             ORDER BY r.created_at ASC, r.report_id ASC LIMIT {} OFFSET {}",
            i64::from(per_page),
            offset,
        );
        let rows = conn.query(sql.as_str(), &[]).await?;

        let reports = rows
            .iter()
            .map(|row| {
                let report = report_from_row(row)?;
                let reporter: String = row.try_get("reporter")?;
                Ok(ReportResponse::from_parts(report, reporter))
            })
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(Paginated::new(reports, page, per_page, total))
    }

    /// Move a report to a new moderation status.
    pub async fn report_set_status(
        &self,
        report_id: ReportId,
        status: ReportStatus,
    ) -> ApiResult<Report> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "UPDATE reports SET status = $2 WHERE report_id = $1 RETURNING *",
                &[&report_id, &status.as_str()],
            )
            .await?
            .ok_or_else(|| ApiError::report_not_found(report_id))?;
        report_from_row(&row)
    }

    // ========================================================================
    // SEARCH OPERATIONS
    // ========================================================================

    /// Case-insensitive substring search over live post titles and bodies.
    /// Returned unranked; the handler orders them with the core ranking
    /// function.
    pub async fn search_posts(&self, q: &str) -> ApiResult<Vec<(Post, String, String)>> {
        let pattern = ilike_pattern(q);
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                "SELECT p.*, u.username AS author, c.name AS community \
                 FROM posts p \
                 JOIN users u ON u.user_id = p.author_id \
                 JOIN communities c ON c.community_id = p.community_id \
                 WHERE NOT p.is_deleted AND (p.title ILIKE $1 OR p.body ILIKE $1) \
                 LIMIT $2",
                &[&pattern, &SEARCH_LIMIT],
            )
            .await?;
        rows.iter()
            .map(|row| {
                let post = post_from_row(row)?;
                let author: String = row.try_get("author")?;
                let community: String = row.try_get("community")?;
                Ok((post, author, community))
            })
            .collect()
    }

    /// Case-insensitive substring search over usernames.
    pub async fn search_users(&self, q: &str) -> ApiResult<Vec<User>> {
        let pattern = ilike_pattern(q);
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                "SELECT * FROM users WHERE username ILIKE $1 \
                 ORDER BY karma DESC, user_id DESC LIMIT $2",
                &[&pattern, &SEARCH_LIMIT],
            )
            .await?;
        rows.iter().map(user_from_row).collect()
    }

    /// Case-insensitive substring search over community names and titles.
    pub async fn search_communities(&self, q: &str) -> ApiResult<Vec<Community>> {
        let pattern = ilike_pattern(q);
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                "SELECT * FROM communities WHERE name ILIKE $1 OR title ILIKE $1 \
                 ORDER BY member_count DESC, community_id DESC LIMIT $2",
                &[&pattern, &SEARCH_LIMIT],
            )
            .await?;
        rows.iter().map(community_from_row).collect()
    }

    // ========================================================================
    // ADMIN OPERATIONS
    // ========================================================================

    /// Aggregate entity counts for the admin panel.
    pub async fn admin_stats(&self) -> ApiResult<AdminStatsResponse> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "SELECT (SELECT COUNT(*) FROM users) AS users, \
                        (SELECT COUNT(*) FROM posts WHERE NOT is_deleted) AS posts, \
                        (SELECT COUNT(*) FROM comments WHERE NOT is_deleted) AS comments, \
                        (SELECT COUNT(*) FROM communities) AS communities",
                &[],
            )
            .await?;
        Ok(AdminStatsResponse {
            users: row.try_get("users")?,
            posts: row.try_get("posts")?,
            comments: row.try_get("comments")?,
            communities: row.try_get("communities")?,
        })
    }

    /// Reconciliation: recompute every denormalized counter from the vote
    /// ledger and report how many rows had drifted.
    ///
    /// Counters are pure accumulators with no other audit path; this is
    /// the on-demand recompute the accumulator design otherwise lacks.
    /// Karma is rebuilt as (+1 per standing upvote, −1 per standing
    /// downvote) over votes received on the user's posts and comments,
    /// which is exactly the fixed point of the transition table.
    pub async fn recount_votes(&self) -> ApiResult<RecountResponse> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let posts_fixed = tx
            .execute(
                "UPDATE posts p SET upvotes = s.ups, downvotes = s.downs \
                 FROM (SELECT post_id, \
                              COUNT(*) FILTER (WHERE kind = 'up')::int AS ups, \
                              COUNT(*) FILTER (WHERE kind = 'down')::int AS downs \
                       FROM post_votes GROUP BY post_id) s \
                 WHERE p.post_id = s.post_id \
                   AND (p.upvotes <> s.ups OR p.downvotes <> s.downs)",
                &[],
            )
            .await?;
        let posts_zeroed = tx
            .execute(
                "UPDATE posts SET upvotes = 0, downvotes = 0 \
                 WHERE (upvotes <> 0 OR downvotes <> 0) \
                   AND NOT EXISTS (SELECT 1 FROM post_votes v WHERE v.post_id = posts.post_id)",
                &[],
            )
            .await?;

        let comments_fixed = tx
            .execute(
                "UPDATE comments c SET upvotes = s.ups, downvotes = s.downs \
                 FROM (SELECT comment_id, \
                              COUNT(*) FILTER (WHERE kind = 'up')::int AS ups, \
                              COUNT(*) FILTER (WHERE kind = 'down')::int AS downs \
                       FROM comment_votes GROUP BY comment_id) s \
                 WHERE c.comment_id = s.comment_id \
                   AND (c.upvotes <> s.ups OR c.downvotes <> s.downs)",
                &[],
            )
            .await?;
        let comments_zeroed = tx
            .execute(
                "UPDATE comments SET upvotes = 0, downvotes = 0 \
                 WHERE (upvotes <> 0 OR downvotes <> 0) \
                   AND NOT EXISTS \
                       (SELECT 1 FROM comment_votes v WHERE v.comment_id = comments.comment_id)",
                &[],
            )
            .await?;

        let users_fixed = tx
            .execute(
                "UPDATE users u SET karma = s.total \
                 FROM (SELECT author_id, SUM(delta)::int AS total FROM ( \
                         SELECT p.author_id, \
                                CASE WHEN v.kind = 'up' THEN 1 ELSE -1 END AS delta \
                         FROM post_votes v JOIN posts p ON p.post_id = v.post_id \
                         UNION ALL \
                         SELECT c.author_id, \
                                CASE WHEN v.kind = 'up' THEN 1 ELSE -1 END \
                         FROM comment_votes v JOIN comments c ON c.comment_id = v.comment_id \
                       ) ledger GROUP BY author_id) s \
                 WHERE u.user_id = s.author_id AND u.karma <> s.total",
                &[],
            )
            .await?;
        let users_zeroed = tx
            .execute(
                "UPDATE users SET karma = 0 \
                 WHERE karma <> 0 \
                   AND NOT EXISTS (SELECT 1 FROM post_votes v \
                                   JOIN posts p ON p.post_id = v.post_id \
                                   WHERE p.author_id = users.user_id) \
                   AND NOT EXISTS (SELECT 1 FROM comment_votes v \
                                   JOIN comments c ON c.comment_id = v.comment_id \
                                   WHERE c.author_id = users.user_id)",
                &[],
            )
            .await?;

        tx.commit().await?;

        Ok(RecountResponse {
            posts_corrected: posts_fixed + posts_zeroed,
            comments_corrected: comments_fixed + comments_zeroed,
            users_corrected: users_fixed + users_zeroed,
        })
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Insert a notification inside an existing transaction.
async fn insert_notification(
    tx: &Transaction<'_>,
    user_id: UserId,
    kind: NotificationKind,
    title: &str,
    body: &str,
    link: &str,
) -> ApiResult<()> {
    tx.execute(
        "INSERT INTO notifications (notification_id, user_id, kind, title, body, link, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
        &[
            &new_entity_id(),
            &user_id,
            &kind.as_str(),
            &title,
            &body,
            &link,
            &Utc::now(),
        ],
    )
    .await?;
    Ok(())
}

/// Escape LIKE metacharacters and wrap the query in wildcards.
fn ilike_pattern(q: &str) -> String {
    let escaped = q.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

/// First `limit` characters of a body, for notification previews.
fn preview(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_config_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "agora");
        assert_eq!(config.max_size, 16);
    }

    #[test]
    fn test_ilike_pattern_escapes_metacharacters() {
        assert_eq!(ilike_pattern("rust"), "%rust%");
        assert_eq!(ilike_pattern("100%"), "%100\\%%");
        assert_eq!(ilike_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 100), "short");
        assert_eq!(preview("abcdef", 3), "abc");
        // Multi-byte characters are not split.
        assert_eq!(preview("héllo", 2), "hé");
    }

    #[test]
    fn test_order_clauses_cover_all_modes() {
        assert!(post_order_clause(SortMode::New).contains("created_at"));
        assert!(post_order_clause(SortMode::Top).contains("upvotes"));
        assert!(post_order_clause(SortMode::Hot).contains("upvotes - p.downvotes"));
        assert!(comment_order_clause(SortMode::Hot).contains("c.upvotes - c.downvotes"));
        // Every clause carries the id tie-break.
        for mode in [SortMode::New, SortMode::Top, SortMode::Hot] {
            assert!(post_order_clause(mode).contains("post_id DESC"));
            assert!(comment_order_clause(mode).contains("comment_id DESC"));
        }
    }
}
