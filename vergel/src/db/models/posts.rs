//! Database models for posts.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{PostId, UserId};

/// Database request for creating a post
#[derive(Debug, Clone)]
pub struct PostCreateDBRequest {
    pub user_id: UserId,
    pub title: String,
    pub content: String,
}

/// Database request for updating a post. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PostUpdateDBRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// A posts-table row.
#[derive(Debug, Clone, FromRow)]
pub struct PostDBResponse {
    pub id: PostId,
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
