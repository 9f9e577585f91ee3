//! API request/response models for posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    db::models::posts::PostDBResponse,
    types::{PostId, UserId},
};

/// Payload for creating a post
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostCreateRequest {
    pub title: String,
    pub content: String,
}

/// Payload for updating a post
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostUpdateRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Post as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PostId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PostDBResponse> for PostResponse {
    fn from(db: PostDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            title: db.title,
            content: db.content,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
