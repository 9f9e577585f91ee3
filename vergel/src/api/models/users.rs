//! API request/response models for users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{db::models::users::UserDBResponse, types::UserId};

/// User as returned by the API. The password hash never leaves the service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            username: db.username,
            full_name: db.full_name,
            is_active: db.is_active,
            is_superuser: db.is_superuser,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// The authenticated user, as produced by the bearer-token extractor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            username: db.username,
            full_name: db.full_name,
            is_active: db.is_active,
            is_superuser: db.is_superuser,
        }
    }
}

/// Profile update payload for `PUT /auth/me`.
///
/// Changing the password requires `current_password` alongside
/// `new_password`; the new password runs through the strength validator and
/// the history guard.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserUpdateRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}
