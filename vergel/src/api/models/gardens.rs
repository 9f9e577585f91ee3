//! API request/response models for gardens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    db::models::gardens::GardenDBResponse,
    types::{GardenId, UserId},
};

/// Garden as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GardenResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: GardenId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GardenDBResponse> for GardenResponse {
    fn from(db: GardenDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            name: db.name,
            description: db.description,
            image_url: db.image_url,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Listing of the user's gardens
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GardenListResponse {
    pub items: Vec<GardenResponse>,
    pub total: i64,
}

/// Update/delete confirmation with a user-facing message
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GardenUpdateResponse {
    pub message: String,
    pub garden: GardenResponse,
}
