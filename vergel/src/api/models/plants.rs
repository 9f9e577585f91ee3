//! API request/response models for plants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    db::models::plants::PlantDBResponse,
    types::{GardenId, PlantId, UserId},
};

/// Payload for adding a plant to a garden.
///
/// Taxonomy fields come straight from an identification result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlantCreateRequest {
    /// Unique alias for the plant (per user)
    pub alias: String,
    pub scientific_name_without_author: String,
    pub genus: String,
    pub family: String,
    pub common_names: Vec<String>,
    pub image_url: Option<String>,
}

/// Plant as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlantResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PlantId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub garden_id: GardenId,
    pub alias: String,
    pub image_url: Option<String>,
    pub scientific_name_without_author: String,
    pub genus: String,
    pub family: String,
    pub common_names: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PlantDBResponse> for PlantResponse {
    fn from(db: PlantDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            garden_id: db.garden_id,
            alias: db.alias,
            image_url: db.image_url,
            scientific_name_without_author: db.scientific_name_without_author,
            genus: db.genus,
            family: db.family,
            common_names: db.common_names,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Paginated listing of one garden's plants
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlantListResponse {
    pub items: Vec<PlantResponse>,
    pub total: i64,
    pub garden_name: String,
    /// Friendly hint shown when the garden has no plants yet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Update confirmation with a user-facing message
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlantUpdateResponse {
    pub message: String,
    pub plant: PlantResponse,
}
