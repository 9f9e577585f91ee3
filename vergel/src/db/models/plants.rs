//! Database models for plants.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{GardenId, PlantId, UserId};

/// Database request for adding a plant to a garden
#[derive(Debug, Clone)]
pub struct PlantCreateDBRequest {
    pub user_id: UserId,
    pub garden_id: GardenId,
    pub alias: String,
    pub image_url: Option<String>,
    pub scientific_name_without_author: String,
    pub genus: String,
    pub family: String,
    pub common_names: Vec<String>,
}

/// Database request for updating a plant. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PlantUpdateDBRequest {
    pub alias: Option<String>,
    pub image_url: Option<String>,
}

/// A plants-table row.
#[derive(Debug, Clone, FromRow)]
pub struct PlantDBResponse {
    pub id: PlantId,
    pub user_id: UserId,
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
