//! Database models for gardens.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{GardenId, UserId};

/// Database request for creating a garden
#[derive(Debug, Clone)]
pub struct GardenCreateDBRequest {
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Database request for updating a garden. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct GardenUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// A gardens-table row.
#[derive(Debug, Clone, FromRow)]
pub struct GardenDBResponse {
    pub id: GardenId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
