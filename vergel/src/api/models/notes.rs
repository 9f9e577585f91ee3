//! API request/response models for plant observation notes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    db::models::notes::NoteDBResponse,
    types::{NoteId, PlantId},
};

/// Payload for creating a note
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteCreateRequest {
    pub text: String,
    pub observation_date: DateTime<Utc>,
}

/// Payload for updating a note
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteUpdateRequest {
    pub text: Option<String>,
    pub observation_date: Option<DateTime<Utc>>,
}

/// Note as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: NoteId,
    #[schema(value_type = String, format = "uuid")]
    pub plant_id: PlantId,
    pub text: String,
    pub observation_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NoteDBResponse> for NoteResponse {
    fn from(db: NoteDBResponse) -> Self {
        Self {
            id: db.id,
            plant_id: db.plant_id,
            text: db.text,
            observation_date: db.observation_date,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
