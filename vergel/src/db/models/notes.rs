//! Database models for plant observation notes.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{NoteId, PlantId};

/// Database request for creating a note
#[derive(Debug, Clone)]
pub struct NoteCreateDBRequest {
    pub plant_id: PlantId,
    pub text: String,
    pub observation_date: DateTime<Utc>,
}

/// Database request for updating a note. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct NoteUpdateDBRequest {
    pub text: Option<String>,
    pub observation_date: Option<DateTime<Utc>>,
}

/// A plant_notes-table row.
#[derive(Debug, Clone, FromRow)]
pub struct NoteDBResponse {
    pub id: NoteId,
    pub plant_id: PlantId,
    pub text: String,
    pub observation_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
