//! Database repository for plant observation notes.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::notes::{NoteCreateDBRequest, NoteDBResponse, NoteUpdateDBRequest},
    },
    types::{abbrev_uuid, NoteId, PlantId},
};

/// Filter for listing the notes of one plant, newest observation first.
#[derive(Debug, Clone)]
pub struct NoteFilter {
    pub plant_id: PlantId,
}

pub struct Notes<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Notes<'c> {
    type CreateRequest = NoteCreateDBRequest;
    type UpdateRequest = NoteUpdateDBRequest;
    type Response = NoteDBResponse;
    type Id = NoteId;
    type Filter = NoteFilter;

    #[instrument(skip(self, request), fields(plant_id = %abbrev_uuid(&request.plant_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let note = sqlx::query_as::<_, NoteDBResponse>(
            r#"
            INSERT INTO plant_notes (id, plant_id, text, observation_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.plant_id)
        .bind(&request.text)
        .bind(request.observation_date)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(note)
    }

    #[instrument(skip(self), fields(note_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let note = sqlx::query_as::<_, NoteDBResponse>("SELECT * FROM plant_notes WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(note)
    }

    #[instrument(skip(self, filter), fields(plant_id = %abbrev_uuid(&filter.plant_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let notes = sqlx::query_as::<_, NoteDBResponse>(
            "SELECT * FROM plant_notes WHERE plant_id = $1 ORDER BY observation_date DESC",
        )
        .bind(filter.plant_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(notes)
    }

    #[instrument(skip(self, request), fields(note_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let note = sqlx::query_as::<_, NoteDBResponse>(
            r#"
            UPDATE plant_notes SET
                text = COALESCE($2, text),
                observation_date = COALESCE($3, observation_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.text)
        .bind(request.observation_date)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(note)
    }

    #[instrument(skip(self), fields(note_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM plant_notes WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> Notes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
