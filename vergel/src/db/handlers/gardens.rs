//! Database repository for gardens.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::gardens::{GardenCreateDBRequest, GardenDBResponse, GardenUpdateDBRequest},
    },
    types::{abbrev_uuid, GardenId, UserId},
};

/// Filter for listing gardens - always scoped to their owner.
#[derive(Debug, Clone)]
pub struct GardenFilter {
    pub user_id: UserId,
}

pub struct Gardens<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Gardens<'c> {
    type CreateRequest = GardenCreateDBRequest;
    type UpdateRequest = GardenUpdateDBRequest;
    type Response = GardenDBResponse;
    type Id = GardenId;
    type Filter = GardenFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let garden = sqlx::query_as::<_, GardenDBResponse>(
            r#"
            INSERT INTO gardens (id, user_id, name, description, image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.image_url)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(garden)
    }

    #[instrument(skip(self), fields(garden_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let garden = sqlx::query_as::<_, GardenDBResponse>("SELECT * FROM gardens WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(garden)
    }

    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let gardens = sqlx::query_as::<_, GardenDBResponse>(
            "SELECT * FROM gardens WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(filter.user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(gardens)
    }

    #[instrument(skip(self, request), fields(garden_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let garden = sqlx::query_as::<_, GardenDBResponse>(
            r#"
            UPDATE gardens SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                image_url = COALESCE($4, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.image_url)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(garden)
    }

    #[instrument(skip(self), fields(garden_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM gardens WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> Gardens<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
