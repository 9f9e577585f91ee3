//! Database repository for plants.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::plants::{PlantCreateDBRequest, PlantDBResponse, PlantUpdateDBRequest},
    },
    types::{abbrev_uuid, GardenId, PlantId},
};

/// Filter for listing plants of one garden, newest first.
#[derive(Debug, Clone)]
pub struct PlantFilter {
    pub garden_id: GardenId,
    pub skip: i64,
    pub limit: i64,
}

pub struct Plants<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Plants<'c> {
    type CreateRequest = PlantCreateDBRequest;
    type UpdateRequest = PlantUpdateDBRequest;
    type Response = PlantDBResponse;
    type Id = PlantId;
    type Filter = PlantFilter;

    #[instrument(skip(self, request), fields(alias = %request.alias), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let plant = sqlx::query_as::<_, PlantDBResponse>(
            r#"
            INSERT INTO plants
                (id, user_id, garden_id, alias, image_url,
                 scientific_name_without_author, genus, family, common_names)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(request.garden_id)
        .bind(&request.alias)
        .bind(&request.image_url)
        .bind(&request.scientific_name_without_author)
        .bind(&request.genus)
        .bind(&request.family)
        .bind(&request.common_names)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(plant)
    }

    #[instrument(skip(self), fields(plant_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let plant = sqlx::query_as::<_, PlantDBResponse>("SELECT * FROM plants WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(plant)
    }

    #[instrument(skip(self, filter), fields(garden_id = %abbrev_uuid(&filter.garden_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let plants = sqlx::query_as::<_, PlantDBResponse>(
            r#"
            SELECT * FROM plants
            WHERE garden_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.garden_id)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(plants)
    }

    #[instrument(skip(self, request), fields(plant_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let plant = sqlx::query_as::<_, PlantDBResponse>(
            r#"
            UPDATE plants SET
                alias = COALESCE($2, alias),
                image_url = COALESCE($3, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.alias)
        .bind(&request.image_url)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(plant)
    }

    #[instrument(skip(self), fields(plant_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM plants WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> Plants<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Total number of plants in a garden, for list pagination.
    #[instrument(skip(self), fields(garden_id = %abbrev_uuid(&garden_id)), err)]
    pub async fn count_for_garden(&mut self, garden_id: GardenId) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM plants WHERE garden_id = $1")
            .bind(garden_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}
