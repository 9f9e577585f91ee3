//! Plant endpoints: adding plants to gardens, listing them, and updating or
//! removing a single plant.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::{
        handlers::read_image_form,
        models::{
            pagination::Pagination,
            plants::{PlantCreateRequest, PlantListResponse, PlantResponse, PlantUpdateResponse},
            users::CurrentUser,
            MessageResponse,
        },
    },
    db::{
        handlers::{plants::PlantFilter, Gardens, Plants, Repository},
        models::plants::{PlantCreateDBRequest, PlantDBResponse, PlantUpdateDBRequest},
    },
    errors::Error,
    storage::{StorageService, GARDEN_IMAGES_FOLDER},
    types::{GardenId, PlantId},
    AppState,
};

/// Load a plant and make sure it belongs to the user.
async fn owned_plant(state: &AppState, plant_id: PlantId, user: &CurrentUser, action: &str) -> Result<PlantDBResponse, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let plant = Plants::new(&mut conn)
        .get_by_id(plant_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Planta".to_string(),
        })?;

    if plant.user_id != user.id {
        return Err(Error::Forbidden {
            message: format!("No tienes permiso para {action} esta planta"),
        });
    }
    Ok(plant)
}

/// Add a plant to a garden
#[utoipa::path(
    post,
    path = "/gardens/{garden_id}/plants",
    request_body = PlantCreateRequest,
    tag = "plants",
    params(("garden_id" = String, Path, format = "uuid")),
    responses(
        (status = 201, description = "Planta agregada", body = PlantResponse),
        (status = 400, description = "Alias duplicado"),
        (status = 404, description = "Jardín no encontrado"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn add_plant(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(garden_id): Path<GardenId>,
    Json(request): Json<PlantCreateRequest>,
) -> Result<(StatusCode, Json<PlantResponse>), Error> {
    if request.alias.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "El alias de la planta es obligatorio".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let garden = Gardens::new(&mut tx)
        .get_by_id(garden_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Jardín".to_string(),
        })?;
    if garden.user_id != current_user.id {
        return Err(Error::Forbidden {
            message: "No tienes permiso para agregar plantas a este jardín".to_string(),
        });
    }

    let plant = Plants::new(&mut tx)
        .create(&PlantCreateDBRequest {
            user_id: current_user.id,
            garden_id,
            alias: request.alias.trim().to_string(),
            image_url: request.image_url,
            scientific_name_without_author: request.scientific_name_without_author,
            genus: request.genus,
            family: request.family,
            common_names: request.common_names,
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(PlantResponse::from(plant))))
}

/// List the plants of a garden
#[utoipa::path(
    get,
    path = "/gardens/{garden_id}/plants",
    tag = "plants",
    params(("garden_id" = String, Path, format = "uuid"), Pagination),
    responses(
        (status = 200, description = "Plantas del jardín", body = PlantListResponse),
        (status = 404, description = "Jardín no encontrado"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_garden_plants(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(garden_id): Path<GardenId>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PlantListResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let garden = Gardens::new(&mut conn)
        .get_by_id(garden_id)
        .await?
        .filter(|g| g.user_id == current_user.id)
        .ok_or_else(|| Error::NotFound {
            resource: "Jardín".to_string(),
        })?;

    let mut plants_repo = Plants::new(&mut conn);
    let total = plants_repo.count_for_garden(garden_id).await?;
    let plants = plants_repo
        .list(&PlantFilter {
            garden_id,
            skip: pagination.skip,
            limit: pagination.limit,
        })
        .await?;

    let message = (total == 0).then(|| "Este jardín aún no tiene plantas. ¡Agrega algunas plantas!".to_string());

    Ok(Json(PlantListResponse {
        items: plants.into_iter().map(PlantResponse::from).collect(),
        total,
        garden_name: garden.name,
        message,
    }))
}

/// Update a plant (alias and/or image)
#[utoipa::path(
    put,
    path = "/gardens/plants/{plant_id}",
    tag = "plants",
    params(("plant_id" = String, Path, format = "uuid")),
    responses(
        (status = 200, description = "Planta actualizada", body = PlantUpdateResponse),
        (status = 403, description = "La planta pertenece a otro usuario"),
        (status = 404, description = "Planta no encontrada"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_plant(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(plant_id): Path<PlantId>,
    mut multipart: Multipart,
) -> Result<Json<PlantUpdateResponse>, Error> {
    let plant = owned_plant(&state, plant_id, &current_user, "actualizar").await?;

    let mut form = read_image_form(&mut multipart).await?;

    let image_url = if let Some(image) = form.image.take() {
        let storage = StorageService::new(&state.config).await;
        let folder = format!(
            "{GARDEN_IMAGES_FOLDER}/{}/{}/plants/{}",
            current_user.id, plant.garden_id, plant_id
        );
        Some(storage.upload_image(image.data, &image.content_type, &folder).await?)
    } else {
        None
    };

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let updated = Plants::new(&mut tx)
        .update(
            plant_id,
            &PlantUpdateDBRequest {
                alias: form.text_field("alias"),
                image_url,
            },
        )
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(PlantUpdateResponse {
        message: format!("Planta '{}' actualizada con éxito", updated.alias),
        plant: PlantResponse::from(updated),
    }))
}

/// Remove a plant
#[utoipa::path(
    delete,
    path = "/gardens/plants/{plant_id}",
    tag = "plants",
    params(("plant_id" = String, Path, format = "uuid")),
    responses(
        (status = 200, description = "Planta eliminada", body = MessageResponse),
        (status = 403, description = "La planta pertenece a otro usuario"),
        (status = 404, description = "Planta no encontrada"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_plant(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(plant_id): Path<PlantId>,
) -> Result<Json<MessageResponse>, Error> {
    let plant = owned_plant(&state, plant_id, &current_user, "eliminar").await?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    Plants::new(&mut tx).delete(plant_id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(MessageResponse::new(format!(
        "Planta '{}' eliminada con éxito",
        plant.alias
    ))))
}

#[cfg(test)]
mod tests {
    use crate::api::models::plants::PlantCreateRequest;
    use crate::test_utils::{create_test_app, register_and_login};
    use axum::http::StatusCode;
    use axum_test::multipart::MultipartForm;
    use axum_test::TestServer;
    use sqlx::PgPool;

    async fn create_garden(server: &TestServer, token: &str, name: &str) -> String {
        let response = server
            .post("/gardens")
            .authorization_bearer(token)
            .multipart(MultipartForm::new().add_text("name", name))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        body["id"].as_str().unwrap().to_string()
    }

    fn rose(alias: &str) -> PlantCreateRequest {
        PlantCreateRequest {
            alias: alias.to_string(),
            scientific_name_without_author: "Rosa canina".to_string(),
            genus: "Rosa".to_string(),
            family: "Rosaceae".to_string(),
            common_names: vec!["rosal silvestre".to_string()],
            image_url: None,
        }
    }

    #[sqlx::test]
    async fn test_add_and_list_plants(pool: PgPool) {
        let server = create_test_app(pool);
        let pair = register_and_login(&server, "a@x.com", "au", "Test1234!").await;
        let garden_id = create_garden(&server, &pair.access_token, "Rosaleda").await;

        // Empty garden advertises itself as such
        let response = server
            .get(&format!("/gardens/{garden_id}/plants"))
            .authorization_bearer(&pair.access_token)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["total"], 0);
        assert_eq!(body["garden_name"], "Rosaleda");
        assert!(body["message"].as_str().unwrap().contains("no tiene plantas"));

        let response = server
            .post(&format!("/gardens/{garden_id}/plants"))
            .authorization_bearer(&pair.access_token)
            .json(&rose("mi-rosal"))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["alias"], "mi-rosal");
        assert_eq!(body["common_names"][0], "rosal silvestre");

        let response = server
            .get(&format!("/gardens/{garden_id}/plants"))
            .authorization_bearer(&pair.access_token)
            .await;
        let body: serde_json::Value = response.json();
        assert_eq!(body["total"], 1);
        assert!(body.get("message").is_none());
    }

    #[sqlx::test]
    async fn test_alias_unique_per_user(pool: PgPool) {
        let server = create_test_app(pool);
        let pair = register_and_login(&server, "a@x.com", "au", "Test1234!").await;
        let garden_id = create_garden(&server, &pair.access_token, "Rosaleda").await;
        let other_garden = create_garden(&server, &pair.access_token, "Huerta").await;

        let response = server
            .post(&format!("/gardens/{garden_id}/plants"))
            .authorization_bearer(&pair.access_token)
            .json(&rose("mi-rosal"))
            .await;
        response.assert_status(StatusCode::CREATED);

        // Same alias in another garden of the same user still collides
        let response = server
            .post(&format!("/gardens/{other_garden}/plants"))
            .authorization_bearer(&pair.access_token)
            .json(&rose("mi-rosal"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Ya existe una planta con ese alias para este usuario");
    }

    #[sqlx::test]
    async fn test_update_and_delete_plant(pool: PgPool) {
        let server = create_test_app(pool);
        let pair = register_and_login(&server, "a@x.com", "au", "Test1234!").await;
        let garden_id = create_garden(&server, &pair.access_token, "Rosaleda").await;

        let response = server
            .post(&format!("/gardens/{garden_id}/plants"))
            .authorization_bearer(&pair.access_token)
            .json(&rose("mi-rosal"))
            .await;
        let plant: serde_json::Value = response.json();
        let plant_id = plant["id"].as_str().unwrap().to_string();

        let response = server
            .put(&format!("/gardens/plants/{plant_id}"))
            .authorization_bearer(&pair.access_token)
            .multipart(MultipartForm::new().add_text("alias", "rosal-grande"))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Planta 'rosal-grande' actualizada con éxito");

        let response = server
            .delete(&format!("/gardens/plants/{plant_id}"))
            .authorization_bearer(&pair.access_token)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Planta 'rosal-grande' eliminada con éxito");
    }

    #[sqlx::test]
    async fn test_foreign_plant_is_forbidden(pool: PgPool) {
        let server = create_test_app(pool);
        let owner = register_and_login(&server, "a@x.com", "au", "Test1234!").await;
        let intruder = register_and_login(&server, "b@x.com", "bu", "Test1234!").await;
        let garden_id = create_garden(&server, &owner.access_token, "Privado").await;

        let response = server
            .post(&format!("/gardens/{garden_id}/plants"))
            .authorization_bearer(&owner.access_token)
            .json(&rose("mi-rosal"))
            .await;
        let plant: serde_json::Value = response.json();
        let plant_id = plant["id"].as_str().unwrap().to_string();

        // Foreign garden: cannot add plants
        let response = server
            .post(&format!("/gardens/{garden_id}/plants"))
            .authorization_bearer(&intruder.access_token)
            .json(&rose("otro"))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        // Foreign plant: cannot delete
        let response = server
            .delete(&format!("/gardens/plants/{plant_id}"))
            .authorization_bearer(&intruder.access_token)
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    async fn test_plant_pagination(pool: PgPool) {
        let server = create_test_app(pool);
        let pair = register_and_login(&server, "a@x.com", "au", "Test1234!").await;
        let garden_id = create_garden(&server, &pair.access_token, "Rosaleda").await;

        for i in 0..3 {
            let response = server
                .post(&format!("/gardens/{garden_id}/plants"))
                .authorization_bearer(&pair.access_token)
                .json(&rose(&format!("rosal-{i}")))
                .await;
            response.assert_status(StatusCode::CREATED);
        }

        let response = server
            .get(&format!("/gardens/{garden_id}/plants"))
            .authorization_bearer(&pair.access_token)
            .add_query_param("skip", "1")
            .add_query_param("limit", "1")
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["total"], 3);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
    }
}
