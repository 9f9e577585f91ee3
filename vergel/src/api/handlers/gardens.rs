//! Garden CRUD endpoints. All routes are scoped to the authenticated user;
//! create and update accept multipart forms with an optional image.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::{
        handlers::read_image_form,
        models::{
            gardens::{GardenListResponse, GardenResponse, GardenUpdateResponse},
            users::CurrentUser,
            MessageResponse,
        },
    },
    db::{
        handlers::{gardens::GardenFilter, Gardens, Repository},
        models::gardens::{GardenCreateDBRequest, GardenDBResponse, GardenUpdateDBRequest},
    },
    errors::Error,
    storage::{StorageService, GARDEN_IMAGES_FOLDER},
    types::GardenId,
    AppState,
};

/// Load a garden and make sure it belongs to the user.
async fn owned_garden(state: &AppState, garden_id: GardenId, user: &CurrentUser, action: &str) -> Result<GardenDBResponse, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let garden = Gardens::new(&mut conn)
        .get_by_id(garden_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Jardín".to_string(),
        })?;

    if garden.user_id != user.id {
        return Err(Error::Forbidden {
            message: format!("No tienes permiso para {action} este jardín"),
        });
    }
    Ok(garden)
}

/// Create a garden
#[utoipa::path(
    post,
    path = "/gardens",
    tag = "gardens",
    responses(
        (status = 201, description = "Jardín creado", body = GardenResponse),
        (status = 400, description = "Datos inválidos o nombre duplicado"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_garden(
    State(state): State<AppState>,
    current_user: CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<GardenResponse>), Error> {
    let mut form = read_image_form(&mut multipart).await?;

    let name = form.text_field("name").ok_or_else(|| Error::BadRequest {
        message: "El nombre del jardín es obligatorio".to_string(),
    })?;

    let image_url = if let Some(image) = form.image.take() {
        let storage = StorageService::new(&state.config).await;
        let folder = format!("{GARDEN_IMAGES_FOLDER}/{}", current_user.id);
        Some(storage.upload_image(image.data, &image.content_type, &folder).await?)
    } else {
        None
    };

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let garden = Gardens::new(&mut tx)
        .create(&GardenCreateDBRequest {
            user_id: current_user.id,
            name,
            description: form.text_field("description"),
            image_url,
        })
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(GardenResponse::from(garden))))
}

/// List the authenticated user's gardens
#[utoipa::path(
    get,
    path = "/gardens",
    tag = "gardens",
    responses(
        (status = 200, description = "Jardines del usuario", body = GardenListResponse),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_gardens(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<GardenListResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let gardens = Gardens::new(&mut conn)
        .list(&GardenFilter {
            user_id: current_user.id,
        })
        .await?;

    Ok(Json(GardenListResponse {
        total: gardens.len() as i64,
        items: gardens.into_iter().map(GardenResponse::from).collect(),
    }))
}

/// Update a garden
#[utoipa::path(
    put,
    path = "/gardens/{garden_id}",
    tag = "gardens",
    params(("garden_id" = String, Path, format = "uuid")),
    responses(
        (status = 200, description = "Jardín actualizado", body = GardenUpdateResponse),
        (status = 403, description = "El jardín pertenece a otro usuario"),
        (status = 404, description = "Jardín no encontrado"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_garden(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(garden_id): Path<GardenId>,
    mut multipart: Multipart,
) -> Result<Json<GardenUpdateResponse>, Error> {
    owned_garden(&state, garden_id, &current_user, "actualizar").await?;

    let mut form = read_image_form(&mut multipart).await?;

    let image_url = if let Some(image) = form.image.take() {
        let storage = StorageService::new(&state.config).await;
        let folder = format!("{GARDEN_IMAGES_FOLDER}/{}/{}", current_user.id, garden_id);
        Some(storage.upload_image(image.data, &image.content_type, &folder).await?)
    } else {
        None
    };

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let updated = Gardens::new(&mut tx)
        .update(
            garden_id,
            &GardenUpdateDBRequest {
                name: form.text_field("name"),
                description: form.text_field("description"),
                image_url,
            },
        )
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(GardenUpdateResponse {
        message: format!("Jardín '{}' actualizado con éxito", updated.name),
        garden: GardenResponse::from(updated),
    }))
}

/// Delete a garden (cascades to its plants and their notes)
#[utoipa::path(
    delete,
    path = "/gardens/{garden_id}",
    tag = "gardens",
    params(("garden_id" = String, Path, format = "uuid")),
    responses(
        (status = 200, description = "Jardín eliminado", body = MessageResponse),
        (status = 403, description = "El jardín pertenece a otro usuario"),
        (status = 404, description = "Jardín no encontrado"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_garden(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(garden_id): Path<GardenId>,
) -> Result<Json<MessageResponse>, Error> {
    let garden = owned_garden(&state, garden_id, &current_user, "eliminar").await?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    Gardens::new(&mut tx).delete(garden_id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(MessageResponse::new(format!(
        "Jardín '{}' eliminado con éxito",
        garden.name
    ))))
}
