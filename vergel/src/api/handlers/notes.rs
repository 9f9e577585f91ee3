//! Plant observation note endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        notes::{NoteCreateRequest, NoteResponse, NoteUpdateRequest},
        users::CurrentUser,
        MessageResponse,
    },
    db::{
        handlers::{notes::NoteFilter, Notes, Plants, Repository},
        models::notes::{NoteCreateDBRequest, NoteUpdateDBRequest},
    },
    errors::Error,
    types::{NoteId, PlantId},
    AppState,
};

fn validate_note_text(text: &str) -> Result<String, Error> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::BadRequest {
            message: "El texto de la nota no puede estar vacío".to_string(),
        });
    }
    if trimmed.len() < 3 {
        return Err(Error::BadRequest {
            message: "El texto de la nota debe tener al menos 3 caracteres".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Create an observation note for a plant
#[utoipa::path(
    post,
    path = "/plants/{plant_id}/notes",
    request_body = NoteCreateRequest,
    tag = "notes",
    params(("plant_id" = String, Path, format = "uuid")),
    responses(
        (status = 201, description = "Nota creada", body = NoteResponse),
        (status = 400, description = "Texto o fecha inválidos"),
        (status = 404, description = "La planta no existe"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_note(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(plant_id): Path<PlantId>,
    Json(request): Json<NoteCreateRequest>,
) -> Result<(StatusCode, Json<NoteResponse>), Error> {
    let text = validate_note_text(&request.text)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    Plants::new(&mut tx)
        .get_by_id(plant_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "La planta especificada".to_string(),
        })?;

    let note = Notes::new(&mut tx)
        .create(&NoteCreateDBRequest {
            plant_id,
            text,
            observation_date: request.observation_date,
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(NoteResponse::from(note))))
}

/// List a plant's notes, newest observation first
#[utoipa::path(
    get,
    path = "/plants/{plant_id}/notes",
    tag = "notes",
    params(("plant_id" = String, Path, format = "uuid")),
    responses(
        (status = 200, description = "Notas de la planta", body = [NoteResponse]),
        (status = 404, description = "La planta no existe"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_notes(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(plant_id): Path<PlantId>,
) -> Result<Json<Vec<NoteResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    Plants::new(&mut conn)
        .get_by_id(plant_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "La planta especificada".to_string(),
        })?;

    let notes = Notes::new(&mut conn).list(&NoteFilter { plant_id }).await?;

    Ok(Json(notes.into_iter().map(NoteResponse::from).collect()))
}

/// Update a note
#[utoipa::path(
    put,
    path = "/notes/{note_id}",
    request_body = NoteUpdateRequest,
    tag = "notes",
    params(("note_id" = String, Path, format = "uuid")),
    responses(
        (status = 200, description = "Nota actualizada", body = NoteResponse),
        (status = 404, description = "Nota no encontrada"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_note(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(note_id): Path<NoteId>,
    Json(request): Json<NoteUpdateRequest>,
) -> Result<Json<NoteResponse>, Error> {
    let text = request.text.as_deref().map(validate_note_text).transpose()?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut notes = Notes::new(&mut tx);
    notes.get_by_id(note_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Nota".to_string(),
    })?;

    let updated = notes
        .update(
            note_id,
            &NoteUpdateDBRequest {
                text,
                observation_date: request.observation_date,
            },
        )
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(NoteResponse::from(updated)))
}

/// Delete a note
#[utoipa::path(
    delete,
    path = "/notes/{note_id}",
    tag = "notes",
    params(("note_id" = String, Path, format = "uuid")),
    responses(
        (status = 200, description = "Nota eliminada", body = MessageResponse),
        (status = 404, description = "Nota no encontrada"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_note(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(note_id): Path<NoteId>,
) -> Result<Json<MessageResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let deleted = Notes::new(&mut tx).delete(note_id).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "Nota".to_string(),
        });
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(MessageResponse::new("Nota eliminada con éxito")))
}

#[cfg(test)]
mod tests {
    use crate::api::models::plants::PlantCreateRequest;
    use crate::test_utils::{create_test_app, register_and_login};
    use axum::http::StatusCode;
    use axum_test::multipart::MultipartForm;
    use axum_test::TestServer;
    use chrono::{Duration, Utc};
    use sqlx::PgPool;

    async fn create_plant(server: &TestServer, token: &str) -> String {
        let response = server
            .post("/gardens")
            .authorization_bearer(token)
            .multipart(MultipartForm::new().add_text("name", "Huerto"))
            .await;
        let garden: serde_json::Value = response.json();
        let garden_id = garden["id"].as_str().unwrap();

        let response = server
            .post(&format!("/gardens/{garden_id}/plants"))
            .authorization_bearer(token)
            .json(&PlantCreateRequest {
                alias: "tomatera".to_string(),
                scientific_name_without_author: "Solanum lycopersicum".to_string(),
                genus: "Solanum".to_string(),
                family: "Solanaceae".to_string(),
                common_names: vec!["tomate".to_string()],
                image_url: None,
            })
            .await;
        let plant: serde_json::Value = response.json();
        plant["id"].as_str().unwrap().to_string()
    }

    #[sqlx::test]
    async fn test_create_and_list_notes_ordered_by_observation(pool: PgPool) {
        let server = create_test_app(pool);
        let pair = register_and_login(&server, "a@x.com", "au", "Test1234!").await;
        let plant_id = create_plant(&server, &pair.access_token).await;

        let older = Utc::now() - Duration::days(2);
        let newer = Utc::now() - Duration::hours(1);

        for (text, date) in [("Primera hoja", older), ("Primera flor", newer)] {
            let response = server
                .post(&format!("/plants/{plant_id}/notes"))
                .authorization_bearer(&pair.access_token)
                .json(&serde_json::json!({ "text": text, "observation_date": date }))
                .await;
            response.assert_status(StatusCode::CREATED);
        }

        let response = server
            .get(&format!("/plants/{plant_id}/notes"))
            .authorization_bearer(&pair.access_token)
            .await;
        response.assert_status_ok();
        let notes: serde_json::Value = response.json();
        let notes = notes.as_array().unwrap();
        assert_eq!(notes.len(), 2);
        // Newest observation first
        assert_eq!(notes[0]["text"], "Primera flor");
        assert_eq!(notes[1]["text"], "Primera hoja");
    }

    #[sqlx::test]
    async fn test_note_text_is_validated(pool: PgPool) {
        let server = create_test_app(pool);
        let pair = register_and_login(&server, "a@x.com", "au", "Test1234!").await;
        let plant_id = create_plant(&server, &pair.access_token).await;

        for text in ["", "  ", "ab"] {
            let response = server
                .post(&format!("/plants/{plant_id}/notes"))
                .authorization_bearer(&pair.access_token)
                .json(&serde_json::json!({ "text": text, "observation_date": Utc::now() }))
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[sqlx::test]
    async fn test_note_requires_existing_plant(pool: PgPool) {
        let server = create_test_app(pool);
        let pair = register_and_login(&server, "a@x.com", "au", "Test1234!").await;

        let response = server
            .post(&format!("/plants/{}/notes", uuid::Uuid::new_v4()))
            .authorization_bearer(&pair.access_token)
            .json(&serde_json::json!({ "text": "Sin planta", "observation_date": Utc::now() }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_update_and_delete_note(pool: PgPool) {
        let server = create_test_app(pool);
        let pair = register_and_login(&server, "a@x.com", "au", "Test1234!").await;
        let plant_id = create_plant(&server, &pair.access_token).await;

        let response = server
            .post(&format!("/plants/{plant_id}/notes"))
            .authorization_bearer(&pair.access_token)
            .json(&serde_json::json!({ "text": "Hojas amarillas", "observation_date": Utc::now() }))
            .await;
        let note: serde_json::Value = response.json();
        let note_id = note["id"].as_str().unwrap().to_string();

        let response = server
            .put(&format!("/notes/{note_id}"))
            .authorization_bearer(&pair.access_token)
            .json(&serde_json::json!({ "text": "Hojas verdes de nuevo" }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["text"], "Hojas verdes de nuevo");

        let response = server
            .delete(&format!("/notes/{note_id}"))
            .authorization_bearer(&pair.access_token)
            .await;
        response.assert_status_ok();

        let response = server
            .delete(&format!("/notes/{note_id}"))
            .authorization_bearer(&pair.access_token)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
