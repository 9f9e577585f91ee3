//! Plant identification endpoint: validates uploaded images and forwards
//! them to the configured identification API.

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::{
    api::models::users::CurrentUser,
    errors::Error,
    identify::{IdentificationClient, IdentificationImage},
    AppState,
};

const ACCEPTED_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Pull the `images` parts out of the multipart body, enforcing count,
/// content type and size limits.
async fn collect_images(state: &AppState, multipart: &mut Multipart) -> Result<Vec<IdentificationImage>, Error> {
    let limits = &state.config.identification;
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Formulario multipart inválido: {e}"),
    })? {
        if field.name() != Some("images") {
            continue;
        }

        if images.len() >= limits.max_images {
            return Err(Error::BadRequest {
                message: format!("Demasiadas imágenes. El máximo permitido es {}", limits.max_images),
            });
        }

        let index = images.len() + 1;
        let filename = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();

        if !ACCEPTED_TYPES.contains(&content_type.as_str()) {
            return Err(Error::BadRequest {
                message: format!("Formato de imagen no soportado en imagen {index}. Use JPEG o PNG"),
            });
        }

        let data = field.bytes().await.map_err(|e| Error::BadRequest {
            message: format!("No se pudo leer la imagen {index}: {e}"),
        })?;

        if data.len() as u64 > limits.max_image_bytes {
            return Err(Error::BadRequest {
                message: format!(
                    "La imagen {index} es demasiado grande. El tamaño máximo es {} MB",
                    limits.max_image_bytes / (1024 * 1024)
                ),
            });
        }

        images.push(IdentificationImage {
            filename,
            content_type,
            data: data.to_vec(),
        });
    }

    if images.is_empty() {
        return Err(Error::BadRequest {
            message: "Debe proporcionar al menos una imagen".to_string(),
        });
    }

    Ok(images)
}

/// Identify a plant from one or more images
#[utoipa::path(
    post,
    path = "/identify",
    tag = "plants",
    responses(
        (status = 200, description = "Identificación exitosa"),
        (status = 400, description = "Parámetros inválidos"),
        (status = 401, description = "No autenticado"),
        (status = 403, description = "Usuario inactivo"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn identify_plant(
    State(state): State<AppState>,
    current_user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, Error> {
    if !current_user.is_active {
        return Err(Error::Forbidden {
            message: "Usuario inactivo".to_string(),
        });
    }

    let images = collect_images(&state, &mut multipart).await?;

    let client = IdentificationClient::new(state.config.identification.clone());
    let result = client.identify(images).await?;

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_app, register_and_login};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use sqlx::PgPool;

    fn jpeg_part() -> Part {
        Part::bytes(vec![0xff, 0xd8, 0xff, 0xe0]).file_name("leaf.jpg").mime_type("image/jpeg")
    }

    #[sqlx::test]
    async fn test_identify_requires_at_least_one_image(pool: PgPool) {
        let server = create_test_app(pool);
        let pair = register_and_login(&server, "a@x.com", "au", "Test1234!").await;

        let response = server
            .post("/identify")
            .authorization_bearer(&pair.access_token)
            .multipart(MultipartForm::new().add_text("organs", "auto"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Debe proporcionar al menos una imagen");
    }

    #[sqlx::test]
    async fn test_identify_rejects_too_many_images(pool: PgPool) {
        let server = create_test_app(pool);
        let pair = register_and_login(&server, "a@x.com", "au", "Test1234!").await;

        let mut form = MultipartForm::new();
        for _ in 0..6 {
            form = form.add_part("images", jpeg_part());
        }

        let response = server
            .post("/identify")
            .authorization_bearer(&pair.access_token)
            .multipart(form)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["message"].as_str().unwrap().contains("Demasiadas imágenes"));
    }

    #[sqlx::test]
    async fn test_identify_rejects_unsupported_content_type(pool: PgPool) {
        let server = create_test_app(pool);
        let pair = register_and_login(&server, "a@x.com", "au", "Test1234!").await;

        let part = Part::bytes(b"GIF89a".to_vec()).file_name("anim.gif").mime_type("image/gif");
        let response = server
            .post("/identify")
            .authorization_bearer(&pair.access_token)
            .multipart(MultipartForm::new().add_part("images", part))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["message"].as_str().unwrap().contains("Formato de imagen no soportado"));
    }

    #[sqlx::test]
    async fn test_identify_rejects_inactive_users(pool: PgPool) {
        let server = create_test_app(pool.clone());
        let pair = register_and_login(&server, "a@x.com", "au", "Test1234!").await;

        sqlx::query("UPDATE users SET is_active = FALSE WHERE username = 'au'")
            .execute(&pool)
            .await
            .unwrap();

        let response = server
            .post("/identify")
            .authorization_bearer(&pair.access_token)
            .multipart(MultipartForm::new().add_part("images", jpeg_part()))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Usuario inactivo");
    }
}
