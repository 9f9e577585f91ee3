//! Axum route handlers for all API endpoints.

use axum::extract::Multipart;
use bytes::Bytes;
use std::collections::HashMap;

use crate::errors::Error;

pub mod auth;
pub mod gardens;
pub mod identify;
pub mod notes;
pub mod plants;
pub mod posts;

/// An image file pulled out of a multipart form.
pub(crate) struct UploadedImage {
    pub data: Bytes,
    pub content_type: String,
}

/// Text fields plus an optional `image` file from a multipart form.
pub(crate) struct ImageForm {
    pub text: HashMap<String, String>,
    pub image: Option<UploadedImage>,
}

impl ImageForm {
    /// A text field, treating empty/whitespace-only values as absent.
    pub fn text_field(&self, name: &str) -> Option<String> {
        self.text
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Drain a multipart form into text fields and at most one `image` file.
pub(crate) async fn read_image_form(multipart: &mut Multipart) -> Result<ImageForm, Error> {
    let mut text = HashMap::new();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Formulario multipart inválido: {e}"),
    })? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "image" {
            // An empty filename means the file input was left blank
            if field.file_name().map(str::is_empty).unwrap_or(true) {
                continue;
            }
            let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
            let data = field.bytes().await.map_err(|e| Error::BadRequest {
                message: format!("No se pudo leer la imagen: {e}"),
            })?;
            image = Some(UploadedImage { data, content_type });
        } else {
            let value = field.text().await.map_err(|e| Error::BadRequest {
                message: format!("No se pudo leer el campo '{name}': {e}"),
            })?;
            text.insert(name, value);
        }
    }

    Ok(ImageForm { text, image })
}
