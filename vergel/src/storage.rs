//! Object storage for garden and plant images.
//!
//! Thin wrapper over the S3 SDK: validate the upload, write it under a
//! caller-chosen folder, and hand back the public URL. Oversize and
//! unsupported uploads are rejected before touching the network.

use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::instrument;
use uuid::Uuid;

use crate::{config::Config, errors::Error};

/// Folder prefix for garden images; plant images nest beneath their garden.
pub const GARDEN_IMAGES_FOLDER: &str = "gardens";

const ALLOWED_CONTENT_TYPES: &[(&str, &str)] = &[("image/jpeg", "jpg"), ("image/png", "png")];

pub struct StorageService {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
    max_image_bytes: u64,
}

impl StorageService {
    pub async fn new(config: &Config) -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        Self {
            client: aws_sdk_s3::Client::new(&aws_config),
            bucket: config.storage.bucket.clone(),
            public_base_url: config.storage.public_base_url.trim_end_matches('/').to_string(),
            max_image_bytes: config.storage.max_image_bytes,
        }
    }

    /// Upload an image and return its public URL.
    #[instrument(skip(self, data), fields(folder, content_type, size = data.len()), err)]
    pub async fn upload_image(&self, data: Bytes, content_type: &str, folder: &str) -> Result<String, Error> {
        let extension = validate_image(&data, content_type, self.max_image_bytes)?;

        let key = format!("{}/{}.{}", folder.trim_matches('/'), Uuid::new_v4(), extension);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Image upload failed: {e}");
                Error::Internal {
                    operation: "upload image to object storage".to_string(),
                }
            })?;

        Ok(format!("{}/{}", self.public_base_url, key))
    }
}

/// Check size and content type; returns the file extension for the key.
pub fn validate_image(data: &Bytes, content_type: &str, max_bytes: u64) -> Result<&'static str, Error> {
    if data.is_empty() {
        return Err(Error::BadRequest {
            message: "El archivo está vacío".to_string(),
        });
    }
    if data.len() as u64 > max_bytes {
        return Err(Error::BadRequest {
            message: format!(
                "La imagen es demasiado grande. El tamaño máximo es {} MB",
                max_bytes / (1024 * 1024)
            ),
        });
    }
    ALLOWED_CONTENT_TYPES
        .iter()
        .find(|(ct, _)| *ct == content_type)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| Error::BadRequest {
            message: "Formato de imagen no soportado. Use JPEG o PNG".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_jpeg_and_png() {
        let data = Bytes::from_static(&[0xff, 0xd8, 0xff]);
        assert_eq!(validate_image(&data, "image/jpeg", 1024).unwrap(), "jpg");
        assert_eq!(validate_image(&data, "image/png", 1024).unwrap(), "png");
    }

    #[test]
    fn rejects_unsupported_types() {
        let data = Bytes::from_static(b"GIF89a");
        let err = validate_image(&data, "image/gif", 1024).unwrap_err();
        assert!(err.user_message().contains("JPEG o PNG"));
    }

    #[test]
    fn rejects_oversize_images() {
        let data = Bytes::from(vec![0u8; 2048]);
        let err = validate_image(&data, "image/png", 1024).unwrap_err();
        assert!(err.user_message().contains("demasiado grande"));
    }

    #[test]
    fn rejects_empty_files() {
        let data = Bytes::new();
        assert!(validate_image(&data, "image/png", 1024).is_err());
    }
}
