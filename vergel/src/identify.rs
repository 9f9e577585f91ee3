//! Client for the plant-identification API.
//!
//! One outbound multipart request per identification: every image is
//! attached as an `images` part with an accompanying `organs=auto` part, and
//! the API's JSON answer is relayed untouched.

use reqwest::multipart;
use tracing::instrument;

use crate::{config::IdentificationConfig, errors::Error};

/// One image submitted for identification.
#[derive(Debug, Clone)]
pub struct IdentificationImage {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Clone)]
pub struct IdentificationClient {
    http: reqwest::Client,
    config: IdentificationConfig,
}

impl IdentificationClient {
    pub fn new(config: IdentificationConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Submit images and return the API's JSON response.
    #[instrument(skip(self, images), fields(count = images.len()), err)]
    pub async fn identify(&self, images: Vec<IdentificationImage>) -> Result<serde_json::Value, Error> {
        let mut form = multipart::Form::new();
        for image in images {
            let part = multipart::Part::bytes(image.data)
                .file_name(image.filename)
                .mime_str(&image.content_type)
                .map_err(|e| Error::Internal {
                    operation: format!("build multipart image part: {e}"),
                })?;
            form = form.part("images", part).text("organs", "auto");
        }

        let include_related = if self.config.include_related { "true" } else { "false" };
        let nb_results = self.config.nb_results.to_string();

        let response = self
            .http
            .post(self.config.api_url.clone())
            .query(&[
                ("include-related-images", include_related),
                ("no-reject", "false"),
                ("nb-results", nb_results.as_str()),
                ("lang", self.config.language.as_str()),
                ("api-key", self.config.api_key.as_str()),
            ])
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Identification API request failed: {e}");
                Error::Internal {
                    operation: "call identification API".to_string(),
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            // The API answers 404 when no species matches
            return Err(Error::NotFound {
                resource: "Especie".to_string(),
            });
        }
        if !status.is_success() {
            tracing::error!("Identification API returned {status}");
            return Err(Error::Internal {
                operation: "identification API returned an error".to_string(),
            });
        }

        response.json().await.map_err(|e| Error::Internal {
            operation: format!("decode identification API response: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentificationConfig;
    use url::Url;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_image() -> IdentificationImage {
        IdentificationImage {
            filename: "leaf.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            data: vec![0xff, 0xd8, 0xff, 0xe0],
        }
    }

    fn client_for(server: &MockServer) -> IdentificationClient {
        IdentificationClient::new(IdentificationConfig {
            api_url: Url::parse(&format!("{}/v2/identify/all", server.uri())).unwrap(),
            api_key: "test-key".to_string(),
            nb_results: 3,
            language: "es".to_string(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn relays_successful_responses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/identify/all"))
            .and(query_param("api-key", "test-key"))
            .and(query_param("lang", "es"))
            .and(query_param("nb-results", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"species": {"scientificNameWithoutAuthor": "Rosa canina"}, "score": 0.91}]
            })))
            .mount(&server)
            .await;

        let result = client_for(&server).identify(vec![test_image()]).await.unwrap();
        assert_eq!(
            result["results"][0]["species"]["scientificNameWithoutAuthor"],
            "Rosa canina"
        );
    }

    #[tokio::test]
    async fn maps_404_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server).identify(vec![test_image()]).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn maps_server_errors_to_internal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).identify(vec![test_image()]).await.unwrap_err();
        assert!(matches!(err, Error::Internal { .. }));
    }
}
