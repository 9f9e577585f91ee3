//! API request and response data models.
//!
//! These structures define the public API contract: serde for
//! (de)serialization, utoipa annotations for the OpenAPI document. They are
//! kept separate from the database models in [`crate::db::models`] so the
//! wire format and the storage format can evolve independently.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod auth;
pub mod gardens;
pub mod notes;
pub mod pagination;
pub mod plants;
pub mod posts;
pub mod users;

/// Generic `{"message": ...}` confirmation body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
