//! HTTP API layer: route handlers and the request/response models that make
//! up the public contract.
//!
//! - **[`handlers`]**: axum route handlers per resource
//! - **[`models`]**: serde/utoipa request and response structures
//!
//! All endpoints are annotated with `utoipa` and collected into the OpenAPI
//! document served at `/docs`.

pub mod handlers;
pub mod models;
