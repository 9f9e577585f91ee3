use crate::db::errors::DbError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error as ThisError;

/// Service-level error type.
///
/// The auth-specific variants mirror the failure taxonomy of the credential
/// lifecycle (invalid credentials, expired/replayed tokens, reuse of recent
/// passwords, reset throttling). Each variant maps to a fixed status code
/// and a user-facing message; nothing is retried internally.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Login or password verification failed
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Token subject does not resolve to a user
    #[error("User not found")]
    UserNotFound,

    /// Registration collided with an existing email or username
    #[error("User already exists")]
    UserAlreadyExists,

    /// Token failed signature/kind/claim checks, was replayed, or superseded
    #[error("Invalid token")]
    InvalidToken { message: Option<String> },

    /// Token signature is fine but `exp` has passed
    #[error("Token has expired")]
    TokenExpired,

    /// Proposed password matches one of the recent history entries
    #[error("Password matches a recent password")]
    PasswordHistoryViolation,

    /// Reset requests are throttled for this user
    #[error("Rate limit exceeded, retry in {retry_after_minutes} minutes")]
    RateLimitExceeded { retry_after_minutes: i64 },

    /// Proposed password fails the strength rules
    #[error("{message}")]
    WeakPassword { message: String },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Authenticated user does not own the resource
    #[error("{message}")]
    Forbidden { message: String },

    /// Requested resource not found
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::UserNotFound => StatusCode::UNAUTHORIZED,
            Error::UserAlreadyExists => StatusCode::BAD_REQUEST,
            Error::InvalidToken { .. } => StatusCode::UNAUTHORIZED,
            Error::TokenExpired => StatusCode::UNAUTHORIZED,
            Error::PasswordHistoryViolation => StatusCode::BAD_REQUEST,
            Error::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::WeakPassword { .. } => StatusCode::BAD_REQUEST,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the user-facing (Spanish) message, without leaking internal detail
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidCredentials => "Credenciales inválidas".to_string(),
            Error::UserNotFound => "Usuario no encontrado".to_string(),
            Error::UserAlreadyExists => "El usuario ya existe".to_string(),
            Error::InvalidToken { message } => message
                .clone()
                .unwrap_or_else(|| "Token inválido".to_string()),
            Error::TokenExpired => "El token ha expirado".to_string(),
            Error::PasswordHistoryViolation => {
                "La nueva contraseña no puede coincidir con ninguna de tus contraseñas recientes".to_string()
            }
            Error::RateLimitExceeded { retry_after_minutes } => format!(
                "Demasiados intentos de restablecimiento. Inténtalo de nuevo en {retry_after_minutes} minutos"
            ),
            Error::WeakPassword { message } => message.clone(),
            Error::BadRequest { message } => message.clone(),
            Error::Forbidden { message } => message.clone(),
            Error::NotFound { resource } => format!("{resource} no encontrado"),
            Error::Internal { .. } => "Error interno del servidor".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Recurso no encontrado".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => {
                    match (table.as_deref(), constraint.as_deref()) {
                        (Some("users"), Some(c)) if c.contains("email") => {
                            "Ya existe una cuenta con este correo electrónico".to_string()
                        }
                        (Some("users"), Some(c)) if c.contains("username") => {
                            "Este nombre de usuario ya está en uso".to_string()
                        }
                        (Some("gardens"), _) => "Ya existe un jardín con ese nombre".to_string(),
                        (Some("plants"), _) => {
                            "Ya existe una planta con ese alias para este usuario".to_string()
                        }
                        _ => "El recurso ya existe".to_string(),
                    }
                }
                DbError::ForeignKeyViolation { .. } => "Referencia inválida a un recurso relacionado".to_string(),
                DbError::CheckViolation { .. } => "Datos inválidos".to_string(),
                DbError::Other(_) => "Error de base de datos".to_string(),
            },
            Error::Other(_) => "Error interno del servidor".to_string(),
        }
    }

    /// Demote this error to a 400 with the same user message.
    ///
    /// The password-reset confirmation endpoint reports every gate failure
    /// (invalid/expired/replayed token, weak or reused password) as a plain
    /// 400, matching the contract of the original router.
    pub fn into_bad_request(self) -> Error {
        match self {
            Error::InvalidToken { .. }
            | Error::TokenExpired
            | Error::PasswordHistoryViolation
            | Error::WeakPassword { .. }
            | Error::InvalidCredentials => Error::BadRequest {
                message: self.user_message(),
            },
            other => other,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - level depends on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::InvalidCredentials
            | Error::UserNotFound
            | Error::InvalidToken { .. }
            | Error::TokenExpired => {
                tracing::info!("Authentication error: {}", self);
            }
            Error::RateLimitExceeded { .. } => {
                tracing::info!("Throttled request: {}", self);
            }
            _ => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = Json(json!({ "message": self.user_message() }));

        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_status_codes() {
        assert_eq!(Error::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::UserAlreadyExists.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::PasswordHistoryViolation.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::RateLimitExceeded { retry_after_minutes: 5 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn rate_limit_message_includes_remaining_minutes() {
        let err = Error::RateLimitExceeded { retry_after_minutes: 12 };
        assert!(err.user_message().contains("12 minutos"));
    }

    #[test]
    fn reset_gate_errors_demote_to_bad_request() {
        for err in [
            Error::InvalidToken { message: None },
            Error::TokenExpired,
            Error::PasswordHistoryViolation,
            Error::WeakPassword {
                message: "corta".to_string(),
            },
        ] {
            let demoted = err.into_bad_request();
            assert_eq!(demoted.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn not_found_keeps_its_status() {
        let err = Error::NotFound {
            resource: "Jardín".to_string(),
        };
        assert_eq!(err.into_bad_request().status_code(), StatusCode::NOT_FOUND);
    }
}
