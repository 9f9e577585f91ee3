//! API request/response models for authentication.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request to register a new user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Email address (must be unique)
    pub email: String,
    /// Username (must be unique)
    pub username: String,
    /// Password (will be hashed)
    pub password: String,
    /// Optional full name
    pub full_name: Option<String>,
}

/// Request to obtain a token pair
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email address or username
    pub username_or_email: String,
    /// Password
    pub password: String,
}

/// Access + refresh token pair
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Always "bearer"
    pub token_type: String,
}

impl TokenPairResponse {
    pub fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Form payload for `POST /auth/refresh`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request to initiate a password reset
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PasswordResetRequest {
    /// Email address to send the reset link to
    pub email: String,
}

/// Request to complete a password reset
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PasswordResetConfirmRequest {
    /// Reset token from the email link
    pub token: String,
    /// New password
    pub new_password: String,
}

/// Query string of the reset-form page
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PasswordResetFormQuery {
    pub token: Option<String>,
}
