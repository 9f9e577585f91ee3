//! Database models for users.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::{auth::rate_limit::ThrottleState, types::UserId};

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub is_superuser: bool,
}

/// Database request for updating a user.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub password_hash: Option<String>,
}

/// A users-table row.
#[derive(Debug, Clone, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub reset_attempts: i32,
    pub last_reset_attempt: Option<DateTime<Utc>>,
    pub reset_lockout_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDBResponse {
    /// The reset-throttle portion of the row, for the rate limiter.
    pub fn throttle_state(&self) -> ThrottleState {
        ThrottleState::new(self.reset_attempts, self.last_reset_attempt, self.reset_lockout_until)
    }
}
