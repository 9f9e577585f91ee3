//! Database models for the credential-lifecycle ledgers: password history,
//! consumed tokens, and per-kind generation counters.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::UserId;

/// One entry of the append-only password-history log.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordHistoryEntry {
    pub id: Uuid,
    pub user_id: UserId,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// One consumed token, stored by SHA-256 fingerprint.
#[derive(Debug, Clone, FromRow)]
pub struct UsedTokenEntry {
    pub id: Uuid,
    pub user_id: UserId,
    pub token_hash: String,
    pub kind: String,
    pub used_at: DateTime<Utc>,
}
