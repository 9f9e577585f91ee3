//! Append-only password-history ledger.
//!
//! Every successful password set (registration, profile update, reset)
//! appends a row. The reuse guard reads the newest N entries and rejects a
//! candidate password that verifies against any of them. Rows are never
//! mutated; they only disappear with the owning user.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::{errors::Result, models::tokens::PasswordHistoryEntry},
    types::{abbrev_uuid, UserId},
};

pub struct PasswordHistory<'c> {
    db: &'c mut PgConnection,
}

impl<'c> PasswordHistory<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Append a hash to the user's history.
    #[instrument(skip(self, password_hash), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn record(&mut self, user_id: UserId, password_hash: &str) -> Result<PasswordHistoryEntry> {
        let entry = sqlx::query_as::<_, PasswordHistoryEntry>(
            r#"
            INSERT INTO password_history (id, user_id, password_hash)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(password_hash)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(entry)
    }

    /// The newest `limit` entries, most recent first.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), limit), err)]
    pub async fn recent(&mut self, user_id: UserId, limit: i64) -> Result<Vec<PasswordHistoryEntry>> {
        let entries = sqlx::query_as::<_, PasswordHistoryEntry>(
            r#"
            SELECT * FROM password_history
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(entries)
    }
}
