//! Token-usage ledger.
//!
//! Two mechanisms gate token redemption:
//!
//! - `used_tokens` records the SHA-256 fingerprint of every consumed token.
//!   A fingerprint already present means the token is being replayed.
//! - `token_generations` holds a per-(user, kind) counter. Tokens embed the
//!   counter value current at mint time in their `gen` claim; bumping the
//!   counter retroactively voids every outstanding token of that kind minted
//!   under an earlier generation. Issuing a new password-reset token bumps
//!   the counter first, so only the newest reset link can be redeemed.
//!
//! Both checks fail closed: a token the caller cannot decode never reaches
//! this layer and is rejected upstream.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::tokens::{fingerprint, TokenKind},
    db::{errors::Result, models::tokens::UsedTokenEntry},
    types::{abbrev_uuid, UserId},
};

pub struct UsedTokens<'c> {
    db: &'c mut PgConnection,
}

impl<'c> UsedTokens<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Record a token as consumed.
    #[instrument(skip(self, token), fields(user_id = %abbrev_uuid(&user_id), kind = %kind), err)]
    pub async fn mark_used(&mut self, token: &str, kind: TokenKind, user_id: UserId) -> Result<UsedTokenEntry> {
        let entry = sqlx::query_as::<_, UsedTokenEntry>(
            r#"
            INSERT INTO used_tokens (id, user_id, token_hash, kind)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(fingerprint(token))
        .bind(kind.as_str())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(entry)
    }

    /// Whether the token's fingerprint is already in the ledger.
    #[instrument(skip(self, token), err)]
    pub async fn is_replayed(&mut self, token: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM used_tokens WHERE token_hash = $1)")
            .bind(fingerprint(token))
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exists)
    }

    /// Current generation counter for (user, kind); 0 if never bumped.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), kind = %kind), err)]
    pub async fn current_generation(&mut self, user_id: UserId, kind: TokenKind) -> Result<i64> {
        let generation =
            sqlx::query_scalar::<_, i64>("SELECT generation FROM token_generations WHERE user_id = $1 AND kind = $2")
                .bind(user_id)
                .bind(kind.as_str())
                .fetch_optional(&mut *self.db)
                .await?;

        Ok(generation.unwrap_or(0))
    }

    /// Bump the generation counter for (user, kind), voiding all outstanding
    /// tokens of that kind, and return the new generation.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), kind = %kind), err)]
    pub async fn bump_generation(&mut self, user_id: UserId, kind: TokenKind) -> Result<i64> {
        let generation = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO token_generations (user_id, kind, generation)
            VALUES ($1, $2, 1)
            ON CONFLICT (user_id, kind)
            DO UPDATE SET generation = token_generations.generation + 1, updated_at = NOW()
            RETURNING generation
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(generation)
    }

    /// Ledger validity of a decoded token: not replayed, and minted under
    /// the current generation.
    #[instrument(skip(self, token), fields(user_id = %abbrev_uuid(&user_id), kind = %kind), err)]
    pub async fn is_valid(&mut self, token: &str, user_id: UserId, kind: TokenKind, token_generation: i64) -> Result<bool> {
        if self.is_replayed(token).await? {
            return Ok(false);
        }
        let current = self.current_generation(user_id, kind).await?;
        Ok(token_generation >= current)
    }
}
