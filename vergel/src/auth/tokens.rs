//! Signed token issuance and verification.
//!
//! Three token kinds share one JWT shape: short-lived access tokens,
//! longer-lived refresh tokens, and single-use password-reset tokens. Every
//! token carries its kind, its issuance time, and the generation counter it
//! was minted under (see [`crate::db::handlers::used_tokens`]).

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{config::Config, errors::Error, types::UserId};

/// The purpose a token was minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    PasswordReset,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
            TokenKind::PasswordReset => "password_reset",
        }
    }

    /// Spanish phrase used when a token of the wrong kind is presented.
    fn required_message(&self) -> &'static str {
        match self {
            TokenKind::Access => "Token inválido: se requiere un token de acceso",
            TokenKind::Refresh => "Token inválido: se requiere un token de refresco",
            TokenKind::PasswordReset => "Token inválido: se requiere un token de restablecimiento",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims shared by all token kinds.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: UserId,
    /// Token purpose tag
    pub kind: TokenKind,
    /// Generation counter at issuance
    pub gen: i64,
    /// Expiration time (unix seconds)
    pub exp: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
}

fn secret_key(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "token signing: secret_key is required".to_string(),
    })
}

/// Mint a signed token of the given kind for a user.
///
/// Expiry is now + the configured duration for the kind. The caller supplies
/// the generation counter the token is minted under.
pub fn issue(user_id: UserId, kind: TokenKind, generation: i64, config: &Config) -> Result<String, Error> {
    let duration = match kind {
        TokenKind::Access => config.auth.tokens.access_token_duration,
        TokenKind::Refresh => config.auth.tokens.refresh_token_duration,
        TokenKind::PasswordReset => config.auth.tokens.password_reset_token_duration,
    };

    let now = Utc::now();
    let exp = now + chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::minutes(30));

    let claims = Claims {
        sub: user_id,
        kind,
        gen: generation,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("sign token: {e}"),
    })
}

/// Verify signature and expiry, and check the token carries the expected kind.
pub fn verify(token: &str, expected: TokenKind, config: &Config) -> Result<Claims, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());
    let validation = Validation::default();

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => Error::TokenExpired,

        // Client errors - malformed tokens, bad signatures, missing claims
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::InvalidToken { message: None },

        // Server-side key problems
        _ => Error::Internal {
            operation: format!("token verification: {e}"),
        },
    })?;

    if data.claims.kind != expected {
        return Err(Error::InvalidToken {
            message: Some(expected.required_message().to_string()),
        });
    }

    Ok(data.claims)
}

/// SHA-256 fingerprint of the raw token string, hex encoded.
///
/// The consumed-token ledger stores fingerprints, never raw tokens.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_config() -> Config {
        Config {
            secret_key: Some("test-secret-key-for-tokens".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let token = issue(user_id, TokenKind::Access, 0, &config).unwrap();
        let claims = verify(&token, TokenKind::Access, &config).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.gen, 0);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_kind_mismatch_is_invalid() {
        let config = test_config();
        let token = issue(Uuid::new_v4(), TokenKind::Refresh, 0, &config).unwrap();

        let err = verify(&token, TokenKind::Access, &config).unwrap_err();
        assert!(matches!(err, Error::InvalidToken { .. }));
        assert!(err.user_message().contains("token de acceso"));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let config = test_config();
        let token = issue(Uuid::new_v4(), TokenKind::Access, 0, &config).unwrap();

        let other = Config {
            secret_key: Some("a-different-secret".to_string()),
            ..Default::default()
        };
        let err = verify(&token, TokenKind::Access, &other).unwrap_err();
        assert!(matches!(err, Error::InvalidToken { .. }));
    }

    #[test]
    fn test_expired_token() {
        let config = test_config();
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            kind: TokenKind::PasswordReset,
            gen: 1,
            exp: (now - chrono::Duration::hours(1)).timestamp(),
            iat: (now - chrono::Duration::hours(2)).timestamp(),
        };
        let key = EncodingKey::from_secret(config.secret_key.as_ref().unwrap().as_bytes());
        let token = encode(&Header::default(), &claims, &key).unwrap();

        let err = verify(&token, TokenKind::PasswordReset, &config).unwrap_err();
        assert!(matches!(err, Error::TokenExpired));
    }

    #[test]
    fn test_malformed_tokens() {
        let config = test_config();
        for token in ["not.a.token", "invalid", "", "too.many.parts.in.this.token"] {
            let err = verify(token, TokenKind::Access, &config).unwrap_err();
            assert!(
                matches!(err, Error::InvalidToken { .. }),
                "expected InvalidToken for {token:?}"
            );
        }
    }

    #[test]
    fn test_fingerprint_is_stable_and_hex() {
        let a = fingerprint("some-token");
        let b = fingerprint("some-token");
        let c = fingerprint("other-token");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}
