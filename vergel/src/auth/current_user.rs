//! Extractor for the authenticated user.
//!
//! Handlers take a [`CurrentUser`] argument; the extractor pulls the bearer
//! access token from the `Authorization` header, verifies it, and loads the
//! user it names. A missing or wrong-kind token rejects with 401 before the
//! handler runs.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::instrument;

use crate::{
    api::models::users::CurrentUser,
    auth::tokens::{self, TokenKind},
    db::handlers::{Repository, Users},
    errors::Error,
    AppState,
};

fn bearer_token(parts: &Parts) -> Result<&str, Error> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(Error::InvalidToken {
            message: Some("No autenticado".to_string()),
        })?;

    header.strip_prefix("Bearer ").ok_or(Error::InvalidToken {
        message: Some("No autenticado".to_string()),
    })
}

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = bearer_token(parts)?;
        let claims = tokens::verify(token, TokenKind::Access, &state.config)?;

        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let user = Users::new(&mut conn)
            .get_by_id(claims.sub)
            .await?
            .ok_or(Error::UserNotFound)?;

        Ok(CurrentUser::from(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("/auth/me");
        if let Some(v) = value {
            builder = builder.header(axum::http::header::AUTHORIZATION, v);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn missing_header_is_rejected() {
        let parts = parts_with_auth(None);
        assert!(bearer_token(&parts).is_err());
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));
        assert!(bearer_token(&parts).is_err());
    }

    #[test]
    fn bearer_token_is_extracted() {
        let parts = parts_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");
    }
}
