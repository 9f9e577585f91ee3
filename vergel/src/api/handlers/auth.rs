//! Authentication endpoints: registration, login, token refresh, the
//! password-reset lifecycle, and the current-user profile.
//!
//! Every mutating flow runs inside a single transaction committed at the
//! end; email dispatch happens after commit, directly on the request path.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    Form, Json,
};
use chrono::Utc;

use crate::{
    api::models::{
        auth::{
            LoginRequest, PasswordResetConfirmRequest, PasswordResetFormQuery, PasswordResetRequest, RefreshRequest,
            RegisterRequest, TokenPairResponse,
        },
        users::{CurrentUser, UserResponse, UserUpdateRequest},
        MessageResponse,
    },
    auth::{
        password::{self, Argon2Params},
        rate_limit::{self, Decision},
        tokens::{self, TokenKind},
        validate,
    },
    db::{
        handlers::{PasswordHistory, Repository, UsedTokens, Users},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    email::EmailService,
    errors::Error,
    AppState,
};

/// Generic response for reset requests, identical whether or not the
/// account exists.
const RESET_REQUESTED_MESSAGE: &str = "Si el correo existe, se ha enviado un enlace para restablecer la contraseña";

/// Hash a password on a blocking thread to avoid stalling the async runtime.
async fn hash_password_blocking(password: String, params: Argon2Params) -> Result<String, Error> {
    tokio::task::spawn_blocking(move || password::hash_password_with_params(&password, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })?
}

/// Verify a password on a blocking thread.
async fn verify_password_blocking(password: String, hash: String) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })?
}

/// Reject a candidate password that verifies against any recent history hash.
async fn guard_password_history(candidate: String, recent_hashes: Vec<String>) -> Result<(), Error> {
    let reused = tokio::task::spawn_blocking(move || -> Result<bool, Error> {
        for hash in &recent_hashes {
            if password::verify_password(&candidate, hash)? {
                return Ok(true);
            }
        }
        Ok(false)
    })
    .await
    .map_err(|e| Error::Internal {
        operation: format!("spawn password history check task: {e}"),
    })??;

    if reused {
        return Err(Error::PasswordHistoryViolation);
    }
    Ok(())
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "auth",
    responses(
        (status = 201, description = "Usuario creado", body = UserResponse),
        (status = 400, description = "Datos inválidos o usuario duplicado"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), Error> {
    validate::validate_email(&request.email)?;
    validate::validate_username(&request.username)?;
    validate::validate_password(&request.password, &state.config.auth.password)?;

    let password_hash = hash_password_blocking(request.password.clone(), (&state.config.auth.password).into()).await?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    // Note: these duplicate checks reveal account existence. The
    // reset-request path deliberately does not.
    let mut users = Users::new(&mut tx);
    if users.get_by_email(&request.email).await?.is_some()
        || users.get_by_identifier(&request.username).await?.is_some()
    {
        return Err(Error::UserAlreadyExists);
    }

    let created = users
        .create(&UserCreateDBRequest {
            email: request.email,
            username: request.username,
            password_hash: password_hash.clone(),
            full_name: request.full_name,
            is_superuser: false,
        })
        .await?;

    PasswordHistory::new(&mut tx).record(created.id, &password_hash).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    // Delivery failure must not undo the registration
    let email_service = EmailService::new(&state.config)?;
    if let Err(e) = email_service.send_welcome_email(&created.email, &created.username).await {
        tracing::warn!("Failed to send welcome email: {e}");
    }

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

/// Exchange credentials for an access/refresh token pair
#[utoipa::path(
    post,
    path = "/auth/token",
    request_body = LoginRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Credenciales válidas", body = TokenPairResponse),
        (status = 401, description = "Credenciales inválidas"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<TokenPairResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let user = Users::new(&mut conn)
        .get_by_identifier(&request.username_or_email)
        .await?
        .ok_or(Error::InvalidCredentials)?;

    if !user.is_active {
        return Err(Error::InvalidCredentials);
    }

    let is_valid = verify_password_blocking(request.password, user.password_hash.clone()).await?;
    if !is_valid {
        return Err(Error::InvalidCredentials);
    }

    let mut ledger = UsedTokens::new(&mut conn);
    let access_gen = ledger.current_generation(user.id, TokenKind::Access).await?;
    let refresh_gen = ledger.current_generation(user.id, TokenKind::Refresh).await?;

    let access = tokens::issue(user.id, TokenKind::Access, access_gen, &state.config)?;
    let refresh = tokens::issue(user.id, TokenKind::Refresh, refresh_gen, &state.config)?;

    Ok(Json(TokenPairResponse::bearer(access, refresh)))
}

/// Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    responses(
        (status = 200, description = "Token renovado", body = TokenPairResponse),
        (status = 401, description = "Token inválido o expirado"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn refresh(State(state): State<AppState>, Form(request): Form<RefreshRequest>) -> Result<Json<TokenPairResponse>, Error> {
    let claims = tokens::verify(&request.refresh_token, TokenKind::Refresh, &state.config)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let user = Users::new(&mut conn)
        .get_by_id(claims.sub)
        .await?
        .ok_or(Error::UserNotFound)?;

    let mut ledger = UsedTokens::new(&mut conn);
    if !ledger
        .is_valid(&request.refresh_token, user.id, TokenKind::Refresh, claims.gen)
        .await?
    {
        return Err(Error::InvalidToken { message: None });
    }

    let access_gen = ledger.current_generation(user.id, TokenKind::Access).await?;
    let refresh_gen = ledger.current_generation(user.id, TokenKind::Refresh).await?;

    let access = tokens::issue(user.id, TokenKind::Access, access_gen, &state.config)?;
    let refresh = tokens::issue(user.id, TokenKind::Refresh, refresh_gen, &state.config)?;

    Ok(Json(TokenPairResponse::bearer(access, refresh)))
}

/// Request a password-reset email
#[utoipa::path(
    post,
    path = "/auth/password-reset-request",
    request_body = PasswordResetRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Respuesta genérica, exista o no la cuenta", body = MessageResponse),
        (status = 429, description = "Demasiados intentos"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let user = Users::new(&mut tx).get_by_email(&request.email).await?;
    let Some(user) = user else {
        // Same response as the success path: no account enumeration
        tx.commit().await.map_err(|e| Error::Database(e.into()))?;
        return Ok(Json(MessageResponse::new(RESET_REQUESTED_MESSAGE)));
    };

    match rate_limit::evaluate(&user.throttle_state(), Utc::now(), &state.config.auth.reset) {
        Decision::Reject {
            state: throttle,
            retry_after_minutes,
            persist,
        } => {
            if persist {
                Users::new(&mut tx).update_reset_throttle(user.id, &throttle).await?;
            }
            tx.commit().await.map_err(|e| Error::Database(e.into()))?;
            return Err(Error::RateLimitExceeded { retry_after_minutes });
        }
        Decision::Allow { state: throttle } => {
            Users::new(&mut tx).update_reset_throttle(user.id, &throttle).await?;
        }
    }

    // Bump first: every previously issued, unused reset token dies with the
    // old generation before the new token exists.
    let generation = UsedTokens::new(&mut tx)
        .bump_generation(user.id, TokenKind::PasswordReset)
        .await?;
    let token = tokens::issue(user.id, TokenKind::PasswordReset, generation, &state.config)?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let expire_minutes = state.config.auth.tokens.password_reset_token_duration.as_secs() / 60;
    let email_service = EmailService::new(&state.config)?;
    if let Err(e) = email_service
        .send_password_reset_email(&user.email, &token, expire_minutes)
        .await
    {
        tracing::error!("Failed to send password reset email: {e}");
        return Err(Error::Internal {
            operation: "send password reset email".to_string(),
        });
    }

    Ok(Json(MessageResponse::new(RESET_REQUESTED_MESSAGE)))
}

const RESET_FORM_TEMPLATE: &str = include_str!("../../../templates/reset_password.html");
const RESET_ERROR_TEMPLATE: &str = include_str!("../../../templates/reset_error.html");

/// Serve the HTML form behind the emailed reset link
#[utoipa::path(
    get,
    path = "/auth/password-reset",
    tag = "auth",
    responses(
        (status = 200, description = "Formulario de restablecimiento", content_type = "text/html"),
        (status = 400, description = "Enlace inválido", content_type = "text/html"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn password_reset_form(Query(query): Query<PasswordResetFormQuery>) -> (StatusCode, Html<String>) {
    let mut env = minijinja::Environment::new();
    env.add_template("reset_password.html", RESET_FORM_TEMPLATE)
        .expect("reset form template must parse");
    env.add_template("reset_error.html", RESET_ERROR_TEMPLATE)
        .expect("reset error template must parse");

    match query.token {
        Some(token) if !token.is_empty() => {
            let page = env
                .get_template("reset_password.html")
                .expect("registered above")
                .render(minijinja::context! { token })
                .unwrap_or_else(|e| {
                    tracing::error!("Failed to render reset form: {e}");
                    "Error interno del servidor".to_string()
                });
            (StatusCode::OK, Html(page))
        }
        _ => {
            let page = env
                .get_template("reset_error.html")
                .expect("registered above")
                .render(minijinja::context! { message => "El enlace de restablecimiento es inválido o está incompleto" })
                .unwrap_or_else(|e| {
                    tracing::error!("Failed to render reset error page: {e}");
                    "Error interno del servidor".to_string()
                });
            (StatusCode::BAD_REQUEST, Html(page))
        }
    }
}

/// Complete a password reset with a token from the emailed link
#[utoipa::path(
    post,
    path = "/auth/password-reset",
    request_body = PasswordResetConfirmRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Contraseña actualizada", body = MessageResponse),
        (status = 400, description = "Token inválido/expirado o contraseña rechazada"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetConfirmRequest>,
) -> Result<Json<MessageResponse>, Error> {
    // Every gate failure on this endpoint surfaces as a 400
    confirm_password_reset_inner(state, request)
        .await
        .map_err(Error::into_bad_request)
}

async fn confirm_password_reset_inner(
    state: AppState,
    request: PasswordResetConfirmRequest,
) -> Result<Json<MessageResponse>, Error> {
    validate::validate_password(&request.new_password, &state.config.auth.password)?;

    let claims = tokens::verify(&request.token, TokenKind::PasswordReset, &state.config)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let user = Users::new(&mut tx)
        .get_by_id(claims.sub)
        .await?
        .ok_or(Error::UserNotFound)?;

    let mut ledger = UsedTokens::new(&mut tx);
    if ledger.is_replayed(&request.token).await? {
        return Err(Error::InvalidToken {
            message: Some("El token ya ha sido utilizado".to_string()),
        });
    }
    if claims.gen < ledger.current_generation(user.id, TokenKind::PasswordReset).await? {
        return Err(Error::InvalidToken {
            message: Some("El token ha sido reemplazado por uno más reciente".to_string()),
        });
    }

    let recent_hashes = PasswordHistory::new(&mut tx)
        .recent(user.id, state.config.auth.password.history_size)
        .await?
        .into_iter()
        .map(|entry| entry.password_hash)
        .collect();
    guard_password_history(request.new_password.clone(), recent_hashes).await?;

    let new_hash = hash_password_blocking(request.new_password.clone(), (&state.config.auth.password).into()).await?;

    let mut users = Users::new(&mut tx);
    users
        .update(
            user.id,
            &UserUpdateDBRequest {
                password_hash: Some(new_hash.clone()),
                ..Default::default()
            },
        )
        .await?;
    users.clear_reset_throttle(user.id).await?;

    PasswordHistory::new(&mut tx).record(user.id, &new_hash).await?;
    UsedTokens::new(&mut tx)
        .mark_used(&request.token, TokenKind::PasswordReset, user.id)
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(MessageResponse::new("Contraseña actualizada exitosamente")))
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Usuario autenticado", body = UserResponse),
        (status = 401, description = "No autenticado"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let user = Users::new(&mut conn)
        .get_by_id(current_user.id)
        .await?
        .ok_or(Error::UserNotFound)?;

    Ok(Json(UserResponse::from(user)))
}

/// Update the current user's profile (optionally the password)
#[utoipa::path(
    put,
    path = "/auth/me",
    request_body = UserUpdateRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Perfil actualizado", body = UserResponse),
        (status = 400, description = "Datos inválidos o contraseña rechazada"),
        (status = 401, description = "No autenticado"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_me(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<UserUpdateRequest>,
) -> Result<Json<UserResponse>, Error> {
    update_me_inner(state, current_user, request).await.map_err(Error::into_bad_request)
}

async fn update_me_inner(
    state: AppState,
    current_user: CurrentUser,
    request: UserUpdateRequest,
) -> Result<Json<UserResponse>, Error> {
    if let Some(email) = &request.email {
        validate::validate_email(email)?;
    }
    if let Some(username) = &request.username {
        validate::validate_username(username)?;
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let user = Users::new(&mut tx)
        .get_by_id(current_user.id)
        .await?
        .ok_or(Error::UserNotFound)?;

    let password_hash = if let Some(new_password) = &request.new_password {
        let current = request.current_password.clone().ok_or(Error::InvalidCredentials)?;
        if !verify_password_blocking(current, user.password_hash.clone()).await? {
            return Err(Error::InvalidCredentials);
        }

        validate::validate_password(new_password, &state.config.auth.password)?;

        let recent_hashes = PasswordHistory::new(&mut tx)
            .recent(user.id, state.config.auth.password.history_size)
            .await?
            .into_iter()
            .map(|entry| entry.password_hash)
            .collect();
        guard_password_history(new_password.clone(), recent_hashes).await?;

        Some(hash_password_blocking(new_password.clone(), (&state.config.auth.password).into()).await?)
    } else {
        None
    };

    let updated = Users::new(&mut tx)
        .update(
            user.id,
            &UserUpdateDBRequest {
                email: request.email,
                username: request.username,
                full_name: request.full_name,
                password_hash: password_hash.clone(),
            },
        )
        .await?;

    if let Some(hash) = &password_hash {
        PasswordHistory::new(&mut tx).record(user.id, hash).await?;
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(UserResponse::from(updated)))
}

/// Delete the current user's account and everything it owns
#[utoipa::path(
    delete,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Cuenta eliminada", body = MessageResponse),
        (status = 401, description = "No autenticado"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<MessageResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let deleted = Users::new(&mut tx).delete(current_user.id).await?;
    if !deleted {
        return Err(Error::UserNotFound);
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(MessageResponse::new("Cuenta eliminada exitosamente")))
}
