//! # vergel: garden catalog API with native authentication
//!
//! `vergel` is a REST API for a garden-management platform. Users register
//! an account, catalog their gardens and plants (with photos stored in
//! object storage), attach observation notes, publish posts, and identify
//! unknown plants through a third-party identification API.
//!
//! ## Overview
//!
//! The service is a classic CRUD application built on
//! [Axum](https://github.com/tokio-rs/axum) with PostgreSQL for all
//! persistence. The one subsystem with real state-machine behavior is the
//! credential lifecycle around password resets:
//!
//! - **Token issuance** ([`auth::tokens`]): three JWT kinds (access,
//!   refresh, password-reset) carrying a purpose tag, expiry, and the
//!   generation counter they were minted under.
//! - **Reset throttling** ([`auth::rate_limit`]): per-user attempt counters
//!   with a rolling window and an exponentially growing, capped lockout.
//! - **Token ledger** ([`db::handlers::used_tokens`]): consumed-token
//!   fingerprints plus per-(user, kind) generation counters, so a redeemed
//!   reset link can never be replayed and issuing a new link voids all
//!   older ones.
//! - **Password history** ([`db::handlers::password_history`]): an
//!   append-only log of previous password hashes; the newest N entries are
//!   rejected on change and reset.
//!
//! ### Request Flow
//!
//! A request hits the router built by [`build_router`], passes through the
//! tracing and CORS layers, and lands in a handler under [`api::handlers`].
//! Protected handlers take a `CurrentUser` extractor argument which
//! verifies the bearer access token and loads the user before the handler
//! body runs. Handlers open one transaction per mutating request, drive the
//! repositories in [`db::handlers`], and commit at the end; outbound email
//! is dispatched after commit, directly on the request path.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use vergel::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = vergel::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     vergel::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module: YAML file plus `VERGEL_`-prefixed environment
//! overrides, validated at startup and passed into [`AppState`] explicitly.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
mod email;
pub mod errors;
mod identify;
mod openapi;
mod storage;
pub mod telemetry;
pub mod types;

use axum::{
    extract::DefaultBodyLimit,
    http::{self, HeaderValue, Method},
    routing::{get, post, put},
    Json, Router,
};
use bon::Builder;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;

use crate::{config::CorsOrigin, openapi::ApiDoc};

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the vergel database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let wildcard = config
        .cors
        .allowed_origins
        .iter()
        .any(|origin| matches!(origin, CorsOrigin::Wildcard));

    let mut cors = if wildcard {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
            .allow_credentials(config.cors.allow_credentials)
    };

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    use api::handlers::{auth, gardens, identify, notes, plants, posts};

    let cors_layer = create_cors_layer(&state.config)?;

    // The identification endpoint accepts several full-size photos, well
    // past the default body limit
    let identify_body_limit = (state.config.identification.max_image_bytes as usize)
        .saturating_mul(state.config.identification.max_images)
        .saturating_add(1024 * 1024);

    let router = Router::new()
        .route("/", get(|| async { Json(serde_json::json!({ "message": "Bienvenido a Vergel" })) }))
        .route("/healthz", get(|| async { "OK" }))
        // Authentication and credential lifecycle
        .route("/auth/register", post(auth::register))
        .route("/auth/token", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/password-reset-request", post(auth::request_password_reset))
        .route(
            "/auth/password-reset",
            get(auth::password_reset_form).post(auth::confirm_password_reset),
        )
        .route("/auth/me", get(auth::get_me).put(auth::update_me).delete(auth::delete_me))
        // Gardens and their plants
        .route("/gardens", post(gardens::create_garden).get(gardens::list_gardens))
        .route(
            "/gardens/{garden_id}",
            put(gardens::update_garden).delete(gardens::delete_garden),
        )
        .route(
            "/gardens/{garden_id}/plants",
            post(plants::add_plant).get(plants::list_garden_plants),
        )
        .route(
            "/gardens/plants/{plant_id}",
            put(plants::update_plant).delete(plants::delete_plant),
        )
        // Observation notes
        .route("/plants/{plant_id}/notes", post(notes::create_note).get(notes::list_notes))
        .route("/notes/{note_id}", put(notes::update_note).delete(notes::delete_note))
        // Posts
        .route("/posts", post(posts::create_post).get(posts::list_posts))
        .route(
            "/posts/{post_id}",
            get(posts::get_post).put(posts::update_post).delete(posts::delete_post),
        )
        // Plant identification
        .route(
            "/identify",
            post(identify::identify_plant).layer(DefaultBodyLimit::max(identify_body_limit)),
        )
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Main application struct owning the router, pool, and configuration.
///
/// 1. **Create**: [`Application::new`] connects the pool, runs migrations,
///    and builds the router.
/// 2. **Serve**: [`Application::serve`] binds the listener and handles
///    requests until the shutdown future resolves.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool_settings = &config.database.pool;
        let pool = PgPoolOptions::new()
            .max_connections(pool_settings.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(pool_settings.acquire_timeout_secs))
            .connect(&config.database.url)
            .await?;

        migrator().run(&pool).await?;

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Vergel listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
pub mod test_utils {
    //! Shared helpers for database-backed handler tests.

    use crate::api::models::auth::{LoginRequest, RegisterRequest, TokenPairResponse};
    use crate::config::EmailTransportConfig;
    use crate::{build_router, AppState, Config};
    use axum_test::TestServer;
    use sqlx::PgPool;

    /// A config suitable for tests: signing key set, email to a temp
    /// directory, cheap Argon2 parameters so hashing does not dominate
    /// test time.
    pub fn create_test_config() -> Config {
        let emails_dir = tempfile::tempdir().expect("create temp emails dir").keep();

        let mut config = Config {
            secret_key: Some("test-secret-key".to_string()),
            ..Default::default()
        };
        config.email.transport = EmailTransportConfig::File {
            path: emails_dir.to_string_lossy().into_owned(),
        };
        config.auth.password.argon2_memory_kib = 8;
        config.auth.password.argon2_iterations = 1;
        config
    }

    /// Full application test server over the given pool.
    pub fn create_test_app(pool: PgPool) -> TestServer {
        create_test_app_with_config(pool, create_test_config())
    }

    pub fn create_test_app_with_config(pool: PgPool, config: Config) -> TestServer {
        let state = AppState::builder().db(pool).config(config).build();
        let router = build_router(state).expect("build test router");
        TestServer::new(router).expect("create test server")
    }

    /// Register a user and return their access/refresh token pair.
    pub async fn register_and_login(server: &TestServer, email: &str, username: &str, password: &str) -> TokenPairResponse {
        let response = server
            .post("/auth/register")
            .json(&RegisterRequest {
                email: email.to_string(),
                username: username.to_string(),
                password: password.to_string(),
                full_name: None,
            })
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .post("/auth/token")
            .json(&LoginRequest {
                username_or_email: username.to_string(),
                password: password.to_string(),
            })
            .await;
        response.assert_status_ok();
        response.json()
    }
}
