//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The file path defaults to `config.yaml` but can be specified
//! via the `-f` flag or the `VERGEL_CONFIG` environment variable.
//!
//! Sources are merged in order (later overrides earlier):
//!
//! 1. **YAML config file** - base configuration (default: `config.yaml`)
//! 2. **Environment variables** - variables prefixed with `VERGEL_`
//!
//! For nested values, use double underscores: `VERGEL_AUTH__RESET__MAX_ATTEMPTS=3`
//! sets `auth.reset.max_attempts`.
//!
//! The loaded [`Config`] is an explicitly constructed value handed to
//! [`crate::AppState`] and from there to every component - there is no
//! process-wide settings singleton.

use clap::Parser;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying the config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "VERGEL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Base URL where the API is reachable from the outside.
    /// Used to build password-reset links in outbound email.
    pub public_url: String,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Secret key for JWT signing (required)
    pub secret_key: Option<String>,
    /// Authentication configuration (passwords, tokens, reset throttle)
    pub auth: AuthConfig,
    /// Email delivery configuration
    pub email: EmailConfig,
    /// Object storage configuration for garden/plant images
    pub storage: StorageConfig,
    /// Plant identification API configuration
    pub identification: IdentificationConfig,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
}

/// PostgreSQL connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection string
    pub url: String,
    /// Connection pool settings
    pub pool: PoolSettings,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/vergel".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

/// Connection pool settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout_secs: 30,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Password validation rules and hashing parameters
    pub password: PasswordConfig,
    /// Token lifetimes
    pub tokens: TokenConfig,
    /// Password-reset request throttle
    pub reset: ResetConfig,
}

/// Password validation rules and Argon2 hashing parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Minimum password length
    pub min_length: usize,
    /// Maximum password length
    pub max_length: usize,
    /// How many previous passwords are rejected on change/reset
    pub history_size: i64,
    /// Argon2 memory cost in KiB (default: 19456 KiB = 19 MB)
    pub argon2_memory_kib: u32,
    /// Argon2 iterations
    pub argon2_iterations: u32,
    /// Argon2 parallelism
    pub argon2_parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 100,
            history_size: 5,
            argon2_memory_kib: 19456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

/// Token lifetimes for the three token kinds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenConfig {
    /// Access token lifetime
    #[serde(with = "humantime_serde")]
    pub access_token_duration: Duration,
    /// Refresh token lifetime
    #[serde(with = "humantime_serde")]
    pub refresh_token_duration: Duration,
    /// Password-reset token lifetime
    #[serde(with = "humantime_serde")]
    pub password_reset_token_duration: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_token_duration: Duration::from_secs(30 * 60),
            refresh_token_duration: Duration::from_secs(7 * 24 * 60 * 60),
            // The upstream service shipped with a 1 minute default here,
            // which locks users out of their own reset links. 30 minutes,
            // see DESIGN.md.
            password_reset_token_duration: Duration::from_secs(30 * 60),
        }
    }
}

/// Password-reset request throttle.
///
/// Attempts inside the rolling window accumulate; exceeding `max_attempts`
/// starts an exponentially growing lockout, capped at `max_lockout`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResetConfig {
    /// Attempts allowed inside the rolling window before lockout
    pub max_attempts: i32,
    /// Rolling window for counting attempts
    #[serde(with = "humantime_serde")]
    pub attempt_window: Duration,
    /// Lockout duration for the first violation
    #[serde(with = "humantime_serde")]
    pub base_lockout: Duration,
    /// Upper bound for the lockout duration
    #[serde(with = "humantime_serde")]
    pub max_lockout: Duration,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            attempt_window: Duration::from_secs(60 * 60),
            base_lockout: Duration::from_secs(15 * 60),
            max_lockout: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Email configuration for welcome and password-reset messages.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
// Note: cannot use deny_unknown_fields here due to #[serde(flatten)] on transport
pub struct EmailConfig {
    /// Email transport method
    #[serde(flatten)]
    pub transport: EmailTransportConfig,
    /// Sender email address
    pub from_email: String,
    /// Sender display name
    pub from_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            transport: EmailTransportConfig::File {
                path: "./emails".to_string(),
            },
            from_email: "no-reply@vergel.app".to_string(),
            from_name: "Vergel".to_string(),
        }
    }
}

/// Email transport configuration - either SMTP or file-based for testing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EmailTransportConfig {
    /// Send emails via SMTP server
    Smtp {
        /// SMTP server hostname
        host: String,
        /// SMTP server port
        port: u16,
        /// SMTP authentication username
        username: String,
        /// SMTP authentication password
        password: String,
        /// Use TLS encryption
        use_tls: bool,
    },
    /// Write emails to files (for development/testing)
    File {
        /// Directory path where email files will be written
        path: String,
    },
}

/// Object storage configuration for image uploads.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// S3 bucket name
    pub bucket: String,
    /// Public base URL under which uploaded objects are reachable
    pub public_base_url: String,
    /// Maximum accepted image size in bytes
    pub max_image_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "vergel-images".to_string(),
            public_base_url: "https://vergel-images.s3.amazonaws.com".to_string(),
            max_image_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Plant identification API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentificationConfig {
    /// Identification API endpoint
    pub api_url: Url,
    /// API key sent as a query parameter
    pub api_key: String,
    /// Maximum number of images accepted per request
    pub max_images: usize,
    /// Maximum accepted size per image in bytes
    pub max_image_bytes: u64,
    /// Number of candidate species to request
    pub nb_results: u32,
    /// Result language
    pub language: String,
    /// Ask the API to include related images
    pub include_related: bool,
}

impl Default for IdentificationConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse("https://my-api.plantnet.org/v2/identify/all").unwrap(),
            api_key: String::new(),
            max_images: 5,
            max_image_bytes: 50 * 1024 * 1024,
            nb_results: 10,
            language: "es".to_string(),
            include_related: false,
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials in CORS requests (must not be combined with "*")
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Wildcard],
            allow_credentials: false,
            max_age: None,
        }
    }
}

/// A single CORS origin - either the wildcard `"*"` or a concrete URL.
#[derive(Debug, Clone)]
pub enum CorsOrigin {
    Url(Url),
    Wildcard,
}

impl Serialize for CorsOrigin {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CorsOrigin::Wildcard => serializer.serialize_str("*"),
            CorsOrigin::Url(url) => serializer.serialize_str(url.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for CorsOrigin {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "*" {
            return Ok(CorsOrigin::Wildcard);
        }
        Url::parse(&raw)
            .map(CorsOrigin::Url)
            .map_err(|e| serde::de::Error::custom(format!("invalid CORS origin '{raw}': {e}")))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            public_url: "http://localhost:8000".to_string(),
            database: DatabaseConfig::default(),
            secret_key: None,
            auth: AuthConfig::default(),
            email: EmailConfig::default(),
            storage: StorageConfig::default(),
            identification: IdentificationConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl Config {
    fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("VERGEL_").split("__"))
    }

    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.secret_key.is_none() {
            return Err(Error::Internal {
                operation: "Config validation: secret_key is not configured. \
                     Set the VERGEL_SECRET_KEY environment variable or add secret_key to the config file."
                    .to_string(),
            });
        }

        let password = &self.auth.password;
        if password.min_length > password.max_length {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: password min_length ({}) cannot be greater than max_length ({})",
                    password.min_length, password.max_length
                ),
            });
        }

        if self.auth.reset.max_attempts < 1 {
            return Err(Error::Internal {
                operation: "Config validation: reset.max_attempts must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
