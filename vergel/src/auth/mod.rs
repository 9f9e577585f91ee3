//! Authentication building blocks.
//!
//! - [`password`]: Argon2id hashing and verification
//! - [`tokens`]: JWT issuance/verification for the three token kinds
//! - [`rate_limit`]: the password-reset request throttle state machine
//! - [`validate`]: password/username/email field validators
//! - [`current_user`]: the bearer-token extractor for protected handlers
//!
//! The reset flow itself is orchestrated in [`crate::api::handlers::auth`];
//! these modules hold the pieces it composes.

pub mod current_user;
pub mod password;
pub mod rate_limit;
pub mod tokens;
pub mod validate;
