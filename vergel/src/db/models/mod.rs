//! Database record structures matching table schemas.
//!
//! Each model struct corresponds to a table row (deriving `sqlx::FromRow`)
//! or to an insert/update payload. Database models are distinct from API
//! models so storage and API representations can evolve independently;
//! conversions live on the API side.

pub mod gardens;
pub mod notes;
pub mod plants;
pub mod posts;
pub mod tokens;
pub mod users;
