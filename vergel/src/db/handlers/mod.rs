//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection (or transaction), provides
//! strongly-typed operations for one table, and returns domain models from
//! [`crate::db::models`]. Mutating flows create their repositories from a
//! transaction so the whole request commits or rolls back as one unit:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let mut users = Users::new(&mut tx);
//! let user = users.create(&create_request).await?;
//! tx.commit().await?;
//! ```

pub mod gardens;
pub mod notes;
pub mod password_history;
pub mod plants;
pub mod posts;
pub mod repository;
pub mod used_tokens;
pub mod users;

pub use gardens::Gardens;
pub use notes::Notes;
pub use password_history::PasswordHistory;
pub use plants::Plants;
pub use posts::Posts;
pub use repository::Repository;
pub use used_tokens::UsedTokens;
pub use users::Users;
