//! Store traits and their PostgreSQL implementations.
//!
//! Handlers hold stores as trait objects in [`crate::AppState`], so the same handler code runs
//! against PostgreSQL in production and against [`crate::db::in_memory`] in tests.
//!
//! # Available Stores
//!
//! - [`PgUsers`]: User accounts, backed by the `users` table
//! - [`PgSessions`]: Server-side sessions, backed by the `sessions` table
//!
//! ```ignore
//! use authgate::db::handlers::{PgUsers, UserStore};
//!
//! async fn example(pool: sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let users = PgUsers::new(pool);
//!     if let Some(user) = users.get_by_username("alice").await? {
//!         println!("Found user: {}", user.id);
//!     }
//!     Ok(())
//! }
//! ```

pub mod repository;
pub mod sessions;
pub mod users;

pub use repository::{SessionStore, UserStore};
pub use sessions::PgSessions;
pub use users::PgUsers;
