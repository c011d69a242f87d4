//! Storage layer for users and sessions.
//!
//! Handlers only ever see the [`handlers::UserStore`] and [`handlers::SessionStore`] traits.
//! Two backends implement them:
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers, extractors)
//! └──────┬──────┘
//!        │  Arc<dyn UserStore>, Arc<dyn SessionStore>
//!        ↓
//! ┌─────────────────────┬──────────────────────┐
//! │ PgUsers / PgSessions│ InMemoryUsers /      │
//! │ (db::handlers)      │ InMemorySessions     │
//! └──────┬──────────────┴──────────────────────┘
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Store traits and PostgreSQL implementations
//! - [`in_memory`]: Process-local implementations (development and tests)
//! - [`models`]: Records and create requests
//! - [`errors`]: Storage-specific error types

pub mod errors;
pub mod handlers;
pub mod in_memory;
pub mod models;

/// Get the authgate database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}
