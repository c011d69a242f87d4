//! Store traits for users and sessions.
//!
//! Each store is an async, object-safe trait so it can be shared as `Arc<dyn ...>` across
//! request handlers. Implementations must be safe to call concurrently.

use chrono::{DateTime, Utc};

use crate::db::errors::Result;
use crate::db::models::{
    sessions::SessionRecord,
    users::{UserCreateDBRequest, UserDBResponse},
};
use crate::types::UserId;

/// User accounts. Usernames are unique.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Create a new user. Fails with `DbError::UniqueViolation` if the username is taken.
    async fn create(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse>;

    /// Get a user by ID
    async fn get_by_id(&self, id: UserId) -> Result<Option<UserDBResponse>>;

    /// Get a user by exact username
    async fn get_by_username(&self, username: &str) -> Result<Option<UserDBResponse>>;

    /// Replace a user's password hash
    async fn set_password(&self, id: UserId, password_hash: &str) -> Result<()>;

    /// Record a successful login
    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<()>;
}

/// Server-side session records keyed by the opaque session key.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session
    async fn insert(&self, record: &SessionRecord) -> Result<()>;

    /// Load a session. Expired sessions are reported as absent.
    async fn load(&self, key: &str) -> Result<Option<SessionRecord>>;

    /// Delete a session, returning whether one existed
    async fn delete(&self, key: &str) -> Result<bool>;
}
