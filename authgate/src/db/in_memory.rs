//! In-memory store implementations.
//!
//! These keep all state inside the process and are suitable for development, tests, and
//! single-instance deployments that can afford to lose every account and session on restart.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{SessionStore, UserStore},
    models::{
        sessions::SessionRecord,
        users::{UserCreateDBRequest, UserDBResponse},
    },
};
use crate::types::UserId;

/// In-memory implementation of [`UserStore`].
#[derive(Clone, Default)]
pub struct InMemoryUsers {
    users: Arc<RwLock<HashMap<UserId, UserDBResponse>>>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUsers {
    async fn create(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let mut users = self.users.write();

        if users.values().any(|u| u.username == request.username) {
            return Err(DbError::UniqueViolation {
                constraint: Some("users_username_key".to_string()),
                table: Some("users".to_string()),
                message: format!("username '{}' already exists", request.username),
            });
        }

        let user = UserDBResponse {
            id: Uuid::new_v4(),
            username: request.username.clone(),
            email: request.email.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            password_hash: request.password_hash.clone(),
            is_active: request.is_active,
            date_joined: Utc::now(),
            last_login: None,
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<UserDBResponse>> {
        Ok(self.users.read().values().find(|u| u.username == username).cloned())
    }

    async fn set_password(&self, id: UserId, password_hash: &str) -> Result<()> {
        let mut users = self.users.write();
        let user = users.get_mut(&id).ok_or(DbError::NotFound)?;
        user.password_hash = Some(password_hash.to_string());
        Ok(())
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<()> {
        let mut users = self.users.write();
        let user = users.get_mut(&id).ok_or(DbError::NotFound)?;
        user.last_login = Some(at);
        Ok(())
    }
}

/// In-memory implementation of [`SessionStore`].
///
/// Entries are evicted by the cache once `ttl` has elapsed; each record's own `expires_at` is
/// also checked on load.
#[derive(Clone)]
pub struct InMemorySessions {
    sessions: Cache<String, SessionRecord>,
}

impl InMemorySessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Cache::builder().time_to_live(ttl).build(),
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessions {
    async fn insert(&self, record: &SessionRecord) -> Result<()> {
        self.sessions.insert(record.key.clone(), record.clone()).await;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<SessionRecord>> {
        match self.sessions.get(key).await {
            Some(record) if record.is_expired(Utc::now()) => {
                self.sessions.invalidate(key).await;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.sessions.remove(key).await.is_some())
    }
}
