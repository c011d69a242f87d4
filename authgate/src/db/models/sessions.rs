//! Database models for server-side sessions.

use crate::types::UserId;
use chrono::{DateTime, Utc};

/// A server-side session: maps the key carried in the session cookie to a user.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub key: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
