//! PostgreSQL store for server-side sessions.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{instrument, trace};

use crate::db::{errors::Result, handlers::repository::SessionStore, models::sessions::SessionRecord};
use crate::types::{UserId, abbrev_uuid};

#[derive(Debug, Clone, FromRow)]
struct Session {
    session_key: String,
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

impl From<Session> for SessionRecord {
    fn from(session: Session) -> Self {
        Self {
            key: session.session_key,
            user_id: session.user_id,
            expires_at: session.expires_at,
        }
    }
}

#[derive(Clone)]
pub struct PgSessions {
    pool: PgPool,
}

impl PgSessions {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SessionStore for PgSessions {
    #[instrument(skip_all, fields(user_id = %abbrev_uuid(&record.user_id)), err)]
    async fn insert(&self, record: &SessionRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Expired rows are never returned; clear them out while we hold a transaction anyway
        let pruned = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if pruned > 0 {
            trace!(pruned, "Removed expired sessions");
        }

        sqlx::query("INSERT INTO sessions (session_key, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&record.key)
            .bind(record.user_id)
            .bind(record.expires_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip_all, err)]
    async fn load(&self, key: &str) -> Result<Option<SessionRecord>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT session_key, user_id, expires_at FROM sessions WHERE session_key = $1 AND expires_at > NOW()",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session.map(Into::into))
    }

    #[instrument(skip_all, err)]
    async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE session_key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
