//! Server-side sessions keyed by an opaque cookie value.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use tracing::{debug, instrument, trace};

use crate::{
    AppState,
    auth::password::generate_opaque_token,
    db::models::sessions::SessionRecord,
    errors::{Error, Result},
    types::{UserId, abbrev_uuid},
};

/// Start a new session for `user_id`, destroying `previous` first if given.
///
/// Returns the new session key, to be set as the session cookie value.
#[instrument(skip(state, previous), fields(user_id = %abbrev_uuid(&user_id)))]
pub async fn start(state: &AppState, user_id: UserId, previous: Option<&str>) -> Result<String> {
    if let Some(previous) = previous {
        if state.sessions.delete(previous).await? {
            debug!("Rotated out previous session");
        }
    }

    let timeout = chrono::Duration::from_std(state.config.auth.session.timeout).map_err(|e| Error::Internal {
        operation: format!("convert session timeout: {e}"),
    })?;

    let expires_at = Utc::now().checked_add_signed(timeout).ok_or_else(|| Error::Internal {
        operation: "compute session expiry: timeout out of range".to_string(),
    })?;

    let record = SessionRecord {
        key: generate_opaque_token(),
        user_id,
        expires_at,
    };
    state.sessions.insert(&record).await?;

    Ok(record.key)
}

/// Destroy the session with the given key. Missing sessions are not an error.
#[instrument(skip_all)]
pub async fn end(state: &AppState, key: Option<&str>) -> Result<()> {
    match key {
        Some(key) => {
            let existed = state.sessions.delete(key).await?;
            trace!("Session destroyed (existed: {existed})");
        }
        None => trace!("No session cookie to destroy"),
    }
    Ok(())
}

/// Extractor for handlers that require a live session.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub user_id: UserId,
}

impl FromRequestParts<AppState> for SessionIdentity {
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(&state.session_cookies.name) else {
            return Err(Error::Unauthenticated { message: None });
        };

        match state.sessions.load(cookie.value()).await? {
            Some(record) => Ok(SessionIdentity { user_id: record.user_id }),
            None => {
                trace!("Session cookie present but no live session");
                Err(Error::Unauthenticated { message: None })
            }
        }
    }
}
