//! Cookie-aware request authentication.
//!
//! An access token is looked for in `Authorization: Bearer <token>` first. Only when no bearer
//! header is present does the access cookie get consulted. Resolution never fails: any problem
//! with the token or the user lookup yields [`Resolution::Unresolved`], leaving the caller free
//! to try something else or reject the request.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, instrument, trace, warn};

use crate::{
    AppState,
    auth::tokens::{TokenKind, ValidatedToken},
    db::models::users::UserDBResponse,
    errors::Error,
    types::abbrev_uuid,
};

/// Outcome of resolving a request to a user.
#[derive(Debug, Clone)]
pub enum Resolution {
    Resolved { user: UserDBResponse, token: ValidatedToken },
    Unresolved,
}

/// What the `Authorization` header says about bearer credentials.
#[derive(Debug, PartialEq, Eq)]
enum BearerHeader<'a> {
    /// No header, or a scheme other than Bearer
    Absent,
    Token(&'a str),
    /// A Bearer header that doesn't carry exactly one token
    Malformed,
}

fn bearer_token(headers: &HeaderMap) -> BearerHeader<'_> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return BearerHeader::Absent;
    };
    let Ok(value) = value.to_str() else {
        return BearerHeader::Malformed;
    };

    let mut parts = value.split_whitespace();
    match parts.next() {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer") => match (parts.next(), parts.next()) {
            (Some(token), None) => BearerHeader::Token(token),
            _ => BearerHeader::Malformed,
        },
        _ => BearerHeader::Absent,
    }
}

/// Resolve a request to the user its access token belongs to.
#[instrument(skip_all)]
pub async fn resolve(parts: &Parts, state: &AppState) -> Resolution {
    let jar = CookieJar::from_headers(&parts.headers);

    let raw = match bearer_token(&parts.headers) {
        BearerHeader::Token(token) => token.to_string(),
        BearerHeader::Malformed => {
            trace!("Malformed bearer header");
            return Resolution::Unresolved;
        }
        BearerHeader::Absent => match jar.get(&state.cookies.access_name) {
            Some(cookie) => cookie.value().to_string(),
            None => {
                trace!("No bearer header and no access cookie");
                return Resolution::Unresolved;
            }
        },
    };

    let token = match state.tokens.validate(&raw, Some(TokenKind::Access)) {
        Ok(token) => token,
        Err(e) => {
            trace!("Access token rejected: {:?}", e);
            return Resolution::Unresolved;
        }
    };

    match state.users.get_by_id(token.user_id()).await {
        Ok(Some(user)) if user.is_active => {
            debug!("Resolved user {} from access token", abbrev_uuid(&user.id));
            Resolution::Resolved { user, token }
        }
        Ok(Some(user)) => {
            debug!("Access token for inactive user {}", abbrev_uuid(&user.id));
            Resolution::Unresolved
        }
        Ok(None) => {
            debug!("Access token for unknown user {}", abbrev_uuid(&token.user_id()));
            Resolution::Unresolved
        }
        Err(e) => {
            warn!("User lookup failed during token resolution: {}", e);
            Resolution::Unresolved
        }
    }
}

/// Extractor for handlers that require a token-authenticated user.
#[derive(Debug, Clone)]
pub struct TokenUser {
    pub user: UserDBResponse,
    pub token: ValidatedToken,
}

impl FromRequestParts<AppState> for TokenUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match resolve(parts, state).await {
            Resolution::Resolved { user, token } => Ok(TokenUser { user, token }),
            Resolution::Unresolved => Err(Error::Unauthenticated { message: None }),
        }
    }
}
