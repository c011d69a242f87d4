//! HTTP handlers for the token lifecycle: create, refresh, verify and logout.
//!
//! Tokens are always returned in the response body. The cookies set alongside are an additional
//! transport, not a replacement.

use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use tracing::debug;

use crate::{
    AppState,
    api::{
        extractors::OptionalJson,
        models::auth::{AccessTokenResponse, CredentialsRequest, RefreshRequest, TokenPairResponse, VerifyResponse},
    },
    auth::{credentials, password::Argon2Params, tokens::TokenKind},
    errors::Error,
    types::abbrev_uuid,
};

/// Stands in for an absent access cookie, so "no cookie" and "bad token" fail identically.
pub const MISSING_TOKEN_SENTINEL: &str = "NO TOKEN";

const NO_ACTIVE_ACCOUNT_FOR_CREDENTIALS: &str = "No active account found with the given credentials";
const NO_ACTIVE_ACCOUNT_FOR_TOKEN: &str = "No active account found for the given token.";

/// Obtain an access/refresh token pair
#[utoipa::path(
    post,
    path = "/auth/jwt/create/",
    request_body = CredentialsRequest,
    tag = "tokens",
    summary = "Create token pair",
    description = "Check credentials and issue an access/refresh token pair. Both tokens are returned in the body and set as cookies.",
    responses(
        (status = 200, description = "Tokens issued", body = TokenPairResponse),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "No active account found with the given credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    jar: CookieJar,
    OptionalJson(request): OptionalJson<CredentialsRequest>,
) -> Result<(CookieJar, Json<TokenPairResponse>), Error> {
    let username = request.username.ok_or(Error::MissingField { field: "username" })?;
    let password = request.password.ok_or(Error::MissingField { field: "password" })?;

    let params = Argon2Params::from(&state.config.auth.password);
    let user = credentials::authenticate(state.users.as_ref(), &username, &password, params)
        .await?
        .ok_or_else(|| Error::Unauthenticated {
            message: Some(NO_ACTIVE_ACCOUNT_FOR_CREDENTIALS.to_string()),
        })?;

    if state.config.auth.jwt.update_last_login {
        state.users.record_login(user.id, Utc::now()).await?;
    }

    let pair = state.tokens.issue_pair(user.id)?;
    debug!("Issued token pair for user {}", abbrev_uuid(&user.id));

    let jar = jar
        .add(state.cookies.access_cookie(&pair.access))
        .add(state.cookies.refresh_cookie(&pair.refresh));

    Ok((
        jar,
        Json(TokenPairResponse {
            access: pair.access,
            refresh: pair.refresh,
        }),
    ))
}

/// Mint a new access token from a refresh token
#[utoipa::path(
    post,
    path = "/auth/jwt/refresh/",
    request_body = RefreshRequest,
    tag = "tokens",
    summary = "Refresh access token",
    description = "Issue a new access token. The refresh token is read from the `refresh` cookie, falling back to the request body. The refresh cookie itself is left unchanged.",
    responses(
        (status = 200, description = "New access token issued", body = AccessTokenResponse),
        (status = 400, description = "No refresh token supplied"),
        (status = 401, description = "Refresh token invalid or expired"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    OptionalJson(request): OptionalJson<RefreshRequest>,
) -> Result<(CookieJar, Json<AccessTokenResponse>), Error> {
    let raw = jar
        .get(&state.cookies.refresh_name)
        .map(|cookie| cookie.value().to_string())
        // An empty cookie does not override the body
        .filter(|value| !value.is_empty())
        .or(request.refresh)
        .ok_or(Error::MissingField { field: "refresh" })?;

    let token = state.tokens.validate(&raw, Some(TokenKind::Refresh))?;

    let user = state.users.get_by_id(token.user_id()).await?;
    if !user.is_some_and(|u| u.is_active) {
        return Err(Error::Unauthenticated {
            message: Some(NO_ACTIVE_ACCOUNT_FOR_TOKEN.to_string()),
        });
    }

    let access = state.tokens.issue(token.user_id(), TokenKind::Access)?;
    debug!("Refreshed access token for user {}", abbrev_uuid(&token.user_id()));

    let jar = jar.add(state.cookies.access_cookie(&access));
    Ok((jar, Json(AccessTokenResponse { access })))
}

/// Verify the access token carried in the `access` cookie
#[utoipa::path(
    post,
    path = "/auth/jwt/verify/",
    tag = "tokens",
    summary = "Verify access cookie",
    description = "Check the token in the `access` cookie. A missing cookie is reported exactly like an invalid token.",
    responses(
        (status = 200, description = "Token is valid", body = VerifyResponse),
        (status = 401, description = "Token is invalid or expired"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn verify(State(state): State<AppState>, jar: CookieJar) -> Result<Json<VerifyResponse>, Error> {
    let raw = jar
        .get(&state.cookies.access_name)
        .map(|cookie| cookie.value().to_string())
        .unwrap_or_else(|| MISSING_TOKEN_SENTINEL.to_string());

    state.tokens.validate(&raw, None)?;
    Ok(Json(VerifyResponse::default()))
}

/// Clear the token cookies
#[utoipa::path(
    post,
    path = "/auth/jwt/logout/",
    tag = "tokens",
    summary = "Token logout",
    description = "Instruct the client to delete the `access` and `refresh` cookies. Tokens are not revoked server-side.",
    responses(
        (status = 204, description = "Cookies cleared"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar
        .add(state.cookies.access_removal())
        .add(state.cookies.refresh_removal());
    (jar, StatusCode::NO_CONTENT)
}
