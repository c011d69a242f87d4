//! HTTP handlers for session-based login, logout and the current session user.

use axum::{Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use tracing::info;

use crate::{
    AppState,
    api::{
        extractors::OptionalJson,
        models::{
            auth::{CredentialsRequest, MessageResponse},
            users::SessionUserResponse,
        },
    },
    auth::{
        credentials,
        password::Argon2Params,
        session::{self, SessionIdentity},
    },
    errors::Error,
    types::abbrev_uuid,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Log in with username and password, starting a server-side session
#[utoipa::path(
    post,
    path = "/auth/session/create/",
    request_body = CredentialsRequest,
    tag = "session",
    summary = "Session login",
    responses(
        (status = 200, description = "Login successful", body = MessageResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    OptionalJson(request): OptionalJson<CredentialsRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), Error> {
    let invalid = || Error::Unauthenticated {
        message: Some(INVALID_CREDENTIALS.to_string()),
    };

    let (Some(username), Some(password)) = (request.username, request.password) else {
        return Err(invalid());
    };

    let params = Argon2Params::from(&state.config.auth.password);
    let user = credentials::authenticate(state.users.as_ref(), &username, &password, params)
        .await?
        .ok_or_else(invalid)?;

    state.users.record_login(user.id, Utc::now()).await?;

    let previous = jar.get(&state.session_cookies.name).map(|c| c.value().to_string());
    let key = session::start(&state, user.id, previous.as_deref()).await?;
    info!("User {} logged in", abbrev_uuid(&user.id));

    let jar = jar.add(state.session_cookies.cookie(&key));
    Ok((jar, Json(MessageResponse::new("Login successful"))))
}

/// End the current session, if any
#[utoipa::path(
    post,
    path = "/auth/session/logout/",
    tag = "session",
    summary = "Session logout",
    description = "Destroys the server-side session and clears the session cookie. Succeeds whether or not a session existed.",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<(CookieJar, Json<MessageResponse>), Error> {
    let key = jar.get(&state.session_cookies.name).map(|c| c.value().to_string());
    session::end(&state, key.as_deref()).await?;

    let jar = jar.add(state.session_cookies.removal());
    Ok((jar, Json(MessageResponse::new("Logout successful"))))
}

/// Get the profile of the session's user
#[utoipa::path(
    get,
    path = "/auth/session/user/",
    tag = "session",
    summary = "Current session user",
    responses(
        (status = 200, description = "Current user", body = SessionUserResponse),
        (status = 401, description = "No session, or the session's user no longer exists"),
    ),
    security(
        ("SessionCookie" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn current_user(State(state): State<AppState>, identity: SessionIdentity) -> Result<Json<SessionUserResponse>, Error> {
    match state.users.get_by_id(identity.user_id).await? {
        Some(user) if user.is_active => Ok(Json(SessionUserResponse::from(user))),
        _ => Err(Error::Unauthenticated {
            message: Some("Invalid request.".to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CREDENTIALS_NOT_PROVIDED;
    use crate::test_utils::{create_test_server, create_test_state, create_test_user, response_cookies};
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    async fn login_cookie(server: &axum_test::TestServer, username: &str, password: &str) -> String {
        let response = server
            .post("/auth/session/create/")
            .json(&json!({"username": username, "password": password}))
            .await;
        response.assert_status(StatusCode::OK);
        response_cookies(&response)["sessionid"].value().to_string()
    }

    #[tokio::test]
    async fn test_login_sets_session_cookie() {
        let state = create_test_state();
        let user = create_test_user(&state, "alice", "password123").await;
        let server = create_test_server(state.clone());

        let response = server
            .post("/auth/session/create/")
            .json(&json!({"username": "alice", "password": "password123"}))
            .await;

        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>(), json!({"message": "Login successful"}));

        let cookies = response_cookies(&response);
        let key = cookies["sessionid"].value();
        let record = state.sessions.load(key).await.unwrap().unwrap();
        assert_eq!(record.user_id, user.id);

        let stored = state.users.get_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.last_login.is_some());
    }

    #[tokio::test]
    async fn test_login_failures_do_not_reveal_username() {
        let state = create_test_state();
        create_test_user(&state, "alice", "password123").await;
        let server = create_test_server(state);

        let wrong_password = server
            .post("/auth/session/create/")
            .json(&json!({"username": "alice", "password": "wrong"}))
            .await;
        let unknown_user = server
            .post("/auth/session/create/")
            .json(&json!({"username": "nobody", "password": "wrong"}))
            .await;
        let missing_fields = server.post("/auth/session/create/").json(&json!({})).await;

        for response in [&wrong_password, &unknown_user, &missing_fields] {
            response.assert_status(StatusCode::UNAUTHORIZED);
            assert_eq!(response.json::<Value>(), json!({"message": "Invalid credentials"}));
            assert!(response_cookies(response).is_empty());
        }
    }

    #[tokio::test]
    async fn test_login_rotates_existing_session() {
        let state = create_test_state();
        create_test_user(&state, "alice", "password123").await;
        let server = create_test_server(state.clone());

        let first = login_cookie(&server, "alice", "password123").await;

        let response = server
            .post("/auth/session/create/")
            .add_header("cookie", format!("sessionid={first}"))
            .json(&json!({"username": "alice", "password": "password123"}))
            .await;
        response.assert_status(StatusCode::OK);
        let second = response_cookies(&response)["sessionid"].value().to_string();

        assert_ne!(first, second);
        assert!(state.sessions.load(&first).await.unwrap().is_none());
        assert!(state.sessions.load(&second).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_current_user_requires_session() {
        let server = create_test_server(create_test_state());

        let response = server.get("/auth/session/user/").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>(), json!({"message": CREDENTIALS_NOT_PROVIDED}));

        let response = server
            .get("/auth/session/user/")
            .add_header("cookie", "sessionid=made-up")
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_current_user_returns_exactly_six_fields() {
        let state = create_test_state();
        let user = create_test_user(&state, "alice", "password123").await;
        let server = create_test_server(state);
        let key = login_cookie(&server, "alice", "password123").await;

        let response = server
            .get("/auth/session/user/")
            .add_header("cookie", format!("sessionid={key}"))
            .await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        let mut keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["email", "first_name", "id", "last_login", "last_name", "username"]);
        assert_eq!(body["id"], json!(user.id));
        assert_eq!(body["username"], "alice");
        assert!(!body["last_login"].is_null());
    }

    #[tokio::test]
    async fn test_logout_destroys_session_and_is_unconditional() {
        let state = create_test_state();
        create_test_user(&state, "alice", "password123").await;
        let server = create_test_server(state.clone());
        let key = login_cookie(&server, "alice", "password123").await;

        let response = server
            .post("/auth/session/logout/")
            .add_header("cookie", format!("sessionid={key}"))
            .await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>(), json!({"message": "Logout successful"}));
        assert_eq!(response_cookies(&response)["sessionid"].max_age(), Some(time::Duration::ZERO));
        assert!(state.sessions.load(&key).await.unwrap().is_none());

        let response = server
            .get("/auth/session/user/")
            .add_header("cookie", format!("sessionid={key}"))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        // No session at all
        let response = server.post("/auth/session/logout/").await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>(), json!({"message": "Logout successful"}));
    }
}
