//! Shared fixtures for unit and handler tests.

use std::collections::HashMap;
use std::sync::Arc;

use axum_extra::extract::cookie::Cookie;
use axum_test::{TestResponse, TestServer};

use crate::{
    AppState,
    auth::password::{self, Argon2Params},
    config::{AuthConfig, Config, PasswordConfig},
    db::{
        handlers::UserStore,
        in_memory::{InMemorySessions, InMemoryUsers},
        models::users::{UserCreateDBRequest, UserDBResponse},
    },
};

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        auth: AuthConfig {
            // Minimum argon2 cost so tests stay fast
            password: PasswordConfig {
                argon2_memory_kib: 8,
                argon2_iterations: 1,
                argon2_parallelism: 1,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

/// State backed by fresh in-memory stores.
pub fn create_test_state() -> AppState {
    let config = create_test_config();
    let sessions = InMemorySessions::new(config.auth.session.timeout);
    AppState::from_config(config, Arc::new(InMemoryUsers::new()), Arc::new(sessions)).expect("Failed to create test state")
}

pub async fn create_test_user(state: &AppState, username: &str, password: &str) -> UserDBResponse {
    let hash = password::hash_password(password, Argon2Params::from(&state.config.auth.password)).expect("Failed to hash password");

    state
        .users
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password_hash: Some(hash),
            is_active: true,
        })
        .await
        .expect("Failed to create test user")
}

/// A test server running the full router over `state`.
pub fn create_test_server(state: AppState) -> TestServer {
    let router = crate::build_router(&state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// Cookies set by a response, keyed by name.
pub fn response_cookies(response: &TestResponse) -> HashMap<String, Cookie<'static>> {
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .map(|value| {
            let cookie = Cookie::parse(value.to_str().expect("non-ascii set-cookie").to_string()).expect("unparseable set-cookie");
            (cookie.name().to_string(), cookie)
        })
        .collect()
}
