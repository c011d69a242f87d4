//! HTTP handlers for user registration and the token-authenticated profile.

use axum::{Json, extract::State, http::StatusCode};
use tracing::info;

use crate::{
    AppState,
    api::models::users::{RegisterRequest, UserResponse},
    auth::{
        password::{self, Argon2Params},
        resolver::TokenUser,
    },
    db::models::users::UserCreateDBRequest,
    errors::Error,
    types::abbrev_uuid,
};

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/users/",
    request_body = RegisterRequest,
    tag = "users",
    summary = "Register",
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Registration disabled or invalid input"),
        (status = 409, description = "Username already taken"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<(StatusCode, Json<UserResponse>), Error> {
    if !state.config.auth.allow_registration {
        return Err(Error::BadRequest {
            message: "User registration is disabled".to_string(),
        });
    }

    let username = request.username.trim();
    if username.is_empty() {
        return Err(Error::BadRequest {
            message: "Username must not be blank".to_string(),
        });
    }

    let password_config = &state.config.auth.password;
    let password_length = request.password.chars().count();
    if password_length < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if password_length > password_config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }

    let password_hash = password::hash_password_blocking(request.password, Argon2Params::from(password_config)).await?;

    let created = state
        .users
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            password_hash: Some(password_hash),
            is_active: true,
        })
        .await?;
    info!("Registered user {}", abbrev_uuid(&created.id));

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

/// Get the profile of the token's user
#[utoipa::path(
    get,
    path = "/auth/users/me/",
    tag = "users",
    summary = "Current token user",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "No valid access token in header or cookie"),
    ),
    security(
        ("BearerAuth" = []),
        ("AccessCookie" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn me(TokenUser { user, .. }: TokenUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}
