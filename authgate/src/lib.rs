//! # authgate: cookie-aware token and session authentication
//!
//! `authgate` is a small HTTP service that authenticates users in two independent ways and keeps
//! both usable from a browser without any client-side token handling.
//!
//! ## Overview
//!
//! **Token mode.** `POST /auth/jwt/create/` checks a username and password and issues a signed
//! access token and a longer-lived refresh token. Both are returned in the JSON body and also set
//! as `access`/`refresh` cookies. Protected endpoints accept the access token either in an
//! `Authorization: Bearer` header or, when no bearer header is sent, from the `access` cookie.
//! Refresh mints a new access token (the refresh token is not rotated), verify checks the
//! `access` cookie, and logout tells the client to drop both cookies. Tokens are never revoked
//! server-side.
//!
//! **Session mode.** `POST /auth/session/create/` checks the same credentials and stores a
//! server-side session record keyed by an opaque random value carried in the `sessionid` cookie.
//! Logout destroys the record.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum). Users and sessions live behind the
//! [`db::handlers::UserStore`] and [`db::handlers::SessionStore`] traits, with a PostgreSQL
//! implementation (migrations run on startup) and an in-memory one for development and tests.
//!
//! - [`api`]: request/response models and handlers
//! - [`auth`]: tokens, passwords, cookie policy, the cookie-aware request authenticator, sessions
//! - [`db`]: stores, records, migrations
//! - [`config`]: YAML + environment configuration
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use authgate::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = authgate::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     authgate::telemetry::init_telemetry(config.log_format)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    http::{self, HeaderValue, Method},
    routing::{get, post},
};
use bon::Builder;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    auth::{
        cookies::{CookiePolicy, SessionCookiePolicy},
        password::{self, Argon2Params},
        tokens::TokenService,
    },
    config::{CorsOrigin, DatabaseConfig, InitialUserConfig},
    db::{
        handlers::{PgSessions, PgUsers, SessionStore, UserStore},
        in_memory::{InMemorySessions, InMemoryUsers},
        models::users::UserCreateDBRequest,
    },
    openapi::ApiDoc,
};

pub use config::Config;
pub use db::migrator;
pub use types::UserId;

/// Application state shared across all request handlers.
///
/// Cheap to clone: the stores are behind `Arc`s and the rest is small, immutable data derived
/// from [`Config`] at startup.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .users(users)
///     .sessions(sessions)
///     .tokens(tokens)
///     .cookies(cookies)
///     .session_cookies(session_cookies)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub tokens: TokenService,
    pub cookies: CookiePolicy,
    pub session_cookies: SessionCookiePolicy,
}

impl AppState {
    /// Build state from config, deriving the token service and cookie policies from it.
    pub fn from_config(config: Config, users: Arc<dyn UserStore>, sessions: Arc<dyn SessionStore>) -> errors::Result<Self> {
        let tokens = TokenService::from_config(&config)?;
        let cookies = CookiePolicy::from(&config.auth.cookies);
        let session_cookies = SessionCookiePolicy::from(&config.auth.session);

        Ok(Self::builder()
            .config(config)
            .users(users)
            .sessions(sessions)
            .tokens(tokens)
            .cookies(cookies)
            .session_cookies(session_cookies)
            .build())
    }
}

/// Create the initial user if it doesn't exist.
///
/// This function is idempotent - it will create the user if one doesn't exist, or reset the
/// password if the user already exists. Called during startup when `initial_user` is configured.
#[instrument(skip_all, fields(username = %initial.username))]
pub async fn create_initial_user(initial: &InitialUserConfig, users: &dyn UserStore, params: Argon2Params) -> anyhow::Result<UserId> {
    let password_hash = password::hash_password_blocking(initial.password.clone(), params).await?;

    if let Some(existing) = users.get_by_username(&initial.username).await? {
        users.set_password(existing.id, &password_hash).await?;
        info!("Initial user already exists, password reset");
        return Ok(existing.id);
    }

    let created = users
        .create(&UserCreateDBRequest {
            username: initial.username.clone(),
            email: initial.email.clone(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: Some(password_hash),
            is_active: true,
        })
        .await?;
    info!("Initial user created");

    Ok(created.id)
}

/// Stores chosen by the `database` config section, plus the pool to close on shutdown.
struct Stores {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    pool: Option<PgPool>,
}

async fn setup_stores(config: &Config) -> anyhow::Result<Stores> {
    match &config.database {
        DatabaseConfig::InMemory => {
            info!("Using in-memory stores: users and sessions are lost on shutdown");
            Ok(Stores {
                users: Arc::new(InMemoryUsers::new()),
                sessions: Arc::new(InMemorySessions::new(config.auth.session.timeout)),
                pool: None,
            })
        }
        DatabaseConfig::External { url, pool } => {
            info!("Using external database");
            let pg = PgPoolOptions::new()
                .max_connections(pool.max_connections)
                .min_connections(pool.min_connections)
                .acquire_timeout(Duration::from_secs(pool.acquire_timeout_secs))
                .connect(url)
                .await?;
            migrator().run(&pg).await?;

            Ok(Stores {
                users: Arc::new(PgUsers::new(pg.clone())),
                sessions: Arc::new(PgSessions::new(pg.clone())),
                pool: Some(pg),
            })
        }
    }
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.cors;

    let allow_origin = if cors_config.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Browsers send the bare origin, without the trailing slash `Url` adds
                origins.push(url.origin().ascii_serialization().parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_credentials(cors_config.allow_credentials);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// # Errors
///
/// Returns an error if the CORS configuration can't be turned into header values.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        // Token lifecycle
        .route("/auth/jwt/create/", post(api::handlers::jwt::create))
        .route("/auth/jwt/refresh/", post(api::handlers::jwt::refresh))
        .route("/auth/jwt/verify/", post(api::handlers::jwt::verify))
        .route("/auth/jwt/logout/", post(api::handlers::jwt::logout))
        // Users
        .route("/auth/users/", post(api::handlers::users::register))
        .route("/auth/users/me/", get(api::handlers::users::me))
        // Session lifecycle
        .route("/auth/session/create/", post(api::handlers::session::login))
        .route("/auth/session/logout/", post(api::handlers::session::logout))
        .route("/auth/session/user/", get(api::handlers::session::current_user))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(auth_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(create_cors_layer(&state.config)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting authgate with configuration: {:#?}", config.auth);

        let stores = setup_stores(&config).await?;

        if let Some(initial) = &config.initial_user {
            create_initial_user(initial, stores.users.as_ref(), Argon2Params::from(&config.auth.password)).await?;
        }

        let app_state = AppState::from_config(config.clone(), stores.users, stores.sessions)?;
        let router = build_router(&app_state)?;

        Ok(Self {
            router,
            config,
            pool: stores.pool,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("authgate listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        Ok(())
    }
}
