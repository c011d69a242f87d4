//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//! - **[`extractors`]**: Body extractors shared by handlers
//!
//! # Endpoints
//!
//! - **Tokens** (`/auth/jwt/*`): create, refresh, verify, logout
//! - **Users** (`/auth/users/*`): registration, current token user
//! - **Session** (`/auth/session/*`): login, logout, current session user
//!
//! All endpoints are documented with `utoipa`. The rendered reference is served at `/docs`.

pub mod extractors;
pub mod handlers;
pub mod models;
