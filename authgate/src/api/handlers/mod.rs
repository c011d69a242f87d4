//! HTTP request handlers.
//!
//! - [`jwt`]: token pair creation, refresh, verification, and cookie logout
//! - [`session`]: session login, logout, and the current session user
//! - [`users`]: registration and the current token user
//!
//! Handlers return [`crate::errors::Error`] on failure, which converts to the matching status
//! code and JSON body.

pub mod jwt;
pub mod session;
pub mod users;
