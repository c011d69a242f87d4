//! API request and response data models.
//!
//! API models are distinct from database models so the wire format can evolve independently of
//! storage. All models derive `utoipa::ToSchema` for the OpenAPI document.
//!
//! - [`auth`]: credential, token and message bodies for the token and session endpoints
//! - [`users`]: public user profiles and registration
//!
//! Request fields that the endpoints must report as missing (rather than reject at the JSON
//! layer) are `Option`s; handlers turn `None` into the appropriate error.

pub mod auth;
pub mod users;
