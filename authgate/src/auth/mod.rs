//! Authentication.
//!
//! Two independent mechanisms share one user store:
//!
//! ## Token authentication
//!
//! - `POST /auth/jwt/create/` checks credentials and issues an access/refresh token pair. The
//!   tokens are returned in the body *and* set as `access`/`refresh` cookies.
//! - Protected endpoints take a [`resolver::TokenUser`], which reads the access token from the
//!   `Authorization: Bearer` header or, when there is no bearer header, from the `access` cookie.
//! - Tokens are stateless; logout only clears the cookies.
//!
//! ## Session authentication
//!
//! - `POST /auth/session/create/` checks credentials and stores a session record. The client
//!   gets an opaque key in the session cookie.
//! - Protected endpoints take a [`session::SessionIdentity`].
//!
//! # Modules
//!
//! - [`cookies`]: cookie policies for the token pair and the session cookie
//! - [`credentials`]: username/password checks
//! - [`password`]: Argon2 hashing
//! - [`resolver`]: the cookie-aware request authenticator
//! - [`session`]: session creation, destruction, and extraction
//! - [`tokens`]: JWT issuance and verification

pub mod cookies;
pub mod credentials;
pub mod password;
pub mod resolver;
pub mod session;
pub mod tokens;
