//! Cookie policies for the token pair and the session cookie.
//!
//! A [`CookiePolicy`] is built once from configuration and handed to every handler that sets or
//! clears cookies. Handlers never read cookie attributes from config directly.

use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::config::{CookieConfig, SessionConfig};

/// Attributes shared by one family of cookies.
#[derive(Debug, Clone)]
pub struct CookieAttributes {
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl CookieAttributes {
    fn build(&self, name: String, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build((name, value))
            .path(self.path.clone())
            .secure(self.secure)
            .http_only(self.http_only)
            .same_site(self.same_site)
            .max_age(to_cookie_duration(max_age))
            .build()
    }

    /// A cookie that tells the client to drop `name`. Path must match the one it was set with.
    fn removal(&self, name: String) -> Cookie<'static> {
        let mut cookie = Cookie::build((name, ""))
            .path(self.path.clone())
            .secure(self.secure)
            .http_only(self.http_only)
            .same_site(self.same_site)
            .build();
        cookie.make_removal();
        cookie
    }
}

fn to_cookie_duration(duration: Duration) -> time::Duration {
    time::Duration::seconds(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
}

/// Policy for the `access`/`refresh` cookie pair.
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    pub access_name: String,
    pub refresh_name: String,
    pub access_max_age: Duration,
    pub refresh_max_age: Duration,
    pub attributes: CookieAttributes,
}

impl From<&CookieConfig> for CookiePolicy {
    fn from(config: &CookieConfig) -> Self {
        Self {
            access_name: config.access_name.clone(),
            refresh_name: config.refresh_name.clone(),
            access_max_age: config.access_max_age,
            refresh_max_age: config.refresh_max_age,
            attributes: CookieAttributes {
                path: config.path.clone(),
                secure: config.secure,
                http_only: config.http_only,
                same_site: config.same_site.into(),
            },
        }
    }
}

impl CookiePolicy {
    pub fn access_cookie(&self, token: &str) -> Cookie<'static> {
        self.attributes
            .build(self.access_name.clone(), token.to_string(), self.access_max_age)
    }

    pub fn refresh_cookie(&self, token: &str) -> Cookie<'static> {
        self.attributes
            .build(self.refresh_name.clone(), token.to_string(), self.refresh_max_age)
    }

    pub fn access_removal(&self) -> Cookie<'static> {
        self.attributes.removal(self.access_name.clone())
    }

    pub fn refresh_removal(&self) -> Cookie<'static> {
        self.attributes.removal(self.refresh_name.clone())
    }
}

/// Policy for the server-side session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookiePolicy {
    pub name: String,
    pub max_age: Duration,
    pub attributes: CookieAttributes,
}

impl From<&SessionConfig> for SessionCookiePolicy {
    fn from(config: &SessionConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            max_age: config.timeout,
            attributes: CookieAttributes {
                path: config.path.clone(),
                secure: config.secure,
                http_only: config.http_only,
                same_site: config.same_site.into(),
            },
        }
    }
}

impl SessionCookiePolicy {
    pub fn cookie(&self, session_key: &str) -> Cookie<'static> {
        self.attributes
            .build(self.name.clone(), session_key.to_string(), self.max_age)
    }

    pub fn removal(&self) -> Cookie<'static> {
        self.attributes.removal(self.name.clone())
    }
}
