//! API request/response models for users.

use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Profile returned to a session-authenticated caller.
///
/// Exactly these six fields are exposed. Nothing else from the user record is serialized.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SessionUserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub last_login: Option<DateTime<Utc>>,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<UserDBResponse> for SessionUserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            last_login: db.last_login,
            username: db.username,
            email: db.email,
            first_name: db.first_name,
            last_name: db.last_name,
        }
    }
}

/// Profile returned to a token-authenticated caller and after registration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}
