//! OpenAPI documentation.
//!
//! [`ApiDoc`] collects every handler's `utoipa::path` annotation. The document is served as JSON
//! at `/openapi.json` and rendered with Scalar at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Registers the three ways a caller can prove who they are.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Access token in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer ACCESS_TOKEN\n```\n\n\
                            When no bearer header is sent, the `access` cookie is used instead.",
                        ))
                        .build(),
                ),
            );
            components.security_schemes.insert(
                "AccessCookie".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "access",
                    "Access token cookie, set by `POST /auth/jwt/create/` and `POST /auth/jwt/refresh/`.",
                ))),
            );
            components.security_schemes.insert(
                "SessionCookie".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "sessionid",
                    "Opaque session key, set by `POST /auth/session/create/`.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "authgate",
        description = "Cookie-carried JWT issuance, refresh and verification, plus server-side session login."
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::jwt::create,
        api::handlers::jwt::refresh,
        api::handlers::jwt::verify,
        api::handlers::jwt::logout,
        api::handlers::users::register,
        api::handlers::users::me,
        api::handlers::session::login,
        api::handlers::session::logout,
        api::handlers::session::current_user,
    ),
    components(
        schemas(
            api::models::auth::CredentialsRequest,
            api::models::auth::RefreshRequest,
            api::models::auth::TokenPairResponse,
            api::models::auth::AccessTokenResponse,
            api::models::auth::VerifyResponse,
            api::models::auth::MessageResponse,
            api::models::users::RegisterRequest,
            api::models::users::UserResponse,
            api::models::users::SessionUserResponse,
        )
    ),
    tags(
        (name = "tokens", description = "Access/refresh token lifecycle"),
        (name = "users", description = "Registration and token-authenticated profile"),
        (name = "session", description = "Server-side session login"),
    )
)]
pub struct ApiDoc;
