//! Access and refresh token issuance and verification.
//!
//! Both token kinds are HS256 JWTs signed with the configured `secret_key`. They differ only in
//! their `token_type` claim and lifetime, so a refresh token can never be presented where an
//! access token is expected (and vice versa).

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::Config, errors::Error, types::UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims carried by both token kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: TokenKind,
    pub sub: UserId, // Subject (user ID)
    pub jti: String, // Unique token ID
    pub iat: i64,    // Issued at
    pub exp: i64,    // Expiration time
}

/// A token whose signature, expiry and type have been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedToken {
    pub raw: String,
    pub claims: Claims,
}

impl ValidatedToken {
    pub fn user_id(&self) -> UserId {
        self.claims.sub
    }
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signs and verifies tokens. Cheap to clone.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], access_lifetime: Duration, refresh_lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_lifetime,
            refresh_lifetime,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let secret_key = config.secret_key.as_ref().ok_or_else(|| Error::Internal {
            operation: "create token service: secret_key is required".to_string(),
        })?;

        Ok(Self::new(
            secret_key.as_bytes(),
            config.auth.jwt.access_token_lifetime,
            config.auth.jwt.refresh_token_lifetime,
        ))
    }

    fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_lifetime,
            TokenKind::Refresh => self.refresh_lifetime,
        }
    }

    /// Issue a single token of the given kind for a user
    pub fn issue(&self, user_id: UserId, kind: TokenKind) -> Result<String, Error> {
        let now = Utc::now();
        let lifetime = chrono::Duration::from_std(self.lifetime(kind)).map_err(|e| Error::Internal {
            operation: format!("convert token lifetime: {e}"),
        })?;

        let claims = Claims {
            token_type: kind,
            sub: user_id,
            jti: Uuid::new_v4().simple().to_string(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(lifetime)
                .ok_or_else(|| Error::Internal {
                    operation: "compute token expiry: lifetime out of range".to_string(),
                })?
                .timestamp(),
        };

        self.encode_claims(&claims)
    }

    pub fn issue_pair(&self, user_id: UserId) -> Result<TokenPair, Error> {
        Ok(TokenPair {
            access: self.issue(user_id, TokenKind::Access)?,
            refresh: self.issue(user_id, TokenKind::Refresh)?,
        })
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| Error::Internal {
            operation: format!("create JWT: {e}"),
        })
    }

    /// Verify a token, optionally requiring a specific kind.
    ///
    /// Anything wrong with the token itself (format, signature, expiry, claims, kind) yields
    /// [`Error::InvalidToken`]. Key and crypto failures are server errors.
    pub fn validate(&self, raw: &str, expected: Option<TokenKind>) -> Result<ValidatedToken, Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<Claims>(raw, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            // Client errors (401) - malformed tokens, invalid claims, expired tokens
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::ExpiredSignature
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::ImmatureSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Error::InvalidToken,

            // Server errors (500) - key issues, internal failures
            ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::RsaFailedSigning
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::MissingAlgorithm
            | ErrorKind::Crypto(_) => Error::Internal {
                operation: format!("JWT verification: {e}"),
            },

            _ => Error::Internal {
                operation: format!("JWT verification (unknown error): {e}"),
            },
        })?;

        if expected.is_some_and(|kind| kind != token_data.claims.token_type) {
            return Err(Error::InvalidToken);
        }

        Ok(ValidatedToken {
            raw: raw.to_string(),
            claims: token_data.claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(b"test-secret-key-for-jwt", Duration::from_secs(300), Duration::from_secs(86400))
    }

    #[test]
    fn test_issue_and_validate_access_token() {
        let tokens = service();
        let user_id = Uuid::new_v4();

        let raw = tokens.issue(user_id, TokenKind::Access).unwrap();
        let validated = tokens.validate(&raw, Some(TokenKind::Access)).unwrap();

        assert_eq!(validated.user_id(), user_id);
        assert_eq!(validated.raw, raw);
        assert_eq!(validated.claims.token_type, TokenKind::Access);
        assert_eq!(validated.claims.exp - validated.claims.iat, 300);
    }

    #[test]
    fn test_pair_has_distinct_kinds_and_lifetimes() {
        let tokens = service();
        let user_id = Uuid::new_v4();
        let pair = tokens.issue_pair(user_id).unwrap();

        let access = tokens.validate(&pair.access, None).unwrap();
        let refresh = tokens.validate(&pair.refresh, None).unwrap();

        assert_eq!(access.claims.token_type, TokenKind::Access);
        assert_eq!(refresh.claims.token_type, TokenKind::Refresh);
        assert_eq!(refresh.claims.exp - refresh.claims.iat, 86400);
        assert_ne!(access.claims.jti, refresh.claims.jti);
    }

    #[test]
    fn test_out_of_range_lifetime_is_internal_error() {
        let forever = Duration::from_secs(10_000_000 * 365 * 24 * 3600);
        let tokens = TokenService::new(b"test-secret-key-for-jwt", Duration::from_secs(300), forever);

        assert!(tokens.issue(Uuid::new_v4(), TokenKind::Access).is_ok());
        assert!(matches!(
            tokens.issue(Uuid::new_v4(), TokenKind::Refresh),
            Err(Error::Internal { .. })
        ));
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let tokens = service();
        let pair = tokens.issue_pair(Uuid::new_v4()).unwrap();

        assert!(matches!(
            tokens.validate(&pair.refresh, Some(TokenKind::Access)),
            Err(Error::InvalidToken)
        ));
        assert!(matches!(
            tokens.validate(&pair.access, Some(TokenKind::Refresh)),
            Err(Error::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service();
        let now = Utc::now().timestamp();
        let raw = tokens
            .encode_claims(&Claims {
                token_type: TokenKind::Access,
                sub: Uuid::new_v4(),
                jti: "expired".to_string(),
                iat: now - 600,
                exp: now - 300,
            })
            .unwrap();

        assert!(matches!(tokens.validate(&raw, None), Err(Error::InvalidToken)));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let other = TokenService::new(b"some-other-secret", Duration::from_secs(300), Duration::from_secs(600));
        let raw = other.issue(Uuid::new_v4(), TokenKind::Access).unwrap();

        assert!(matches!(service().validate(&raw, None), Err(Error::InvalidToken)));
    }

    #[test]
    fn test_garbage_is_invalid_not_internal() {
        let tokens = service();
        for raw in ["NO TOKEN", "", "a.b.c", "not-even-close"] {
            assert!(
                matches!(tokens.validate(raw, None), Err(Error::InvalidToken)),
                "expected InvalidToken for {raw:?}"
            );
        }
    }

    #[test]
    fn test_from_config_requires_secret() {
        let config = Config::default();
        assert!(TokenService::from_config(&config).is_err());

        let config = Config {
            secret_key: Some("secret".to_string()),
            ..Default::default()
        };
        assert!(TokenService::from_config(&config).is_ok());
    }
}
