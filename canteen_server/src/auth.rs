//! Caller authentication.
//!
//! Callers present an HS256-signed JWT in the `Authorization: Bearer <token>` header. The token's `sub` claim is the
//! caller's account id. [`JwtClaims`] is an actix extractor; handlers take it as `Option<JwtClaims>` so that a
//! missing or invalid token reaches the engine as "no caller", which rejects the request before any side effect.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use canteen_engine::payment_objects::Caller;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The caller's account id
    pub sub: String,
    /// Expiry, as a unix timestamp in seconds
    pub exp: i64,
}

impl JwtClaims {
    pub fn caller(&self) -> Caller {
        Caller::new(self.sub.clone())
    }
}

/// Validates access tokens. Registered as app data so that the [`JwtClaims`] extractor can find it.
#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { key, validation: Validation::new(Algorithm::HS256) }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::ValidationError("The token has no subject".into()));
        }
        Ok(data.claims)
    }

    /// Pulls the bearer token out of the request headers and validates it.
    pub fn validate_request(&self, req: &HttpRequest) -> Result<JwtClaims, AuthError> {
        let header = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
        let header = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let token = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a bearer token".into()))?;
        self.validate(token.trim())
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<TokenValidator>>() {
            Some(validator) => validator.validate_request(req).map_err(|e| {
                debug!("🔐️ Rejected access token for {}. {e}", req.path());
                ServerError::AuthenticationError(e)
            }),
            None => {
                error!("🔐️ No token validator has been registered with the server. All requests will be rejected.");
                Err(ServerError::ConfigurationError("Token validator is not configured".into()))
            },
        };
        ready(result)
    }
}

/// Signs access tokens with the server's JWT secret. The identity provider normally issues tokens; this is for tests
/// and tooling.
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes()) }
    }

    /// Issue a new access token for `account_id`, valid for `duration` (one day if not given).
    pub fn issue_token(&self, account_id: &str, duration: Option<Duration>) -> Result<String, AuthError> {
        let duration = duration.unwrap_or_else(|| Duration::days(1));
        let claims = JwtClaims { sub: account_id.to_string(), exp: (Utc::now() + duration).timestamp() };
        encode(&Header::new(Algorithm::HS256), &claims, &self.key).map_err(|e| AuthError::ValidationError(e.to_string()))
    }
}
