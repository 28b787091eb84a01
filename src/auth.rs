//! Auth context: resolves the acting user from a bearer token.
//!
//! Token issuance, refresh and role management belong to the identity
//! service; this module only validates HS256 tokens it is handed and exposes
//! the acting usuario id to handlers.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Acting usuario id
    pub sub: i32,
    /// Display name, informational only
    #[serde(default)]
    pub nombre: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Issues a token for the given usuario. Used by tests and local tooling;
/// production tokens come from the identity service with the same claims.
pub fn issue_token(
    usuario_id: i32,
    nombre: Option<String>,
    secret: &str,
    ttl_secs: i64,
) -> Result<String, ServiceError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: usuario_id,
        nombre,
        iat: now,
        exp: now + ttl_secs,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ServiceError::InternalError(format!("Failed to issue token: {}", e)))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, ServiceError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| ServiceError::Unauthorized(format!("Invalid token: {}", e)))
}

/// Extractor that authenticates the request and exposes the acting usuario.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub usuario_id: i32,
    pub nombre: Option<String>,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServiceError::Unauthorized("Missing Authorization header".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ServiceError::Unauthorized("Expected a Bearer token".into()))?;

        let claims = decode_token(token, &state.config.jwt_secret)?;

        Ok(AuthenticatedUser {
            usuario_id: claims.sub,
            nombre: claims.nombre,
        })
    }
}
