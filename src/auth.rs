//! Credential check and bearer token issuance/verification.
//!
//! Tokens are stateless HS256 JWTs: a token is valid exactly when its
//! signature checks out and its expiry has not passed.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::state::AppState;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// The authenticated caller, attached to request extensions by `require_token`.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub username: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// Bodies that are not a JSON object with string fields carry no credentials.
    pub fn from_body(body: &[u8]) -> AuthResult<Self> {
        serde_json::from_slice(body).map_err(|_| AuthError::MissingCredentials)
    }
}

pub struct AuthGateway {
    users: BTreeMap<String, String>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl_secs: i64,
}

impl AuthGateway {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            users: config.users.clone(),
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            token_ttl_secs: i64::try_from(config.token_ttl_secs).unwrap_or(i64::MAX),
        }
    }

    /// Checks the credential pair and issues a signed access token.
    pub fn login(&self, username: Option<&str>, password: Option<&str>) -> AuthResult<String> {
        let (username, password) = match (username, password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
            _ => return Err(AuthError::MissingCredentials),
        };

        // Unknown users and wrong passwords share one response.
        let known = self
            .users
            .get(username)
            .is_some_and(|secret| constant_time_compare(secret, password));
        if !known {
            warn!(username, "Rejected login");
            return Err(AuthError::BadCredentials);
        }

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: username.to_string(),
            iat: now,
            exp: now.saturating_add(self.token_ttl_secs),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenIssue(e.to_string()))?;

        info!(username, "Issued access token");
        Ok(token)
    }

    /// Verifies signature and expiry of a bearer token.
    pub fn authorize(&self, token: &str) -> AuthResult<Identity> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AuthError::InvalidOrExpiredToken)?;
        Ok(Identity {
            username: data.claims.sub,
        })
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header_value: &str) -> AuthResult<&str> {
    let header = header_value.trim();
    if header.is_empty() {
        return Err(AuthError::MissingToken);
    }

    let (scheme, token) = header
        .split_once(char::is_whitespace)
        .ok_or(AuthError::InvalidOrExpiredToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidOrExpiredToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidOrExpiredToken);
    }
    Ok(token)
}

/// Compares secrets without short-circuiting on content or length.
pub fn constant_time_compare(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();

    let mut diff = u8::from(expected.len() != provided.len());
    for i in 0..expected.len().max(provided.len()) {
        let x = expected.get(i).copied().unwrap_or(0);
        let y = provided.get(i).copied().unwrap_or(0);
        diff |= x ^ y;
    }

    diff == 0
}

/// Middleware guarding protected routes.
pub async fn require_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidOrExpiredToken)?;
    let token = extract_bearer(header)?;
    let identity = state.auth.authorize(token)?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
