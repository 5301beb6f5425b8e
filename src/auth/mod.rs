use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub tenant_id: String,
    pub user_id: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(tenant_id: String, user_id: String, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            tenant_id,
            user_id,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Why a request could not be turned into a caller context
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,
    #[error("Authorization header must use Bearer token format")]
    InvalidScheme,
    #[error("Empty JWT token")]
    EmptyToken,
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("JWT secret not configured")]
    NotConfigured,
}

/// Request metadata recorded alongside every audited change
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditMetadata {
    pub location: String,
    pub user_agent: Option<String>,
}

impl AuditMetadata {
    /// Location is the originating client address: first `x-forwarded-for` hop, then `x-real-ip`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header_str = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let location = header_str("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .or_else(|| header_str("x-real-ip"))
            .unwrap_or_default()
            .to_string();

        Self {
            location,
            user_agent: header_str("user-agent").map(str::to_string),
        }
    }
}

/// Authenticated caller, resolved once per request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallerContext {
    pub user_id: String,
    pub tenant_id: String,
    pub audit: AuditMetadata,
}

/// Resolves the caller behind a request.
///
/// Handlers trust whatever context the authenticator returns, so
/// implementations are responsible for all identity checks.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<CallerContext, AuthError>;
}

/// Bearer-token authenticator for HS256 tokens minted by [`generate_jwt`]
pub struct JwtAuthenticator {
    secret: String,
}

impl JwtAuthenticator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::NotConfigured);
        }

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(token_data.claims)
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<CallerContext, AuthError> {
        let token = extract_bearer_token(headers)?;
        let claims = self.validate(token)?;

        Ok(CallerContext {
            user_id: claims.user_id,
            tenant_id: claims.tenant_id,
            audit: AuditMetadata::from_headers(headers),
        })
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_str = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidScheme)?;

    let token = auth_str.strip_prefix("Bearer ").ok_or(AuthError::InvalidScheme)?;
    if token.trim().is_empty() {
        return Err(AuthError::EmptyToken);
    }
    Ok(token.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "unit-test-secret";

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn round_trips_claims_into_caller() {
        let token = generate_jwt(&Claims::new("t1".into(), "u1".into(), 1), SECRET).unwrap();
        let mut headers = bearer(&token);
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("user-agent", HeaderValue::from_static("curl/8.4"));

        let caller = JwtAuthenticator::new(SECRET).authenticate(&headers).await.unwrap();
        assert_eq!(caller.tenant_id, "t1");
        assert_eq!(caller.user_id, "u1");
        assert_eq!(caller.audit.location, "203.0.113.7");
        assert_eq!(caller.audit.user_agent.as_deref(), Some("curl/8.4"));
    }

    #[tokio::test]
    async fn rejects_token_signed_with_other_secret() {
        let token = generate_jwt(&Claims::new("t1".into(), "u1".into(), 1), "other").unwrap();
        let err = JwtAuthenticator::new(SECRET).authenticate(&bearer(&token)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn rejects_missing_and_malformed_headers() {
        let auth = JwtAuthenticator::new(SECRET);
        assert!(matches!(auth.authenticate(&HeaderMap::new()).await, Err(AuthError::MissingHeader)));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(matches!(auth.authenticate(&headers).await, Err(AuthError::InvalidScheme)));

        assert!(matches!(auth.authenticate(&bearer(" ")).await, Err(AuthError::EmptyToken)));
    }

    #[test]
    fn location_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(AuditMetadata::from_headers(&headers).location, "198.51.100.2");
        assert_eq!(AuditMetadata::from_headers(&HeaderMap::new()), AuditMetadata::default());
    }

    #[test]
    fn refuses_to_sign_without_secret() {
        let claims = Claims::new("t1".into(), "u1".into(), 1);
        assert!(matches!(generate_jwt(&claims, ""), Err(JwtError::InvalidSecret)));
    }
}
