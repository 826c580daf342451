//! Authentication and authorization utilities
//!
//! Provides:
//! - API key generation and validation
//! - JWT token generation and validation
//! - Per-request user context extraction

use crate::errors::{AppError, Result};
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Extracted authentication context available to handlers
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authenticated user
    pub user_id: Uuid,

    /// API key (if authenticated via API key)
    pub api_key: Option<String>,

    /// User role: user or admin
    pub role: String,

    /// Request ID for tracing
    pub request_id: String,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    /// Require that the context owns the given resource.
    ///
    /// Admins bypass ownership checks.
    pub fn require_owner(&self, owner_id: Uuid) -> Result<()> {
        if self.user_id == owner_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: "Resource belongs to another user".to_string(),
            })
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Role granted to the token
    #[serde(default = "default_role")]
    pub role: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

fn default_role() -> String {
    "user".to_string()
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
        }
    }

    /// Generate a new JWT token
    pub fn generate_token(&self, user_id: Uuid, role: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to generate token: {}", e),
        })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::InvalidApiKey,
            })
    }
}

/// Hash an API key for storage
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Validate an API key against a stored hash
pub fn validate_api_key(api_key: &str, stored_hash: &str) -> bool {
    hash_api_key(api_key) == stored_hash
}

/// Generate a new API key
pub fn generate_api_key() -> String {
    let random_bytes: [u8; 32] = rand::random();
    format!("pk_{}", hex::encode(random_bytes))
}

/// Extract the bearer token from an Authorization header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Axum extractor for AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        // Extract request ID
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        // Extract user ID
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing or invalid X-User-ID header".to_string(),
            })?;

        // Extract API key or JWT
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let api_key = extract_bearer(auth_header).map(String::from);

        // Bearer values are either pk_-prefixed API keys or JWTs.
        if let Some(ref key) = api_key {
            if !key.starts_with("pk_") && key.split('.').count() != 3 {
                return Err(AppError::InvalidApiKey);
            }
        }

        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("user")
            .to_string();

        Ok(AuthContext {
            user_id,
            api_key,
            role,
            request_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_api_key() {
        let key = "pk_test_12345";
        let hash = hash_api_key(key);
        assert!(validate_api_key(key, &hash));
        assert!(!validate_api_key("wrong_key", &hash));
    }

    #[test]
    fn test_generate_api_key() {
        let key = generate_api_key();
        assert!(key.starts_with("pk_"));
        assert!(key.len() > 10);
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer pk_123"), Some("pk_123"));
        assert_eq!(extract_bearer("pk_123"), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test_secret", 3600);

        let user_id = Uuid::new_v4();
        let token = manager.generate_token(user_id, "admin").unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn test_ownership_check() {
        let owner = Uuid::new_v4();
        let ctx = AuthContext {
            user_id: owner,
            api_key: None,
            role: "user".to_string(),
            request_id: "r".to_string(),
        };
        assert!(ctx.require_owner(owner).is_ok());
        assert!(ctx.require_owner(Uuid::new_v4()).is_err());

        let admin = AuthContext {
            user_id: Uuid::new_v4(),
            api_key: None,
            role: "admin".to_string(),
            request_id: "r".to_string(),
        };
        assert!(admin.require_owner(owner).is_ok());
    }
}
