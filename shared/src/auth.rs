//! Session tokens and password hashing

use crate::{config::AuthConfig, error::AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_token_ttl: Duration,
    bcrypt_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub email: String,
    pub exp: i64, // Expiration time
    pub iat: i64, // Issued at
    pub jti: String, // JWT ID
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub expires_in: i64,
}

impl AuthService {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        if config.jwt_secret.is_empty() {
            return Err(AppError::configuration("JWT secret must not be empty"));
        }

        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        Ok(Self {
            encoding_key,
            decoding_key,
            session_token_ttl: Duration::seconds(config.session_token_ttl_seconds as i64),
            bcrypt_cost: config.bcrypt_cost,
        })
    }

    /// Issue a signed session token for an authenticated user
    pub fn issue_session_token(&self, user_id: &str, email: &str) -> Result<SessionToken> {
        let now = Utc::now();

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: (now + self.session_token_ttl).timestamp(),
            iat: now.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to generate session token: {}", e)))?;

        Ok(SessionToken {
            token,
            expires_in: self.session_token_ttl.num_seconds(),
        })
    }

    /// Validate and decode a session token
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let validation = Validation::default();

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::authentication("Token has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AppError::authentication("Invalid token")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::authentication("Invalid token signature")
                }
                _ => AppError::authentication(format!("Token validation failed: {}", e)),
            })?;

        Ok(token_data.claims)
    }

    /// Hash password with a random per-record salt
    pub fn hash_password(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.bcrypt_cost)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify password
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        bcrypt::verify(password, hash)
            .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service(ttl_seconds: u64) -> AuthService {
        AuthService::new(&AuthConfig {
            jwt_secret: "unit-test-secret".to_string(),
            session_token_ttl_seconds: ttl_seconds,
            bcrypt_cost: 4,
        })
        .unwrap()
    }

    #[test]
    fn test_session_token_round_trip() {
        let auth = test_service(3600);
        let session = auth.issue_session_token("user-1", "alice@example.com").unwrap();

        assert_eq!(session.expires_in, 3600);

        let claims = auth.validate_token(&session.token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let auth = test_service(3600);
        let other = AuthService::new(&AuthConfig {
            jwt_secret: "another-secret".to_string(),
            session_token_ttl_seconds: 3600,
            bcrypt_cost: 4,
        })
        .unwrap();

        let session = other.issue_session_token("user-1", "alice@example.com").unwrap();
        let err = auth.validate_token(&session.token).unwrap_err();
        assert!(matches!(err, AppError::Authentication { .. }));
    }

    #[test]
    fn test_password_hash_uses_random_salt() {
        let auth = test_service(60);
        let first = auth.hash_password("hunter2").unwrap();
        let second = auth.hash_password("hunter2").unwrap();

        assert_ne!(first, second);
        assert!(auth.verify_password("hunter2", &first).unwrap());
        assert!(auth.verify_password("hunter2", &second).unwrap());
        assert!(!auth.verify_password("hunter3", &first).unwrap());
    }

    #[test]
    fn test_empty_secret_is_a_configuration_error() {
        let result = AuthService::new(&AuthConfig {
            jwt_secret: String::new(),
            session_token_ttl_seconds: 60,
            bcrypt_cost: 4,
        });
        assert!(matches!(result, Err(AppError::Configuration { .. })));
    }
}
