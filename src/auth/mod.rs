pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;

pub use password::{PasswordError, PasswordHasher};

/// Session token payload. `exp` is only present when an expiry is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "orgId")]
    pub org_id: Uuid,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    pub fn new(org_id: Uuid, expiry_hours: Option<u64>) -> Result<Self, TokenError> {
        let now = Utc::now();
        let exp = match expiry_hours {
            Some(hours) => {
                let expires_at = i64::try_from(hours)
                    .ok()
                    .and_then(Duration::try_hours)
                    .and_then(|ttl| now.checked_add_signed(ttl))
                    .ok_or_else(|| TokenError::Generation(format!("expiry of {} hours is out of range", hours)))?;
                Some(expires_at.timestamp())
            }
            None => None,
        };

        Ok(Self {
            org_id,
            iat: now.timestamp(),
            exp,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    Generation(String),

    #[error("Invalid JWT token: {0}")]
    Invalid(String),
}

/// HS256 signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expiry_hours: Option<u64>,
}

impl TokenKeys {
    pub fn new(secret: &str, expiry_hours: Option<u64>) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = expiry_hours.is_some();
        if expiry_hours.is_some() {
            validation.required_spec_claims.insert("exp".to_string());
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry_hours,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, TokenError> {
        Self::new(&security.jwt_secret, security.jwt_expiry_hours)
    }

    pub fn issue(&self, org_id: Uuid) -> Result<String, TokenError> {
        let claims = Claims::new(org_id, self.expiry_hours)?;
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}
