//! JWT token generation and validation
//!
//! Tokens are HS256-signed and carry `{sub, iat, exp}`. Verification is
//! stateless: it needs only the secret and the current time.

use crate::core::config::SecurityConfig;
use crate::core::error::{GateError, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The only accepted signing algorithm
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token was issued to
    pub sub: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
}

/// Issues and verifies bearer tokens with a server-held secret
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("algorithm", &SIGNING_ALGORITHM)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Derive signing keys from `secret`
    pub fn new(secret: &str, ttl: chrono::Duration) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Result<Self> {
        let ttl = config
            .token_ttl()
            .map_err(|e| GateError::ConfigError(e.to_string()))?;
        Ok(Self::new(&config.jwt_secret, ttl))
    }

    /// Issue a token for `subject` expiring one TTL from now
    pub fn issue(&self, subject: &str) -> Result<String> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| GateError::Internal("Failed to calculate expiration".to_string()))?;

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| GateError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token against the clock reading `now`.
    ///
    /// Bad signatures, malformed input, foreign algorithms and expiry all
    /// surface as the same `InvalidToken`. A token is expired once
    /// `now >= exp`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(reason = ?e.kind(), "Token rejected");
                GateError::InvalidToken
            })?;

        let claims = token_data.claims;
        if now.timestamp() >= claims.exp {
            tracing::debug!("Token rejected: expired");
            return Err(GateError::InvalidToken);
        }
        if claims.sub.is_empty() {
            return Err(GateError::InvalidToken);
        }

        Ok(claims)
    }
}
