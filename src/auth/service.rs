//! Authentication service
//!
//! Orchestrates the credential store, password hasher and token signer for
//! the three protocol operations: register, login and identify.

use crate::auth::events::{AuthEvent, AuthObserver};
use crate::auth::jwt::TokenSigner;
use crate::auth::password::{CredentialHasher, MAX_PASSWORD_BYTES};
use crate::core::error::{GateError, Result};
use crate::db::models::{CreateOutcome, UserCredential};
use crate::db::repository::CredentialStore;
use std::sync::Arc;

/// Token type marker returned with every access token
pub const TOKEN_TYPE: &str = "bearer";

/// Longest accepted username, in characters
pub const MAX_USERNAME_CHARS: usize = 64;

/// Verified against when the username is unknown so both login failures
/// cost one bcrypt verification.
const TIMING_DUMMY_PASSWORD: &str = "authgate-timing-equalizer";

/// A freshly minted access token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: TokenSigner,
    observer: Arc<dyn AuthObserver>,
    dummy_digest: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: TokenSigner,
        observer: Arc<dyn AuthObserver>,
    ) -> Result<Self> {
        let dummy_digest = hasher.hash(TIMING_DUMMY_PASSWORD)?;

        Ok(Self {
            store,
            hasher,
            tokens,
            observer,
            dummy_digest,
        })
    }

    /// Store a new credential. No token is issued.
    pub async fn register(&self, username: &str, password: &str) -> Result<()> {
        let username = normalize_username(username)?;
        validate_password(password)?;

        self.observer.info(&AuthEvent::RegistrationAttempt {
            username: username.to_string(),
        });

        let password_hash = self.hash_blocking(password).await?;
        let credential = UserCredential::new(username, password_hash);

        match self.store.create(&credential).await? {
            CreateOutcome::Created => {
                self.observer.info(&AuthEvent::Registered {
                    username: credential.username,
                });
                Ok(())
            }
            CreateOutcome::DuplicateUsername => {
                self.observer.warn(&AuthEvent::DuplicateUsername {
                    username: credential.username,
                });
                Err(GateError::DuplicateUsername)
            }
        }
    }

    /// Check credentials and mint an access token.
    ///
    /// An unknown username and a wrong password produce the same error.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken> {
        let username = normalize_username(username)?;
        if password.is_empty() {
            return Err(GateError::ValidationError(
                "password must not be empty".to_string(),
            ));
        }

        let stored = self.store.find_by_username(username).await?;

        let known = stored.is_some();
        let digest = stored.unwrap_or_else(|| self.dummy_digest.clone());

        // Exactly one verification per attempt, whatever the outcome
        let matched = self.verify_blocking(password, digest).await?;

        // bcrypt truncates longer inputs, which would match on a prefix
        let verified = known && matched && password.len() <= MAX_PASSWORD_BYTES;

        if !verified {
            self.observer.warn(&AuthEvent::LoginRejected);
            return Err(GateError::InvalidCredentials);
        }

        let access_token = self.tokens.issue(username)?;
        self.observer.info(&AuthEvent::LoginSucceeded {
            username: username.to_string(),
        });

        Ok(IssuedToken {
            access_token,
            token_type: TOKEN_TYPE,
        })
    }

    /// Resolve the username bound to a bearer token
    pub fn identify(&self, token: &str) -> Result<String> {
        match self.tokens.verify(token) {
            Ok(claims) => Ok(claims.sub),
            Err(_) => {
                self.observer.warn(&AuthEvent::TokenRejected);
                Err(GateError::InvalidToken)
            }
        }
    }

    async fn hash_blocking(&self, password: &str) -> Result<String> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| GateError::Internal(format!("Hashing task panicked: {}", e)))?
    }

    async fn verify_blocking(&self, password: &str, digest: String) -> Result<bool> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| GateError::Internal(format!("Verification task panicked: {}", e)))
    }
}

fn normalize_username(username: &str) -> Result<&str> {
    let username = username.trim();
    if username.is_empty() {
        return Err(GateError::ValidationError(
            "username must not be empty".to_string(),
        ));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(GateError::ValidationError(format!(
            "username must be at most {} characters",
            MAX_USERNAME_CHARS
        )));
    }
    Ok(username)
}

fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(GateError::ValidationError(
            "password must not be empty".to_string(),
        ));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(GateError::ValidationError(format!(
            "password must be at most {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }
    Ok(())
}
