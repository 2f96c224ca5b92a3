//! Authentication request/response models

use crate::auth::service::IssuedToken;
use serde::{Deserialize, Serialize};

/// Body of `POST /register` and `POST /login`
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

// Request bodies end up in debug logs; keep the password out
impl std::fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn registered() -> Self {
        Self {
            message: "user registered".to_string(),
        }
    }
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

impl From<IssuedToken> for LoginResponse {
    fn from(token: IssuedToken) -> Self {
        Self {
            access_token: token.access_token,
            token_type: token.token_type.to_string(),
        }
    }
}

/// Current user response
#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
}
