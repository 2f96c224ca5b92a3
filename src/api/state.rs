//! Shared application state

use crate::auth::{AuthService, PasswordHasher, TokenSigner, TracingObserver};
use crate::core::config::SecurityConfig;
use crate::core::error::Result;
use crate::db::{DatabaseManager, UserRepository};
use std::sync::Arc;

/// Shared application state for handlers.
///
/// Built once at startup; holds no per-request mutable state.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(auth: Arc<AuthService>) -> Self {
        Self { auth }
    }

    /// Wire the production auth service over a database pool
    pub fn from_config(security: &SecurityConfig, db: Arc<DatabaseManager>) -> Result<Self> {
        let auth = AuthService::new(
            Arc::new(UserRepository::new(db)),
            Arc::new(PasswordHasher::new(security.bcrypt_cost)),
            TokenSigner::from_config(security)?,
            Arc::new(TracingObserver),
        )?;

        Ok(Self::new(Arc::new(auth)))
    }
}
