//! Repository pattern implementation for the credential store

use crate::core::error::Result;
use crate::db::manager::DatabaseManager;
use crate::db::models::{CreateOutcome, UserCredential};
use async_trait::async_trait;
use rusqlite::{ErrorCode, OptionalExtension};
use std::sync::Arc;

/// Persistence contract for (username, password_hash) pairs
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a credential. Uniqueness is decided by the store in the same
    /// statement that writes the row.
    async fn create(&self, credential: &UserCredential) -> Result<CreateOutcome>;

    /// Look up the stored digest for `username`
    async fn find_by_username(&self, username: &str) -> Result<Option<String>>;
}

/// SQLite-backed credential store
pub struct UserRepository {
    db: Arc<DatabaseManager>,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Count stored credentials
    pub async fn count(&self) -> Result<i64> {
        self.db
            .execute(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?))
            .await
    }
}

#[async_trait]
impl CredentialStore for UserRepository {
    async fn create(&self, credential: &UserCredential) -> Result<CreateOutcome> {
        let credential = credential.clone();
        self.db
            .execute(move |conn| {
                let inserted = conn.execute(
                    "INSERT INTO users (username, password_hash) VALUES (?, ?)",
                    rusqlite::params![&credential.username, &credential.password_hash],
                );

                match inserted {
                    Ok(_) => Ok(CreateOutcome::Created),
                    Err(e) if is_unique_violation(&e) => Ok(CreateOutcome::DuplicateUsername),
                    Err(e) => Err(e.into()),
                }
            })
            .await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<String>> {
        let username = username.to_string();
        self.db
            .execute(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT password_hash FROM users WHERE username = ?",
                        [&username],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await
    }
}

/// True for the constraint failures raised by the `users` primary key
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && matches!(
                    e.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                        | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                )
        }
        _ => false,
    }
}
