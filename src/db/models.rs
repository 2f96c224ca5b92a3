//! Database models
//!
//! Data structures representing database tables

use std::fmt;

/// Row of the `users` table.
///
/// `password_hash` is an opaque self-describing digest. It is never
/// serialized into a response and is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct UserCredential {
    pub username: String,
    pub password_hash: String,
}

impl UserCredential {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
        }
    }
}

impl fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredential")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Outcome of inserting a credential.
///
/// A duplicate username is an expected result of `create`, not a storage
/// failure; storage failures travel in the `Err` side of the `Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    DuplicateUsername,
}
