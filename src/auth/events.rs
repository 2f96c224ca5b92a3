//! Authentication event reporting
//!
//! The auth service reports outcomes through an injected `AuthObserver`
//! instead of logging directly, so tests can capture what was reported.
//! Events never carry a password or digest.

use std::fmt;
use tracing::{info, warn};

/// Something the auth service wants to report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    RegistrationAttempt { username: String },
    Registered { username: String },
    DuplicateUsername { username: String },
    LoginSucceeded { username: String },
    /// Unknown user and wrong password are deliberately the same event
    LoginRejected,
    TokenRejected,
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthEvent::RegistrationAttempt { .. } => write!(f, "Attempting user registration"),
            AuthEvent::Registered { .. } => write!(f, "User registered"),
            AuthEvent::DuplicateUsername { .. } => write!(f, "Registration rejected: username taken"),
            AuthEvent::LoginSucceeded { .. } => write!(f, "User logged in"),
            AuthEvent::LoginRejected => write!(f, "Invalid login attempt"),
            AuthEvent::TokenRejected => write!(f, "Invalid token presented"),
        }
    }
}

impl AuthEvent {
    fn username(&self) -> Option<&str> {
        match self {
            AuthEvent::RegistrationAttempt { username }
            | AuthEvent::Registered { username }
            | AuthEvent::DuplicateUsername { username }
            | AuthEvent::LoginSucceeded { username } => Some(username),
            AuthEvent::LoginRejected | AuthEvent::TokenRejected => None,
        }
    }
}

/// Observability collaborator for the auth service
pub trait AuthObserver: Send + Sync {
    fn info(&self, event: &AuthEvent);
    fn warn(&self, event: &AuthEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl AuthObserver for TracingObserver {
    fn info(&self, event: &AuthEvent) {
        match event.username() {
            Some(username) => info!(target: "authgate::audit", %username, "{}", event),
            None => info!(target: "authgate::audit", "{}", event),
        }
    }

    fn warn(&self, event: &AuthEvent) {
        match event.username() {
            Some(username) => warn!(target: "authgate::audit", %username, "{}", event),
            None => warn!(target: "authgate::audit", "{}", event),
        }
    }
}
