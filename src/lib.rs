//! authgate
//!
//! A small user-registration and authentication service: salted password
//! hashes in SQLite, HS256 bearer tokens on login, and token verification
//! for protected routes.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;

// Re-export commonly used types
pub use crate::core::{Config, GateError};
pub use api::{build_router, ApiServer, AppState};
pub use auth::AuthService;
pub use db::DatabaseManager;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
