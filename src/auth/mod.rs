//! Authentication module
//!
//! This module provides authentication functionality including:
//! - User registration and login
//! - JWT token generation and validation
//! - Password hashing and verification
//! - Bearer token extraction for protected handlers

pub mod events;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;

pub use events::{AuthEvent, AuthObserver, TracingObserver};
pub use handlers::{get_me, login, register};
pub use jwt::{Claims, TokenSigner};
pub use middleware::AuthUser;
pub use password::{CredentialHasher, PasswordHasher};
pub use service::{AuthService, IssuedToken, TOKEN_TYPE};
