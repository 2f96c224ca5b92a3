//! Database module
//!
//! This module provides the credential store including:
//! - Database connection pool management
//! - The `CredentialStore` repository
//! - Database migrations
//! - Data models and schemas

pub mod manager;
pub mod migrations;
pub mod models;
pub mod repository;

pub use manager::DatabaseManager;
pub use models::{CreateOutcome, UserCredential};
pub use repository::{CredentialStore, UserRepository};
