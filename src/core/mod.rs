//! Core application infrastructure
//!
//! This module provides the ambient pieces shared by every component:
//! - Configuration management
//! - Structured logging system
//! - Error handling and type system

pub mod config;
pub mod error;
pub mod logging;

pub use config::Config;
pub use error::{ErrorResponse, GateError, Result};
pub use logging::Logger;
