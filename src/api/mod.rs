//! REST API module
//!
//! This module provides the HTTP server and endpoints including:
//! - API routing and request handling
//! - Shared application state
//! - Request tracing middleware

pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use middleware::{trace_id_middleware, TraceId, TRACE_ID_HEADER};
pub use server::{build_router, ApiServer};
pub use state::AppState;
