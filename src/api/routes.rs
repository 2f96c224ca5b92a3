//! API routes

use crate::api::state::AppState;
use crate::auth::handlers::{get_me, login, register};
use axum::{
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

/// Build the API routes
pub fn build_api_routes(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        // Requires a bearer token via the AuthUser extractor
        .route("/me", get(get_me))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Health check endpoint handler
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
