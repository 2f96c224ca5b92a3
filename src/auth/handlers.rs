//! Authentication API handlers

use crate::api::state::AppState;
use crate::auth::middleware::AuthUser;
use crate::auth::models::{CredentialsRequest, LoginResponse, MessageResponse, UserInfo};
use crate::core::error::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

/// Request body extraction whose failure is mapped onto `GateError`
type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;

/// Handler for POST /register - User registration
pub async fn register(
    State(state): State<AppState>,
    body: JsonBody<CredentialsRequest>,
) -> Result<Json<MessageResponse>> {
    let Json(req) = body?;
    state.auth.register(&req.username, &req.password).await?;
    Ok(Json(MessageResponse::registered()))
}

/// Handler for POST /login - User login
pub async fn login(
    State(state): State<AppState>,
    body: JsonBody<CredentialsRequest>,
) -> Result<Json<LoginResponse>> {
    let Json(req) = body?;
    let issued = state.auth.login(&req.username, &req.password).await?;
    Ok(Json(issued.into()))
}

/// Handler for GET /me - Get current user info
pub async fn get_me(user: AuthUser) -> Json<UserInfo> {
    Json(UserInfo {
        username: user.username,
    })
}
