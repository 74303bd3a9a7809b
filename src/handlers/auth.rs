//! Authentication handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::auth::{issue_token, require_auth};
use crate::error::ApiError;
use crate::models::{LoginRequest, NewUser, RegisterRequest, UpdateProfileRequest};
use crate::AppState;

/// Register a new user
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.trim().len() < 3 {
        return Err(ApiError::bad_request(
            "Username must be at least 3 characters",
        ));
    }

    if req.password.len() < 8 {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }

    if state.db.get_user_by_username(&req.username)?.is_some() {
        return Err(ApiError::Conflict("Username already taken".to_string()));
    }

    if let Some(email) = &req.email {
        if state.db.get_user_by_email(email)?.is_some() {
            return Err(ApiError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }
    }

    let user = state
        .db
        .create_user(NewUser {
            username: req.username.trim().to_string(),
            email: req.email,
            password: req.password,
        })
        .map_err(|e| ApiError::conflict_on_unique(e, "Username already taken"))?;

    let _ = state.db.record_activity(
        Some(user.id),
        "user_registered",
        &format!("{} joined the wiki", user.username),
        None,
        Some("user-plus"),
        None,
    );

    let token = issue_token(&state.config, &user)?;
    let permissions = state.db.effective_permissions(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": user,
            "permissions": permissions,
            "token": token,
        })),
    ))
}

/// Login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = state
        .db
        .authenticate_user(&req.username, &req.password)?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let _ = state.db.record_activity(
        Some(user.id),
        "user_login",
        &format!("{} logged in", user.username),
        None,
        Some("log-in"),
        None,
    );

    let token = issue_token(&state.config, &user)?;
    let permissions = state.db.effective_permissions(&user)?;

    Ok(Json(json!({
        "success": true,
        "user": user,
        "permissions": permissions,
        "token": token,
    })))
}

/// Logout. Tokens have no server-side state, so this is a no-op that the
/// client pairs with deleting its stored token.
pub async fn logout() -> Json<serde_json::Value> {
    Json(json!({ "success": true }))
}

/// Get current user
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;

    // A valid token for a deleted account is no longer worth anything
    let user = state
        .db
        .get_user_by_id(actor.id)?
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;
    let permissions = state.db.effective_permissions(&user)?;

    Ok(Json(json!({
        "user": user,
        "permissions": permissions,
    })))
}

/// Verify a token without fetching the full profile
pub async fn verify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;

    Ok(Json(json!({
        "valid": true,
        "user_id": actor.id,
        "username": actor.username,
        "is_admin": actor.is_admin,
    })))
}

/// Update own profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;

    state
        .db
        .update_profile(
            actor.id,
            req.email.as_deref(),
            req.avatar.as_deref(),
            req.bio.as_deref(),
        )
        .map_err(|e| {
            ApiError::conflict_on_unique(e, "An account with this email already exists")
        })?;

    let user = state
        .db
        .get_user_by_id(actor.id)?
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;
    Ok(Json(json!({ "success": true, "user": user })))
}
