//! Admin user management handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::auth::{authorize, perm, require_auth};
use crate::error::ApiError;
use crate::models::{CreateUserRequest, NewUser, UpdateUserRequest};
use crate::AppState;

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::MANAGE_USERS)?;

    let users = state.db.list_users()?;
    Ok(Json(json!({ "users": users })))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::MANAGE_USERS)?;

    let user = state
        .db
        .get_user_by_id(id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let permissions = state.db.effective_permissions(&user)?;

    Ok(Json(json!({ "user": user, "permissions": permissions })))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::MANAGE_USERS)?;

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

    let new_user = NewUser {
        username: req.username.trim().to_string(),
        email: req.email,
        password: req.password,
    };

    let user = match req.tags {
        Some(ref tags) => state.db.create_user_with_tags(new_user, req.is_admin, tags),
        None => state.db.create_user(new_user),
    }
    .map_err(|e| ApiError::conflict_on_unique(e, "A user with this name already exists"))?;

    let user = if req.is_admin && !user.is_admin {
        state.db.set_user_admin(user.id, true)?;
        state
            .db
            .get_user_by_id(user.id)?
            .ok_or_else(|| ApiError::not_found("User not found"))?
    } else {
        user
    };

    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::MANAGE_USERS)?;

    // Prevent self-demotion
    if id == actor.id && req.is_admin == Some(false) {
        return Err(ApiError::bad_request("Cannot remove your own admin status"));
    }

    if state.db.get_user_by_id(id)?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    state
        .db
        .update_profile(id, req.email.as_deref(), req.avatar.as_deref(), req.bio.as_deref())
        .map_err(|e| {
            ApiError::conflict_on_unique(e, "An account with this email already exists")
        })?;

    if let Some(is_admin) = req.is_admin {
        state.db.set_user_admin(id, is_admin)?;
    }

    if let Some(tags) = req.tags {
        state.db.set_user_tags(id, &tags)?;
    }

    let user = state
        .db
        .get_user_by_id(id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(json!({ "success": true, "user": user })))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::MANAGE_USERS)?;

    // Prevent self-deletion
    if id == actor.id {
        return Err(ApiError::bad_request("Cannot delete yourself"));
    }

    if state.db.get_user_by_id(id)?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    state.db.delete_user(id)?;
    Ok(Json(json!({ "success": true })))
}
