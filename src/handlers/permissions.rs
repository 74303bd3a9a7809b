//! Permission handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::auth::{authorize, perm, require_auth};
use crate::error::ApiError;
use crate::models::{CreatePermissionRequest, SetTagPermissionsRequest, UpdatePermissionRequest};
use crate::AppState;

pub async fn list_permissions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::MANAGE_PERMISSIONS)?;

    let permissions = state.db.list_permissions()?;
    Ok(Json(json!({ "permissions": permissions })))
}

pub async fn by_category(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::MANAGE_PERMISSIONS)?;

    let grouped = state.db.permissions_by_category()?;
    Ok(Json(json!({ "categories": grouped })))
}

pub async fn create_permission(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreatePermissionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::MANAGE_PERMISSIONS)?;

    if req.name.trim().is_empty() {
        return Err(ApiError::bad_request("Permission name cannot be empty"));
    }

    let permission = state
        .db
        .create_permission(req.name.trim(), req.description.as_deref(), &req.category)
        .map_err(|e| {
            ApiError::conflict_on_unique(e, "A permission with this name already exists")
        })?;

    Ok((StatusCode::CREATED, Json(json!({ "permission": permission }))))
}

pub async fn update_permission(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePermissionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::MANAGE_PERMISSIONS)?;

    if state.db.get_permission_by_id(id)?.is_none() {
        return Err(ApiError::not_found("Permission not found"));
    }

    let permission = state
        .db
        .update_permission(
            id,
            req.name.as_deref(),
            req.description.as_deref(),
            req.category.as_deref(),
        )
        .map_err(|e| {
            ApiError::conflict_on_unique(e, "A permission with this name already exists")
        })?;

    Ok(Json(json!({ "permission": permission })))
}

pub async fn delete_permission(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::MANAGE_PERMISSIONS)?;

    if state.db.get_permission_by_id(id)?.is_none() {
        return Err(ApiError::not_found("Permission not found"));
    }

    state.db.delete_permission(id)?;
    Ok(Json(json!({ "success": true })))
}

pub async fn get_tag_permissions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(tag_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::MANAGE_PERMISSIONS)?;

    let tag = state
        .db
        .get_tag_by_id(tag_id)?
        .ok_or_else(|| ApiError::not_found("Tag not found"))?;

    let permission_ids = state.db.tag_permission_ids(tag_id)?;
    Ok(Json(json!({ "tag": tag, "permission_ids": permission_ids })))
}

/// Replace the full permission set for a tag. Takes effect on the next
/// authorization check; the resolver has no cache.
pub async fn set_tag_permissions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(tag_id): Path<i64>,
    Json(req): Json<SetTagPermissionsRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::MANAGE_PERMISSIONS)?;

    let tag = state
        .db
        .get_tag_by_id(tag_id)?
        .ok_or_else(|| ApiError::not_found("Tag not found"))?;

    state.db.set_tag_permissions(tag_id, &req.permission_ids)?;

    let permission_ids = state.db.tag_permission_ids(tag_id)?;
    Ok(Json(json!({
        "success": true,
        "tag": tag,
        "permission_ids": permission_ids,
    })))
}
