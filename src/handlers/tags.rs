//! Tag handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::auth::{authorize, perm, require_auth};
use crate::db::DomainError;
use crate::error::ApiError;
use crate::models::{CreateTagRequest, UpdateTagRequest};
use crate::AppState;

pub async fn list_tags(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::MANAGE_TAGS)?;

    let tags = state.db.list_tags()?;
    Ok(Json(json!({ "tags": tags })))
}

/// Public tag listing (names and colors only), no auth required
pub async fn public_tags(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tags: Vec<serde_json::Value> = state
        .db
        .list_tags()?
        .into_iter()
        .map(|t| json!({ "id": t.id, "name": t.name, "color": t.color }))
        .collect();

    Ok(Json(json!({ "tags": tags })))
}

pub async fn create_tag(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateTagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::MANAGE_TAGS)?;

    if req.name.trim().is_empty() {
        return Err(ApiError::bad_request("Tag name cannot be empty"));
    }

    let tag = state
        .db
        .create_tag(req.name.trim(), req.color.as_deref())
        .map_err(|e| ApiError::conflict_on_unique(e, "A tag with this name already exists"))?;

    Ok((StatusCode::CREATED, Json(json!({ "tag": tag }))))
}

pub async fn update_tag(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTagRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::MANAGE_TAGS)?;

    if state.db.get_tag_by_id(id)?.is_none() {
        return Err(ApiError::not_found("Tag not found"));
    }

    let tag = state
        .db
        .update_tag(id, req.name.as_deref(), req.color.as_deref())
        .map_err(|e| match e.downcast_ref::<DomainError>() {
            Some(DomainError::SystemTagRename) => {
                ApiError::bad_request("System tags cannot be renamed")
            }
            _ => ApiError::conflict_on_unique(e, "A tag with this name already exists"),
        })?;

    Ok(Json(json!({ "tag": tag })))
}

pub async fn delete_tag(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::MANAGE_TAGS)?;

    if state.db.get_tag_by_id(id)?.is_none() {
        return Err(ApiError::not_found("Tag not found"));
    }

    state
        .db
        .delete_tag(id)
        .map_err(|e| match e.downcast_ref::<DomainError>() {
            Some(DomainError::SystemTagDelete) => {
                ApiError::bad_request("System tags cannot be deleted")
            }
            _ => ApiError::Internal(e),
        })?;

    Ok(Json(json!({ "success": true })))
}
