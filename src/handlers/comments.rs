//! Comment handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{authorize, optional_auth, perm, require_auth};
use crate::db::DomainError;
use crate::error::ApiError;
use crate::models::{CreateCommentRequest, UpdateCommentRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListCommentsQuery {
    pub page_id: i64,
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListCommentsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = optional_auth(&state.config, &headers);
    authorize(&state.db, actor.as_ref(), perm::VIEW_PAGES)?;

    if state.db.get_page_by_id(query.page_id)?.is_none() {
        return Err(ApiError::not_found("Page not found"));
    }

    let comments = state.db.comments_for_page(query.page_id)?;
    Ok(Json(json!({ "comments": comments })))
}

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::COMMENT)?;

    if req.content.trim().is_empty() {
        return Err(ApiError::bad_request("Comment cannot be empty"));
    }

    let page = state
        .db
        .get_page_by_id(req.page_id)?
        .ok_or_else(|| ApiError::not_found("Page not found"))?;

    if !page.comments_enabled {
        return Err(ApiError::forbidden("Comments are disabled on this page"));
    }

    let comment = state
        .db
        .create_comment(req.page_id, actor.id, req.content.trim(), req.parent_id)
        .map_err(|e| match e.downcast_ref::<DomainError>() {
            Some(DomainError::ParentCommentMissing) => {
                ApiError::bad_request("Parent comment not found")
            }
            Some(DomainError::ParentCommentOtherPage) => {
                ApiError::bad_request("Parent comment belongs to a different page")
            }
            _ => ApiError::Internal(e),
        })?;

    let _ = state.db.record_activity(
        Some(actor.id),
        "comment_created",
        &format!("Commented on \"{}\"", page.title),
        None,
        Some("message-circle"),
        Some(&json!({ "page_id": page.id, "comment_id": comment.id })),
    );

    Ok((StatusCode::CREATED, Json(json!({ "comment": comment }))))
}

pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;

    let comment = state
        .db
        .get_comment_by_id(id)?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    // Authors edit their own comments; moderators edit any
    if comment.user_id != actor.id {
        authorize(&state.db, Some(&actor), perm::MODERATE_COMMENTS)?;
    }

    if req.content.trim().is_empty() {
        return Err(ApiError::bad_request("Comment cannot be empty"));
    }

    let comment = state.db.update_comment(id, req.content.trim())?;
    Ok(Json(json!({ "comment": comment })))
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;

    let comment = state
        .db
        .get_comment_by_id(id)?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    if comment.user_id != actor.id {
        authorize(&state.db, Some(&actor), perm::MODERATE_COMMENTS)?;
    }

    state.db.delete_comment(id)?;
    Ok(Json(json!({ "success": true })))
}
