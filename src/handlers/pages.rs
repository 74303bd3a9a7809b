//! Wiki page handlers: CRUD, history, sections

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::auth::{authorize, authorize_protected, optional_auth, perm, require_auth, AuthUser};
use crate::error::ApiError;
use crate::models::{
    CommentsEnabledRequest, CreatePageRequest, ProtectPageRequest, RenamePageRequest,
    RenameSectionRequest, ReorderSectionsRequest, UpdatePageRequest, UpdateSectionRequest,
    WikiPage,
};
use crate::{sections, AppState};

fn load_page(state: &AppState, id: i64) -> Result<WikiPage, ApiError> {
    state
        .db
        .get_page_by_id(id)?
        .ok_or_else(|| ApiError::not_found("Page not found"))
}

/// Protected pages additionally require admin status or protect_pages for
/// content updates, renames and deletes.
fn check_protection(
    state: &AppState,
    page: &WikiPage,
    actor: Option<&AuthUser>,
) -> Result<(), ApiError> {
    if page.is_protected {
        authorize_protected(&state.db, actor)?;
    }
    Ok(())
}

pub async fn list_pages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = optional_auth(&state.config, &headers);
    authorize(&state.db, actor.as_ref(), perm::VIEW_PAGES)?;

    let pages = state.db.list_pages()?;
    Ok(Json(json!({ "pages": pages })))
}

pub async fn get_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = optional_auth(&state.config, &headers);
    authorize(&state.db, actor.as_ref(), perm::VIEW_PAGES)?;

    let page = load_page(&state, id)?;
    Ok(Json(json!({ "page": page })))
}

pub async fn create_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreatePageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::CREATE_PAGES)?;

    if req.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title cannot be empty"));
    }

    let page = state
        .db
        .create_page(req.title.trim(), &req.content, req.icon.as_deref(), actor.id)
        .map_err(|e| ApiError::conflict_on_unique(e, "A page with this title already exists"))?;

    let _ = state.db.record_activity(
        Some(actor.id),
        "page_created",
        &format!("Created page \"{}\"", page.title),
        None,
        Some("file-plus"),
        Some(&json!({ "page_id": page.id })),
    );

    Ok((StatusCode::CREATED, Json(json!({ "page": page }))))
}

pub async fn update_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePageRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::EDIT_PAGES)?;

    let page = load_page(&state, id)?;
    check_protection(&state, &page, Some(&actor))?;

    let page = state
        .db
        .update_content(id, &req.content, req.icon.as_deref(), actor.id)?;

    let _ = state.db.record_activity(
        Some(actor.id),
        "page_updated",
        &format!("Updated page \"{}\"", page.title),
        None,
        Some("edit"),
        Some(&json!({ "page_id": page.id })),
    );

    Ok(Json(json!({ "page": page })))
}

pub async fn rename_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<RenamePageRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::RENAME_PAGES)?;

    if req.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title cannot be empty"));
    }

    let page = load_page(&state, id)?;
    check_protection(&state, &page, Some(&actor))?;

    let old_title = page.title.clone();
    let page = state
        .db
        .rename_page(id, req.title.trim(), actor.id)
        .map_err(|e| ApiError::conflict_on_unique(e, "A page with this title already exists"))?;

    let _ = state.db.record_activity(
        Some(actor.id),
        "page_renamed",
        &format!("Renamed \"{}\" to \"{}\"", old_title, page.title),
        None,
        Some("edit-3"),
        Some(&json!({ "page_id": page.id })),
    );

    Ok(Json(json!({ "page": page })))
}

pub async fn protect_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<ProtectPageRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::PROTECT_PAGES)?;

    load_page(&state, id)?;
    state.db.set_page_protected(id, req.protected)?;

    let page = load_page(&state, id)?;
    Ok(Json(json!({ "page": page })))
}

pub async fn set_comments_enabled(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<CommentsEnabledRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::EDIT_PAGES)?;

    load_page(&state, id)?;
    state.db.set_page_comments_enabled(id, req.enabled)?;

    let page = load_page(&state, id)?;
    Ok(Json(json!({ "page": page })))
}

pub async fn delete_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::DELETE_PAGES)?;

    let page = load_page(&state, id)?;
    check_protection(&state, &page, Some(&actor))?;

    state.db.delete_page(id)?;

    let _ = state.db.record_activity(
        Some(actor.id),
        "page_deleted",
        &format!("Deleted page \"{}\"", page.title),
        None,
        Some("trash"),
        None,
    );

    Ok(Json(json!({ "success": true })))
}

// ============================================================================
// Version history
// ============================================================================

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = optional_auth(&state.config, &headers);
    authorize(&state.db, actor.as_ref(), perm::VIEW_PAGES)?;

    load_page(&state, id)?;
    let history = state.db.history_for_page(id)?;
    Ok(Json(json!({ "history": history })))
}

pub async fn get_history_detail(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, history_id)): Path<(i64, i64)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = optional_auth(&state.config, &headers);
    authorize(&state.db, actor.as_ref(), perm::VIEW_PAGES)?;

    let detail = state
        .db
        .history_detail(id, history_id)?
        .ok_or_else(|| ApiError::not_found("History entry not found"))?;

    Ok(Json(json!({ "version": detail })))
}

/// Restore an archived version by pushing its content through the normal
/// update path, which archives the current state first. History is never
/// rewritten.
pub async fn restore_version(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, history_id)): Path<(i64, i64)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::EDIT_PAGES)?;

    let page = load_page(&state, id)?;
    check_protection(&state, &page, Some(&actor))?;

    let detail = state
        .db
        .history_detail(id, history_id)?
        .ok_or_else(|| ApiError::not_found("History entry not found"))?;

    let page = state.db.update_content(id, &detail.content, None, actor.id)?;

    let _ = state.db.record_activity(
        Some(actor.id),
        "page_updated",
        &format!("Restored an earlier version of \"{}\"", page.title),
        None,
        Some("rotate-ccw"),
        Some(&json!({ "page_id": page.id, "restored_from": history_id })),
    );

    Ok(Json(json!({ "page": page })))
}

// ============================================================================
// Sections
// ============================================================================

pub async fn get_sections(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = optional_auth(&state.config, &headers);
    authorize(&state.db, actor.as_ref(), perm::VIEW_PAGES)?;

    let page = load_page(&state, id)?;
    let sections = sections::parse_sections(&page.content);
    Ok(Json(json!({ "sections": sections })))
}

pub async fn update_section(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, section_id)): Path<(i64, String)>,
    Json(req): Json<UpdateSectionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::EDIT_PAGES)?;

    let page = load_page(&state, id)?;
    check_protection(&state, &page, Some(&actor))?;

    let content = sections::replace_section_content(&page.content, &section_id, &req.content)
        .ok_or_else(|| ApiError::not_found("Section not found"))?;

    let page = state.db.update_content(id, &content, None, actor.id)?;

    let _ = state.db.record_activity(
        Some(actor.id),
        "page_updated",
        &format!("Updated a section of \"{}\"", page.title),
        None,
        Some("edit"),
        Some(&json!({ "page_id": page.id, "section_id": section_id })),
    );

    Ok(Json(json!({ "page": page })))
}

pub async fn rename_section(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, section_id)): Path<(i64, String)>,
    Json(req): Json<RenameSectionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::EDIT_PAGES)?;

    let page = load_page(&state, id)?;
    check_protection(&state, &page, Some(&actor))?;

    let content = sections::rename_section(&page.content, &section_id, &req.title)
        .ok_or_else(|| ApiError::not_found("Section not found"))?;

    let page = state.db.update_content(id, &content, None, actor.id)?;
    Ok(Json(json!({ "page": page })))
}

/// Reordering re-serializes the whole page in the new order; it is a content
/// rewrite and creates a history entry like any other edit.
pub async fn reorder_sections(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<ReorderSectionsRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = require_auth(&state.config, &headers)?;
    authorize(&state.db, Some(&actor), perm::EDIT_PAGES)?;

    let page = load_page(&state, id)?;
    check_protection(&state, &page, Some(&actor))?;

    let content = sections::reorder_sections(&page.content, &req.order)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let page = state.db.update_content(id, &content, None, actor.id)?;
    Ok(Json(json!({ "page": page })))
}
