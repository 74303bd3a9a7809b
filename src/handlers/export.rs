//! Export handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Json},
};
use crate::auth::{authorize, optional_auth, perm};
use crate::error::ApiError;
use crate::models::{BulkExportRequest, WikiPage};
use crate::{export, AppState};

fn load_page(state: &AppState, id: i64) -> Result<WikiPage, ApiError> {
    state
        .db
        .get_page_by_id(id)?
        .ok_or_else(|| ApiError::not_found("Page not found"))
}

fn attachment_headers(filename: &str, content_type: &str) -> [(header::HeaderName, String); 2] {
    [
        (header::CONTENT_TYPE, content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ]
}

pub async fn export_markdown(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(page_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = optional_auth(&state.config, &headers);
    authorize(&state.db, actor.as_ref(), perm::EXPORT_PAGES)?;

    let page = load_page(&state, page_id)?;
    let body = export::export_markdown(&page);
    let filename = format!("{}.md", export::safe_filename(&page.title));

    Ok((
        attachment_headers(&filename, "text/markdown; charset=utf-8"),
        body,
    ))
}

pub async fn export_html(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(page_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = optional_auth(&state.config, &headers);
    authorize(&state.db, actor.as_ref(), perm::EXPORT_PAGES)?;

    let page = load_page(&state, page_id)?;
    let body = export::export_html(&page);
    let filename = format!("{}.html", export::safe_filename(&page.title));

    Ok((
        attachment_headers(&filename, "text/html; charset=utf-8"),
        body,
    ))
}

pub async fn export_pdf(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(page_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = optional_auth(&state.config, &headers);
    authorize(&state.db, actor.as_ref(), perm::EXPORT_PAGES)?;

    let page = load_page(&state, page_id)?;
    let bytes = export::export_pdf(&state.config, &page).await?;
    let filename = format!("{}.pdf", export::safe_filename(&page.title));

    Ok((attachment_headers(&filename, "application/pdf"), bytes))
}

pub async fn export_bulk(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<BulkExportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = optional_auth(&state.config, &headers);
    authorize(&state.db, actor.as_ref(), perm::EXPORT_PAGES)?;

    if req.page_ids.is_empty() {
        return Err(ApiError::bad_request("No pages requested"));
    }

    let format = req.format.as_deref().unwrap_or("markdown");
    if !matches!(format, "markdown" | "html" | "pdf") {
        return Err(ApiError::bad_request(format!(
            "Unsupported format: {}",
            format
        )));
    }

    // Missing pages are skipped, matching the per-page failure policy
    let mut pages = Vec::new();
    for page_id in &req.page_ids {
        match state.db.get_page_by_id(*page_id)? {
            Some(page) => pages.push(page),
            None => tracing::warn!("skipping missing page {} in bulk export", page_id),
        }
    }

    if pages.is_empty() {
        return Err(ApiError::not_found("None of the requested pages exist"));
    }

    let bytes = export::export_bulk(&state.config, &pages, format).await?;

    Ok((
        attachment_headers("wiki-export.zip", "application/zip"),
        bytes,
    ))
}
