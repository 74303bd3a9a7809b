//! Activity feed handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{authorize, optional_auth, perm};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Activity feed with optional auth: guests see page activity only, members
/// with view_activity (or admins) see everything.
pub async fn list_activities(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = optional_auth(&state.config, &headers);

    // Unbounded log: paginate by default
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let full_feed = match &actor {
        Some(actor) => authorize(&state.db, Some(actor), perm::VIEW_ACTIVITY).is_ok(),
        None => false,
    };

    let activities = state.db.list_activities(limit, offset, !full_feed)?;

    Ok(Json(json!({
        "activities": activities,
        "limit": limit,
        "offset": offset,
    })))
}
