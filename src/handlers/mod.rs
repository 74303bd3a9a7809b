//! HTTP request handlers

mod activities;
mod auth;
mod comments;
mod export;
mod pages;
mod permissions;
mod tags;
mod users;

use std::sync::Arc;

use axum::{
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde_json::json;

use crate::AppState;

/// Create API routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/verify", get(auth::verify))
        .route("/auth/profile", put(auth::update_profile))
        // User management (admin)
        .route("/auth/users", get(users::list_users).post(users::create_user))
        .route(
            "/auth/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        // Wiki pages
        .route("/wiki", get(pages::list_pages).post(pages::create_page))
        .route(
            "/wiki/:id",
            get(pages::get_page)
                .put(pages::update_page)
                .delete(pages::delete_page),
        )
        .route("/wiki/:id/rename", put(pages::rename_page))
        .route("/wiki/:id/protect", put(pages::protect_page))
        .route("/wiki/:id/comments", put(pages::set_comments_enabled))
        // Version history
        .route("/wiki/:id/history", get(pages::get_history))
        .route("/wiki/:id/history/:history_id", get(pages::get_history_detail))
        .route(
            "/wiki/:id/history/:history_id/restore",
            post(pages::restore_version),
        )
        // Sections
        .route("/wiki/:id/sections", get(pages::get_sections))
        .route("/wiki/:id/sections/reorder", put(pages::reorder_sections))
        .route("/wiki/:id/sections/:section_id", put(pages::update_section))
        .route(
            "/wiki/:id/sections/:section_id/rename",
            put(pages::rename_section),
        )
        // Tags
        .route("/tags", get(tags::list_tags).post(tags::create_tag))
        .route("/tags/public", get(tags::public_tags))
        .route("/tags/:id", put(tags::update_tag).delete(tags::delete_tag))
        // Permissions
        .route(
            "/permissions",
            get(permissions::list_permissions).post(permissions::create_permission),
        )
        .route("/permissions/by-category", get(permissions::by_category))
        .route(
            "/permissions/tags/:tag_id",
            get(permissions::get_tag_permissions).put(permissions::set_tag_permissions),
        )
        .route(
            "/permissions/:id",
            put(permissions::update_permission).delete(permissions::delete_permission),
        )
        // Comments
        .route(
            "/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/comments/:id",
            put(comments::update_comment).delete(comments::delete_comment),
        )
        // Activity feed
        .route("/activities", get(activities::list_activities))
        // Export
        .route("/export/:page_id/markdown", get(export::export_markdown))
        .route("/export/:page_id/html", get(export::export_html))
        .route("/export/:page_id/pdf", get(export::export_pdf))
        .route("/export/bulk", post(export::export_bulk))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "wikid",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
