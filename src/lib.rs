//! Wikid - Collaborative Wiki Backend
//!
//! An HTTP/JSON service over SQLite providing:
//! - User accounts with tag-based permissions
//! - Wiki pages with automatic version history
//! - Named sections inside page content
//! - Threaded comments and an append-only activity log
//! - Document export (Markdown, HTML, PDF, ZIP)

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod sections;

pub use app::AppState;
pub use config::Config;

/// Default port for the wiki server
pub const DEFAULT_PORT: u16 = 8040;
