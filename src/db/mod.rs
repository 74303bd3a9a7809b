//! Database module
//!
//! Thin repository methods over a shared SQLite connection, one file per
//! entity. Handlers call these and translate errors into API responses.

mod activities;
mod comments;
mod pages;
mod permissions;
mod schema;
mod tags;
mod users;

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

/// Business-rule violations the repository enforces itself. Handlers
/// downcast to these to pick a status code instead of parsing messages.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("system tags cannot be renamed")]
    SystemTagRename,
    #[error("system tags cannot be deleted")]
    SystemTagDelete,
    #[error("parent comment not found")]
    ParentCommentMissing,
    #[error("parent comment belongs to a different page")]
    ParentCommentOtherPage,
}

/// Database wrapper around the shared connection
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        schema::init_schema(&conn)?;
        schema::seed_defaults(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get a connection for operations
    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}
