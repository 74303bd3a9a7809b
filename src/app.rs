//! Application state

use crate::config::Config;
use crate::db::Database;

/// Application state shared across all handlers
pub struct AppState {
    /// Server configuration
    pub config: Config,

    /// SQLite database for users, tags, pages, comments, activity
    pub db: Database,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let db_path = config.data_dir.join("wikid.db");
        let db = Database::new(&db_path)?;

        tracing::info!("wikid data directory: {:?}", config.data_dir);

        Ok(Self { config, db })
    }
}
