//! Activity log
//!
//! Append-only; nothing here mutates or deletes rows.

use rusqlite::params;

use crate::db::Database;
use crate::models::Activity;

impl Database {
    pub fn record_activity(
        &self,
        user_id: Option<i64>,
        kind: &str,
        title: &str,
        description: Option<&str>,
        icon: Option<&str>,
        metadata: Option<&serde_json::Value>,
    ) -> anyhow::Result<()> {
        let conn = self.conn();

        let metadata = metadata.map(|m| m.to_string());
        conn.execute(
            r#"
            INSERT INTO activities (user_id, type, title, description, icon, metadata)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![user_id, kind, title, description, icon, metadata],
        )?;

        Ok(())
    }

    /// Paginated activity feed. Guests only see page activity; members see
    /// everything.
    pub fn list_activities(
        &self,
        limit: i64,
        offset: i64,
        guest: bool,
    ) -> anyhow::Result<Vec<Activity>> {
        let conn = self.conn();

        let query = if guest {
            r#"
            SELECT a.*, u.username
            FROM activities a
            LEFT JOIN users u ON a.user_id = u.id
            WHERE a.type LIKE 'page_%'
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT ?1 OFFSET ?2
            "#
        } else {
            r#"
            SELECT a.*, u.username
            FROM activities a
            LEFT JOIN users u ON a.user_id = u.id
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT ?1 OFFSET ?2
            "#
        };

        let mut stmt = conn.prepare(query)?;
        let activities: Vec<Activity> = stmt
            .query_map(params![limit, offset], |row| Activity::from_row(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(activities)
    }
}
