//! Tag management
//!
//! System tags (Administrator, Contributor, Unauthenticated User) anchor the
//! baseline permission semantics and are refused rename/delete here, not in
//! the handlers.

use rusqlite::params;

use crate::db::{Database, DomainError};
use crate::models::{is_system_tag, Tag};

impl Database {
    pub fn list_tags(&self) -> anyhow::Result<Vec<Tag>> {
        let conn = self.conn();

        let mut stmt = conn.prepare("SELECT * FROM tags ORDER BY name")?;
        let tags: Vec<Tag> = stmt
            .query_map([], |row| Tag::from_row(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(tags)
    }

    pub fn get_tag_by_id(&self, id: i64) -> anyhow::Result<Option<Tag>> {
        let conn = self.conn();

        let result = conn.query_row("SELECT * FROM tags WHERE id = ?1", params![id], |row| {
            Tag::from_row(row)
        });

        match result {
            Ok(tag) => Ok(Some(tag)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_tag_by_name(&self, name: &str) -> anyhow::Result<Option<Tag>> {
        let conn = self.conn();

        let result = conn.query_row("SELECT * FROM tags WHERE name = ?1", params![name], |row| {
            Tag::from_row(row)
        });

        match result {
            Ok(tag) => Ok(Some(tag)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn create_tag(&self, name: &str, color: Option<&str>) -> anyhow::Result<Tag> {
        let conn = self.conn();

        conn.execute(
            "INSERT INTO tags (name, color) VALUES (?1, ?2)",
            params![name, color.unwrap_or("#718096")],
        )?;

        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_tag_by_id(id)?
            .ok_or_else(|| anyhow::anyhow!("tag vanished after insert"))
    }

    /// Update a tag. System tags accept a color change but not a rename.
    pub fn update_tag(
        &self,
        id: i64,
        name: Option<&str>,
        color: Option<&str>,
    ) -> anyhow::Result<Tag> {
        let current = self
            .get_tag_by_id(id)?
            .ok_or_else(|| anyhow::anyhow!("tag not found"))?;

        if let Some(new_name) = name {
            if is_system_tag(&current.name) && new_name != current.name {
                return Err(DomainError::SystemTagRename.into());
            }
        }

        let conn = self.conn();

        if let Some(new_name) = name {
            conn.execute(
                "UPDATE tags SET name = ?1 WHERE id = ?2",
                params![new_name, id],
            )?;
        }
        if let Some(color) = color {
            conn.execute(
                "UPDATE tags SET color = ?1 WHERE id = ?2",
                params![color, id],
            )?;
        }

        drop(conn);
        self.get_tag_by_id(id)?
            .ok_or_else(|| anyhow::anyhow!("tag not found"))
    }

    /// Delete a tag; cascades user_tags and tag_permissions rows.
    /// System tags are refused.
    pub fn delete_tag(&self, id: i64) -> anyhow::Result<()> {
        let current = self
            .get_tag_by_id(id)?
            .ok_or_else(|| anyhow::anyhow!("tag not found"))?;

        if is_system_tag(&current.name) {
            return Err(DomainError::SystemTagDelete.into());
        }

        let conn = self.conn();
        conn.execute("DELETE FROM tags WHERE id = ?1", params![id])?;
        Ok(())
    }
}
