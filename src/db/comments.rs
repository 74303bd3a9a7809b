//! Comment management

use rusqlite::params;

use crate::db::{Database, DomainError};
use crate::models::Comment;

impl Database {
    /// Flat comment list for a page; the thread tree is rebuilt client-side
    pub fn comments_for_page(&self, page_id: i64) -> anyhow::Result<Vec<Comment>> {
        let conn = self.conn();

        let mut stmt = conn.prepare(
            r#"
            SELECT c.*, u.username
            FROM comments c
            JOIN users u ON c.user_id = u.id
            WHERE c.page_id = ?1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )?;

        let comments: Vec<Comment> = stmt
            .query_map(params![page_id], |row| Comment::from_row(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(comments)
    }

    pub fn get_comment_by_id(&self, id: i64) -> anyhow::Result<Option<Comment>> {
        let conn = self.conn();

        let result = conn.query_row(
            r#"
            SELECT c.*, u.username
            FROM comments c
            JOIN users u ON c.user_id = u.id
            WHERE c.id = ?1
            "#,
            params![id],
            |row| Comment::from_row(row),
        );

        match result {
            Ok(comment) => Ok(Some(comment)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a comment. A parent_id must reference a comment on the same
    /// page; that is validated here since no database constraint covers it.
    pub fn create_comment(
        &self,
        page_id: i64,
        user_id: i64,
        content: &str,
        parent_id: Option<i64>,
    ) -> anyhow::Result<Comment> {
        if let Some(parent_id) = parent_id {
            let parent = self
                .get_comment_by_id(parent_id)?
                .ok_or(DomainError::ParentCommentMissing)?;
            if parent.page_id != page_id {
                return Err(DomainError::ParentCommentOtherPage.into());
            }
        }

        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO comments (page_id, user_id, content, parent_id)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![page_id, user_id, content, parent_id],
        )?;

        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_comment_by_id(id)?
            .ok_or_else(|| anyhow::anyhow!("comment vanished after insert"))
    }

    pub fn update_comment(&self, id: i64, content: &str) -> anyhow::Result<Comment> {
        let conn = self.conn();
        conn.execute(
            "UPDATE comments SET content = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![content, id],
        )?;
        drop(conn);

        self.get_comment_by_id(id)?
            .ok_or_else(|| anyhow::anyhow!("comment not found"))
    }

    /// Delete a comment; replies cascade
    pub fn delete_comment(&self, id: i64) -> anyhow::Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        Ok(())
    }
}
