//! Wiki page management and version history
//!
//! Every content update and rename archives the pre-update row into
//! wiki_page_history before touching the live row. Both statements run in
//! one transaction, so the live row and its history can never diverge.

use rusqlite::params;

use crate::db::Database;
use crate::models::{HistoryDetail, HistoryEntry, PageSummary, WikiPage};

impl Database {
    pub fn create_page(
        &self,
        title: &str,
        content: &str,
        icon: Option<&str>,
        author_id: i64,
    ) -> anyhow::Result<WikiPage> {
        let conn = self.conn();

        conn.execute(
            r#"
            INSERT INTO wiki_pages (title, content, icon, author_id)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![title, content, icon, author_id],
        )?;

        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_page_by_id(id)?
            .ok_or_else(|| anyhow::anyhow!("page vanished after insert"))
    }

    pub fn get_page_by_id(&self, id: i64) -> anyhow::Result<Option<WikiPage>> {
        let conn = self.conn();

        let result = conn.query_row(
            r#"
            SELECT p.*, u.username AS author_username
            FROM wiki_pages p
            LEFT JOIN users u ON p.author_id = u.id
            WHERE p.id = ?1
            "#,
            params![id],
            |row| WikiPage::from_row(row),
        );

        match result {
            Ok(page) => Ok(Some(page)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_page_by_title(&self, title: &str) -> anyhow::Result<Option<WikiPage>> {
        let conn = self.conn();

        let result = conn.query_row(
            r#"
            SELECT p.*, u.username AS author_username
            FROM wiki_pages p
            LEFT JOIN users u ON p.author_id = u.id
            WHERE p.title = ?1
            "#,
            params![title],
            |row| WikiPage::from_row(row),
        );

        match result {
            Ok(page) => Ok(Some(page)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_pages(&self) -> anyhow::Result<Vec<PageSummary>> {
        let conn = self.conn();

        let mut stmt = conn.prepare(
            r#"
            SELECT p.id, p.title, p.is_protected, p.icon, p.comments_enabled,
                   p.updated_at, u.username AS author_username
            FROM wiki_pages p
            LEFT JOIN users u ON p.author_id = u.id
            ORDER BY p.title
            "#,
        )?;

        let pages: Vec<PageSummary> = stmt
            .query_map([], |row| PageSummary::from_row(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(pages)
    }

    /// Apply a content update, archiving the previous (title, content) first.
    pub fn update_content(
        &self,
        page_id: i64,
        new_content: &str,
        new_icon: Option<&str>,
        editor_id: i64,
    ) -> anyhow::Result<WikiPage> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let archived = archive_page(&tx, page_id, editor_id)?;
        if !archived {
            anyhow::bail!("page not found");
        }

        match new_icon {
            Some(icon) => tx.execute(
                r#"
                UPDATE wiki_pages
                SET content = ?1, icon = ?2, updated_at = datetime('now')
                WHERE id = ?3
                "#,
                params![new_content, icon, page_id],
            )?,
            None => tx.execute(
                r#"
                UPDATE wiki_pages
                SET content = ?1, updated_at = datetime('now')
                WHERE id = ?2
                "#,
                params![new_content, page_id],
            )?,
        };

        tx.commit()?;
        drop(conn);

        self.get_page_by_id(page_id)?
            .ok_or_else(|| anyhow::anyhow!("page not found"))
    }

    /// Rename a page; the old title is archived like a content update.
    pub fn rename_page(
        &self,
        page_id: i64,
        new_title: &str,
        editor_id: i64,
    ) -> anyhow::Result<WikiPage> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let archived = archive_page(&tx, page_id, editor_id)?;
        if !archived {
            anyhow::bail!("page not found");
        }

        tx.execute(
            "UPDATE wiki_pages SET title = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![new_title, page_id],
        )?;

        tx.commit()?;
        drop(conn);

        self.get_page_by_id(page_id)?
            .ok_or_else(|| anyhow::anyhow!("page not found"))
    }

    pub fn set_page_protected(&self, page_id: i64, protected: bool) -> anyhow::Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE wiki_pages SET is_protected = ?1 WHERE id = ?2",
            params![protected as i64, page_id],
        )?;
        Ok(())
    }

    pub fn set_page_comments_enabled(&self, page_id: i64, enabled: bool) -> anyhow::Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE wiki_pages SET comments_enabled = ?1 WHERE id = ?2",
            params![enabled as i64, page_id],
        )?;
        Ok(())
    }

    /// Delete a page; history and comments cascade.
    pub fn delete_page(&self, page_id: i64) -> anyhow::Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM wiki_pages WHERE id = ?1", params![page_id])?;
        Ok(())
    }

    /// History entries for a page, newest first, ties broken by id.
    pub fn history_for_page(&self, page_id: i64) -> anyhow::Result<Vec<HistoryEntry>> {
        let conn = self.conn();

        let mut stmt = conn.prepare(
            r#"
            SELECT h.id, h.page_id, h.title, h.changed_by, h.changed_at,
                   u.username AS changed_by_username
            FROM wiki_page_history h
            LEFT JOIN users u ON h.changed_by = u.id
            WHERE h.page_id = ?1
            ORDER BY h.changed_at DESC, h.id DESC
            "#,
        )?;

        let entries: Vec<HistoryEntry> = stmt
            .query_map(params![page_id], |row| HistoryEntry::from_row(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(entries)
    }

    /// Full archived content for one history entry
    pub fn history_detail(
        &self,
        page_id: i64,
        history_id: i64,
    ) -> anyhow::Result<Option<HistoryDetail>> {
        let conn = self.conn();

        let result = conn.query_row(
            r#"
            SELECT h.*, u.username AS changed_by_username
            FROM wiki_page_history h
            LEFT JOIN users u ON h.changed_by = u.id
            WHERE h.id = ?1 AND h.page_id = ?2
            "#,
            params![history_id, page_id],
            |row| HistoryDetail::from_row(row),
        );

        match result {
            Ok(detail) => Ok(Some(detail)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Snapshot the live (title, content) pair into the history table.
/// Returns false when the page does not exist.
fn archive_page(
    tx: &rusqlite::Transaction<'_>,
    page_id: i64,
    editor_id: i64,
) -> anyhow::Result<bool> {
    let inserted = tx.execute(
        r#"
        INSERT INTO wiki_page_history (page_id, title, content, changed_by)
        SELECT id, title, content, ?2 FROM wiki_pages WHERE id = ?1
        "#,
        params![page_id, editor_id],
    )?;
    Ok(inserted == 1)
}
