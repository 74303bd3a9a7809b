//! Database schema and seed data

use rusqlite::Connection;

/// Initialize database schema
pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        r#"
        -- Users table
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            email TEXT UNIQUE,
            password_hash TEXT NOT NULL,
            avatar TEXT,
            bio TEXT,
            is_admin INTEGER DEFAULT 0,
            created_at TEXT DEFAULT (datetime('now')),
            last_login TEXT
        );

        -- Tags (permission groups attached to users)
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            color TEXT NOT NULL DEFAULT '#718096'
        );

        -- User <-> tag assignments
        CREATE TABLE IF NOT EXISTS user_tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            tag_id INTEGER NOT NULL,
            UNIQUE(user_id, tag_id),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
        );

        -- Permissions
        CREATE TABLE IF NOT EXISTS permissions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            description TEXT,
            category TEXT NOT NULL DEFAULT 'general'
        );

        -- Tag <-> permission grants
        CREATE TABLE IF NOT EXISTS tag_permissions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tag_id INTEGER NOT NULL,
            permission_id INTEGER NOT NULL,
            UNIQUE(tag_id, permission_id),
            FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE,
            FOREIGN KEY (permission_id) REFERENCES permissions(id) ON DELETE CASCADE
        );

        -- Wiki pages; authorship clears when the author account goes away
        CREATE TABLE IF NOT EXISTS wiki_pages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT UNIQUE NOT NULL,
            content TEXT NOT NULL DEFAULT '',
            author_id INTEGER,
            is_protected INTEGER DEFAULT 0,
            icon TEXT,
            comments_enabled INTEGER DEFAULT 1,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE SET NULL
        );

        -- Page version history (append-only)
        CREATE TABLE IF NOT EXISTS wiki_page_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            page_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            changed_by INTEGER,
            changed_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY (page_id) REFERENCES wiki_pages(id) ON DELETE CASCADE,
            FOREIGN KEY (changed_by) REFERENCES users(id) ON DELETE SET NULL
        );

        -- Comments (threaded via parent_id, tree rebuilt client-side)
        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            page_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            content TEXT NOT NULL,
            parent_id INTEGER,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY (page_id) REFERENCES wiki_pages(id) ON DELETE CASCADE,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (parent_id) REFERENCES comments(id) ON DELETE CASCADE
        );

        -- Activity log (append-only)
        CREATE TABLE IF NOT EXISTS activities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER,
            type TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            icon TEXT,
            metadata TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE SET NULL
        );

        -- Indexes
        CREATE INDEX IF NOT EXISTS idx_user_tags_user ON user_tags(user_id);
        CREATE INDEX IF NOT EXISTS idx_tag_permissions_tag ON tag_permissions(tag_id);
        CREATE INDEX IF NOT EXISTS idx_history_page ON wiki_page_history(page_id);
        CREATE INDEX IF NOT EXISTS idx_comments_page ON comments(page_id);
        CREATE INDEX IF NOT EXISTS idx_activities_created ON activities(created_at);
        "#,
    )?;

    Ok(())
}

/// Seed system tags, the baseline permission set and default grants.
/// Idempotent; runs on every startup.
pub fn seed_defaults(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        r#"
        INSERT OR IGNORE INTO tags (name, color) VALUES
            ('Administrator', '#e53e3e'),
            ('Contributor', '#3182ce'),
            ('Unauthenticated User', '#718096');

        INSERT OR IGNORE INTO permissions (name, description, category) VALUES
            ('view_pages', 'Can view wiki pages', 'pages'),
            ('create_pages', 'Can create wiki pages', 'pages'),
            ('edit_pages', 'Can edit wiki pages', 'pages'),
            ('rename_pages', 'Can rename wiki pages', 'pages'),
            ('delete_pages', 'Can delete wiki pages', 'pages'),
            ('protect_pages', 'Can edit protected pages and toggle protection', 'pages'),
            ('comment', 'Can post comments', 'comments'),
            ('moderate_comments', 'Can edit or delete any comment', 'comments'),
            ('manage_users', 'Can manage user accounts', 'admin'),
            ('manage_tags', 'Can manage tags', 'admin'),
            ('manage_permissions', 'Can manage permissions', 'admin'),
            ('view_activity', 'Can view the full activity feed', 'system'),
            ('export_pages', 'Can export pages', 'system');
        "#,
    )?;

    let grants: &[(&str, &str)] = &[
        ("Contributor", "view_pages"),
        ("Contributor", "create_pages"),
        ("Contributor", "edit_pages"),
        ("Contributor", "rename_pages"),
        ("Contributor", "comment"),
        ("Contributor", "view_activity"),
        ("Contributor", "export_pages"),
        ("Unauthenticated User", "view_pages"),
        ("Unauthenticated User", "export_pages"),
    ];

    for (tag, permission) in grants {
        conn.execute(
            r#"
            INSERT OR IGNORE INTO tag_permissions (tag_id, permission_id)
            SELECT t.id, p.id FROM tags t, permissions p
            WHERE t.name = ?1 AND p.name = ?2
            "#,
            rusqlite::params![tag, permission],
        )?;
    }

    Ok(())
}
