//! Permission management and the permission resolver

use std::collections::BTreeMap;

use rusqlite::params;

use crate::db::Database;
use crate::models::{Permission, User, GUEST_TAG};

impl Database {
    pub fn list_permissions(&self) -> anyhow::Result<Vec<Permission>> {
        let conn = self.conn();

        let mut stmt = conn.prepare("SELECT * FROM permissions ORDER BY category, name")?;
        let permissions: Vec<Permission> = stmt
            .query_map([], |row| Permission::from_row(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(permissions)
    }

    /// Permissions grouped by their free-text category label
    pub fn permissions_by_category(&self) -> anyhow::Result<BTreeMap<String, Vec<Permission>>> {
        let permissions = self.list_permissions()?;
        let mut grouped: BTreeMap<String, Vec<Permission>> = BTreeMap::new();
        for permission in permissions {
            grouped
                .entry(permission.category.clone())
                .or_default()
                .push(permission);
        }
        Ok(grouped)
    }

    pub fn get_permission_by_id(&self, id: i64) -> anyhow::Result<Option<Permission>> {
        let conn = self.conn();

        let result = conn.query_row(
            "SELECT * FROM permissions WHERE id = ?1",
            params![id],
            |row| Permission::from_row(row),
        );

        match result {
            Ok(permission) => Ok(Some(permission)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn create_permission(
        &self,
        name: &str,
        description: Option<&str>,
        category: &str,
    ) -> anyhow::Result<Permission> {
        let conn = self.conn();

        conn.execute(
            "INSERT INTO permissions (name, description, category) VALUES (?1, ?2, ?3)",
            params![name, description, category],
        )?;

        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_permission_by_id(id)?
            .ok_or_else(|| anyhow::anyhow!("permission vanished after insert"))
    }

    pub fn update_permission(
        &self,
        id: i64,
        name: Option<&str>,
        description: Option<&str>,
        category: Option<&str>,
    ) -> anyhow::Result<Permission> {
        let conn = self.conn();

        if let Some(name) = name {
            conn.execute(
                "UPDATE permissions SET name = ?1 WHERE id = ?2",
                params![name, id],
            )?;
        }
        if let Some(description) = description {
            conn.execute(
                "UPDATE permissions SET description = ?1 WHERE id = ?2",
                params![description, id],
            )?;
        }
        if let Some(category) = category {
            conn.execute(
                "UPDATE permissions SET category = ?1 WHERE id = ?2",
                params![category, id],
            )?;
        }

        drop(conn);
        self.get_permission_by_id(id)?
            .ok_or_else(|| anyhow::anyhow!("permission not found"))
    }

    pub fn delete_permission(&self, id: i64) -> anyhow::Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM permissions WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Permission ids currently granted to a tag
    pub fn tag_permission_ids(&self, tag_id: i64) -> anyhow::Result<Vec<i64>> {
        let conn = self.conn();

        let ids: Vec<i64> = conn
            .prepare(
                "SELECT permission_id FROM tag_permissions WHERE tag_id = ?1 ORDER BY permission_id",
            )?
            .query_map(params![tag_id], |row| row.get(0))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(ids)
    }

    /// Replace all permissions for a tag. Runs in one transaction so a crash
    /// cannot leave the tag with a partial permission set.
    pub fn set_tag_permissions(&self, tag_id: i64, permission_ids: &[i64]) -> anyhow::Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM tag_permissions WHERE tag_id = ?1",
            params![tag_id],
        )?;
        for permission_id in permission_ids {
            tx.execute(
                "INSERT OR IGNORE INTO tag_permissions (tag_id, permission_id) VALUES (?1, ?2)",
                params![tag_id, permission_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Resolve the effective permission set for a user (or a guest).
    ///
    /// The set is the union of permissions granted to the user's tags;
    /// guests get whatever is attached to the reserved guest tag. Recomputed
    /// on every call so permission changes take effect immediately. A user
    /// with no tags resolves to an empty set, not an error.
    pub fn resolve_permissions(&self, user_id: Option<i64>) -> anyhow::Result<Vec<String>> {
        let conn = self.conn();

        let names: Vec<String> = match user_id {
            Some(user_id) => conn
                .prepare(
                    r#"
                    SELECT DISTINCT p.name FROM permissions p
                    JOIN tag_permissions tp ON tp.permission_id = p.id
                    JOIN user_tags ut ON ut.tag_id = tp.tag_id
                    WHERE ut.user_id = ?1
                    ORDER BY p.name
                    "#,
                )?
                .query_map(params![user_id], |row| row.get(0))?
                .filter_map(|r| r.ok())
                .collect(),
            None => conn
                .prepare(
                    r#"
                    SELECT DISTINCT p.name FROM permissions p
                    JOIN tag_permissions tp ON tp.permission_id = p.id
                    JOIN tags t ON t.id = tp.tag_id
                    WHERE t.name = ?1
                    ORDER BY p.name
                    "#,
                )?
                .query_map(params![GUEST_TAG], |row| row.get(0))?
                .filter_map(|r| r.ok())
                .collect(),
        };

        Ok(names)
    }

    /// Permission list shown for a user: admins see the full universe,
    /// everyone else their resolved set.
    pub fn effective_permissions(&self, user: &User) -> anyhow::Result<Vec<String>> {
        if user.is_admin {
            Ok(self
                .list_permissions()?
                .into_iter()
                .map(|p| p.name)
                .collect())
        } else {
            self.resolve_permissions(Some(user.id))
        }
    }
}
