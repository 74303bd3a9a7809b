//! User management

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use rusqlite::params;

use crate::db::Database;
use crate::models::{NewUser, User, DEFAULT_TAG};

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

impl Database {
    /// Create a new user; new accounts get the default Contributor tag
    pub fn create_user(&self, new_user: NewUser) -> anyhow::Result<User> {
        let password_hash = hash_password(&new_user.password)?;

        let conn = self.conn();
        conn.execute(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES (?1, ?2, ?3)
            "#,
            params![new_user.username, new_user.email, password_hash],
        )?;

        let user_id = conn.last_insert_rowid();

        conn.execute(
            r#"
            INSERT OR IGNORE INTO user_tags (user_id, tag_id)
            SELECT ?1, id FROM tags WHERE name = ?2
            "#,
            params![user_id, DEFAULT_TAG],
        )?;

        drop(conn);
        self.get_user_by_id(user_id)?
            .ok_or_else(|| anyhow::anyhow!("user vanished after insert"))
    }

    /// Create a user with an explicit tag set and admin flag (admin path)
    pub fn create_user_with_tags(
        &self,
        new_user: NewUser,
        is_admin: bool,
        tags: &[String],
    ) -> anyhow::Result<User> {
        let user = self.create_user(new_user)?;

        let conn = self.conn();
        if is_admin {
            conn.execute(
                "UPDATE users SET is_admin = 1 WHERE id = ?1",
                params![user.id],
            )?;
        }
        drop(conn);

        self.set_user_tags(user.id, tags)?;
        self.get_user_by_id(user.id)?
            .ok_or_else(|| anyhow::anyhow!("user vanished after insert"))
    }

    /// Get user by ID, with tags attached
    pub fn get_user_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let conn = self.conn();

        let result = conn.query_row(
            "SELECT * FROM users WHERE id = ?1",
            params![id],
            |row| User::from_row(row),
        );

        match result {
            Ok(user) => {
                let tags = user_tag_names(&conn, id)?;
                Ok(Some(User { tags, ..user }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get user by username
    pub fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let conn = self.conn();

        let result = conn.query_row(
            "SELECT * FROM users WHERE username = ?1",
            params![username],
            |row| User::from_row(row),
        );

        match result {
            Ok(user) => {
                let tags = user_tag_names(&conn, user.id)?;
                Ok(Some(User { tags, ..user }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get user by email
    pub fn get_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let conn = self.conn();

        let result = conn.query_row(
            "SELECT * FROM users WHERE email = ?1",
            params![email],
            |row| User::from_row(row),
        );

        match result {
            Ok(user) => {
                let tags = user_tag_names(&conn, user.id)?;
                Ok(Some(User { tags, ..user }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Verify credentials; updates last_login on success
    pub fn authenticate_user(&self, username: &str, password: &str) -> anyhow::Result<Option<User>> {
        let conn = self.conn();

        let result: Result<(i64, String), _> = conn.query_row(
            "SELECT id, password_hash FROM users WHERE username = ?1 OR email = ?1",
            params![username],
            |row| Ok((row.get(0)?, row.get(1)?)),
        );

        match result {
            Ok((id, hash)) => {
                let parsed_hash = PasswordHash::new(&hash)
                    .map_err(|e| anyhow::anyhow!("Invalid password hash: {}", e))?;
                if Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok()
                {
                    conn.execute(
                        "UPDATE users SET last_login = datetime('now') WHERE id = ?1",
                        params![id],
                    )?;
                    drop(conn);
                    self.get_user_by_id(id)
                } else {
                    Ok(None)
                }
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Update own profile fields
    pub fn update_profile(
        &self,
        id: i64,
        email: Option<&str>,
        avatar: Option<&str>,
        bio: Option<&str>,
    ) -> anyhow::Result<()> {
        let conn = self.conn();

        if let Some(email) = email {
            conn.execute(
                "UPDATE users SET email = ?1 WHERE id = ?2",
                params![email, id],
            )?;
        }

        if let Some(avatar) = avatar {
            conn.execute(
                "UPDATE users SET avatar = ?1 WHERE id = ?2",
                params![avatar, id],
            )?;
        }

        if let Some(bio) = bio {
            conn.execute("UPDATE users SET bio = ?1 WHERE id = ?2", params![bio, id])?;
        }

        Ok(())
    }

    /// Set the admin flag
    pub fn set_user_admin(&self, id: i64, is_admin: bool) -> anyhow::Result<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE users SET is_admin = ?1 WHERE id = ?2",
            params![is_admin as i64, id],
        )?;
        Ok(())
    }

    /// Replace a user's tag assignments with the named tags.
    /// Unknown tag names are skipped.
    pub fn set_user_tags(&self, user_id: i64, tags: &[String]) -> anyhow::Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM user_tags WHERE user_id = ?1", params![user_id])?;
        for tag in tags {
            tx.execute(
                r#"
                INSERT OR IGNORE INTO user_tags (user_id, tag_id)
                SELECT ?1, id FROM tags WHERE name = ?2
                "#,
                params![user_id, tag],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// List all users (admin view)
    pub fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let conn = self.conn();

        let mut stmt = conn.prepare("SELECT * FROM users ORDER BY created_at DESC")?;
        let users: Vec<User> = stmt
            .query_map([], |row| User::from_row(row))?
            .filter_map(|r| r.ok())
            .collect();

        let users = users
            .into_iter()
            .map(|user| {
                let tags = user_tag_names(&conn, user.id).unwrap_or_default();
                User { tags, ..user }
            })
            .collect();

        Ok(users)
    }

    /// Delete a user. Tag assignments and comments cascade; pages and
    /// history entries stay, with their authorship cleared to NULL.
    pub fn delete_user(&self, user_id: i64) -> anyhow::Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        Ok(())
    }
}

fn user_tag_names(conn: &rusqlite::Connection, user_id: i64) -> anyhow::Result<Vec<String>> {
    let tags: Vec<String> = conn
        .prepare(
            r#"
            SELECT t.name FROM tags t
            JOIN user_tags ut ON ut.tag_id = t.id
            WHERE ut.user_id = ?1
            ORDER BY t.name
            "#,
        )?
        .query_map(params![user_id], |row| row.get(0))?
        .filter_map(|r| r.ok())
        .collect();
    Ok(tags)
}
