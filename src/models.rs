//! Data models for the wiki

use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Tag names that cannot be renamed or deleted
pub const SYSTEM_TAGS: &[&str] = &["Administrator", "Contributor", "Unauthenticated User"];

/// Tag granted to new accounts
pub const DEFAULT_TAG: &str = "Contributor";

/// Tag whose permissions apply to guests
pub const GUEST_TAG: &str = "Unauthenticated User";

pub fn is_system_tag(name: &str) -> bool {
    SYSTEM_TAGS.contains(&name)
}

// ============================================================================
// User models
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
    pub last_login: Option<String>,

    /// Tag names, loaded from user_tags separately
    pub tags: Vec<String>,
}

impl User {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            email: row.get("email").ok(),
            avatar: row.get("avatar").ok(),
            bio: row.get("bio").ok(),
            is_admin: row.get::<_, i64>("is_admin").unwrap_or(0) == 1,
            created_at: row.get("created_at")?,
            last_login: row.get("last_login").ok(),
            tags: Vec::new(), // Filled in separately
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
}

// ============================================================================
// Tag and permission models
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub is_system: bool,
}

impl Tag {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let name: String = row.get("name")?;
        let is_system = is_system_tag(&name);
        Ok(Self {
            id: row.get("id")?,
            name,
            color: row.get("color")?,
            is_system,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Permission {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
}

impl Permission {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description").ok(),
            category: row.get("category")?,
        })
    }
}

// ============================================================================
// Page models
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct WikiPage {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// None once the author account has been deleted
    pub author_id: Option<i64>,
    pub author_username: Option<String>,
    pub is_protected: bool,
    pub icon: Option<String>,
    pub comments_enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl WikiPage {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            author_id: row.get("author_id").ok(),
            author_username: row.get("author_username").ok(),
            is_protected: row.get::<_, i64>("is_protected").unwrap_or(0) == 1,
            icon: row.get("icon").ok(),
            comments_enabled: row.get::<_, i64>("comments_enabled").unwrap_or(1) == 1,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Listing view without the content blob
#[derive(Debug, Clone, Serialize)]
pub struct PageSummary {
    pub id: i64,
    pub title: String,
    pub author_username: Option<String>,
    pub is_protected: bool,
    pub icon: Option<String>,
    pub comments_enabled: bool,
    pub updated_at: String,
}

impl PageSummary {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            author_username: row.get("author_username").ok(),
            is_protected: row.get::<_, i64>("is_protected").unwrap_or(0) == 1,
            icon: row.get("icon").ok(),
            comments_enabled: row.get::<_, i64>("comments_enabled").unwrap_or(1) == 1,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// History listing entry, without the archived content
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub page_id: i64,
    pub title: String,
    pub changed_by: Option<i64>,
    pub changed_by_username: Option<String>,
    pub changed_at: String,
}

impl HistoryEntry {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            page_id: row.get("page_id")?,
            title: row.get("title")?,
            changed_by: row.get("changed_by").ok(),
            changed_by_username: row.get("changed_by_username").ok(),
            changed_at: row.get("changed_at")?,
        })
    }
}

/// Full archived version of a page
#[derive(Debug, Clone, Serialize)]
pub struct HistoryDetail {
    pub id: i64,
    pub page_id: i64,
    pub title: String,
    pub content: String,
    pub changed_by: Option<i64>,
    pub changed_by_username: Option<String>,
    pub changed_at: String,
}

impl HistoryDetail {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            page_id: row.get("page_id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            changed_by: row.get("changed_by").ok(),
            changed_by_username: row.get("changed_by_username").ok(),
            changed_at: row.get("changed_at")?,
        })
    }
}

// ============================================================================
// Comment models
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: i64,
    pub page_id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    pub parent_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl Comment {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            page_id: row.get("page_id")?,
            user_id: row.get("user_id")?,
            username: row.get("username").unwrap_or_else(|_| String::new()),
            content: row.get("content")?,
            parent_id: row.get("parent_id").ok(),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

// ============================================================================
// Activity models
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Activity {
    pub id: i64,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: String,
}

impl Activity {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let metadata: Option<String> = row.get("metadata").ok();
        let metadata = metadata
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or(serde_json::Value::Null);

        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id").ok(),
            username: row.get("username").ok(),
            kind: row.get("type")?,
            title: row.get("title")?,
            description: row.get("description").ok(),
            icon: row.get("icon").ok(),
            metadata,
            created_at: row.get("created_at")?,
        })
    }
}

// ============================================================================
// API request types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub is_admin: Option<bool>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePageRequest {
    pub title: String,
    pub content: String,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePageRequest {
    pub content: String,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenamePageRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ProtectPageRequest {
    pub protected: bool,
}

#[derive(Debug, Deserialize)]
pub struct CommentsEnabledRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTagRequest {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePermissionRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePermissionRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetTagPermissionsRequest {
    pub permission_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub page_id: i64,
    pub content: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSectionRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameSectionRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ReorderSectionsRequest {
    pub order: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkExportRequest {
    pub page_ids: Vec<i64>,
    /// "markdown", "html" or "pdf"
    pub format: Option<String>,
}
