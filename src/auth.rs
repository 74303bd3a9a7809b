//! Bearer token authentication and the authorization policy
//!
//! Tokens are signed, time-limited JWTs; validity is purely cryptographic,
//! so logout is client-side token deletion and a token stays valid until it
//! expires. All permission checks go through [`authorize`], which is the only
//! place the admin bypass lives.

use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::db::Database;
use crate::error::ApiError;
use crate::models::User;

/// Permission names used by the route handlers
pub mod perm {
    pub const VIEW_PAGES: &str = "view_pages";
    pub const CREATE_PAGES: &str = "create_pages";
    pub const EDIT_PAGES: &str = "edit_pages";
    pub const RENAME_PAGES: &str = "rename_pages";
    pub const DELETE_PAGES: &str = "delete_pages";
    pub const PROTECT_PAGES: &str = "protect_pages";
    pub const COMMENT: &str = "comment";
    pub const MODERATE_COMMENTS: &str = "moderate_comments";
    pub const MANAGE_USERS: &str = "manage_users";
    pub const MANAGE_TAGS: &str = "manage_tags";
    pub const MANAGE_PERMISSIONS: &str = "manage_permissions";
    pub const VIEW_ACTIVITY: &str = "view_activity";
    pub const EXPORT_PAGES: &str = "export_pages";
}

/// Claims embedded in the bearer token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    pub username: String,
    pub is_admin: bool,
    /// Expiry, seconds since epoch
    pub exp: usize,
}

/// Authenticated requester identity, decoded from the token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

impl AuthUser {
    fn from_claims(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            is_admin: claims.is_admin,
        }
    }
}

/// Issue a signed token for a user
pub fn issue_token(config: &Config, user: &User) -> anyhow::Result<String> {
    let expires = Utc::now() + Duration::hours(config.token_ttl_hours);
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        is_admin: user.is_admin,
        exp: expires.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;
    Ok(token)
}

/// Verify a token, returning the requester identity
pub fn verify_token(config: &Config, token: &str) -> anyhow::Result<AuthUser> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(AuthUser::from_claims(data.claims))
}

/// Extract a bearer token from request headers
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(header::AUTHORIZATION) {
        if let Ok(value) = auth.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }
    None
}

/// Require a valid bearer token
pub fn require_auth(config: &Config, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let token =
        extract_token(headers).ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;
    verify_token(config, &token).map_err(|_| ApiError::unauthorized("Invalid or expired token"))
}

/// Populate the requester identity when a valid token is present, otherwise
/// proceed as a guest. Used on endpoints with different guest/member views.
pub fn optional_auth(config: &Config, headers: &HeaderMap) -> Option<AuthUser> {
    let token = extract_token(headers)?;
    verify_token(config, &token).ok()
}

/// Central authorization policy.
///
/// Administrators are granted everything; everyone else (including guests,
/// passed as `None`) is checked against the resolved permission set.
pub fn authorize(
    db: &Database,
    actor: Option<&AuthUser>,
    permission: &str,
) -> Result<(), ApiError> {
    if actor.map(|a| a.is_admin).unwrap_or(false) {
        return Ok(());
    }

    let granted = db.resolve_permissions(actor.map(|a| a.id))?;
    if granted.iter().any(|name| name == permission) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "Missing permission: {}",
            permission
        )))
    }
}

/// Protected-page gate: content updates, renames and deletes on a protected
/// page need admin status or the protect_pages permission, independent of
/// the operation's own permission.
pub fn authorize_protected(db: &Database, actor: Option<&AuthUser>) -> Result<(), ApiError> {
    authorize(db, actor, perm::PROTECT_PAGES)
        .map_err(|_| ApiError::forbidden("This page is protected".to_string()))
}
