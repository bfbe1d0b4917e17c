//! User model - credentials plus the primary church relationship.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Role codes. Stored as upper-case text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Leader,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Leader => "LEADER",
            UserRole::User => "USER",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ADMIN" => Ok(UserRole::Admin),
            "LEADER" => Ok(UserRole::Leader),
            "USER" => Ok(UserRole::User),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User row.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: bool,
    pub organization_id: Option<String>,
    /// Primary church. Access to it is implicit and needs no grant row.
    pub church_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Role as enum. Unknown codes degrade to the least privileged role.
    pub fn role(&self) -> UserRole {
        self.role.parse().unwrap_or(UserRole::User)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == UserRole::Admin
    }

    pub fn is_primary_church(&self, church_id: &str) -> bool {
        self.church_id.as_deref() == Some(church_id)
    }

    /// Convert to sanitized response (no password hash).
    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser::from(self.clone())
    }
}

/// Data needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub organization_id: Option<String>,
    pub church_id: Option<String>,
}

impl NewUser {
    pub fn new(
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
        role: UserRole,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.trim().to_lowercase(),
            password_hash,
            first_name,
            last_name,
            role,
            organization_id: None,
            church_id: None,
        }
    }

    pub fn with_primary_church(mut self, organization_id: String, church_id: String) -> Self {
        self.organization_id = Some(organization_id);
        self.church_id = Some(church_id);
        self
    }

    pub fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role.as_str().to_string(),
            is_active: true,
            organization_id: self.organization_id,
            church_id: self.church_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Admin edit of a user; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

impl UserUpdate {
    pub fn deactivate() -> Self {
        Self {
            is_active: Some(false),
            ..Self::default()
        }
    }

    /// True when applying this would take admin powers away from the user.
    pub fn demotes(&self, user: &User) -> bool {
        user.is_admin()
            && (self.is_active == Some(false)
                || self.role.is_some_and(|role| role != UserRole::Admin))
    }

    pub fn apply(self, user: &mut User, now: DateTime<Utc>) {
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(role) = self.role {
            user.role = role.as_str().to_string();
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
        user.updated_at = now;
    }
}

/// User as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedUser {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: bool,
    pub organization_id: Option<String>,
    pub church_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for SanitizedUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            role: u.role,
            is_active: u.is_active,
            organization_id: u.organization_id,
            church_id: u.church_id,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}
