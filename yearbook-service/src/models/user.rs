//! User model - account identity and role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Account role. Closed set; every consumer matches exhaustively so a new
/// role is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Standard,
    DepartmentHead,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Standard => "STANDARD",
            Role::DepartmentHead => "DEPARTMENT_HEAD",
            Role::Admin => "ADMIN",
        }
    }
}

/// User entity. The password hash never leaves the model layer; API
/// responses go through [`PublicUser`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_utc: DateTime<Utc>,
}

impl User {
    /// Create a new user with the default role.
    pub fn new(full_name: String, email: String, password_hash: String) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            full_name,
            email,
            password_hash,
            role: Role::Standard,
            created_utc: Utc::now(),
        }
    }

    /// Public projection (id, fullName, email, role).
    pub fn sanitized(&self) -> PublicUser {
        PublicUser {
            id: self.user_id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// User fields safe to return to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}
