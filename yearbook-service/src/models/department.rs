//! Department model.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Department {
    pub department_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub head_user_id: Uuid,
    pub created_utc: DateTime<Utc>,
}

impl Department {
    pub fn new(name: String, email: Option<String>, head_user_id: Uuid) -> Self {
        Self {
            department_id: Uuid::new_v4(),
            name,
            email,
            head_user_id,
            created_utc: Utc::now(),
        }
    }
}
