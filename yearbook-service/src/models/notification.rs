//! Notification model - messages surfaced to profile owners after
//! moderation decisions.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Notification {
    pub notification_id: Uuid,
    pub recipient_id: Uuid,
    pub message: String,
    pub created_utc: DateTime<Utc>,
}

impl Notification {
    pub fn new(recipient_id: Uuid, message: String) -> Self {
        Self {
            notification_id: Uuid::new_v4(),
            recipient_id,
            message,
            created_utc: Utc::now(),
        }
    }
}
