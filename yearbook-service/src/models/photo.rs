//! Photo model - gallery entries uploaded with a profile.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Photo {
    pub photo_id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub created_utc: DateTime<Utc>,
}

impl Photo {
    pub fn new(user_id: Uuid, url: String) -> Self {
        Self {
            photo_id: Uuid::new_v4(),
            user_id,
            url,
            created_utc: Utc::now(),
        }
    }
}
