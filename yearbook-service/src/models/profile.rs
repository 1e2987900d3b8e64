//! Yearbook profile model and approval states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Moderation state of a submitted profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "approval_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// One student's yearbook entry. At most one per user; resubmission
/// replaces the content and resets the status to `Pending`.
#[derive(Debug, Clone, FromRow)]
pub struct UserProfile {
    pub profile_id: Uuid,
    pub user_id: Uuid,
    pub department_id: Option<Uuid>,
    pub batch: i32,
    pub profile_quote: Option<String>,
    pub description: Option<String>,
    pub profile_picture: Option<String>,
    pub approval_status: ApprovalStatus,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(
        user_id: Uuid,
        department_id: Option<Uuid>,
        batch: i32,
        profile_quote: Option<String>,
        description: Option<String>,
        profile_picture: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            profile_id: Uuid::new_v4(),
            user_id,
            department_id,
            batch,
            profile_quote,
            description,
            profile_picture,
            approval_status: ApprovalStatus::Pending,
            created_utc: now,
            updated_utc: now,
        }
    }
}
