//! Approval history - audit trail of moderation decisions.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::ApprovalStatus;

/// Entity type tag for profile moderation rows.
pub const ENTITY_USER_PROFILE: &str = "UserProfile";

#[derive(Debug, Clone, FromRow)]
pub struct ApprovalEvent {
    pub approval_id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub action: ApprovalStatus,
    pub approved_by: Uuid,
    pub comments: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl ApprovalEvent {
    pub fn for_profile(
        profile_id: Uuid,
        action: ApprovalStatus,
        approved_by: Uuid,
        comments: Option<String>,
    ) -> Self {
        Self {
            approval_id: Uuid::new_v4(),
            entity_type: ENTITY_USER_PROFILE.to_string(),
            entity_id: profile_id,
            action,
            approved_by,
            comments,
            created_utc: Utc::now(),
        }
    }
}
