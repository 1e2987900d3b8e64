use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::student::ProfileView;
use crate::models::{ApprovalStatus, Department};
use crate::services::{ProfileFilter, ProfileSort};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    /// Case-insensitive substring over name or email
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartmentRequest {
    #[validate(length(min = 1, message = "Department name is required"))]
    #[schema(example = "Computer Science")]
    pub name: String,

    pub email: Option<String>,

    /// User promoted to department head
    pub head_user_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentDetail {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub head_user_id: Uuid,
    pub created_utc: DateTime<Utc>,
}

impl From<&Department> for DepartmentDetail {
    fn from(department: &Department) -> Self {
        Self {
            id: department.department_id,
            name: department.name.clone(),
            email: department.email.clone(),
            head_user_id: department.head_user_id,
            created_utc: department.created_utc,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateDepartmentResponse {
    pub message: String,
    pub department: DepartmentDetail,
}

/// Moderation-listing parameters: filtering, search, sorting, pagination.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ProfilesQuery {
    pub department_id: Option<Uuid>,
    pub status: Option<ApprovalStatus>,
    pub graduation_year: Option<i32>,
    pub search: Option<String>,
    /// `createdAt` (default), `updatedAt`, or `batch`/`graduationYear`
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default)
    pub order: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ProfilesQuery {
    pub fn into_filter(self) -> ProfileFilter {
        ProfileFilter {
            department_id: self.department_id,
            status: self.status,
            graduation_year: self.graduation_year,
            search: self.search.filter(|s| !s.is_empty()),
            sort_by: self
                .sort_by
                .as_deref()
                .map(ProfileSort::from_query)
                .unwrap_or(ProfileSort::CreatedUtc),
            descending: !matches!(self.order.as_deref(), Some("asc")),
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(10).clamp(1, 100),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfilesPage {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub profiles: Vec<ProfileView>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModerationRequest {
    pub profile_id: Uuid,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModerationResponse {
    pub message: String,
    pub profile: ProfileView,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApproveAllRequest {
    pub department_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_defaults_are_sane() {
        let query = ProfilesQuery {
            department_id: None,
            status: None,
            graduation_year: None,
            search: None,
            sort_by: None,
            order: None,
            page: None,
            limit: None,
        };
        let filter = query.into_filter();

        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, 10);
        assert_eq!(filter.sort_by, ProfileSort::CreatedUtc);
        assert!(filter.descending);
    }

    #[test]
    fn filter_clamps_out_of_range_paging() {
        let query = ProfilesQuery {
            department_id: None,
            status: None,
            graduation_year: None,
            search: Some(String::new()),
            sort_by: Some("batch".to_string()),
            order: Some("asc".to_string()),
            page: Some(0),
            limit: Some(10_000),
        };
        let filter = query.into_filter();

        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, 100);
        assert_eq!(filter.sort_by, ProfileSort::Batch);
        assert!(!filter.descending);
        // Empty search collapses to no filter.
        assert!(filter.search.is_none());
    }
}
