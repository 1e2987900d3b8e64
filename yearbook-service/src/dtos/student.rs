use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{ApprovalStatus, Department, Photo};
use crate::services::ProfileRecord;
use crate::utils::proxied_image_url;

#[derive(Debug, Serialize, ToSchema)]
pub struct DepartmentView {
    pub id: Uuid,
    pub name: String,
}

impl From<&Department> for DepartmentView {
    fn from(department: &Department) -> Self {
        Self {
            id: department.department_id,
            name: department.name.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOwner {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PhotoView {
    pub id: Uuid,
    pub url: String,
}

impl PhotoView {
    /// Build a gallery entry with the stored Drive link rewritten to the
    /// image proxy.
    pub fn from_photo(photo: &Photo, server_url: &str) -> Self {
        Self {
            id: photo.photo_id,
            url: proxied_image_url(server_url, &photo.url),
        }
    }
}

/// A profile joined with its owner and department, picture link rewritten.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub department_id: Option<Uuid>,
    pub batch: i32,
    pub profile_quote: Option<String>,
    pub description: Option<String>,
    pub profile_picture: Option<String>,
    pub approval_status: ApprovalStatus,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub user: ProfileOwner,
    pub department: Option<DepartmentView>,
}

impl ProfileView {
    pub fn from_record(record: &ProfileRecord, server_url: &str) -> Self {
        Self {
            id: record.profile.profile_id,
            user_id: record.profile.user_id,
            department_id: record.profile.department_id,
            batch: record.profile.batch,
            profile_quote: record.profile.profile_quote.clone(),
            description: record.profile.description.clone(),
            profile_picture: record
                .profile
                .profile_picture
                .as_deref()
                .map(|url| proxied_image_url(server_url, url)),
            approval_status: record.profile.approval_status,
            created_utc: record.profile.created_utc,
            updated_utc: record.profile.updated_utc,
            user: ProfileOwner {
                id: record.user.user_id,
                full_name: record.user.full_name.clone(),
                email: record.user.email.clone(),
            },
            department: record.department.as_ref().map(DepartmentView::from),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileWithPhotos {
    pub profile: ProfileView,
    pub photos: Vec<PhotoView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitProfileResponse {
    pub message: String,
    pub profile: ProfileView,
    pub photos: Vec<PhotoView>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewOwner {
    pub id: Uuid,
    pub full_name: String,
}

/// Overview entry for the public approved-profiles listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewItem {
    pub id: Uuid,
    pub profile_quote: Option<String>,
    pub profile_picture: Option<String>,
    pub user: OverviewOwner,
}

impl OverviewItem {
    pub fn from_record(record: &ProfileRecord, server_url: &str) -> Self {
        Self {
            id: record.profile.profile_id,
            profile_quote: record.profile.profile_quote.clone(),
            profile_picture: record
                .profile
                .profile_picture
                .as_deref()
                .map(|url| proxied_image_url(server_url, url)),
            user: OverviewOwner {
                id: record.user.user_id,
                full_name: record.user.full_name.clone(),
            },
        }
    }
}
