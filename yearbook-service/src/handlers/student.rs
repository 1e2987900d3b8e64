//! Student endpoints: profile submission, own profile, departments, and
//! the public approved-profiles views.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::student::{
    DepartmentView, OverviewItem, PhotoView, ProfileView, ProfileWithPhotos,
    SubmitProfileResponse,
};
use crate::dtos::ErrorResponse;
use crate::middleware::AuthUser;
use crate::models::{ApprovalStatus, Photo, UserProfile};
use crate::services::{MediaStorage, YearbookStore};
use crate::AppState;

/// Photos accepted per submission.
const MAX_PHOTOS: usize = 5;

/// Submit or replace the caller's yearbook profile
#[utoipa::path(
    post,
    path = "/api/v1/student/profile",
    responses(
        (status = 201, description = "Profile submitted", body = SubmitProfileResponse),
        (status = 400, description = "Malformed form data", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "Student",
    security(("bearer_auth" = []))
)]
pub async fn submit_profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitProfileResponse>), AppError> {
    let mut department_id: Option<Uuid> = None;
    let mut batch: Option<i32> = None;
    let mut profile_quote: Option<String> = None;
    let mut description: Option<String> = None;
    let mut uploads: Vec<(String, String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "departmentId" => {
                let text = read_text(field).await?;
                if !text.is_empty() {
                    department_id = Some(text.parse().map_err(|_| {
                        AppError::BadRequest(anyhow::anyhow!("Invalid departmentId"))
                    })?);
                }
            }
            "batch" => {
                let text = read_text(field).await?;
                batch = Some(
                    text.parse()
                        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid batch")))?,
                );
            }
            "profileQuote" => {
                let text = read_text(field).await?;
                if !text.is_empty() {
                    profile_quote = Some(text);
                }
            }
            "description" => {
                let text = read_text(field).await?;
                if !text.is_empty() {
                    description = Some(text);
                }
            }
            "photos" => {
                if uploads.len() >= MAX_PHOTOS {
                    return Err(AppError::BadRequest(anyhow::anyhow!(
                        "At most {} photos per submission",
                        MAX_PHOTOS
                    )));
                }
                let file_name = field.file_name().unwrap_or("photo").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        AppError::BadRequest(anyhow::anyhow!("Failed to read photo: {}", e))
                    })?
                    .to_vec();
                uploads.push((file_name, mime_type, bytes));
            }
            // Unknown fields are ignored, matching lenient form handling.
            _ => {}
        }
    }

    let batch = batch.ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("batch is required")))?;

    let mut links = Vec::with_capacity(uploads.len());
    for (file_name, mime_type, bytes) in uploads {
        let link = state.media.upload(&file_name, &mime_type, bytes).await?;
        tracing::debug!(link = %link, "Photo uploaded");
        links.push(link);
    }

    // First photo doubles as the profile picture.
    let profile = UserProfile::new(
        claims.sub,
        department_id,
        batch,
        profile_quote,
        description,
        links.first().cloned(),
    );
    let stored = state.store.upsert_profile(&profile).await?;

    let mut photos = Vec::with_capacity(links.len());
    for link in &links {
        let photo = Photo::new(claims.sub, link.clone());
        state.store.insert_photo(&photo).await?;
        photos.push(PhotoView::from_photo(&photo, &state.config.server_url));
    }

    let record = state
        .store
        .find_profile_by_id(stored.profile_id)
        .await?
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Stored profile not found")))?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitProfileResponse {
            message: "Yearbook profile submitted successfully".to_string(),
            profile: ProfileView::from_record(&record, &state.config.server_url),
            photos,
        }),
    ))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid form field: {}", e)))
}

/// The caller's profile with their photo gallery
#[utoipa::path(
    get,
    path = "/api/v1/student/me",
    responses(
        (status = 200, description = "Profile and photos", body = ProfileWithPhotos),
        (status = 404, description = "No profile submitted yet", body = ErrorResponse)
    ),
    tag = "Student",
    security(("bearer_auth" = []))
)]
pub async fn my_profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ProfileWithPhotos>, AppError> {
    let record = state
        .store
        .find_profile_by_user_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Profile not found")))?;

    let photos = state.store.photos_for_user(claims.sub).await?;

    Ok(Json(ProfileWithPhotos {
        profile: ProfileView::from_record(&record, &state.config.server_url),
        photos: photos
            .iter()
            .map(|p| PhotoView::from_photo(p, &state.config.server_url))
            .collect(),
    }))
}

/// All departments, sorted by name
#[utoipa::path(
    get,
    path = "/api/v1/student/departments",
    responses((status = 200, description = "Departments", body = [DepartmentView])),
    tag = "Student"
)]
pub async fn departments(
    State(state): State<AppState>,
) -> Result<Json<Vec<DepartmentView>>, AppError> {
    let departments = state.store.list_departments().await?;
    Ok(Json(departments.iter().map(DepartmentView::from).collect()))
}

/// Public overview of approved profiles
#[utoipa::path(
    get,
    path = "/api/v1/student/all",
    responses((status = 200, description = "Approved profiles", body = [OverviewItem])),
    tag = "Student"
)]
pub async fn profiles_overview(
    State(state): State<AppState>,
) -> Result<Json<Vec<OverviewItem>>, AppError> {
    let records = state.store.list_approved_profiles().await?;
    Ok(Json(
        records
            .iter()
            .map(|r| OverviewItem::from_record(r, &state.config.server_url))
            .collect(),
    ))
}

/// Detail of one approved profile
#[utoipa::path(
    get,
    path = "/api/v1/student/{id}",
    params(("id" = Uuid, Path, description = "Profile id")),
    responses(
        (status = 200, description = "Profile and photos", body = ProfileWithPhotos),
        (status = 404, description = "Absent or not approved", body = ErrorResponse)
    ),
    tag = "Student"
)]
pub async fn profile_details(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<ProfileWithPhotos>, AppError> {
    let record = state
        .store
        .find_profile_by_id(profile_id)
        .await?
        .filter(|r| r.profile.approval_status == ApprovalStatus::Approved)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Profile not found or not approved")))?;

    let photos = state.store.photos_for_user(record.profile.user_id).await?;

    Ok(Json(ProfileWithPhotos {
        profile: ProfileView::from_record(&record, &state.config.server_url),
        photos: photos
            .iter()
            .map(|p| PhotoView::from_photo(p, &state.config.server_url))
            .collect(),
    }))
}
