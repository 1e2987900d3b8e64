//! Administrative endpoints: user listing, department creation, and the
//! profile approval workflow.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::admin::{
    ApproveAllRequest, CreateDepartmentRequest, CreateDepartmentResponse, DepartmentDetail,
    ListUsersQuery, ModerationRequest, ModerationResponse, ProfilesPage, ProfilesQuery,
};
use crate::dtos::student::{PhotoView, ProfileView, ProfileWithPhotos};
use crate::dtos::{ErrorResponse, MessageResponse};
use crate::middleware::AuthUser;
use crate::models::{ApprovalEvent, ApprovalStatus, Department, Notification, PublicUser, Role};
use crate::services::YearbookStore;
use crate::utils::ValidatedJson;
use crate::AppState;

/// List users, optionally filtered by a name/email search
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Users", body = [PublicUser]),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let users = state.store.list_users(query.search.as_deref()).await?;
    Ok(Json(users.iter().map(|u| u.sanitized()).collect()))
}

/// Create a department and promote its head
#[utoipa::path(
    post,
    path = "/api/v1/admin/departments",
    request_body = CreateDepartmentRequest,
    responses(
        (status = 201, description = "Department created", body = CreateDepartmentResponse),
        (status = 404, description = "Head user not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn create_department(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<CreateDepartmentResponse>), AppError> {
    let head = state
        .store
        .find_user_by_id(req.head_user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Head user not found")))?;

    let department = Department::new(req.name, req.email, head.user_id);
    state.store.insert_department(&department).await?;
    state
        .store
        .update_user_role(head.user_id, Role::DepartmentHead)
        .await?;

    tracing::info!(
        department_id = %department.department_id,
        head_user_id = %head.user_id,
        "Department created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateDepartmentResponse {
            message: "Department created and head assigned successfully".to_string(),
            department: DepartmentDetail::from(&department),
        }),
    ))
}

/// Moderation listing with filtering, search, sorting, and pagination
#[utoipa::path(
    get,
    path = "/api/v1/admin/profiles",
    params(ProfilesQuery),
    responses((status = 200, description = "Profile page", body = ProfilesPage)),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn list_profiles(
    State(state): State<AppState>,
    Query(query): Query<ProfilesQuery>,
) -> Result<Json<ProfilesPage>, AppError> {
    let filter = query.into_filter();
    let (records, total) = state.store.list_profiles(&filter).await?;

    Ok(Json(ProfilesPage {
        total,
        page: filter.page,
        limit: filter.limit,
        profiles: records
            .iter()
            .map(|r| ProfileView::from_record(r, &state.config.server_url))
            .collect(),
    }))
}

/// One profile regardless of approval status
#[utoipa::path(
    get,
    path = "/api/v1/admin/profiles/{id}",
    params(("id" = Uuid, Path, description = "Profile id")),
    responses(
        (status = 200, description = "Profile and photos", body = ProfileWithPhotos),
        (status = 404, description = "Profile not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<ProfileWithPhotos>, AppError> {
    let record = state
        .store
        .find_profile_by_id(profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Profile not found")))?;

    let photos = state.store.photos_for_user(record.profile.user_id).await?;

    Ok(Json(ProfileWithPhotos {
        profile: ProfileView::from_record(&record, &state.config.server_url),
        photos: photos
            .iter()
            .map(|p| PhotoView::from_photo(p, &state.config.server_url))
            .collect(),
    }))
}

/// Approve a single profile
#[utoipa::path(
    post,
    path = "/api/v1/admin/profiles/approve",
    request_body = ModerationRequest,
    responses(
        (status = 200, description = "Profile approved", body = ModerationResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn approve_profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<ModerationRequest>,
) -> Result<Json<ModerationResponse>, AppError> {
    let profile = moderate(
        &state,
        claims.sub,
        &req,
        ApprovalStatus::Approved,
        "Your profile has been approved".to_string(),
    )
    .await?;

    Ok(Json(ModerationResponse {
        message: "Profile approved".to_string(),
        profile,
    }))
}

/// Reject a single profile
#[utoipa::path(
    post,
    path = "/api/v1/admin/profiles/reject",
    request_body = ModerationRequest,
    responses(
        (status = 200, description = "Profile rejected", body = ModerationResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn reject_profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<ModerationRequest>,
) -> Result<Json<ModerationResponse>, AppError> {
    let notification = match &req.comment {
        Some(comment) => format!("Your profile was rejected: {}", comment),
        None => "Your profile was rejected".to_string(),
    };

    let profile = moderate(&state, claims.sub, &req, ApprovalStatus::Rejected, notification).await?;

    Ok(Json(ModerationResponse {
        message: "Profile rejected".to_string(),
        profile,
    }))
}

/// Apply a moderation decision: status change, history row, and a
/// notification for the owner.
async fn moderate(
    state: &AppState,
    approver: Uuid,
    req: &ModerationRequest,
    action: ApprovalStatus,
    notification: String,
) -> Result<ProfileView, AppError> {
    let profile = state
        .store
        .set_profile_status(req.profile_id, action)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Profile not found")))?;

    state
        .store
        .insert_approval(&ApprovalEvent::for_profile(
            profile.profile_id,
            action,
            approver,
            req.comment.clone(),
        ))
        .await?;
    state
        .store
        .insert_notification(&Notification::new(profile.user_id, notification))
        .await?;

    tracing::info!(
        profile_id = %profile.profile_id,
        action = ?action,
        approved_by = %approver,
        "Profile moderated"
    );

    let record = state
        .store
        .find_profile_by_id(profile.profile_id)
        .await?
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Moderated profile not found")))?;

    Ok(ProfileView::from_record(&record, &state.config.server_url))
}

/// Approve every pending profile in a department
#[utoipa::path(
    post,
    path = "/api/v1/admin/profiles/approve-all",
    request_body = ApproveAllRequest,
    responses((status = 200, description = "Result message", body = MessageResponse)),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn approve_all(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<ApproveAllRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let pending = state
        .store
        .pending_profiles_in_department(req.department_id)
        .await?;

    if pending.is_empty() {
        return Ok(Json(MessageResponse::new(
            "No pending profiles in this department",
        )));
    }

    for profile in &pending {
        state
            .store
            .set_profile_status(profile.profile_id, ApprovalStatus::Approved)
            .await?;
        state
            .store
            .insert_approval(&ApprovalEvent::for_profile(
                profile.profile_id,
                ApprovalStatus::Approved,
                claims.sub,
                None,
            ))
            .await?;
        state
            .store
            .insert_notification(&Notification::new(
                profile.user_id,
                "Your profile has been approved".to_string(),
            ))
            .await?;
    }

    tracing::info!(
        department_id = %req.department_id,
        approved = pending.len(),
        "Department profiles approved"
    );

    Ok(Json(MessageResponse::new(format!(
        "Approved {} profiles successfully",
        pending.len()
    ))))
}
