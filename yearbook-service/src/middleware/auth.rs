//! Authorization guard: stateless access-token validation and role gates.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::models::Role;
use crate::services::AccessTokenClaims;
use crate::AppState;

/// Validate the bearer access token and attach its claims to the request.
/// Signature + expiry only; no storage is consulted, and an expired token
/// is the caller's cue to hit the refresh endpoint explicitly.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
        })?;

    let claims = state
        .jwt
        .validate_access_token(token)
        .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token")))?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Gate for Admin-only operations. Composed after `auth_middleware`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let claims = claims_from(&req)?;
    match claims.role {
        Role::Admin => Ok(next.run(req).await),
        Role::DepartmentHead | Role::Standard => Err(AppError::Forbidden(anyhow::anyhow!(
            "Admin access required"
        ))),
    }
}

/// Gate for profile moderation: admins and department heads.
pub async fn require_moderator(req: Request, next: Next) -> Result<Response, AppError> {
    let claims = claims_from(&req)?;
    match claims.role {
        Role::Admin | Role::DepartmentHead => Ok(next.run(req).await),
        Role::Standard => Err(AppError::Forbidden(anyhow::anyhow!(
            "Moderator access required"
        ))),
    }
}

fn claims_from(req: &Request) -> Result<&AccessTokenClaims, AppError> {
    req.extensions()
        .get::<AccessTokenClaims>()
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authentication required")))
}

/// Extractor handing validated claims to handlers.
pub struct AuthUser(pub AccessTokenClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<AccessTokenClaims>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("Auth claims missing from request extensions"))
        })?;

        Ok(AuthUser(claims.clone()))
    }
}
