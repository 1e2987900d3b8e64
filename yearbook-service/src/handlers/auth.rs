//! Authentication endpoints: sign-up, sign-in, refresh, logout.
//!
//! The refresh token travels exclusively in an HTTP-only cookie; response
//! bodies carry only the access token and the public user projection.

use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use service_core::error::AppError;

use crate::config::{AppConfig, Environment};
use crate::dtos::auth::{AuthResponse, RefreshResponse, SignInRequest, SignUpRequest};
use crate::dtos::{ErrorResponse, MessageResponse};
use crate::utils::ValidatedJson;
use crate::AppState;

pub const REFRESH_COOKIE: &str = "refreshToken";

fn refresh_cookie(config: &AppConfig, token: String) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(config.environment == Environment::Prod)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::days(config.jwt.refresh_token_expiry_days))
        .build()
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::from(REFRESH_COOKIE);
    cookie.set_path("/");
    cookie
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Missing or malformed field", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<SignUpRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let issued = state
        .auth_service
        .sign_up(req.full_name, req.email, req.password)
        .await?;

    let jar = jar.add(refresh_cookie(&state.config, issued.refresh_token));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            access_token: issued.access_token,
            user: issued.user.sanitized(),
        }),
    ))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/signin",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<SignInRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let issued = state.auth_service.sign_in(req.email, req.password).await?;

    let jar = jar.add(refresh_cookie(&state.config, issued.refresh_token));

    Ok((
        jar,
        Json(AuthResponse {
            access_token: issued.access_token,
            user: issued.user.sanitized(),
        }),
    ))
}

/// Exchange the refresh cookie for a new access token, rotating the cookie
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    responses(
        (status = 200, description = "Token refreshed", body = RefreshResponse),
        (status = 401, description = "Missing or invalid refresh token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<RefreshResponse>), AppError> {
    let presented = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());

    let rotated = state.auth_service.refresh(presented.as_deref()).await?;

    let jar = jar.add(refresh_cookie(&state.config, rotated.refresh_token));

    Ok((
        jar,
        Json(RefreshResponse {
            access_token: rotated.access_token,
        }),
    ))
}

/// Invalidate the presented refresh token and clear the cookie
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Logged out"),
        (status = 204, description = "No refresh token presented")
    ),
    tag = "Authentication"
)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<Response, AppError> {
    let presented = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());

    if !state.auth_service.logout(presented.as_deref()).await? {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let jar = jar.remove(removal_cookie());
    Ok((jar, Json(MessageResponse::new("Logged out successfully"))).into_response())
}
