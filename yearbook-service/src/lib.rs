pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    rate_limit::{ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{AppConfig, Environment, SwaggerMode};
use crate::services::{AuthService, JwtService, MediaStorage, YearbookStore};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::sign_up,
        handlers::auth::sign_in,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::student::submit_profile,
        handlers::student::my_profile,
        handlers::student::departments,
        handlers::student::profiles_overview,
        handlers::student::profile_details,
        handlers::admin::list_users,
        handlers::admin::create_department,
        handlers::admin::list_profiles,
        handlers::admin::get_profile,
        handlers::admin::approve_profile,
        handlers::admin::reject_profile,
        handlers::admin::approve_all,
        handlers::image::google_image,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::auth::SignUpRequest,
            dtos::auth::SignInRequest,
            dtos::auth::AuthResponse,
            dtos::auth::RefreshResponse,
            dtos::student::DepartmentView,
            dtos::student::PhotoView,
            dtos::student::ProfileOwner,
            dtos::student::ProfileView,
            dtos::student::ProfileWithPhotos,
            dtos::student::SubmitProfileResponse,
            dtos::student::OverviewOwner,
            dtos::student::OverviewItem,
            dtos::admin::CreateDepartmentRequest,
            dtos::admin::DepartmentDetail,
            dtos::admin::CreateDepartmentResponse,
            dtos::admin::ProfilesPage,
            dtos::admin::ModerationRequest,
            dtos::admin::ModerationResponse,
            dtos::admin::ApproveAllRequest,
            models::PublicUser,
            models::Role,
            models::ApprovalStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Sign-up, sign-in, token refresh, and logout"),
        (name = "Student", description = "Profile submission and public yearbook views"),
        (name = "Admin", description = "User listing, departments, and profile moderation"),
        (name = "Images", description = "Proxied photo retrieval"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn YearbookStore>,
    pub jwt: JwtService,
    pub media: Arc<dyn MediaStorage>,
    pub auth_service: AuthService,
    pub signin_rate_limiter: IpRateLimiter,
    pub signup_rate_limiter: IpRateLimiter,
    pub ip_rate_limiter: IpRateLimiter,
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Credential endpoints get their own tighter limiters.
    let signin_route = Router::new()
        .route("/api/v1/auth/signin", post(handlers::auth::sign_in))
        .layer(from_fn_with_state(
            state.signin_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let signup_route = Router::new()
        .route("/api/v1/auth/signup", post(handlers::auth::sign_up))
        .layer(from_fn_with_state(
            state.signup_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let student_protected = Router::new()
        .route(
            "/api/v1/student/profile",
            post(handlers::student::submit_profile),
        )
        .route("/api/v1/student/me", get(handlers::student::my_profile))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let admin_only = Router::new()
        .route("/api/v1/admin/users", get(handlers::admin::list_users))
        .route(
            "/api/v1/admin/departments",
            post(handlers::admin::create_department),
        )
        .layer(from_fn(middleware::require_admin))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let moderation = Router::new()
        .route("/api/v1/admin/profiles", get(handlers::admin::list_profiles))
        .route(
            "/api/v1/admin/profiles/approve",
            post(handlers::admin::approve_profile),
        )
        .route(
            "/api/v1/admin/profiles/reject",
            post(handlers::admin::reject_profile),
        )
        .route(
            "/api/v1/admin/profiles/approve-all",
            post(handlers::admin::approve_all),
        )
        .route(
            "/api/v1/admin/profiles/:id",
            get(handlers::admin::get_profile),
        )
        .layer(from_fn(middleware::require_moderator))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let mut app = Router::new().route("/health", get(health_check));

    let swagger_enabled = match state.config.environment {
        Environment::Dev => true,
        Environment::Prod => state.config.swagger.enabled == SwaggerMode::Public,
    };

    if swagger_enabled {
        app = app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    let origins: Vec<axum::http::HeaderValue> = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}; skipping", origin, e);
                None
            }
        })
        .collect();

    let app = app
        // Public auth endpoints
        .route("/api/v1/auth/refresh", post(handlers::auth::refresh))
        .route("/api/v1/auth/logout", post(handlers::auth::logout))
        .merge(signin_route)
        .merge(signup_route)
        // Public yearbook views
        .route(
            "/api/v1/student/departments",
            get(handlers::student::departments),
        )
        .route(
            "/api/v1/student/all",
            get(handlers::student::profiles_overview),
        )
        .route(
            "/api/v1/student/:id",
            get(handlers::student::profile_details),
        )
        .merge(student_protected)
        .merge(admin_only)
        .merge(moderation)
        // Image proxy
        .route(
            "/api/v1/google-image/:id",
            get(handlers::image::google_image),
        )
        .with_state(state.clone())
        // Global IP rate limiting
        .layer(from_fn_with_state(
            state.ip_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ))
        // Tracing layer with request-id span field
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::PATCH,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                ])
                .allow_credentials(true),
        );

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Storage unreachable")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Storage health check failed");
        e
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
    })))
}
