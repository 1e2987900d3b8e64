//! Test helper module for yearbook-service integration tests.
//!
//! Spins the full router up against the in-memory store and mock media
//! storage, so every test exercises the real middleware stack and handlers
//! without external services.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use service_core::config as core_config;
use service_core::middleware::rate_limit::create_ip_rate_limiter;
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;
use yearbook_service::{
    build_router,
    config::{
        AppConfig, DatabaseConfig, DriveConfig, Environment, JwtConfig, RateLimitConfig,
        SecurityConfig, SwaggerConfig, SwaggerMode,
    },
    models::Role,
    services::{
        AuthService, JwtService, MemoryStore, MockMediaStorage, YearbookStore,
    },
    AppState,
};

pub const TEST_JWT_SECRET: &str = "integration-test-signing-secret";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub media: Arc<MockMediaStorage>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        common: core_config::Config { port: 0 },
        environment: Environment::Dev,
        service_name: "yearbook-service-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        server_url: "http://localhost:5500".to_string(),
        database: DatabaseConfig {
            url: "postgres://unused-in-tests".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_minutes: 5,
            refresh_token_expiry_days: 7,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        drive: DriveConfig {
            client_email: String::new(),
            private_key: String::new(),
        },
        rate_limit: RateLimitConfig {
            signin_attempts: 10_000,
            signin_window_seconds: 60,
            signup_attempts: 10_000,
            signup_window_seconds: 60,
            global_ip_limit: 100_000,
            global_ip_window_seconds: 60,
        },
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Disabled,
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let media = Arc::new(MockMediaStorage::new());
        let jwt = JwtService::new(&config.jwt);

        let auth_service = AuthService::new(
            store.clone(),
            jwt.clone(),
            config.jwt.refresh_token_expiry_days,
        );

        let state = AppState {
            config: config.clone(),
            store: store.clone(),
            jwt,
            media: media.clone(),
            auth_service,
            signin_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.signin_attempts,
                config.rate_limit.signin_window_seconds,
            ),
            signup_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.signup_attempts,
                config.rate_limit.signup_window_seconds,
            ),
            ip_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.global_ip_limit,
                config.rate_limit.global_ip_window_seconds,
            ),
        };

        let router = build_router(state.clone())
            .await
            .expect("Failed to build router");

        TestApp {
            router,
            state,
            store,
            media,
        }
    }

    pub async fn request(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn get(&self, path: &str) -> Response<Body> {
        self.request(
            Request::builder()
                .method("GET")
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> Response<Body> {
        self.request(
            Request::builder()
                .method("GET")
                .uri(path)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> Response<Body> {
        self.request(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_json_auth(
        &self,
        path: &str,
        body: serde_json::Value,
        token: &str,
    ) -> Response<Body> {
        self.request(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// POST with an optional `refreshToken` cookie, for refresh/logout.
    pub async fn post_with_cookie(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("POST").uri(path);
        if let Some(value) = cookie {
            builder = builder.header(header::COOKIE, format!("refreshToken={}", value));
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    /// Register an account and return (user id, access token, refresh
    /// token). Non-standard roles are applied in the store and a fresh
    /// token is obtained via sign-in so the claims carry the new role.
    pub async fn seeded_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> (Uuid, String, String) {
        let res = self
            .post_json(
                "/api/v1/auth/signup",
                serde_json::json!({
                    "fullName": name,
                    "email": email,
                    "password": password,
                }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let refresh = refresh_cookie_value(&res).expect("signup sets the refresh cookie");
        let body = body_json(res).await;
        let user_id = Uuid::parse_str(body["user"]["id"].as_str().unwrap()).unwrap();

        if role == Role::Standard {
            let token = body["accessToken"].as_str().unwrap().to_string();
            return (user_id, token, refresh);
        }

        self.store.update_user_role(user_id, role).await.unwrap();

        let res = self
            .post_json(
                "/api/v1/auth/signin",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let refresh = refresh_cookie_value(&res).expect("signin sets the refresh cookie");
        let body = body_json(res).await;
        let token = body["accessToken"].as_str().unwrap().to_string();

        (user_id, token, refresh)
    }
}

pub async fn body_json(res: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!(
            "Response body was not JSON ({}): {:?}",
            e,
            String::from_utf8_lossy(&bytes)
        )
    })
}

pub async fn body_bytes(res: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// The raw `Set-Cookie` line for the refresh cookie, if present.
pub fn refresh_cookie_header(res: &Response<Body>) -> Option<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("refreshToken="))
        .map(|v| v.to_string())
}

/// The refresh-token value from the `Set-Cookie` header, if present.
pub fn refresh_cookie_value(res: &Response<Body>) -> Option<String> {
    let header = refresh_cookie_header(res)?;
    let value = header
        .split(';')
        .next()?
        .trim_start_matches("refreshToken=")
        .to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
