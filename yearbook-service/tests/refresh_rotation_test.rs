//! Refresh-token rotation and logout lifecycle.

mod common;

use axum::http::StatusCode;
use common::{body_json, refresh_cookie_value, TestApp};
use yearbook_service::models::Role;

#[tokio::test]
async fn refresh_rotates_and_supersedes_the_old_token() {
    let app = TestApp::spawn().await;
    let (_, _, token_0) = app
        .seeded_account("Alice", "a@x.com", "pw123456", Role::Standard)
        .await;

    // Exchange T0: succeeds, sets T1.
    let res = app
        .post_with_cookie("/api/v1/auth/refresh", Some(&token_0))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let token_1 = refresh_cookie_value(&res).expect("rotation sets a new cookie");
    assert_ne!(token_0, token_1);
    let body = body_json(res).await;
    assert!(!body["accessToken"].as_str().unwrap().is_empty());

    // Replaying T0 fails: the rotation superseded it.
    let res = app
        .post_with_cookie("/api/v1/auth/refresh", Some(&token_0))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(res).await;
    assert_eq!(body["error"], "Invalid refresh token");

    // T1 is the live lineage and keeps rotating.
    let res = app
        .post_with_cookie("/api/v1/auth/refresh", Some(&token_1))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let token_2 = refresh_cookie_value(&res).unwrap();
    assert_ne!(token_1, token_2);
}

#[tokio::test]
async fn refresh_without_a_cookie_is_unauthorized() {
    let app = TestApp::spawn().await;

    let res = app.post_with_cookie("/api/v1/auth/refresh", None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(res).await;
    assert_eq!(body["error"], "No refresh token provided");
}

#[tokio::test]
async fn forged_refresh_token_is_unauthorized() {
    let app = TestApp::spawn().await;
    app.seeded_account("Alice", "a@x.com", "pw123456", Role::Standard)
        .await;

    let res = app
        .post_with_cookie("/api/v1/auth/refresh", Some("not-a-real-token"))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_deletes_the_session() {
    let app = TestApp::spawn().await;
    let (_, _, refresh_token) = app
        .seeded_account("Alice", "a@x.com", "pw123456", Role::Standard)
        .await;

    let res = app
        .post_with_cookie("/api/v1/auth/logout", Some(&refresh_token))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["message"], "Logged out successfully");

    // The deleted lineage can no longer refresh.
    let res = app
        .post_with_cookie("/api/v1/auth/refresh", Some(&refresh_token))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_is_idempotent() {
    let app = TestApp::spawn().await;
    let (_, _, refresh_token) = app
        .seeded_account("Alice", "a@x.com", "pw123456", Role::Standard)
        .await;

    // A stale cookie value deletes nothing the second time, and that is
    // still a success.
    for _ in 0..2 {
        let res = app
            .post_with_cookie("/api/v1/auth/logout", Some(&refresh_token))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    // No cookie at all: intentional no-op success.
    let res = app.post_with_cookie("/api/v1/auth/logout", None).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}
