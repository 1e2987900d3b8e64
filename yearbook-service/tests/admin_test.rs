//! Administrative surface: user listing, departments, and the approval
//! workflow.

mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use serde_json::json;
use uuid::Uuid;
use yearbook_service::models::{ApprovalStatus, Role, UserProfile};
use yearbook_service::services::YearbookStore;

#[tokio::test]
async fn list_users_supports_search() {
    let app = TestApp::spawn().await;
    let (_, admin_token, _) = app
        .seeded_account("Root", "root@x.com", "pw123456", Role::Admin)
        .await;
    app.seeded_account("Alice Smith", "alice@x.com", "pw123456", Role::Standard)
        .await;
    app.seeded_account("Bob Jones", "bob@x.com", "pw123456", Role::Standard)
        .await;

    let res = app.get_auth("/api/v1/admin/users", &admin_token).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 3);

    // Case-insensitive substring over name or email.
    let res = app
        .get_auth("/api/v1/admin/users?search=ALIC", &admin_token)
        .await;
    let body = body_json(res).await;
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["fullName"], "Alice Smith");
    // Public projection only.
    assert!(users[0].get("passwordHash").is_none());
}

#[tokio::test]
async fn create_department_promotes_the_head() {
    let app = TestApp::spawn().await;
    let (_, admin_token, _) = app
        .seeded_account("Root", "root@x.com", "pw123456", Role::Admin)
        .await;
    let (head_id, _, _) = app
        .seeded_account("Head", "head@x.com", "pw123456", Role::Standard)
        .await;

    let res = app
        .post_json_auth(
            "/api/v1/admin/departments",
            json!({ "name": "Computer Science", "email": "cs@x.com", "headUserId": head_id }),
            &admin_token,
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = body_json(res).await;
    assert_eq!(body["department"]["name"], "Computer Science");

    let head = app.store.find_user_by_id(head_id).await.unwrap().unwrap();
    assert_eq!(head.role, Role::DepartmentHead);

    // Publicly visible in the departments listing.
    let res = app.get("/api/v1/student/departments").await;
    let departments = body_json(res).await;
    assert_eq!(departments.as_array().unwrap().len(), 1);
    assert_eq!(departments[0]["name"], "Computer Science");
}

#[tokio::test]
async fn create_department_with_unknown_head_is_not_found() {
    let app = TestApp::spawn().await;
    let (_, admin_token, _) = app
        .seeded_account("Root", "root@x.com", "pw123456", Role::Admin)
        .await;

    let res = app
        .post_json_auth(
            "/api/v1/admin/departments",
            json!({ "name": "CS", "headUserId": Uuid::new_v4() }),
            &admin_token,
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = body_json(res).await;
    assert_eq!(body["error"], "Head user not found");
}

#[tokio::test]
async fn approve_records_history_and_notifies_the_owner() {
    let app = TestApp::spawn().await;
    let (_, admin_token, _) = app
        .seeded_account("Root", "root@x.com", "pw123456", Role::Admin)
        .await;
    let (student_id, _, _) = app
        .seeded_account("Alice", "a@x.com", "pw123456", Role::Standard)
        .await;

    let profile = app
        .store
        .upsert_profile(&UserProfile::new(student_id, None, 2024, None, None, None))
        .await
        .unwrap();

    let res = app
        .post_json_auth(
            "/api/v1/admin/profiles/approve",
            json!({ "profileId": profile.profile_id, "comment": "looks great" }),
            &admin_token,
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["message"], "Profile approved");
    assert_eq!(body["profile"]["approvalStatus"], "APPROVED");

    assert_eq!(app.store.approval_count(), 1);
    let notifications = app.store.notifications_for(student_id);
    assert_eq!(notifications, vec!["Your profile has been approved"]);
}

#[tokio::test]
async fn reject_carries_the_comment_into_the_notification() {
    let app = TestApp::spawn().await;
    let (_, admin_token, _) = app
        .seeded_account("Root", "root@x.com", "pw123456", Role::Admin)
        .await;
    let (student_id, _, _) = app
        .seeded_account("Alice", "a@x.com", "pw123456", Role::Standard)
        .await;

    let profile = app
        .store
        .upsert_profile(&UserProfile::new(student_id, None, 2024, None, None, None))
        .await
        .unwrap();

    let res = app
        .post_json_auth(
            "/api/v1/admin/profiles/reject",
            json!({ "profileId": profile.profile_id, "comment": "blurry photo" }),
            &admin_token,
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["profile"]["approvalStatus"], "REJECTED");

    let notifications = app.store.notifications_for(student_id);
    assert_eq!(notifications, vec!["Your profile was rejected: blurry photo"]);
}

#[tokio::test]
async fn moderating_a_missing_profile_is_not_found() {
    let app = TestApp::spawn().await;
    let (_, admin_token, _) = app
        .seeded_account("Root", "root@x.com", "pw123456", Role::Admin)
        .await;

    let res = app
        .post_json_auth(
            "/api/v1/admin/profiles/approve",
            json!({ "profileId": Uuid::new_v4() }),
            &admin_token,
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn approve_all_covers_exactly_the_departments_pending_profiles() {
    let app = TestApp::spawn().await;
    let (_, admin_token, _) = app
        .seeded_account("Root", "root@x.com", "pw123456", Role::Admin)
        .await;
    let (head_id, _, _) = app
        .seeded_account("Head", "head@x.com", "pw123456", Role::Standard)
        .await;

    let res = app
        .post_json_auth(
            "/api/v1/admin/departments",
            json!({ "name": "CS", "headUserId": head_id }),
            &admin_token,
        )
        .await;
    let department_id =
        Uuid::parse_str(body_json(res).await["department"]["id"].as_str().unwrap()).unwrap();

    let (a, _, _) = app
        .seeded_account("A", "aa@x.com", "pw123456", Role::Standard)
        .await;
    let (b, _, _) = app
        .seeded_account("B", "bb@x.com", "pw123456", Role::Standard)
        .await;
    let (c, _, _) = app
        .seeded_account("C", "cc@x.com", "pw123456", Role::Standard)
        .await;

    // Two pending in the department, one outside it.
    for user_id in [a, b] {
        app.store
            .upsert_profile(&UserProfile::new(
                user_id,
                Some(department_id),
                2024,
                None,
                None,
                None,
            ))
            .await
            .unwrap();
    }
    let outside = app
        .store
        .upsert_profile(&UserProfile::new(c, None, 2024, None, None, None))
        .await
        .unwrap();

    let res = app
        .post_json_auth(
            "/api/v1/admin/profiles/approve-all",
            json!({ "departmentId": department_id }),
            &admin_token,
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["message"], "Approved 2 profiles successfully");

    // Both owners notified, outsider untouched.
    assert_eq!(app.store.notifications_for(a).len(), 1);
    assert_eq!(app.store.notifications_for(b).len(), 1);
    assert!(app.store.notifications_for(c).is_empty());
    let outside_now = app
        .store
        .find_profile_by_id(outside.profile_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outside_now.profile.approval_status, ApprovalStatus::Pending);

    // Nothing left pending: reported as a message, not an error.
    let res = app
        .post_json_auth(
            "/api/v1/admin/profiles/approve-all",
            json!({ "departmentId": department_id }),
            &admin_token,
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["message"], "No pending profiles in this department");
}

#[tokio::test]
async fn moderation_listing_filters_and_paginates() {
    let app = TestApp::spawn().await;
    let (_, admin_token, _) = app
        .seeded_account("Root", "root@x.com", "pw123456", Role::Admin)
        .await;

    for (i, (name, email)) in [
        ("Alice", "aa@x.com"),
        ("Bob", "bb@x.com"),
        ("Cara", "cc@x.com"),
    ]
    .iter()
    .enumerate()
    {
        let (user_id, _, _) = app
            .seeded_account(name, email, "pw123456", Role::Standard)
            .await;
        app.store
            .upsert_profile(&UserProfile::new(
                user_id,
                None,
                2022 + i as i32,
                None,
                None,
                None,
            ))
            .await
            .unwrap();
    }

    // Page size smaller than the total.
    let res = app
        .get_auth("/api/v1/admin/profiles?limit=2", &admin_token)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["profiles"].as_array().unwrap().len(), 2);

    // Filter by graduation year.
    let res = app
        .get_auth("/api/v1/admin/profiles?graduationYear=2023", &admin_token)
        .await;
    let body = body_json(res).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["profiles"][0]["batch"], 2023);

    // Search joins against the owner.
    let res = app
        .get_auth("/api/v1/admin/profiles?search=cara", &admin_token)
        .await;
    let body = body_json(res).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["profiles"][0]["user"]["fullName"], "Cara");

    // Status filter: nothing approved yet.
    let res = app
        .get_auth("/api/v1/admin/profiles?status=APPROVED", &admin_token)
        .await;
    let body = body_json(res).await;
    assert_eq!(body["total"], 0);

    // Ascending batch sort.
    let res = app
        .get_auth(
            "/api/v1/admin/profiles?sortBy=batch&order=asc",
            &admin_token,
        )
        .await;
    let body = body_json(res).await;
    assert_eq!(body["profiles"][0]["batch"], 2022);
    assert_eq!(body["profiles"][2]["batch"], 2024);
}
