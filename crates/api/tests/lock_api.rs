//! Integration tests for the lock endpoints.

mod common;

use axum::http::{Method, StatusCode};
use chrono::Duration;
use common::{body_json, build_test_app, t0, timestamp, TestApp, ALICE, BOB};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn acquire(
    app: &TestApp,
    project_id: i64,
    user: i64,
    resource_id: i64,
) -> (StatusCode, Value) {
    let response = app
        .post_json(
            &format!("/api/v1/projects/{project_id}/locks"),
            user,
            json!({ "resource_type": "section", "resource_id": resource_id }),
        )
        .await;
    let status = response.status();
    (status, body_json(response).await)
}

// ---------------------------------------------------------------------------
// Acquire
// ---------------------------------------------------------------------------

#[tokio::test]
async fn acquire_returns_lock_with_expiry() {
    let app = build_test_app();
    let seeded = app.seed("body").await;

    let (status, json) = acquire(&app, seeded.project_id, ALICE, seeded.section_id).await;

    assert_eq!(status, StatusCode::OK);
    let lock = &json["data"];
    assert_eq!(lock["user_id"], ALICE);
    assert_eq!(lock["resource_type"], "section");
    assert_eq!(lock["resource_id"], seeded.section_id);
    assert_eq!(timestamp(&lock["locked_at"]), t0());
    assert_eq!(timestamp(&lock["expires_at"]), t0() + Duration::hours(2));
    assert_eq!(lock["refresh_interval_secs"], 1800);
}

#[tokio::test]
async fn reacquire_by_holder_keeps_lock_id() {
    let app = build_test_app();
    let seeded = app.seed("body").await;

    let (_, first) = acquire(&app, seeded.project_id, ALICE, seeded.section_id).await;
    app.clock.advance(Duration::minutes(10));
    let (status, second) = acquire(&app, seeded.project_id, ALICE, seeded.section_id).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["id"], first["data"]["id"]);
    assert_eq!(
        timestamp(&second["data"]["locked_at"]),
        t0() + Duration::minutes(10)
    );
}

#[tokio::test]
async fn acquire_held_by_other_user_is_conflict() {
    let app = build_test_app();
    let seeded = app.seed("body").await;

    acquire(&app, seeded.project_id, ALICE, seeded.section_id).await;
    let (status, json) = acquire(&app, seeded.project_id, BOB, seeded.section_id).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "LOCK_HELD");
    assert_eq!(json["details"]["holder_user_id"], ALICE);
    assert_eq!(
        timestamp(&json["details"]["expires_at"]),
        t0() + Duration::hours(2)
    );
}

#[tokio::test]
async fn expired_lock_can_be_taken_by_another_user() {
    let app = build_test_app();
    let seeded = app.seed("body").await;

    let (_, stale) = acquire(&app, seeded.project_id, ALICE, seeded.section_id).await;
    app.clock.advance(Duration::hours(2));
    let (status, fresh) = acquire(&app, seeded.project_id, BOB, seeded.section_id).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fresh["data"]["user_id"], BOB);
    assert_ne!(fresh["data"]["id"], stale["data"]["id"]);
}

#[tokio::test]
async fn acquire_rejects_bad_input() {
    let app = build_test_app();
    let seeded = app.seed("body").await;
    let uri = format!("/api/v1/projects/{}/locks", seeded.project_id);

    let response = app
        .post_json(&uri, ALICE, json!({ "resource_type": "page", "resource_id": 1 }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = app
        .post_json(&uri, ALICE, json!({ "resource_type": "block", "resource_id": 0 }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn acquire_in_unknown_project_is_not_found() {
    let app = build_test_app();

    let (status, json) = acquire(&app, 9999, ALICE, 1).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn missing_or_invalid_user_header_is_unauthorized() {
    let app = build_test_app();
    let body = json!({ "resource_type": "section", "resource_id": 1 });

    let response = app
        .send(Method::POST, "/api/v1/projects/1/locks", None, Some(body.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");

    let response = app.post_json("/api/v1/projects/1/locks", -4, body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Refresh / release
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_moves_expiry_forward() {
    let app = build_test_app();
    let seeded = app.seed("body").await;
    let (_, json) = acquire(&app, seeded.project_id, ALICE, seeded.section_id).await;
    let lock_id = json["data"]["id"].as_i64().unwrap();

    app.clock.advance(Duration::minutes(90));
    let response = app.post(&format!("/api/v1/locks/{lock_id}/refresh"), ALICE).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], lock_id);
    assert_eq!(
        timestamp(&json["data"]["expires_at"]),
        t0() + Duration::minutes(90) + Duration::hours(2)
    );
}

#[tokio::test]
async fn refresh_of_unknown_or_lapsed_lock_is_not_found() {
    let app = build_test_app();
    let seeded = app.seed("body").await;

    let response = app.post("/api/v1/locks/9999/refresh", ALICE).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let (_, json) = acquire(&app, seeded.project_id, ALICE, seeded.section_id).await;
    let lock_id = json["data"]["id"].as_i64().unwrap();
    app.clock.advance(Duration::hours(3));

    let response = app.post(&format!("/api/v1/locks/{lock_id}/refresh"), ALICE).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn release_deletes_then_reports_not_found() {
    let app = build_test_app();
    let seeded = app.seed("body").await;
    let (_, json) = acquire(&app, seeded.project_id, ALICE, seeded.section_id).await;
    let lock_id = json["data"]["id"].as_i64().unwrap();

    let response = app.delete(&format!("/api/v1/locks/{lock_id}"), ALICE).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.delete(&format!("/api/v1/locks/{lock_id}"), ALICE).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");

    let (status, _) = acquire(&app, seeded.project_id, BOB, seeded.section_id).await;
    assert_eq!(status, StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resource_lock_is_null_once_expired() {
    let app = build_test_app();
    let seeded = app.seed("body").await;
    acquire(&app, seeded.project_id, ALICE, seeded.section_id).await;
    let uri = format!("/api/v1/resources/section/{}/lock", seeded.section_id);

    let json = body_json(app.get(&uri, BOB).await).await;
    assert_eq!(json["data"]["user_id"], ALICE);

    app.clock.advance(Duration::hours(2));
    let json = body_json(app.get(&uri, BOB).await).await;
    assert!(json["data"].is_null());
}

#[tokio::test]
async fn status_depends_on_viewer() {
    let app = build_test_app();
    let seeded = app.seed("body").await;
    let uri = format!("/api/v1/resources/section/{}/lock-status", seeded.section_id);

    let json = body_json(app.get(&uri, ALICE).await).await;
    assert_eq!(json["data"]["status"], "available");
    assert!(json["data"]["holder_user_id"].is_null());

    acquire(&app, seeded.project_id, ALICE, seeded.section_id).await;

    let json = body_json(app.get(&uri, ALICE).await).await;
    assert_eq!(json["data"]["status"], "acquired");

    let json = body_json(app.get(&uri, BOB).await).await;
    assert_eq!(json["data"]["status"], "blocked");
    assert_eq!(json["data"]["holder_user_id"], ALICE);
}

#[tokio::test]
async fn bad_resource_type_in_path_is_bad_request() {
    let app = build_test_app();
    let response = app.get("/api/v1/resources/chapter/1/lock", ALICE).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn project_listing_omits_expired_locks() {
    let app = build_test_app();
    let seeded = app.seed("body").await;

    acquire(&app, seeded.project_id, ALICE, seeded.section_id).await;
    app.clock.advance(Duration::minutes(90));
    acquire(&app, seeded.project_id, BOB, seeded.block_id).await;
    app.clock.advance(Duration::minutes(40));

    let json = body_json(
        app.get(&format!("/api/v1/projects/{}/locks", seeded.project_id), ALICE)
            .await,
    )
    .await;
    let locks = json["data"].as_array().unwrap();
    assert_eq!(locks.len(), 1);
    assert_eq!(locks[0]["user_id"], BOB);
}
