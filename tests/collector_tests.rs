// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collector lookup, self-service and admin management tests.

use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;
use wardwatch::middleware::auth::Role;
use wardwatch::models::CollectorStatus;
use wardwatch::services::password::verify_password;

mod common;
use common::{body_json, create_test_app, create_test_jwt, json_request, seed_collector};

fn new_collector(id: &str, wards: Value) -> Value {
    json!({
        "collectorId": id,
        "name": "Ram Bahadur",
        "email": "ram@city.example",
        "phone": "9800000000",
        "password": "s3cret-pass",
        "assignedWards": wards,
        "vehicleId": "BA-2-KHA-1234"
    })
}

#[tokio::test]
async fn test_public_lookup_for_ward() {
    let (app, state) = create_test_app();
    seed_collector(&state.db, "COL-5", &[1, 2, 3, 4, 5]).await;

    let response = app
        .clone()
        .oneshot(json_request("GET", "/api/collectors/ward/5", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["collectorId"], "COL-5");
    assert!(body.get("passwordHash").is_none());

    let response = app
        .oneshot(json_request("GET", "/api/collectors/ward/6", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lookup_tie_break_is_smallest_id() {
    let (app, state) = create_test_app();
    seed_collector(&state.db, "COL-B", &[1, 2, 3, 4, 5]).await;
    seed_collector(&state.db, "COL-A", &[5, 6, 7, 8, 9]).await;
    seed_collector(&state.db, "COL-C", &[5, 10, 11, 12, 13]).await;

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(json_request("GET", "/api/collectors/ward/5", None, None))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["collectorId"], "COL-A");
    }
}

#[tokio::test]
async fn test_lookup_ignores_inactive_collectors() {
    let (_, state) = create_test_app();
    let inactive = common::test_collector("COL-A", &[1, 2, 3, 4, 5], CollectorStatus::Inactive);
    state.db.upsert_collector(&inactive).await.unwrap();
    seed_collector(&state.db, "COL-B", &[1, 2, 3, 4, 5]).await;

    let found = state
        .assignment_resolver()
        .find_active_collector_for_ward(3)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.collector_id, "COL-B");
}

#[tokio::test]
async fn test_admin_creates_collector() {
    let (app, state) = create_test_app();
    let admin = create_test_jwt("admin-1", Role::Admin, &state);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/collectors",
            Some(&admin),
            Some(new_collector("COL-NEW", json!([9, 7, 8, 7, 6, 5]))),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["assignedWards"], json!([5, 6, 7, 8, 9]));
    assert_eq!(body["status"], "active");
    assert_eq!(body["totalCollections"], 0);

    let stored = state.db.get_collector("COL-NEW").await.unwrap().unwrap();
    assert!(verify_password("s3cret-pass", &stored.password_hash));

    // Duplicate IDs are rejected
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/admin/collectors",
            Some(&admin),
            Some(new_collector("COL-NEW", json!([1, 2, 3, 4, 5]))),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_collector_needs_five_distinct_valid_wards() {
    let (app, state) = create_test_app();
    let admin = create_test_jwt("admin-1", Role::Admin, &state);

    for wards in [json!([1, 2, 3, 4]), json!([1, 1, 2, 3, 4]), json!([1, 2, 3, 4, 34])] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/admin/collectors",
                Some(&admin),
                Some(new_collector("COL-BAD", wards.clone())),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "wards {wards}");
    }

    assert!(state.db.get_collector("COL-BAD").await.unwrap().is_none());
}

#[tokio::test]
async fn test_non_admin_cannot_manage_collectors() {
    let (app, state) = create_test_app();
    seed_collector(&state.db, "COL-5", &[1, 2, 3, 4, 5]).await;
    let collector = create_test_jwt("COL-5", Role::Collector, &state);
    let citizen = create_test_jwt("citizen-1", Role::Citizen, &state);

    for token in [&collector, &citizen] {
        let response = app
            .clone()
            .oneshot(json_request(
                "GET",
                "/api/admin/collectors",
                Some(token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn test_admin_update_and_delete() {
    let (app, state) = create_test_app();
    seed_collector(&state.db, "COL-5", &[1, 2, 3, 4, 5]).await;
    let admin = create_test_jwt("admin-1", Role::Admin, &state);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/admin/collectors/COL-5",
            Some(&admin),
            Some(json!({ "status": "inactive", "rating": 4.5, "badge": "gold" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "inactive");
    assert_eq!(body["rating"], 4.5);
    assert_eq!(body["badge"], "gold");

    // Deactivated collectors stop receiving new assignments
    assert!(state
        .assignment_resolver()
        .find_active_collector_for_ward(3)
        .await
        .unwrap()
        .is_none());

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/admin/collectors/COL-5",
            Some(&admin),
            Some(json!({ "assignedWards": [1, 2] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            "/api/admin/collectors/COL-5",
            Some(&admin),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(state.db.get_collector("COL-5").await.unwrap().is_none());

    let response = app
        .oneshot(json_request(
            "DELETE",
            "/api/admin/collectors/COL-5",
            Some(&admin),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_collector_updates_own_profile_only() {
    let (app, state) = create_test_app();
    seed_collector(&state.db, "COL-5", &[1, 2, 3, 4, 5]).await;
    let token = create_test_jwt("COL-5", Role::Collector, &state);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/collector/me",
            Some(&token),
            Some(json!({ "name": "New Name", "phone": "9811111111" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "New Name");
    assert_eq!(body["phone"], "9811111111");
    assert_eq!(body["assignedWards"], json!([1, 2, 3, 4, 5]));

    // Ward sets are admin-only; unknown fields are ignored
    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/collector/me",
            Some(&token),
            Some(json!({ "assignedWards": [6, 7, 8, 9, 10] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stored = state.db.get_collector("COL-5").await.unwrap().unwrap();
    assert_eq!(stored.assigned_wards, vec![1, 2, 3, 4, 5]);
}
