// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resident profile sync tests.

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use wardwatch::middleware::auth::Role;

mod common;
use common::{body_json, create_test_app, create_test_jwt, json_request};

#[tokio::test]
async fn test_sync_normalizes_ward_forms() {
    let (app, state) = create_test_app();

    for (user, ward) in [
        ("u-num", json!(5)),
        ("u-text", json!("5")),
        ("u-label", json!("Ward 5")),
        ("u-lower", json!("ward 5")),
    ] {
        let token = create_test_jwt(user, Role::Citizen, &state);
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/users/sync",
                Some(&token),
                Some(json!({ "ward": ward })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "user {user}");
        assert_eq!(body_json(response).await["ward"], 5);
    }

    let residents = state.db.list_active_residents_in_ward(5).await.unwrap();
    assert_eq!(residents.len(), 4);
}

#[tokio::test]
async fn test_sync_rejects_unknown_ward() {
    let (app, state) = create_test_app();
    let token = create_test_jwt("u1", Role::Citizen, &state);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/users/sync",
            Some(&token),
            Some(json!({ "ward": "Ward 40" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.db.get_resident("u1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_sync_uses_claims_and_keeps_existing_fields() {
    let (app, state) = create_test_app();
    let token = create_test_jwt("u1", Role::Citizen, &state);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users/sync",
            Some(&token),
            Some(json!({ "ward": 12 })),
        ))
        .await
        .unwrap();
    let first = body_json(response).await;
    assert_eq!(first["email"], "u1@example.com");
    assert_eq!(first["active"], true);

    // A later sync without a ward keeps the stored one
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users/sync",
            Some(&token),
            Some(json!({ "active": false })),
        ))
        .await
        .unwrap();
    let second = body_json(response).await;
    assert_eq!(second["ward"], 12);
    assert_eq!(second["active"], false);
    assert_eq!(second["createdAt"], first["createdAt"]);

    let response = app
        .oneshot(json_request("GET", "/api/users/me", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["active"], false);

    assert!(state
        .db
        .list_active_residents_in_ward(12)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_profile_before_sync_not_found() {
    let (app, state) = create_test_app();
    let token = create_test_jwt("u-new", Role::Citizen, &state);

    let response = app
        .oneshot(json_request("GET", "/api/users/me", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
