// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use std::sync::{Arc, Mutex};
use wardwatch::config::Config;
use wardwatch::db::FirestoreDb;
use wardwatch::error::AppError;
use wardwatch::middleware::auth::{create_jwt, Role};
use wardwatch::models::{Collector, CollectorStatus, Resident, WardNumber};
use wardwatch::routes::create_router;
use wardwatch::services::password::hash_password_with_iterations;
use wardwatch::services::{EmailMessage, EmailSender, WardRegistry};
use wardwatch::AppState;

/// Password used for every seeded collector.
#[allow(dead_code)]
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create an in-process database (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_in_memory()
}

/// Mailer that records every message and fails for chosen recipients.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail_for: Vec<String>,
}

#[allow(dead_code)]
impl RecordingMailer {
    pub fn failing_for(addresses: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_for: addresses.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn recipients(&self) -> Vec<String> {
        let mut to: Vec<String> = self
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.to.clone())
            .collect();
        to.sort();
        to
    }
}

#[async_trait::async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        if self.fail_for.contains(&message.to) {
            return Err(AppError::Email(format!("mailbox {} unavailable", message.to)));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Create a test app backed by the in-process store and the built-in wards.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_mailer(Arc::new(RecordingMailer::default()))
}

#[allow(dead_code)]
pub fn create_test_app_with_mailer(mailer: Arc<dyn EmailSender>) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        config: Config::test_default(),
        db: test_db_offline(),
        wards: Arc::new(WardRegistry::builtin()),
        mailer,
    });

    (create_router(state.clone()), state)
}

/// Session token for `subject` with `role`, signed with the test key.
#[allow(dead_code)]
pub fn create_test_jwt(subject: &str, role: Role, state: &AppState) -> String {
    create_jwt(
        subject,
        role,
        Some(format!("{subject}@example.com")),
        Some(format!("Test {subject}")),
        &state.config.jwt_signing_key,
    )
    .unwrap()
}

/// Build a collector record without storing it.
#[allow(dead_code)]
pub fn test_collector(id: &str, wards: &[WardNumber], status: CollectorStatus) -> Collector {
    let now = chrono::Utc::now().to_rfc3339();
    Collector {
        collector_id: id.to_string(),
        name: format!("Collector {id}"),
        email: Some(format!("{id}@city.example")),
        phone: None,
        // Low iteration count keeps tests fast
        password_hash: hash_password_with_iterations(TEST_PASSWORD, 1_000).unwrap(),
        assigned_wards: wards.to_vec(),
        vehicle_id: format!("TRUCK-{id}"),
        status,
        badge: None,
        rating: 0.0,
        efficiency: 0.0,
        total_collections: 0,
        created_at: now.clone(),
        updated_at: now,
    }
}

/// Store an active collector covering `wards`.
#[allow(dead_code)]
pub async fn seed_collector(db: &FirestoreDb, id: &str, wards: &[WardNumber]) -> Collector {
    let collector = test_collector(id, wards, CollectorStatus::Active);
    db.upsert_collector(&collector).await.unwrap();
    collector
}

#[allow(dead_code)]
pub async fn seed_resident(
    db: &FirestoreDb,
    user_id: &str,
    email: Option<&str>,
    ward: Option<WardNumber>,
    active: bool,
) -> Resident {
    let now = chrono::Utc::now().to_rfc3339();
    let resident = Resident {
        user_id: user_id.to_string(),
        name: Some(format!("Resident {user_id}")),
        email: email.map(str::to_string),
        ward,
        active,
        created_at: now.clone(),
        updated_at: now,
    };
    db.upsert_resident(&resident).await.unwrap();
    resident
}

/// Authenticated JSON request.
#[allow(dead_code)]
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Collect a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
