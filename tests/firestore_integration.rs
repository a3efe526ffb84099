// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Run with `FIRESTORE_EMULATOR_HOST=localhost:8081 cargo test --test firestore_integration`.
//!
//! The emulator provides a clean state for each test run.

use wardwatch::models::{
    CollectorAssignment, CollectorStatus, Report, ReportStatus, ReportType, TaskStatus, WardTask,
};

mod common;
use common::{seed_resident, test_collector, test_db};

/// Generate a unique ID suffix for test isolation.
fn unique_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos()
        .to_string()
}

fn test_report(id: &str, ward: u32) -> Report {
    let now = chrono::Utc::now().to_rfc3339();
    Report {
        id: id.to_string(),
        report_type: ReportType::IllegalDumping,
        report_label: ReportType::IllegalDumping.label().to_string(),
        description: "Construction debris by the river".to_string(),
        location: "Riverside".to_string(),
        ward,
        latitude: 27.7,
        longitude: 85.3,
        images: vec![],
        status: ReportStatus::Received,
        user_id: "citizen-it".to_string(),
        user_name: None,
        user_email: None,
        assignment: None,
        created_at: now.clone(),
        updated_at: now,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// COLLECTOR TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_collector_insert_conflict() {
    require_emulator!();

    let db = test_db().await;
    let id = format!("COL-{}", unique_suffix());
    let collector = test_collector(&id, &[1, 2, 3, 4, 5], CollectorStatus::Active);

    assert!(db.insert_collector(&collector).await.unwrap());
    assert!(
        !db.insert_collector(&collector).await.unwrap(),
        "Second insert with the same ID must report a conflict"
    );

    db.delete_collector(&id).await.unwrap();
    assert!(db.get_collector(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_active_collectors_for_ward_query() {
    require_emulator!();

    let db = test_db().await;
    let suffix = unique_suffix();
    // Ward 33 is shared by both; only the active one should match
    let active = test_collector(&format!("A-{suffix}"), &[29, 30, 31, 32, 33], CollectorStatus::Active);
    let inactive = test_collector(&format!("I-{suffix}"), &[29, 30, 31, 32, 33], CollectorStatus::Inactive);
    db.upsert_collector(&active).await.unwrap();
    db.upsert_collector(&inactive).await.unwrap();

    let found = db.find_active_collectors_for_ward(33).await.unwrap();
    assert!(found.iter().any(|c| c.collector_id == active.collector_id));
    assert!(!found.iter().any(|c| c.collector_id == inactive.collector_id));

    db.delete_collector(&active.collector_id).await.unwrap();
    db.delete_collector(&inactive.collector_id).await.unwrap();
}

#[tokio::test]
async fn test_concurrent_total_collection_increments() {
    require_emulator!();

    let db = test_db().await;
    let id = format!("COL-{}", unique_suffix());
    db.upsert_collector(&test_collector(&id, &[1, 2, 3, 4, 5], CollectorStatus::Active))
        .await
        .unwrap();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let db = db.clone();
            let id = id.clone();
            tokio::spawn(async move { db.increment_total_collections(&id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = db.get_collector(&id).await.unwrap().unwrap();
    assert_eq!(stored.total_collections, 10, "No increment may be lost");
}

// ═══════════════════════════════════════════════════════════════════════════
// REPORT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_report_assignment_only_once() {
    require_emulator!();

    let db = test_db().await;
    let id = format!("report-{}", unique_suffix());
    db.upsert_report(&test_report(&id, 8)).await.unwrap();

    let first = CollectorAssignment {
        collector_id: "COL-1".to_string(),
        collector_name: "One".to_string(),
        vehicle_id: "V1".to_string(),
    };
    let second = CollectorAssignment {
        collector_id: "COL-2".to_string(),
        collector_name: "Two".to_string(),
        vehicle_id: "V2".to_string(),
    };
    let now = chrono::Utc::now().to_rfc3339();

    assert!(db.assign_report_if_unassigned(&id, &first, &now).await.unwrap());
    assert!(!db.assign_report_if_unassigned(&id, &second, &now).await.unwrap());

    let stored = db.get_report(&id).await.unwrap().unwrap();
    assert_eq!(stored.assignment, Some(first));
}

#[tokio::test]
async fn test_report_status_compare_and_set() {
    require_emulator!();

    let db = test_db().await;
    let id = format!("report-{}", unique_suffix());
    db.upsert_report(&test_report(&id, 9)).await.unwrap();
    let now = chrono::Utc::now().to_rfc3339();

    assert!(db
        .update_report_status_if(&id, ReportStatus::Received, ReportStatus::InProgress, &now)
        .await
        .unwrap());
    assert!(!db
        .update_report_status_if(&id, ReportStatus::Received, ReportStatus::Resolved, &now)
        .await
        .unwrap());

    let stored = db.get_report(&id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReportStatus::InProgress);
}

// ═══════════════════════════════════════════════════════════════════════════
// WARD TASK TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_ward_task_insert_if_absent() {
    require_emulator!();

    let db = test_db().await;
    // Far-future date derived from the clock so reruns use a fresh key
    let offset = (unique_suffix().parse::<u128>().unwrap() % 36_500) as u64;
    let date = (chrono::NaiveDate::from_ymd_opt(2100, 1, 1).unwrap()
        + chrono::Days::new(offset))
    .format("%Y-%m-%d")
    .to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let winner = WardTask::scheduled(10, &date, "8:00 AM - 10:00 AM", "COL-WIN", &now);
    let loser = WardTask::scheduled(10, &date, "8:00 AM - 10:00 AM", "COL-LOSE", &now);

    assert!(db.create_ward_task_if_absent(&winner).await.unwrap());
    assert!(
        !db.create_ward_task_if_absent(&loser).await.unwrap(),
        "Duplicate (ward, date) insert must be refused"
    );

    let stored = db.get_ward_task(&winner.id).await.unwrap().unwrap();
    assert_eq!(stored.collector_id, "COL-WIN");

    let mut completed = stored.clone();
    completed
        .transition(TaskStatus::Completed, "COL-WIN", None, &now)
        .unwrap();
    assert!(db
        .replace_ward_task_if_status(&completed, TaskStatus::Scheduled)
        .await
        .unwrap());
    // The stored row is no longer scheduled, so a stale writer loses
    assert!(!db
        .replace_ward_task_if_status(&completed, TaskStatus::Scheduled)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_concurrent_task_completions_single_winner() {
    require_emulator!();

    let db = test_db().await;
    // Ward 11 keys stay apart from the insert test, which uses ward 10
    let offset = (unique_suffix().parse::<u128>().unwrap() % 36_500) as u64;
    let date = (chrono::NaiveDate::from_ymd_opt(2100, 1, 1).unwrap()
        + chrono::Days::new(offset))
    .format("%Y-%m-%d")
    .to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let task = WardTask::scheduled(11, &date, "8:00 AM - 10:00 AM", "COL-OWNER", &now);
    assert!(db.create_ward_task_if_absent(&task).await.unwrap());

    let handles: Vec<_> = (0..2)
        .map(|i| {
            let db = db.clone();
            let mut completed = task.clone();
            completed
                .transition(TaskStatus::Completed, &format!("COL-{i}"), None, &now)
                .unwrap();
            tokio::spawn(async move {
                db.replace_ward_task_if_status(&completed, TaskStatus::Scheduled)
                    .await
            })
        })
        .collect();

    let mut wins = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            wins += 1;
        }
    }
    assert_eq!(wins, 1, "Exactly one concurrent completion may commit");

    let stored = db.get_ward_task(&task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_concurrent_report_assignment_single_winner() {
    require_emulator!();

    let db = test_db().await;
    let id = format!("report-{}", unique_suffix());
    db.upsert_report(&test_report(&id, 12)).await.unwrap();
    let now = chrono::Utc::now().to_rfc3339();

    let handles: Vec<_> = (0..2)
        .map(|i| {
            let db = db.clone();
            let id = id.clone();
            let now = now.clone();
            let assignment = CollectorAssignment {
                collector_id: format!("COL-{i}"),
                collector_name: format!("Collector {i}"),
                vehicle_id: format!("V{i}"),
            };
            tokio::spawn(async move {
                db.assign_report_if_unassigned(&id, &assignment, &now).await
            })
        })
        .collect();

    let mut wins = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            wins += 1;
        }
    }
    assert_eq!(wins, 1, "Exactly one concurrent assignment may commit");
}

// ═══════════════════════════════════════════════════════════════════════════
// RESIDENT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_active_residents_in_ward_query() {
    require_emulator!();

    let db = test_db().await;
    let suffix = unique_suffix();
    let active_id = format!("res-a-{suffix}");
    let inactive_id = format!("res-i-{suffix}");
    seed_resident(&db, &active_id, Some("a@example.com"), Some(17), true).await;
    seed_resident(&db, &inactive_id, Some("i@example.com"), Some(17), false).await;

    let residents = db.list_active_residents_in_ward(17).await.unwrap();
    assert!(residents.iter().any(|r| r.user_id == active_id));
    assert!(!residents.iter().any(|r| r.user_id == inactive_id));
}
