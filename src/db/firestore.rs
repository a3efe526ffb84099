// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Collectors (accounts and ward assignments)
//! - Reports (citizen submissions)
//! - Ward tasks (one document per ward per calendar day)
//! - Residents (profiles synced from the identity provider)
//!
//! The same operations are served from a [`MemoryStore`] when the service
//! runs without Firestore.

use crate::db::collections;
use crate::db::MemoryStore;
use crate::error::AppError;
use crate::models::{
    Collector, CollectorAssignment, Report, ReportStatus, Resident, TaskStatus, WardNumber,
    WardTask,
};
use chrono::{DateTime, Utc};
use firestore::errors::FirestoreError;
use firestore::FirestoreWritePrecondition;
use futures_util::{stream, StreamExt};
use std::sync::Arc;

const MAX_CONCURRENT_DB_OPS: usize = 50;

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
}

/// Document database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

fn db_err(e: FirestoreError) -> AppError {
    AppError::Database(e.to_string())
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a client backed by an in-process store.
    ///
    /// Used for tests and `STORAGE_BACKEND=memory`. Data lives as long as the
    /// returned value (and its clones).
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
        }
    }

    // ─── Collector Operations ────────────────────────────────────

    /// Get a collector by ID.
    pub async fn get_collector(&self, collector_id: &str) -> Result<Option<Collector>, AppError> {
        match &self.backend {
            Backend::Memory(mem) => Ok(mem.get_collector(collector_id)),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::COLLECTORS)
                .obj()
                .one(collector_id)
                .await
                .map_err(db_err),
        }
    }

    /// Create a collector. Returns `false` if the ID is already taken.
    pub async fn insert_collector(&self, collector: &Collector) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Memory(mem) => Ok(mem.insert_collector(collector)),
            Backend::Firestore(client) => {
                let result: Result<(), FirestoreError> = client
                    .fluent()
                    .insert()
                    .into(collections::COLLECTORS)
                    .document_id(&collector.collector_id)
                    .object(collector)
                    .execute()
                    .await;
                match result {
                    Ok(()) => Ok(true),
                    Err(FirestoreError::DataConflictError(_)) => Ok(false),
                    Err(e) => Err(db_err(e)),
                }
            }
        }
    }

    /// Create or replace a collector.
    pub async fn upsert_collector(&self, collector: &Collector) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => {
                mem.upsert_collector(collector);
                Ok(())
            }
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::COLLECTORS)
                    .document_id(&collector.collector_id)
                    .object(collector)
                    .execute()
                    .await
                    .map_err(db_err)?;
                Ok(())
            }
        }
    }

    pub async fn delete_collector(&self, collector_id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => {
                mem.delete_collector(collector_id);
                Ok(())
            }
            Backend::Firestore(client) => {
                client
                    .fluent()
                    .delete()
                    .from(collections::COLLECTORS)
                    .document_id(collector_id)
                    .execute()
                    .await
                    .map_err(db_err)?;
                Ok(())
            }
        }
    }

    /// All collectors, ordered by ID.
    pub async fn list_collectors(&self) -> Result<Vec<Collector>, AppError> {
        let mut collectors: Vec<Collector> = match &self.backend {
            Backend::Memory(mem) => mem.list_collectors(),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collections::COLLECTORS)
                .obj()
                .query()
                .await
                .map_err(db_err)?,
        };
        collectors.sort_by(|a, b| a.collector_id.cmp(&b.collector_id));
        Ok(collectors)
    }

    /// Active collectors whose `assignedWards` contains `ward`, in no particular order.
    pub async fn find_active_collectors_for_ward(
        &self,
        ward: WardNumber,
    ) -> Result<Vec<Collector>, AppError> {
        match &self.backend {
            Backend::Memory(mem) => Ok(mem.find_active_collectors_for_ward(ward)),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collections::COLLECTORS)
                .filter(move |q| {
                    q.for_all([
                        q.field("status").eq("active"),
                        q.field("assignedWards").array_contains(ward),
                    ])
                })
                .obj()
                .query()
                .await
                .map_err(db_err),
        }
    }

    /// Atomically add one to a collector's `totalCollections`.
    pub async fn increment_total_collections(&self, collector_id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => {
                if mem.increment_total_collections(collector_id) {
                    Ok(())
                } else {
                    Err(AppError::NotFound(format!(
                        "Collector {} not found",
                        collector_id
                    )))
                }
            }
            Backend::Firestore(client) => {
                // Server-side transform, so concurrent completions never lose an increment.
                let mut transaction = client.begin_transaction().await.map_err(|e| {
                    AppError::Database(format!("Failed to begin transaction: {}", e))
                })?;

                client
                    .fluent()
                    .update()
                    .in_col(collections::COLLECTORS)
                    .document_id(collector_id)
                    .transforms(|t| t.fields([t.field("totalCollections").increment(1)]))
                    .only_transform()
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add increment to transaction: {}",
                            e
                        ))
                    })?;

                transaction
                    .commit()
                    .await
                    .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
                Ok(())
            }
        }
    }

    // ─── Report Operations ───────────────────────────────────────

    /// Store a report.
    pub async fn upsert_report(&self, report: &Report) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => {
                mem.upsert_report(report);
                Ok(())
            }
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::REPORTS)
                    .document_id(&report.id)
                    .object(report)
                    .execute()
                    .await
                    .map_err(db_err)?;
                Ok(())
            }
        }
    }

    pub async fn get_report(&self, report_id: &str) -> Result<Option<Report>, AppError> {
        match &self.backend {
            Backend::Memory(mem) => Ok(mem.get_report(report_id)),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::REPORTS)
                .obj()
                .one(report_id)
                .await
                .map_err(db_err),
        }
    }

    /// All reports, newest first.
    pub async fn list_reports(&self) -> Result<Vec<Report>, AppError> {
        let mut reports: Vec<Report> = match &self.backend {
            Backend::Memory(mem) => mem.list_reports(),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collections::REPORTS)
                .obj()
                .query()
                .await
                .map_err(db_err)?,
        };
        sort_newest_first(&mut reports);
        Ok(reports)
    }

    /// Reports submitted by one user, newest first.
    pub async fn list_reports_for_user(&self, user_id: &str) -> Result<Vec<Report>, AppError> {
        let mut reports: Vec<Report> = match &self.backend {
            Backend::Memory(mem) => mem
                .list_reports()
                .into_iter()
                .filter(|r| r.user_id == user_id)
                .collect(),
            Backend::Firestore(client) => {
                let user_id = user_id.to_string();
                client
                    .fluent()
                    .select()
                    .from(collections::REPORTS)
                    .filter(move |q| q.field("userId").eq(user_id.clone()))
                    .obj()
                    .query()
                    .await
                    .map_err(db_err)?
            }
        };
        sort_newest_first(&mut reports);
        Ok(reports)
    }

    /// Reports located in any of `wards`, newest first.
    ///
    /// Firestore runs one equality query per ward, concurrently.
    pub async fn list_reports_for_wards(
        &self,
        wards: &[WardNumber],
    ) -> Result<Vec<Report>, AppError> {
        let mut reports: Vec<Report> = match &self.backend {
            Backend::Memory(mem) => mem
                .list_reports()
                .into_iter()
                .filter(|r| wards.contains(&r.ward))
                .collect(),
            Backend::Firestore(client) => stream::iter(wards.to_vec())
                .map(|ward| async move {
                    client
                        .fluent()
                        .select()
                        .from(collections::REPORTS)
                        .filter(move |q| q.field("ward").eq(ward))
                        .obj::<Report>()
                        .query()
                        .await
                        .map_err(db_err)
                })
                .buffer_unordered(MAX_CONCURRENT_DB_OPS)
                .collect::<Vec<Result<Vec<Report>, AppError>>>()
                .await
                .into_iter()
                .collect::<Result<Vec<Vec<Report>>, AppError>>()?
                .into_iter()
                .flatten()
                .collect(),
        };
        sort_newest_first(&mut reports);
        Ok(reports)
    }

    /// Set a report's collector assignment unless it already has one.
    ///
    /// Returns `true` if the report was changed.
    pub async fn assign_report_if_unassigned(
        &self,
        report_id: &str,
        assignment: &CollectorAssignment,
        now: &str,
    ) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Memory(mem) => Ok(mem.assign_report_if_unassigned(report_id, assignment, now)),
            Backend::Firestore(client) => {
                let Some((mut report, version)) = self
                    .get_versioned::<Report>(client, collections::REPORTS, report_id)
                    .await?
                else {
                    return Ok(false);
                };
                if report.assignment.is_some() {
                    return Ok(false);
                }
                report.assignment = Some(assignment.clone());
                report.updated_at = now.to_string();

                self.update_if_unchanged(client, collections::REPORTS, report_id, &report, version)
                    .await
            }
        }
    }

    /// Move a report from `expected` to `next`. Returns `false` if the stored
    /// status no longer matches `expected`.
    pub async fn update_report_status_if(
        &self,
        report_id: &str,
        expected: ReportStatus,
        next: ReportStatus,
        now: &str,
    ) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Memory(mem) => Ok(mem.update_report_status_if(report_id, expected, next, now)),
            Backend::Firestore(client) => {
                let Some((mut report, version)) = self
                    .get_versioned::<Report>(client, collections::REPORTS, report_id)
                    .await?
                else {
                    return Ok(false);
                };
                if report.status != expected {
                    return Ok(false);
                }
                report.status = next;
                report.updated_at = now.to_string();

                self.update_if_unchanged(client, collections::REPORTS, report_id, &report, version)
                    .await
            }
        }
    }

    // ─── Ward Task Operations ────────────────────────────────────

    pub async fn get_ward_task(&self, task_id: &str) -> Result<Option<WardTask>, AppError> {
        match &self.backend {
            Backend::Memory(mem) => Ok(mem.get_ward_task(task_id)),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::WARD_TASKS)
                .obj()
                .one(task_id)
                .await
                .map_err(db_err),
        }
    }

    /// Insert a task unless a document with the same `(ward, date)` ID exists.
    ///
    /// Returns `true` if this call created the document. A concurrent creator
    /// losing the race gets `false`, never an error.
    pub async fn create_ward_task_if_absent(&self, task: &WardTask) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Memory(mem) => Ok(mem.create_ward_task_if_absent(task)),
            Backend::Firestore(client) => {
                let result: Result<(), FirestoreError> = client
                    .fluent()
                    .insert()
                    .into(collections::WARD_TASKS)
                    .document_id(&task.id)
                    .object(task)
                    .execute()
                    .await;
                match result {
                    Ok(()) => Ok(true),
                    Err(FirestoreError::DataConflictError(_)) => Ok(false),
                    Err(e) => Err(db_err(e)),
                }
            }
        }
    }

    /// Persisted tasks for a calendar date.
    pub async fn list_ward_tasks_for_date(&self, date: &str) -> Result<Vec<WardTask>, AppError> {
        let mut tasks: Vec<WardTask> = match &self.backend {
            Backend::Memory(mem) => mem.list_ward_tasks_for_date(date),
            Backend::Firestore(client) => {
                let date = date.to_string();
                client
                    .fluent()
                    .select()
                    .from(collections::WARD_TASKS)
                    .filter(move |q| q.field("date").eq(date.clone()))
                    .obj()
                    .query()
                    .await
                    .map_err(db_err)?
            }
        };
        tasks.sort_by_key(|t| t.ward);
        Ok(tasks)
    }

    /// Overwrite a task if its stored status still equals `expected`.
    ///
    /// Of several concurrent callers expecting the same status, at most one
    /// gets `true`.
    pub async fn replace_ward_task_if_status(
        &self,
        task: &WardTask,
        expected: TaskStatus,
    ) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Memory(mem) => Ok(mem.replace_ward_task_if_status(task, expected)),
            Backend::Firestore(client) => {
                let Some((current, version)) = self
                    .get_versioned::<WardTask>(client, collections::WARD_TASKS, &task.id)
                    .await?
                else {
                    return Ok(false);
                };
                if current.status != expected {
                    return Ok(false);
                }

                self.update_if_unchanged(client, collections::WARD_TASKS, &task.id, task, version)
                    .await
            }
        }
    }

    // ─── Resident Operations ─────────────────────────────────────

    pub async fn upsert_resident(&self, resident: &Resident) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => {
                mem.upsert_resident(resident);
                Ok(())
            }
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::RESIDENTS)
                    .document_id(&resident.user_id)
                    .object(resident)
                    .execute()
                    .await
                    .map_err(db_err)?;
                Ok(())
            }
        }
    }

    pub async fn get_resident(&self, user_id: &str) -> Result<Option<Resident>, AppError> {
        match &self.backend {
            Backend::Memory(mem) => Ok(mem.get_resident(user_id)),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::RESIDENTS)
                .obj()
                .one(user_id)
                .await
                .map_err(db_err),
        }
    }

    /// Active residents registered in `ward`.
    pub async fn list_active_residents_in_ward(
        &self,
        ward: WardNumber,
    ) -> Result<Vec<Resident>, AppError> {
        match &self.backend {
            Backend::Memory(mem) => Ok(mem.list_active_residents_in_ward(ward)),
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .from(collections::RESIDENTS)
                .filter(move |q| {
                    q.for_all([q.field("active").eq(true), q.field("ward").eq(ward)])
                })
                .obj()
                .query()
                .await
                .map_err(db_err),
        }
    }

    // ─── Helper Methods ──────────────────────────────────────────

    /// Read a document together with its last update time.
    async fn get_versioned<T>(
        &self,
        client: &firestore::FirestoreDb,
        collection: &str,
        doc_id: &str,
    ) -> Result<Option<(T, DateTime<Utc>)>, AppError>
    where
        for<'de> T: serde::Deserialize<'de>,
    {
        let Some(doc) = client
            .fluent()
            .select()
            .by_id_in(collection)
            .one(doc_id)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };

        let update_time = doc.update_time.clone().ok_or_else(|| {
            AppError::Database(format!("{}/{} has no update time", collection, doc_id))
        })?;
        let version = firestore::timestamp_utils::from_timestamp(update_time).map_err(db_err)?;
        let object = firestore::FirestoreDb::deserialize_doc_to::<T>(&doc).map_err(db_err)?;
        Ok(Some((object, version)))
    }

    /// Overwrite a document only if it still carries the update time seen at
    /// read. Returns `false` when another writer got there first.
    async fn update_if_unchanged<T>(
        &self,
        client: &firestore::FirestoreDb,
        collection: &str,
        doc_id: &str,
        object: &T,
        version: DateTime<Utc>,
    ) -> Result<bool, AppError>
    where
        T: serde::Serialize + for<'de> serde::Deserialize<'de> + Sync + Send,
    {
        let result: Result<(), FirestoreError> = client
            .fluent()
            .update()
            .in_col(collection)
            .precondition(FirestoreWritePrecondition::UpdateTime(version))
            .document_id(doc_id)
            .object(object)
            .execute()
            .await;
        match result {
            Ok(()) => Ok(true),
            Err(e) if is_precondition_failure(&e) => {
                tracing::debug!(collection, doc_id, "Document changed since read, write skipped");
                Ok(false)
            }
            Err(e) => Err(db_err(e)),
        }
    }
}

fn is_precondition_failure(e: &FirestoreError) -> bool {
    match e {
        FirestoreError::DatabaseError(err) => err.public.code == "FailedPrecondition",
        // A deleted document fails the update-time check as not found
        FirestoreError::DataNotFoundError(_) => true,
        _ => false,
    }
}

fn sort_newest_first(reports: &mut [Report]) {
    reports.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
