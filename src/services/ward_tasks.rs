// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ward task manager: daily pickup tasks and their state machine.
//!
//! Tasks are created lazily, the first time a collector looks at "today's
//! tasks" for a ward with a pickup that day. Status moves forward only:
//! `scheduled -> in-progress -> completed` (or straight to completed).
//! Completing a task credits the task's owning collector and notifies the
//! ward's residents in the background.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{Collector, TaskStatus, WardNumber, WardSchedule, WardTask};
use crate::services::notifications::{notify_ward_residents, EmailSender, NotificationSummary};
use crate::services::wards::WardRegistry;
use crate::time_utils::{format_calendar_date, format_utc_rfc3339, parse_calendar_date};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A task annotated with its ward's schedule.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TaskView {
    pub id: String,
    pub ward: WardNumber,
    pub date: String,
    pub time_slot: String,
    pub pickup_days: Vec<u8>,
    pub status: TaskStatus,
    pub collector_id: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub completed_by: Option<String>,
    pub notes: Option<String>,
}

impl TaskView {
    fn new(task: WardTask, schedule: Option<&WardSchedule>) -> Self {
        Self {
            id: task.id,
            ward: task.ward,
            date: task.date,
            time_slot: task.time_slot,
            pickup_days: schedule.map(|s| s.pickup_days.clone()).unwrap_or_default(),
            status: task.status,
            collector_id: task.collector_id,
            started_at: task.started_at,
            completed_at: task.completed_at,
            completed_by: task.completed_by,
            notes: task.notes,
        }
    }
}

/// Public status of one ward on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum WardDayStatus {
    Scheduled,
    InProgress,
    Completed,
    NoPickup,
}

impl From<TaskStatus> for WardDayStatus {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Scheduled => WardDayStatus::Scheduled,
            TaskStatus::InProgress => WardDayStatus::InProgress,
            TaskStatus::Completed => WardDayStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TaskStatusView {
    pub ward: WardNumber,
    pub date: String,
    pub status: WardDayStatus,
    /// False when the status was derived from the schedule alone
    pub persisted: bool,
    pub task_id: Option<String>,
    pub time_slot: Option<String>,
    pub completed_at: Option<String>,
    pub notes: Option<String>,
}

/// Result of a status change.
pub struct StatusUpdate {
    pub task: WardTask,
    /// Resident fan-out started by a completion. Dropping the handle detaches it.
    pub notification: Option<JoinHandle<NotificationSummary>>,
}

pub struct WardTaskManager {
    db: FirestoreDb,
    wards: Arc<WardRegistry>,
    mailer: Arc<dyn EmailSender>,
}

impl WardTaskManager {
    pub fn new(db: FirestoreDb, wards: Arc<WardRegistry>, mailer: Arc<dyn EmailSender>) -> Self {
        Self { db, wards, mailer }
    }

    /// Find or create the task for `(ward, date)`.
    ///
    /// Creation is an insert-if-absent on the `(ward, date)` document ID; when
    /// a concurrent caller wins the insert, its row is read back and returned.
    pub async fn ensure_task(
        &self,
        ward: WardNumber,
        date: NaiveDate,
        collector_id: &str,
    ) -> Result<WardTask> {
        let schedule = self
            .wards
            .get_schedule(ward)
            .ok_or_else(|| AppError::NotFound(format!("Ward {} has no schedule", ward)))?;
        let date = format_calendar_date(date);
        let task_id = WardTask::document_id(ward, &date);

        if let Some(existing) = self.db.get_ward_task(&task_id).await? {
            return Ok(existing);
        }

        let now = format_utc_rfc3339(chrono::Utc::now());
        let task = WardTask::scheduled(ward, &date, &schedule.time_slot, collector_id, &now);

        if self.db.create_ward_task_if_absent(&task).await? {
            tracing::info!(ward, date = %date, collector_id, "Created ward task");
            return Ok(task);
        }

        tracing::debug!(ward, date = %date, "Ward task created concurrently, reading it back");
        self.db
            .get_ward_task(&task_id)
            .await?
            .ok_or_else(|| AppError::Database(format!("Ward task {} vanished after insert", task_id)))
    }

    /// Today's tasks for `collector`, created as needed.
    ///
    /// Sorted in-progress first, then scheduled, then completed; ward order is
    /// kept within each group.
    pub async fn today_tasks(&self, collector: &Collector, today: NaiveDate) -> Result<Vec<TaskView>> {
        let wards = self
            .wards
            .wards_with_pickup_on(&collector.assigned_wards, today);

        let mut views = Vec::with_capacity(wards.len());
        for ward in wards {
            let task = self
                .ensure_task(ward, today, &collector.collector_id)
                .await?;
            views.push(TaskView::new(task, self.wards.get_schedule(ward)));
        }

        views.sort_by_key(|v| v.status.display_priority());
        Ok(views)
    }

    /// Persisted tasks for the collector's wards on `date`. Never creates rows.
    pub async fn tasks_for_date(&self, collector: &Collector, date: NaiveDate) -> Result<Vec<TaskView>> {
        let date = format_calendar_date(date);
        let mut views: Vec<TaskView> = self
            .db
            .list_ward_tasks_for_date(&date)
            .await?
            .into_iter()
            .filter(|t| collector.covers_ward(t.ward))
            .map(|t| {
                let schedule = self.wards.get_schedule(t.ward);
                TaskView::new(t, schedule)
            })
            .collect();

        views.sort_by_key(|v| v.status.display_priority());
        Ok(views)
    }

    /// Drive the task state machine on behalf of `collector`.
    pub async fn update_status(
        &self,
        collector: &Collector,
        task_id: &str,
        next: TaskStatus,
        notes: Option<String>,
    ) -> Result<StatusUpdate> {
        let mut task = self
            .db
            .get_ward_task(task_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ward task {} not found", task_id)))?;

        if !collector.covers_ward(task.ward) {
            tracing::warn!(
                collector_id = %collector.collector_id,
                ward = task.ward,
                task_id,
                "Collector not assigned to task ward"
            );
            return Err(AppError::Forbidden(format!(
                "Collector {} is not assigned to ward {}",
                collector.collector_id, task.ward
            )));
        }

        let previous = task.status;
        let now = format_utc_rfc3339(chrono::Utc::now());
        task.transition(next, &collector.collector_id, notes, &now)
            .map_err(|e| AppError::InvalidTransition(e.to_string()))?;

        if !self.db.replace_ward_task_if_status(&task, previous).await? {
            return Err(AppError::InvalidTransition(format!(
                "task {} changed concurrently, reload and retry",
                task_id
            )));
        }

        tracing::info!(
            task_id,
            ward = task.ward,
            date = %task.date,
            from = ?previous,
            to = ?task.status,
            collector_id = %collector.collector_id,
            "Ward task status updated"
        );

        let mut notification = None;
        if task.status == TaskStatus::Completed {
            if let Err(e) = self.db.increment_total_collections(&task.collector_id).await {
                // The completion is already persisted; the counter is best-effort.
                tracing::error!(
                    collector_id = %task.collector_id,
                    error = %e,
                    "Failed to increment collector total collections"
                );
            }

            let db = self.db.clone();
            let mailer = self.mailer.clone();
            let (ward, date, slot) = (task.ward, task.date.clone(), task.time_slot.clone());
            notification = Some(tokio::spawn(async move {
                notify_ward_residents(&db, mailer, ward, &date, &slot).await
            }));
        }

        Ok(StatusUpdate { task, notification })
    }

    /// Side-effect-free status probe for `(ward, date)`.
    ///
    /// Without a persisted task the status is derived from the schedule:
    /// `scheduled` on a pickup day, otherwise `no-pickup`.
    pub async fn task_status(&self, ward: WardNumber, date: &str) -> Result<TaskStatusView> {
        let parsed = parse_calendar_date(date).ok_or_else(|| {
            AppError::BadRequest("date must be a calendar date in YYYY-MM-DD form".to_string())
        })?;
        let date = format_calendar_date(parsed);
        let schedule = self
            .wards
            .get_schedule(ward)
            .ok_or_else(|| AppError::NotFound(format!("Ward {} has no schedule", ward)))?;

        let task_id = WardTask::document_id(ward, &date);
        if let Some(task) = self.db.get_ward_task(&task_id).await? {
            return Ok(TaskStatusView {
                ward,
                date,
                status: task.status.into(),
                persisted: true,
                task_id: Some(task.id),
                time_slot: Some(task.time_slot),
                completed_at: task.completed_at,
                notes: task.notes,
            });
        }

        let pickup = self.wards.is_pickup_on(ward, parsed);
        Ok(TaskStatusView {
            ward,
            date,
            status: if pickup {
                WardDayStatus::Scheduled
            } else {
                WardDayStatus::NoPickup
            },
            persisted: false,
            task_id: None,
            time_slot: pickup.then(|| schedule.time_slot.clone()),
            completed_at: None,
            notes: None,
        })
    }
}
