// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-ward, per-day pickup tasks and their lifecycle.
//!
//! A task is keyed by `(ward, date)` where `date` is a `YYYY-MM-DD` calendar
//! string, never a timestamp. The key doubles as the Firestore document ID,
//! which gives the store-level uniqueness guarantee.

use crate::models::ward::WardNumber;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum TaskStatus {
    Scheduled,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Sort key for "today's tasks": in-progress, then scheduled, then completed.
    pub fn display_priority(self) -> u8 {
        match self {
            TaskStatus::InProgress => 0,
            TaskStatus::Scheduled => 1,
            TaskStatus::Completed => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("can only start a scheduled task")]
    StartRequiresScheduled,

    #[error("can only complete a scheduled or in-progress task")]
    CompleteRequiresOpen,

    #[error("a task cannot be moved back to scheduled")]
    CannotReschedule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardTask {
    pub id: String,
    pub ward: WardNumber,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    /// Copied from the ward schedule when the task is created
    pub time_slot: String,
    pub status: TaskStatus,
    /// Collector who created the task
    pub collector_id: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    /// Collector who completed the task, credited with the collection
    #[serde(default)]
    pub completed_by: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl WardTask {
    pub fn document_id(ward: WardNumber, date: &str) -> String {
        format!("{}_{}", ward, date)
    }

    /// A fresh `scheduled` task.
    pub fn scheduled(
        ward: WardNumber,
        date: &str,
        time_slot: &str,
        collector_id: &str,
        now: &str,
    ) -> Self {
        Self {
            id: Self::document_id(ward, date),
            ward,
            date: date.to_string(),
            time_slot: time_slot.to_string(),
            status: TaskStatus::Scheduled,
            collector_id: collector_id.to_string(),
            started_at: None,
            completed_at: None,
            completed_by: None,
            notes: None,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    /// Apply a forward-only status change in place.
    ///
    /// `notes`, when given, replace the stored notes.
    pub fn transition(
        &mut self,
        next: TaskStatus,
        actor_id: &str,
        notes: Option<String>,
        now: &str,
    ) -> Result<(), TransitionError> {
        match next {
            TaskStatus::Scheduled => return Err(TransitionError::CannotReschedule),
            TaskStatus::InProgress => {
                if self.status != TaskStatus::Scheduled {
                    return Err(TransitionError::StartRequiresScheduled);
                }
                self.started_at = Some(now.to_string());
            }
            TaskStatus::Completed => {
                if self.status == TaskStatus::Completed {
                    return Err(TransitionError::CompleteRequiresOpen);
                }
                self.completed_at = Some(now.to_string());
                self.completed_by = Some(actor_id.to_string());
            }
        }

        self.status = next;
        if notes.is_some() {
            self.notes = notes;
        }
        self.updated_at = now.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: &str = "2024-01-10T08:30:00Z";

    fn task() -> WardTask {
        WardTask::scheduled(10, "2024-01-10", "8:00 AM - 10:00 AM", "COL-1", NOW)
    }

    #[test]
    fn test_document_id_is_ward_and_date() {
        assert_eq!(task().id, "10_2024-01-10");
    }

    #[test]
    fn test_scheduled_to_in_progress_to_completed() {
        let mut t = task();
        t.transition(TaskStatus::InProgress, "COL-1", None, NOW)
            .unwrap();
        assert_eq!(t.status, TaskStatus::InProgress);
        assert_eq!(t.started_at.as_deref(), Some(NOW));

        t.transition(TaskStatus::Completed, "COL-2", Some("done".into()), NOW)
            .unwrap();
        assert_eq!(t.status, TaskStatus::Completed);
        assert_eq!(t.completed_at.as_deref(), Some(NOW));
        assert_eq!(t.completed_by.as_deref(), Some("COL-2"));
        assert_eq!(t.notes.as_deref(), Some("done"));
    }

    #[test]
    fn test_scheduled_can_complete_directly() {
        let mut t = task();
        assert!(t
            .transition(TaskStatus::Completed, "COL-1", None, NOW)
            .is_ok());
        assert!(t.started_at.is_none());
    }

    #[test]
    fn test_backward_transitions_rejected() {
        let mut t = task();
        t.transition(TaskStatus::Completed, "COL-1", None, NOW)
            .unwrap();

        assert_eq!(
            t.transition(TaskStatus::InProgress, "COL-1", None, NOW),
            Err(TransitionError::StartRequiresScheduled)
        );
        assert_eq!(
            t.transition(TaskStatus::Completed, "COL-1", None, NOW),
            Err(TransitionError::CompleteRequiresOpen)
        );
        assert_eq!(
            t.transition(TaskStatus::Scheduled, "COL-1", None, NOW),
            Err(TransitionError::CannotReschedule)
        );
    }

    #[test]
    fn test_start_twice_rejected() {
        let mut t = task();
        t.transition(TaskStatus::InProgress, "COL-1", None, NOW)
            .unwrap();
        assert_eq!(
            t.transition(TaskStatus::InProgress, "COL-1", None, NOW),
            Err(TransitionError::StartRequiresScheduled)
        );
    }

    #[test]
    fn test_notes_kept_when_not_supplied() {
        let mut t = task();
        t.notes = Some("gate locked".to_string());
        t.transition(TaskStatus::InProgress, "COL-1", None, NOW)
            .unwrap();
        assert_eq!(t.notes.as_deref(), Some("gate locked"));
    }

    #[test]
    fn test_display_priority_order() {
        let mut statuses = vec![
            TaskStatus::Completed,
            TaskStatus::Scheduled,
            TaskStatus::InProgress,
        ];
        statuses.sort_by_key(|s| s.display_priority());
        assert_eq!(
            statuses,
            vec![
                TaskStatus::InProgress,
                TaskStatus::Scheduled,
                TaskStatus::Completed
            ]
        );
    }
}
