// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store used for local development and tests.
//!
//! Each collection is a `DashMap` keyed by document ID. Conditional writes
//! hold the shard lock of the entry they inspect, so check-and-set operations
//! are atomic per document, matching the single-document guarantees the
//! Firestore backend relies on.

use crate::models::{
    Collector, CollectorAssignment, Report, ReportStatus, Resident, TaskStatus, WardNumber,
    WardTask,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryStore {
    collectors: DashMap<String, Collector>,
    reports: DashMap<String, Report>,
    ward_tasks: DashMap<String, WardTask>,
    residents: DashMap<String, Resident>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Collectors ──────────────────────────────────────────────

    pub fn get_collector(&self, collector_id: &str) -> Option<Collector> {
        self.collectors.get(collector_id).map(|c| c.clone())
    }

    pub fn insert_collector(&self, collector: &Collector) -> bool {
        match self.collectors.entry(collector.collector_id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(collector.clone());
                true
            }
        }
    }

    pub fn upsert_collector(&self, collector: &Collector) {
        self.collectors
            .insert(collector.collector_id.clone(), collector.clone());
    }

    pub fn delete_collector(&self, collector_id: &str) {
        self.collectors.remove(collector_id);
    }

    pub fn list_collectors(&self) -> Vec<Collector> {
        self.collectors.iter().map(|c| c.value().clone()).collect()
    }

    pub fn find_active_collectors_for_ward(&self, ward: WardNumber) -> Vec<Collector> {
        self.collectors
            .iter()
            .filter(|c| c.is_active() && c.covers_ward(ward))
            .map(|c| c.value().clone())
            .collect()
    }

    pub fn increment_total_collections(&self, collector_id: &str) -> bool {
        match self.collectors.get_mut(collector_id) {
            Some(mut c) => {
                c.total_collections += 1;
                true
            }
            None => false,
        }
    }

    // ─── Reports ─────────────────────────────────────────────────

    pub fn upsert_report(&self, report: &Report) {
        self.reports.insert(report.id.clone(), report.clone());
    }

    pub fn get_report(&self, report_id: &str) -> Option<Report> {
        self.reports.get(report_id).map(|r| r.clone())
    }

    pub fn list_reports(&self) -> Vec<Report> {
        self.reports.iter().map(|r| r.value().clone()).collect()
    }

    pub fn assign_report_if_unassigned(
        &self,
        report_id: &str,
        assignment: &CollectorAssignment,
        now: &str,
    ) -> bool {
        match self.reports.get_mut(report_id) {
            Some(mut r) if r.assignment.is_none() => {
                r.assignment = Some(assignment.clone());
                r.updated_at = now.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn update_report_status_if(
        &self,
        report_id: &str,
        expected: ReportStatus,
        next: ReportStatus,
        now: &str,
    ) -> bool {
        match self.reports.get_mut(report_id) {
            Some(mut r) if r.status == expected => {
                r.status = next;
                r.updated_at = now.to_string();
                true
            }
            _ => false,
        }
    }

    // ─── Ward Tasks ──────────────────────────────────────────────

    pub fn get_ward_task(&self, task_id: &str) -> Option<WardTask> {
        self.ward_tasks.get(task_id).map(|t| t.clone())
    }

    pub fn create_ward_task_if_absent(&self, task: &WardTask) -> bool {
        match self.ward_tasks.entry(task.id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(task.clone());
                true
            }
        }
    }

    pub fn list_ward_tasks_for_date(&self, date: &str) -> Vec<WardTask> {
        self.ward_tasks
            .iter()
            .filter(|t| t.date == date)
            .map(|t| t.value().clone())
            .collect()
    }

    pub fn replace_ward_task_if_status(&self, task: &WardTask, expected: TaskStatus) -> bool {
        match self.ward_tasks.get_mut(&task.id) {
            Some(mut current) if current.status == expected => {
                *current = task.clone();
                true
            }
            _ => false,
        }
    }

    // ─── Residents ───────────────────────────────────────────────

    pub fn upsert_resident(&self, resident: &Resident) {
        self.residents
            .insert(resident.user_id.clone(), resident.clone());
    }

    pub fn get_resident(&self, user_id: &str) -> Option<Resident> {
        self.residents.get(user_id).map(|r| r.clone())
    }

    pub fn list_active_residents_in_ward(&self, ward: WardNumber) -> Vec<Resident> {
        self.residents
            .iter()
            .filter(|r| r.active && r.ward == Some(ward))
            .map(|r| r.value().clone())
            .collect()
    }
}
