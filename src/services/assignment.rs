// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collector assignment for reports.
//!
//! A report is assigned to the active collector whose ward set contains the
//! report's ward. Resolution happens when the report is submitted and again
//! during reconciliation for reports that were left unassigned.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Collector, CollectorAssignment, WardNumber};
use crate::time_utils::format_utc_rfc3339;
use serde::Serialize;
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReconcileSummary {
    /// Reports without an assignment when the pass started
    pub unassigned: u32,
    /// Reports this pass assigned
    pub assigned: u32,
    /// Wards whose collector lookup failed
    pub lookup_failures: u32,
}

/// Resolves collectors for wards and backfills report assignments.
#[derive(Clone)]
pub struct AssignmentResolver {
    db: FirestoreDb,
}

impl AssignmentResolver {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// The active collector covering `ward`.
    ///
    /// When several active collectors claim the same ward, the one with the
    /// smallest `collector_id` wins so the choice is stable across calls.
    pub async fn find_active_collector_for_ward(
        &self,
        ward: WardNumber,
    ) -> Result<Option<Collector>, AppError> {
        let candidates = self.db.find_active_collectors_for_ward(ward).await?;
        if candidates.len() > 1 {
            tracing::warn!(
                ward,
                count = candidates.len(),
                "Multiple active collectors claim ward"
            );
        }

        Ok(candidates
            .into_iter()
            .filter(|c| c.is_active() && c.covers_ward(ward))
            .min_by(|a, b| a.collector_id.cmp(&b.collector_id)))
    }

    /// Best-effort resolution used during report submission.
    ///
    /// Lookup failures are logged and treated as "no collector".
    pub async fn resolve_assignment(&self, ward: WardNumber) -> Option<CollectorAssignment> {
        match self.find_active_collector_for_ward(ward).await {
            Ok(Some(collector)) => Some(CollectorAssignment::from(&collector)),
            Ok(None) => {
                tracing::info!(ward, "No active collector for ward, report left unassigned");
                None
            }
            Err(e) => {
                tracing::warn!(ward, error = %e, "Collector lookup failed, report left unassigned");
                None
            }
        }
    }

    /// Assign every unassigned report whose ward now has an active collector.
    ///
    /// Idempotent: reports that already carry an assignment are never
    /// touched, so a second pass right after the first changes nothing.
    pub async fn reconcile_unassigned_reports(&self) -> Result<ReconcileSummary, AppError> {
        let reports = self.db.list_reports().await?;
        let now = format_utc_rfc3339(chrono::Utc::now());

        let mut summary = ReconcileSummary::default();
        let mut by_ward: HashMap<WardNumber, Option<CollectorAssignment>> = HashMap::new();

        for report in reports.iter().filter(|r| !r.is_assigned()) {
            summary.unassigned += 1;

            let assignment = match by_ward.get(&report.ward) {
                Some(cached) => cached.clone(),
                None => {
                    let resolved = match self.find_active_collector_for_ward(report.ward).await {
                        Ok(found) => found.as_ref().map(CollectorAssignment::from),
                        Err(e) => {
                            tracing::warn!(
                                ward = report.ward,
                                error = %e,
                                "Collector lookup failed during reconciliation"
                            );
                            summary.lookup_failures += 1;
                            None
                        }
                    };
                    by_ward.insert(report.ward, resolved.clone());
                    resolved
                }
            };

            let Some(assignment) = assignment else {
                continue;
            };

            if self
                .db
                .assign_report_if_unassigned(&report.id, &assignment, &now)
                .await?
            {
                tracing::info!(
                    report_id = %report.id,
                    ward = report.ward,
                    collector_id = %assignment.collector_id,
                    "Backfilled report assignment"
                );
                summary.assigned += 1;
            }
        }

        if summary.assigned > 0 || summary.lookup_failures > 0 {
            tracing::info!(
                unassigned = summary.unassigned,
                assigned = summary.assigned,
                lookup_failures = summary.lookup_failures,
                "Assignment reconciliation finished"
            );
        }

        Ok(summary)
    }
}
