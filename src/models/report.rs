// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Citizen-submitted waste reports.

use crate::models::ward::WardNumber;
use crate::models::Collector;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Kind of issue being reported. Each type has exactly one display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ReportType {
    OverflowingBin,
    IllegalDumping,
    MissedPickup,
    DeadAnimal,
    BurningWaste,
    Other,
}

impl ReportType {
    pub fn label(self) -> &'static str {
        match self {
            ReportType::OverflowingBin => "Overflowing Bin",
            ReportType::IllegalDumping => "Illegal Dumping",
            ReportType::MissedPickup => "Missed Pickup",
            ReportType::DeadAnimal => "Dead Animal",
            ReportType::BurningWaste => "Burning Waste",
            ReportType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ReportStatus {
    Received,
    InProgress,
    Resolved,
}

impl ReportStatus {
    fn rank(self) -> u8 {
        match self {
            ReportStatus::Received => 0,
            ReportStatus::InProgress => 1,
            ReportStatus::Resolved => 2,
        }
    }

    /// Reports only move forward: received -> in-progress -> resolved,
    /// and received may jump straight to resolved.
    pub fn can_transition_to(self, next: ReportStatus) -> bool {
        next.rank() > self.rank()
    }
}

/// Denormalized collector details copied onto a report.
///
/// Held as one optional value so the three fields are always set together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorAssignment {
    pub collector_id: String,
    pub collector_name: String,
    pub vehicle_id: String,
}

impl From<&Collector> for CollectorAssignment {
    fn from(c: &Collector) -> Self {
        Self {
            collector_id: c.collector_id.clone(),
            collector_name: c.name.clone(),
            vehicle_id: c.vehicle_id.clone(),
        }
    }
}

/// Report stored in Firestore (document ID = `id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub report_type: ReportType,
    pub report_label: String,
    pub description: String,
    pub location: String,
    pub ward: WardNumber,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub images: Vec<String>,
    pub status: ReportStatus,
    pub user_id: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    #[serde(default)]
    pub assignment: Option<CollectorAssignment>,
    pub created_at: String,
    pub updated_at: String,
}

impl Report {
    pub fn is_assigned(&self) -> bool {
        self.assignment.is_some()
    }
}
