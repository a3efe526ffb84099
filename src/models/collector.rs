// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Waste collector accounts.

use crate::models::ward::WardNumber;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum CollectorStatus {
    Active,
    Inactive,
}

/// Collector account stored in Firestore (document ID = `collector_id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collector {
    pub collector_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// PBKDF2 hash, see `services::password`
    pub password_hash: String,
    pub assigned_wards: Vec<WardNumber>,
    pub vehicle_id: String,
    pub status: CollectorStatus,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub efficiency: f64,
    /// Lifetime completed ward tasks. Only ever incremented.
    #[serde(default)]
    pub total_collections: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl Collector {
    pub fn is_active(&self) -> bool {
        self.status == CollectorStatus::Active
    }

    pub fn covers_ward(&self, ward: WardNumber) -> bool {
        self.assigned_wards.contains(&ward)
    }
}

/// Collector as exposed over the API (no credentials).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CollectorProfile {
    pub collector_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub assigned_wards: Vec<WardNumber>,
    pub vehicle_id: String,
    pub status: CollectorStatus,
    pub badge: Option<String>,
    pub rating: f64,
    pub efficiency: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_collections: u64,
}

impl From<&Collector> for CollectorProfile {
    fn from(c: &Collector) -> Self {
        Self {
            collector_id: c.collector_id.clone(),
            name: c.name.clone(),
            email: c.email.clone(),
            phone: c.phone.clone(),
            assigned_wards: c.assigned_wards.clone(),
            vehicle_id: c.vehicle_id.clone(),
            status: c.status,
            badge: c.badge.clone(),
            rating: c.rating,
            efficiency: c.efficiency,
            total_collections: c.total_collections,
        }
    }
}
