// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ward pickup calendar.
//!
//! The registry is the single authoritative weekly schedule. It is built once
//! at startup, either from the compiled-in table or from a JSON file, and is
//! read-only afterwards.

use crate::models::ward::{is_valid_ward, MAX_WARD, MIN_WARD};
use crate::models::{WardNumber, WardSchedule};
use crate::time_utils::{parse_calendar_date, weekday_index};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const EARLY: &str = "6:00 AM - 8:00 AM";
const MORNING: &str = "8:00 AM - 10:00 AM";
const LATE_MORNING: &str = "10:00 AM - 12:00 PM";
const AFTERNOON: &str = "2:00 PM - 4:00 PM";

const SUN_TUE_THU: &[u8] = &[0, 2, 4];
const MON_WED_FRI: &[u8] = &[1, 3, 5];
const TUE_THU_SAT: &[u8] = &[2, 4, 6];
const SUN_WED_SAT: &[u8] = &[0, 3, 6];
const MON_THU: &[u8] = &[1, 4];
const TUE_FRI: &[u8] = &[2, 5];
const SUN_WED: &[u8] = &[0, 3];

#[rustfmt::skip]
const BUILTIN_SCHEDULE: [(WardNumber, &[u8], &str); 33] = [
    (1, SUN_TUE_THU, EARLY),
    (2, SUN_TUE_THU, MORNING),
    (3, SUN_TUE_THU, LATE_MORNING),
    (4, SUN_TUE_THU, EARLY),
    (5, SUN_TUE_THU, MORNING),
    (6, MON_WED_FRI, EARLY),
    (7, MON_WED_FRI, MORNING),
    (8, MON_WED_FRI, LATE_MORNING),
    (9, MON_WED_FRI, AFTERNOON),
    (10, MON_WED_FRI, MORNING),
    (11, MON_WED_FRI, MORNING),
    (12, MON_WED_FRI, LATE_MORNING),
    (13, MON_WED_FRI, EARLY),
    (14, MON_WED_FRI, AFTERNOON),
    (15, TUE_THU_SAT, EARLY),
    (16, TUE_THU_SAT, MORNING),
    (17, TUE_THU_SAT, LATE_MORNING),
    (18, TUE_THU_SAT, EARLY),
    (19, TUE_THU_SAT, AFTERNOON),
    (20, SUN_WED_SAT, EARLY),
    (21, SUN_WED_SAT, MORNING),
    (22, SUN_WED_SAT, LATE_MORNING),
    (23, SUN_WED_SAT, AFTERNOON),
    (24, SUN_WED_SAT, MORNING),
    (25, MON_THU, EARLY),
    (26, MON_THU, MORNING),
    (27, MON_THU, LATE_MORNING),
    (28, MON_THU, AFTERNOON),
    (29, TUE_FRI, EARLY),
    (30, TUE_FRI, MORNING),
    (31, TUE_FRI, LATE_MORNING),
    (32, TUE_FRI, AFTERNOON),
    (33, SUN_WED, LATE_MORNING),
];

/// Read-only lookup from ward number to weekly pickup schedule.
#[derive(Debug, Clone)]
pub struct WardRegistry {
    schedules: BTreeMap<WardNumber, WardSchedule>,
}

impl Default for WardRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WardRegistry {
    /// The compiled-in municipal schedule.
    pub fn builtin() -> Self {
        let schedules = BUILTIN_SCHEDULE
            .iter()
            .map(|&(ward, days, slot)| {
                (
                    ward,
                    WardSchedule {
                        ward_number: ward,
                        pickup_days: days.to_vec(),
                        time_slot: slot.to_string(),
                    },
                )
            })
            .collect();
        Self { schedules }
    }

    /// Load a replacement schedule from a JSON file (array of `WardSchedule`).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, WardRegistryError> {
        let json_data = fs::read_to_string(path.as_ref())
            .map_err(|e| WardRegistryError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load a replacement schedule from a JSON string.
    ///
    /// Every ward from 1 to 33 must appear exactly once with at least one
    /// valid weekday and a non-empty time slot.
    pub fn load_from_json(json_data: &str) -> Result<Self, WardRegistryError> {
        let entries: Vec<WardSchedule> = serde_json::from_str(json_data)
            .map_err(|e| WardRegistryError::ParseError(e.to_string()))?;

        let mut schedules = BTreeMap::new();
        for mut entry in entries {
            let ward = entry.ward_number;
            if !is_valid_ward(ward) {
                return Err(WardRegistryError::InvalidEntry(ward, "ward out of range"));
            }
            if entry.pickup_days.is_empty() || entry.pickup_days.iter().any(|&d| d > 6) {
                return Err(WardRegistryError::InvalidEntry(ward, "bad pickup days"));
            }
            if entry.time_slot.trim().is_empty() {
                return Err(WardRegistryError::InvalidEntry(ward, "empty time slot"));
            }
            entry.pickup_days.sort_unstable();
            entry.pickup_days.dedup();
            if schedules.insert(ward, entry).is_some() {
                return Err(WardRegistryError::InvalidEntry(ward, "duplicate ward"));
            }
        }

        if let Some(missing) = (MIN_WARD..=MAX_WARD).find(|w| !schedules.contains_key(w)) {
            return Err(WardRegistryError::MissingWard(missing));
        }

        tracing::info!(count = schedules.len(), "Loaded ward schedules");
        Ok(Self { schedules })
    }

    pub fn get_schedule(&self, ward: WardNumber) -> Option<&WardSchedule> {
        self.schedules.get(&ward)
    }

    /// All schedules ordered by ward number.
    pub fn schedules(&self) -> impl Iterator<Item = &WardSchedule> {
        self.schedules.values()
    }

    /// Whether `ward` has a pickup on the calendar date `date` (`YYYY-MM-DD`).
    ///
    /// Unknown wards and unparseable dates are simply not pickup days.
    pub fn is_pickup_day(&self, ward: WardNumber, date: &str) -> bool {
        parse_calendar_date(date)
            .map(|d| self.is_pickup_on(ward, d))
            .unwrap_or(false)
    }

    pub fn is_pickup_on(&self, ward: WardNumber, date: NaiveDate) -> bool {
        self.get_schedule(ward)
            .map(|s| s.picks_up_on(weekday_index(date)))
            .unwrap_or(false)
    }

    /// Wards among `wards` that have a pickup on `date`, in input order.
    pub fn wards_with_pickup_on(&self, wards: &[WardNumber], date: NaiveDate) -> Vec<WardNumber> {
        let mut seen = Vec::with_capacity(wards.len());
        for &ward in wards {
            if !seen.contains(&ward) && self.is_pickup_on(ward, date) {
                seen.push(ward);
            }
        }
        seen
    }
}

/// Errors from loading a ward schedule file.
#[derive(Debug, thiserror::Error)]
pub enum WardRegistryError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse ward schedule JSON: {0}")]
    ParseError(String),

    #[error("Invalid schedule for ward {0}: {1}")]
    InvalidEntry(WardNumber, &'static str),

    #[error("Ward {0} has no schedule")]
    MissingWard(WardNumber),
}
