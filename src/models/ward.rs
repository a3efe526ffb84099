// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ward numbers and pickup schedules.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::ValidationError;

/// Municipal ward number (1..=33).
pub type WardNumber = u32;

pub const MIN_WARD: WardNumber = 1;
pub const MAX_WARD: WardNumber = 33;

/// Collectors must cover at least this many distinct wards.
pub const MIN_ASSIGNED_WARDS: usize = 5;

pub fn is_valid_ward(ward: WardNumber) -> bool {
    (MIN_WARD..=MAX_WARD).contains(&ward)
}

/// Normalize a user-entered ward ("5", "05", "Ward 5", "ward-5") to its number.
///
/// Returns `None` when no number is present or it is out of range.
pub fn parse_ward_label(raw: &str) -> Option<WardNumber> {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    let digits = lower
        .strip_prefix("ward")
        .unwrap_or(&lower)
        .trim_start_matches(|c: char| c.is_whitespace() || c == '-' || c == '#' || c == ':');

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok().filter(|w| is_valid_ward(*w))
}

/// Validator hook for a single ward field.
pub fn validate_ward(ward: WardNumber) -> Result<(), ValidationError> {
    if is_valid_ward(ward) {
        Ok(())
    } else {
        let mut err = ValidationError::new("ward_range");
        err.message = Some(format!("ward must be between {MIN_WARD} and {MAX_WARD}").into());
        Err(err)
    }
}

/// Validator hook for a collector's assigned ward set.
pub fn validate_assigned_wards(wards: &[WardNumber]) -> Result<(), ValidationError> {
    for &ward in wards {
        validate_ward(ward)?;
    }

    let mut distinct = wards.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() < MIN_ASSIGNED_WARDS {
        let mut err = ValidationError::new("assigned_wards");
        err.message =
            Some(format!("at least {MIN_ASSIGNED_WARDS} distinct wards must be assigned").into());
        return Err(err);
    }

    Ok(())
}

/// Fixed weekly pickup schedule of one ward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WardSchedule {
    pub ward_number: WardNumber,
    /// Weekday indices, 0 = Sunday .. 6 = Saturday
    pub pickup_days: Vec<u8>,
    /// Display string, e.g. "8:00 AM - 10:00 AM"
    pub time_slot: String,
}

impl WardSchedule {
    pub fn picks_up_on(&self, weekday: u8) -> bool {
        self.pickup_days.contains(&weekday)
    }
}
