// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public ward schedule lookups.

use crate::error::{AppError, Result};
use crate::models::WardSchedule;
use crate::routes::parse_ward_param;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/wards/schedules", get(list_schedules))
        .route("/api/wards/{ward}/schedule", get(get_schedule))
}

/// Every ward's weekly pickup schedule, ordered by ward.
async fn list_schedules(State(state): State<Arc<AppState>>) -> Json<Vec<WardSchedule>> {
    Json(state.wards.schedules().cloned().collect())
}

async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Path(ward): Path<String>,
) -> Result<Json<WardSchedule>> {
    let ward = parse_ward_param(&ward)?;
    state
        .wards
        .get_schedule(ward)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Ward {} has no schedule", ward)))
}
