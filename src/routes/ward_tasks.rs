// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ward pickup task routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{TaskStatus, WardTask};
use crate::routes::collectors::acting_collector;
use crate::routes::{json_body, parse_ward_param};
use crate::services::{TaskStatusView, TaskView};
use crate::time_utils::{local_today, parse_calendar_date};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Public status probe.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/ward-tasks/status/{ward}/{date}", get(get_task_status))
}

/// Collector task routes (auth applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ward-tasks", get(list_tasks_for_date))
        .route("/api/ward-tasks/today", get(get_today_tasks))
        .route("/api/ward-tasks/{task_id}/status", put(update_task_status))
}

async fn get_task_status(
    State(state): State<Arc<AppState>>,
    Path((ward, date)): Path<(String, String)>,
) -> Result<Json<TaskStatusView>> {
    let ward = parse_ward_param(&ward)?;
    let view = state.ward_task_manager().task_status(ward, &date).await?;
    Ok(Json(view))
}

/// Today's tasks for the acting collector. Creates the day's rows on first view.
async fn get_today_tasks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<TaskView>>> {
    let collector = acting_collector(&state, &user).await?;
    let tasks = state
        .ward_task_manager()
        .today_tasks(&collector, local_today())
        .await?;
    Ok(Json(tasks))
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: String,
}

async fn list_tasks_for_date(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<TaskView>>> {
    let date = parse_calendar_date(&query.date).ok_or_else(|| {
        AppError::BadRequest("date must be a calendar date in YYYY-MM-DD form".to_string())
    })?;
    let collector = acting_collector(&state, &user).await?;
    let tasks = state
        .ward_task_manager()
        .tasks_for_date(&collector, date)
        .await?;
    Ok(Json(tasks))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskStatusRequest {
    pub status: TaskStatus,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

async fn update_task_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(task_id): Path<String>,
    payload: std::result::Result<Json<UpdateTaskStatusRequest>, JsonRejection>,
) -> Result<Json<WardTask>> {
    let req = json_body(payload)?;
    req.validate()?;
    let collector = acting_collector(&state, &user).await?;

    let notes = req
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    // The fan-out handle is dropped: delivery runs detached from the request.
    let update = state
        .ward_task_manager()
        .update_status(&collector, &task_id, req.status, notes)
        .await?;

    Ok(Json(update.task))
}
