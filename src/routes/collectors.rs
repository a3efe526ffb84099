// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collector lookup, self-service profile and admin management routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::{AuthUser, Role};
use crate::models::ward::validate_assigned_wards;
use crate::models::{Collector, CollectorProfile, CollectorStatus, WardNumber};
use crate::routes::{json_body, parse_ward_param};
use crate::services::password::hash_password;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Public collector lookup.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/collectors/ward/{ward}", get(get_collector_for_ward))
}

/// Collector self-service and admin routes (auth applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/collector/me", get(get_me).put(update_me))
        .route(
            "/api/admin/collectors",
            get(list_collectors).post(create_collector),
        )
        .route(
            "/api/admin/collectors/{collector_id}",
            put(admin_update_collector).delete(delete_collector),
        )
}

/// Load the collector account behind an authenticated collector session.
///
/// Inactive or deleted accounts are refused even if their token is still valid.
pub(crate) async fn acting_collector(state: &AppState, user: &AuthUser) -> Result<Collector> {
    user.require_role(Role::Collector)?;

    let collector = state
        .db
        .get_collector(&user.user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("collector account not found".to_string()))?;

    if !collector.is_active() {
        return Err(AppError::Forbidden("collector account is inactive".to_string()));
    }

    Ok(collector)
}

// ─── Public Lookup ───────────────────────────────────────────

async fn get_collector_for_ward(
    State(state): State<Arc<AppState>>,
    Path(ward): Path<String>,
) -> Result<Json<CollectorProfile>> {
    let ward = parse_ward_param(&ward)?;
    let collector = state
        .assignment_resolver()
        .find_active_collector_for_ward(ward)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No active collector for ward {}", ward)))?;

    Ok(Json(CollectorProfile::from(&collector)))
}

// ─── Self Service ────────────────────────────────────────────

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CollectorProfile>> {
    let collector = acting_collector(&state, &user).await?;
    Ok(Json(CollectorProfile::from(&collector)))
}

/// Fields a collector may change on their own account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOwnProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 5, max = 20))]
    pub phone: Option<String>,
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<UpdateOwnProfileRequest>, JsonRejection>,
) -> Result<Json<CollectorProfile>> {
    let req = json_body(payload)?;
    req.validate()?;

    let mut collector = acting_collector(&state, &user).await?;
    if let Some(name) = req.name {
        collector.name = name.trim().to_string();
    }
    if let Some(email) = req.email {
        collector.email = Some(email);
    }
    if let Some(phone) = req.phone {
        collector.phone = Some(phone);
    }
    collector.updated_at = format_utc_rfc3339(chrono::Utc::now());

    state.db.upsert_collector(&collector).await?;
    tracing::info!(collector_id = %collector.collector_id, "Collector updated own profile");

    Ok(Json(CollectorProfile::from(&collector)))
}

// ─── Admin Management ────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectorRequest {
    #[validate(length(min = 1, max = 64))]
    pub collector_id: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 5, max = 20))]
    pub phone: Option<String>,
    #[validate(length(min = 8, max = 256))]
    pub password: String,
    #[validate(custom(function = "validate_assigned_wards"))]
    pub assigned_wards: Vec<WardNumber>,
    #[validate(length(min = 1, max = 32))]
    pub vehicle_id: String,
    pub status: Option<CollectorStatus>,
    pub badge: Option<String>,
}

async fn create_collector(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<CreateCollectorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CollectorProfile>)> {
    user.require_role(Role::Admin)?;
    let req = json_body(payload)?;
    req.validate()?;

    if req.collector_id.contains('/') || req.collector_id.trim() != req.collector_id {
        return Err(AppError::BadRequest(
            "collectorId must not contain '/' or surrounding whitespace".to_string(),
        ));
    }

    let now = format_utc_rfc3339(chrono::Utc::now());
    let collector = Collector {
        collector_id: req.collector_id,
        name: req.name.trim().to_string(),
        email: req.email,
        phone: req.phone,
        password_hash: hash_password(&req.password)?,
        assigned_wards: normalized_wards(req.assigned_wards),
        vehicle_id: req.vehicle_id,
        status: req.status.unwrap_or(CollectorStatus::Active),
        badge: req.badge,
        rating: 0.0,
        efficiency: 0.0,
        total_collections: 0,
        created_at: now.clone(),
        updated_at: now,
    };

    if !state.db.insert_collector(&collector).await? {
        return Err(AppError::BadRequest(format!(
            "Collector {} already exists",
            collector.collector_id
        )));
    }

    tracing::info!(
        collector_id = %collector.collector_id,
        wards = ?collector.assigned_wards,
        admin = %user.user_id,
        "Collector created"
    );

    Ok((StatusCode::CREATED, Json(CollectorProfile::from(&collector))))
}

async fn list_collectors(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<CollectorProfile>>> {
    user.require_role(Role::Admin)?;
    let collectors = state.db.list_collectors().await?;
    Ok(Json(collectors.iter().map(CollectorProfile::from).collect()))
}

/// Admin edit. `totalCollections` is not editable; it only moves on task completion.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateCollectorRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 5, max = 20))]
    pub phone: Option<String>,
    #[validate(length(min = 8, max = 256))]
    pub password: Option<String>,
    #[validate(custom(function = "validate_assigned_wards"))]
    pub assigned_wards: Option<Vec<WardNumber>>,
    #[validate(length(min = 1, max = 32))]
    pub vehicle_id: Option<String>,
    pub status: Option<CollectorStatus>,
    pub badge: Option<String>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub efficiency: Option<f64>,
}

async fn admin_update_collector(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(collector_id): Path<String>,
    payload: std::result::Result<Json<AdminUpdateCollectorRequest>, JsonRejection>,
) -> Result<Json<CollectorProfile>> {
    user.require_role(Role::Admin)?;
    let req = json_body(payload)?;
    req.validate()?;

    let mut collector = state
        .db
        .get_collector(&collector_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Collector {} not found", collector_id)))?;

    if let Some(name) = req.name {
        collector.name = name.trim().to_string();
    }
    if let Some(email) = req.email {
        collector.email = Some(email);
    }
    if let Some(phone) = req.phone {
        collector.phone = Some(phone);
    }
    if let Some(password) = req.password {
        collector.password_hash = hash_password(&password)?;
    }
    if let Some(wards) = req.assigned_wards {
        collector.assigned_wards = normalized_wards(wards);
    }
    if let Some(vehicle_id) = req.vehicle_id {
        collector.vehicle_id = vehicle_id;
    }
    if let Some(status) = req.status {
        collector.status = status;
    }
    if let Some(badge) = req.badge {
        collector.badge = Some(badge);
    }
    if let Some(rating) = req.rating {
        collector.rating = rating;
    }
    if let Some(efficiency) = req.efficiency {
        collector.efficiency = efficiency;
    }
    collector.updated_at = format_utc_rfc3339(chrono::Utc::now());

    state.db.upsert_collector(&collector).await?;
    tracing::info!(collector_id = %collector.collector_id, admin = %user.user_id, "Collector updated");

    Ok(Json(CollectorProfile::from(&collector)))
}

async fn delete_collector(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(collector_id): Path<String>,
) -> Result<StatusCode> {
    user.require_role(Role::Admin)?;

    if state.db.get_collector(&collector_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Collector {} not found",
            collector_id
        )));
    }

    state.db.delete_collector(&collector_id).await?;
    tracing::info!(collector_id = %collector_id, admin = %user.user_id, "Collector deleted");

    Ok(StatusCode::NO_CONTENT)
}

fn normalized_wards(mut wards: Vec<WardNumber>) -> Vec<WardNumber> {
    wards.sort_unstable();
    wards.dedup();
    wards
}
