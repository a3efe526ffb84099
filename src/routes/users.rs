// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resident profile sync from the identity provider.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Resident;
use crate::routes::{json_body, NumberOrText};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/sync", post(sync_profile))
        .route("/api/users/me", get(get_profile))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SyncProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    /// `5`, `"5"` or `"Ward 5"`; stored as a number
    pub ward: Option<NumberOrText>,
    pub active: Option<bool>,
}

/// Create or update the caller's resident profile.
///
/// Fields missing from the body fall back to the token's claims, then to
/// the stored profile.
async fn sync_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<SyncProfileRequest>, JsonRejection>,
) -> Result<Json<Resident>> {
    let req = json_body(payload)?;
    req.validate()?;

    let ward = match &req.ward {
        Some(raw) => Some(raw.as_ward().ok_or_else(|| {
            AppError::BadRequest("ward must identify a ward between 1 and 33".to_string())
        })?),
        None => None,
    };

    let existing = state.db.get_resident(&user.user_id).await?;
    let now = format_utc_rfc3339(chrono::Utc::now());

    let resident = match existing {
        Some(mut r) => {
            r.name = req.name.or(user.name).or(r.name);
            r.email = req.email.or(user.email).or(r.email);
            r.ward = ward.or(r.ward);
            r.active = req.active.unwrap_or(r.active);
            r.updated_at = now;
            r
        }
        None => Resident {
            user_id: user.user_id.clone(),
            name: req.name.or(user.name),
            email: req.email.or(user.email),
            ward,
            active: req.active.unwrap_or(true),
            created_at: now.clone(),
            updated_at: now,
        },
    };

    state.db.upsert_resident(&resident).await?;
    tracing::debug!(user_id = %resident.user_id, ward = ?resident.ward, "Resident profile synced");

    Ok(Json(resident))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Resident>> {
    state
        .db
        .get_resident(&user.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Profile not synced yet".to_string()))
}
