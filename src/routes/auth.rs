// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collector login and session routes.
//!
//! Citizens and admins authenticate with the external identity provider,
//! which issues tokens signed with the shared key. Collectors log in here
//! with their collector ID and password.

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, Role, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::models::CollectorProfile;
use crate::routes::json_body;
use crate::services::password::verify_password;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/collector/login", post(collector_login))
        .route("/api/auth/logout", post(logout))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CollectorLoginRequest {
    #[validate(length(min = 1, max = 64))]
    pub collector_id: String,
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorLoginResponse {
    pub token: String,
    pub collector: CollectorProfile,
}

fn session_cookie(config_frontend_url: &str, value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config_frontend_url.starts_with("https://"))
        .build()
}

async fn collector_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: std::result::Result<Json<CollectorLoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<CollectorLoginResponse>)> {
    let req = json_body(payload)?;
    req.validate()?;

    // Same error for unknown ID, wrong password and inactive account
    let invalid = || AppError::Unauthorized;

    let collector = state
        .db
        .get_collector(req.collector_id.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&req.password, &collector.password_hash) {
        tracing::warn!(collector_id = %collector.collector_id, "Collector login failed");
        return Err(invalid());
    }
    if !collector.is_active() {
        tracing::warn!(collector_id = %collector.collector_id, "Inactive collector login attempt");
        return Err(invalid());
    }

    let token = create_jwt(
        &collector.collector_id,
        Role::Collector,
        collector.email.clone(),
        Some(collector.name.clone()),
        &state.config.jwt_signing_key,
    )?;

    let mut cookie = session_cookie(&state.config.frontend_url, token.clone());
    cookie.set_max_age(time::Duration::seconds(SESSION_TTL_SECS as i64));

    tracing::info!(collector_id = %collector.collector_id, "Collector logged in");

    Ok((
        jar.add(cookie),
        Json(CollectorLoginResponse {
            token,
            collector: CollectorProfile::from(&collector),
        }),
    ))
}

async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let removal = session_cookie(&state.config.frontend_url, String::new());
    (jar.remove(removal), StatusCode::NO_CONTENT)
}
