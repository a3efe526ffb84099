// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod auth;
pub mod collectors;
pub mod reports;
pub mod users;
pub mod ward_tasks;
pub mod wards;

use crate::error::AppError;
use crate::middleware::auth::require_auth;
use crate::models::ward::is_valid_ward;
use crate::models::WardNumber;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes())
        .merge(wards::routes())
        .merge(collectors::public_routes())
        .merge(ward_tasks::public_routes());

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .merge(reports::routes())
        .merge(ward_tasks::routes())
        .merge(collectors::routes())
        .merge(users::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

// ─── Shared extraction helpers ───────────────────────────────

/// Unwrap a JSON body, reporting malformed input as a 400.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Parse a ward number from a path segment.
pub(crate) fn parse_ward_param(raw: &str) -> Result<WardNumber, AppError> {
    raw.trim()
        .parse::<WardNumber>()
        .ok()
        .filter(|w| is_valid_ward(*w))
        .ok_or_else(|| AppError::BadRequest("ward must be a number between 1 and 33".to_string()))
}

/// A JSON value that may arrive as a number or a numeric string (HTML forms
/// submit everything as text).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            NumberOrText::Number(n) => Some(*n),
            NumberOrText::Text(s) => s.trim().parse::<f64>().ok(),
        };
        value.filter(|n| n.is_finite())
    }

    /// Interpret as a ward: integers, or labels like "Ward 5".
    pub fn as_ward(&self) -> Option<WardNumber> {
        match self {
            NumberOrText::Number(n) if n.fract() == 0.0 && *n >= 0.0 => {
                let ward = *n as WardNumber;
                is_valid_ward(ward).then_some(ward)
            }
            NumberOrText::Number(_) => None,
            NumberOrText::Text(s) => crate::models::ward::parse_ward_label(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_or_text() {
        let n: NumberOrText = serde_json::from_str("12.5").unwrap();
        assert_eq!(n.as_f64(), Some(12.5));
        let t: NumberOrText = serde_json::from_str(r#""77.25""#).unwrap();
        assert_eq!(t.as_f64(), Some(77.25));
        let bad: NumberOrText = serde_json::from_str(r#""north""#).unwrap();
        assert_eq!(bad.as_f64(), None);
    }

    #[test]
    fn test_number_or_text_as_ward() {
        let w: NumberOrText = serde_json::from_str("5").unwrap();
        assert_eq!(w.as_ward(), Some(5));
        let w: NumberOrText = serde_json::from_str(r#""Ward 7""#).unwrap();
        assert_eq!(w.as_ward(), Some(7));
        let w: NumberOrText = serde_json::from_str("5.5").unwrap();
        assert_eq!(w.as_ward(), None);
        let w: NumberOrText = serde_json::from_str("34").unwrap();
        assert_eq!(w.as_ward(), None);
    }

    #[test]
    fn test_parse_ward_param() {
        assert_eq!(parse_ward_param("10").unwrap(), 10);
        assert!(parse_ward_param("0").is_err());
        assert!(parse_ward_param("ten").is_err());
    }
}
