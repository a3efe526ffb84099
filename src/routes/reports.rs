// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Citizen report routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::{AuthUser, Role};
use crate::models::ward::MAX_WARD;
use crate::models::{Report, ReportStatus, ReportType, WardNumber};
use crate::routes::collectors::acting_collector;
use crate::routes::{json_body, NumberOrText};
use crate::services::ReconcileSummary;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/reports", post(create_report).get(list_reports))
        .route("/api/reports/mine", get(list_my_reports))
        .route("/api/reports/reconcile", post(reconcile_reports))
        .route("/api/reports/{report_id}", get(get_report))
        .route("/api/reports/{report_id}/status", put(update_report_status))
        .route("/api/collector/reports", get(list_collector_reports))
}

/// Report as returned by the API, with the assignment flattened into
/// nullable fields that are always all set or all null.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReportResponse {
    pub id: String,
    pub report_type: ReportType,
    pub report_label: String,
    pub description: String,
    pub location: String,
    pub ward: WardNumber,
    pub latitude: f64,
    pub longitude: f64,
    pub images: Vec<String>,
    pub status: ReportStatus,
    pub user_id: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub assigned_collector_id: Option<String>,
    pub assigned_collector_name: Option<String>,
    pub assigned_vehicle_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Report> for ReportResponse {
    fn from(r: Report) -> Self {
        let (assigned_collector_id, assigned_collector_name, assigned_vehicle_id) =
            match r.assignment {
                Some(a) => (Some(a.collector_id), Some(a.collector_name), Some(a.vehicle_id)),
                None => (None, None, None),
            };

        Self {
            id: r.id,
            report_type: r.report_type,
            report_label: r.report_label,
            description: r.description,
            location: r.location,
            ward: r.ward,
            latitude: r.latitude,
            longitude: r.longitude,
            images: r.images,
            status: r.status,
            user_id: r.user_id,
            user_name: r.user_name,
            user_email: r.user_email,
            assigned_collector_id,
            assigned_collector_name,
            assigned_vehicle_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

fn to_responses(reports: Vec<Report>) -> Vec<ReportResponse> {
    reports.into_iter().map(ReportResponse::from).collect()
}

// ─── Submission ──────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub report_type: ReportType,
    #[validate(length(min = 1, max = 64))]
    pub report_label: String,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    #[validate(length(min = 1, max = 500))]
    pub location: String,
    pub ward: NumberOrText,
    pub latitude: NumberOrText,
    pub longitude: NumberOrText,
    #[serde(default)]
    #[validate(length(max = 10))]
    pub images: Vec<String>,
}

/// Check the fields serde and validator can't: ward range, coordinates and
/// the type/label pairing.
fn check_report_fields(req: &CreateReportRequest) -> Result<(WardNumber, f64, f64)> {
    let ward = req.ward.as_ward().ok_or_else(|| {
        AppError::BadRequest(format!("ward must be a number between 1 and {}", MAX_WARD))
    })?;

    let latitude = req
        .latitude
        .as_f64()
        .filter(|lat| (-90.0..=90.0).contains(lat))
        .ok_or_else(|| AppError::BadRequest("latitude must be a number in [-90, 90]".to_string()))?;
    let longitude = req
        .longitude
        .as_f64()
        .filter(|lng| (-180.0..=180.0).contains(lng))
        .ok_or_else(|| {
            AppError::BadRequest("longitude must be a number in [-180, 180]".to_string())
        })?;

    if req.report_label.trim() != req.report_type.label() {
        return Err(AppError::BadRequest(format!(
            "reportLabel for {:?} must be \"{}\"",
            req.report_type,
            req.report_type.label()
        )));
    }

    if req
        .images
        .iter()
        .any(|url| !(url.starts_with("https://") || url.starts_with("http://")))
    {
        return Err(AppError::BadRequest(
            "images must be absolute http(s) URLs".to_string(),
        ));
    }

    Ok((ward, latitude, longitude))
}

async fn create_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<CreateReportRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ReportResponse>)> {
    user.require_role(Role::Citizen)?;
    let req = json_body(payload)?;
    req.validate()?;
    let (ward, latitude, longitude) = check_report_fields(&req)?;

    // Lookup failure leaves the report unassigned; reconciliation fills it in later.
    let assignment = state.assignment_resolver().resolve_assignment(ward).await;

    let now = format_utc_rfc3339(chrono::Utc::now());
    let report = Report {
        id: uuid::Uuid::new_v4().to_string(),
        report_type: req.report_type,
        report_label: req.report_type.label().to_string(),
        description: req.description.trim().to_string(),
        location: req.location.trim().to_string(),
        ward,
        latitude,
        longitude,
        images: req.images,
        status: ReportStatus::Received,
        user_id: user.user_id.clone(),
        user_name: user.name.clone(),
        user_email: user.email.clone(),
        assignment,
        created_at: now.clone(),
        updated_at: now,
    };

    state.db.upsert_report(&report).await?;

    tracing::info!(
        report_id = %report.id,
        ward,
        user_id = %user.user_id,
        assigned = report.is_assigned(),
        "Report submitted"
    );

    Ok((StatusCode::CREATED, Json(report.into())))
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ReportFilter {
    pub ward: Option<WardNumber>,
    pub status: Option<ReportStatus>,
}

impl ReportFilter {
    fn matches(&self, report: &Report) -> bool {
        self.ward.is_none_or(|w| report.ward == w)
            && self.status.is_none_or(|s| report.status == s)
    }
}

/// All reports, newest first. Read-only: unassigned reports are backfilled
/// by reconciliation, not here.
async fn list_reports(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ReportFilter>,
) -> Result<Json<Vec<ReportResponse>>> {
    let reports = state
        .db
        .list_reports()
        .await?
        .into_iter()
        .filter(|r| filter.matches(r))
        .collect();

    Ok(Json(to_responses(reports)))
}

async fn list_my_reports(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ReportResponse>>> {
    let reports = state.db.list_reports_for_user(&user.user_id).await?;
    Ok(Json(to_responses(reports)))
}

async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<String>,
) -> Result<Json<ReportResponse>> {
    let report = state
        .db
        .get_report(&report_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))?;

    Ok(Json(report.into()))
}

/// Reports located in the acting collector's wards.
async fn list_collector_reports(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ReportResponse>>> {
    let collector = acting_collector(&state, &user).await?;
    let reports = state
        .db
        .list_reports_for_wards(&collector.assigned_wards)
        .await?;

    Ok(Json(to_responses(reports)))
}

// ─── Status And Reconciliation ───────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateReportStatusRequest {
    pub status: ReportStatus,
}

async fn update_report_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(report_id): Path<String>,
    payload: std::result::Result<Json<UpdateReportStatusRequest>, JsonRejection>,
) -> Result<Json<ReportResponse>> {
    let req = json_body(payload)?;
    let collector = acting_collector(&state, &user).await?;

    let report = state
        .db
        .get_report(&report_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))?;

    if !collector.covers_ward(report.ward) {
        return Err(AppError::Forbidden(format!(
            "Collector {} is not assigned to ward {}",
            collector.collector_id, report.ward
        )));
    }

    if !report.status.can_transition_to(req.status) {
        return Err(AppError::InvalidTransition(format!(
            "cannot move report from {:?} to {:?}",
            report.status, req.status
        )));
    }

    let now = format_utc_rfc3339(chrono::Utc::now());
    if !state
        .db
        .update_report_status_if(&report_id, report.status, req.status, &now)
        .await?
    {
        return Err(AppError::InvalidTransition(format!(
            "report {} changed concurrently, reload and retry",
            report_id
        )));
    }

    tracing::info!(
        report_id = %report_id,
        from = ?report.status,
        to = ?req.status,
        collector_id = %collector.collector_id,
        "Report status updated"
    );

    let updated = state
        .db
        .get_report(&report_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))?;

    Ok(Json(updated.into()))
}

async fn reconcile_reports(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ReconcileSummary>> {
    user.require_any_role(&[Role::Collector, Role::Admin])?;
    let summary = state
        .assignment_resolver()
        .reconcile_unassigned_reports()
        .await?;

    tracing::info!(
        user_id = %user.user_id,
        assigned = summary.assigned,
        unassigned = summary.unassigned,
        "Manual report reconciliation"
    );

    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(ward: serde_json::Value, label: &str) -> CreateReportRequest {
        serde_json::from_value(serde_json::json!({
            "reportType": "overflowing-bin",
            "reportLabel": label,
            "description": "Bin spilling onto the road",
            "location": "Market Street",
            "ward": ward,
            "latitude": "27.70",
            "longitude": 85.32
        }))
        .unwrap()
    }

    #[test]
    fn test_check_report_fields_accepts_text_numbers() {
        let (ward, lat, lng) =
            check_report_fields(&request(serde_json::json!("5"), "Overflowing Bin")).unwrap();
        assert_eq!(ward, 5);
        assert_eq!(lat, 27.70);
        assert_eq!(lng, 85.32);
    }

    #[test]
    fn test_check_report_fields_rejects_out_of_range_ward() {
        assert!(check_report_fields(&request(serde_json::json!(0), "Overflowing Bin")).is_err());
        assert!(check_report_fields(&request(serde_json::json!(34), "Overflowing Bin")).is_err());
    }

    #[test]
    fn test_check_report_fields_rejects_mismatched_label() {
        assert!(check_report_fields(&request(serde_json::json!(5), "Dead Animal")).is_err());
    }

    #[test]
    fn test_report_filter() {
        let filter = ReportFilter {
            ward: Some(3),
            status: None,
        };
        let mut report: Report = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "reportType": "other",
            "reportLabel": "Other",
            "description": "d",
            "location": "l",
            "ward": 3,
            "latitude": 0.0,
            "longitude": 0.0,
            "status": "received",
            "userId": "u1",
            "userName": null,
            "userEmail": null,
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(filter.matches(&report));
        report.ward = 4;
        assert!(!filter.matches(&report));
    }
}
