//! Saved reports: `/api/reports/{customer|employee|financial}`.
//!
//! Creating a report saves its filters and returns the computed result.
//! Opening a saved report recomputes it, so edits to invoices show up.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use daftar_core::report::{
    CustomerReport, CustomerReportSpec, EmployeeReport, EmployeeReportSpec, FinancialReportSpec,
    FinancialSummary, SavedReport,
};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

/// A saved spec together with its freshly computed result.
#[derive(Debug, Serialize)]
pub struct ReportView<S, R> {
    pub report: SavedReport<S>,
    pub result: R,
}

// =============================================================================
// Customer
// =============================================================================

/// `POST /api/reports/customer`
pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(spec): Json<CustomerReportSpec>,
) -> ApiResult<(StatusCode, Json<ReportView<CustomerReportSpec, CustomerReport>>)> {
    let reports = state.db.reports();
    let report = reports.create_customer(&auth.actor, &spec).await?;
    let result = reports.generate_customer(&auth.actor, &report.spec).await?;
    Ok((StatusCode::CREATED, Json(ReportView { report, result })))
}

/// `GET /api/reports/customer`
pub async fn list_customer(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<SavedReport<CustomerReportSpec>>>> {
    Ok(Json(state.db.reports().list_customer(&auth.actor).await?))
}

/// `GET /api/reports/customer/{id}`
pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<ReportView<CustomerReportSpec, CustomerReport>>> {
    let reports = state.db.reports();
    let report = reports.get_customer(&auth.actor, id).await?;
    let result = reports.generate_customer(&auth.actor, &report.spec).await?;
    Ok(Json(ReportView { report, result }))
}

// =============================================================================
// Employee
// =============================================================================

/// `POST /api/reports/employee`
pub async fn create_employee(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(spec): Json<EmployeeReportSpec>,
) -> ApiResult<(StatusCode, Json<ReportView<EmployeeReportSpec, EmployeeReport>>)> {
    let reports = state.db.reports();
    let report = reports.create_employee(&auth.actor, &spec).await?;
    let result = reports.generate_employee(&auth.actor, &report.spec).await?;
    Ok((StatusCode::CREATED, Json(ReportView { report, result })))
}

/// `GET /api/reports/employee`
pub async fn list_employee(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<SavedReport<EmployeeReportSpec>>>> {
    Ok(Json(state.db.reports().list_employee(&auth.actor).await?))
}

/// `GET /api/reports/employee/{id}`
pub async fn get_employee(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<ReportView<EmployeeReportSpec, EmployeeReport>>> {
    let reports = state.db.reports();
    let report = reports.get_employee(&auth.actor, id).await?;
    let result = reports.generate_employee(&auth.actor, &report.spec).await?;
    Ok(Json(ReportView { report, result }))
}

// =============================================================================
// Financial
// =============================================================================

/// `POST /api/reports/financial`
pub async fn create_financial(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(spec): Json<FinancialReportSpec>,
) -> ApiResult<(StatusCode, Json<ReportView<FinancialReportSpec, FinancialSummary>>)> {
    let reports = state.db.reports();
    let report = reports.create_financial(&auth.actor, &spec).await?;
    let result = reports.generate_financial(&auth.actor, &report.spec).await?;
    Ok((StatusCode::CREATED, Json(ReportView { report, result })))
}

/// `GET /api/reports/financial`
pub async fn list_financial(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<SavedReport<FinancialReportSpec>>>> {
    Ok(Json(state.db.reports().list_financial(&auth.actor).await?))
}

/// `GET /api/reports/financial/{id}`
pub async fn get_financial(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<ReportView<FinancialReportSpec, FinancialSummary>>> {
    let reports = state.db.reports();
    let report = reports.get_financial(&auth.actor, id).await?;
    let result = reports.generate_financial(&auth.actor, &report.spec).await?;
    Ok(Json(ReportView { report, result }))
}
