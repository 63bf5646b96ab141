//! Fiscal year and period management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::organization;
use crate::error::ApiError;
use crate::{AppState, middleware::AuthUser};
use fiscus_core::fiscal::NewFiscalYear;
use fiscus_db::PeriodTransition;
use fiscus_shared::types::{FiscalYearId, MonthlyPeriodId};

/// Creates the fiscal routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/fiscal-years",
            get(list_fiscal_years).post(create_fiscal_year),
        )
        .route(
            "/organizations/{org_id}/fiscal-years/{fiscal_year_id}",
            get(get_fiscal_year),
        )
        .route(
            "/organizations/{org_id}/fiscal-years/{fiscal_year_id}/periods",
            post(initialize_periods),
        )
        .route(
            "/organizations/{org_id}/periods/transition",
            post(transition_period),
        )
        .route("/organizations/{org_id}/periods/resolve", get(resolve_period))
        .route("/organizations/{org_id}/periods/{period_id}", get(get_period))
        .route(
            "/organizations/{org_id}/periods/{period_id}/audit",
            get(audit_trail),
        )
}

/// Query parameters for resolving a period.
#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    /// Date to resolve (YYYY-MM-DD).
    pub date: NaiveDate,
}

/// GET `/organizations/{org_id}/fiscal-years` - List fiscal years with nested periods.
async fn list_fiscal_years(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let org = organization(&auth, org_id)?;
    let years = state.fiscal().list_fiscal_years(org).await?;
    Ok(Json(json!({ "fiscal_years": years })))
}

/// POST `/organizations/{org_id}/fiscal-years` - Create a fiscal year.
async fn create_fiscal_year(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<NewFiscalYear>,
) -> Result<impl IntoResponse, ApiError> {
    let org = organization(&auth, org_id)?;
    let fiscal_year = state
        .fiscal()
        .create_fiscal_year(auth.actor(), org, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(fiscal_year)))
}

/// GET `/organizations/{org_id}/fiscal-years/{fiscal_year_id}`
async fn get_fiscal_year(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, fiscal_year_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let org = organization(&auth, org_id)?;
    let fiscal_year = state
        .fiscal()
        .find_fiscal_year(org, FiscalYearId::from_uuid(fiscal_year_id))
        .await?;
    Ok(Json(fiscal_year))
}

/// POST `/organizations/{org_id}/fiscal-years/{fiscal_year_id}/periods` - Generate the
/// twelve monthly periods.
async fn initialize_periods(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, fiscal_year_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let org = organization(&auth, org_id)?;
    let periods = state
        .fiscal()
        .initialize_periods(auth.actor(), org, FiscalYearId::from_uuid(fiscal_year_id))
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "periods": periods }))))
}

/// POST `/organizations/{org_id}/periods/transition` - Activate, deactivate,
/// close or reopen a fiscal year or monthly period.
async fn transition_period(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<PeriodTransition>,
) -> Result<impl IntoResponse, ApiError> {
    let org = organization(&auth, org_id)?;
    let plan = state.fiscal().transition(auth.actor(), org, &payload).await?;
    Ok(Json(plan))
}

/// GET `/organizations/{org_id}/periods/resolve?date=` - Period covering a date.
async fn resolve_period(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Query(query): Query<ResolveQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let org = organization(&auth, org_id)?;
    let context = state.fiscal().resolve_period(org, query.date).await?;
    Ok(Json(context))
}

/// GET `/organizations/{org_id}/periods/{period_id}`
async fn get_period(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, period_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let org = organization(&auth, org_id)?;
    let context = state
        .fiscal()
        .find_period(org, MonthlyPeriodId::from_uuid(period_id))
        .await?;
    Ok(Json(context))
}

/// GET `/organizations/{org_id}/periods/{period_id}/audit` - Accepted
/// transitions of a fiscal year or monthly period.
async fn audit_trail(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, subject_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let org = organization(&auth, org_id)?;
    let records = state.fiscal().audit_trail(org, subject_id).await?;
    Ok(Json(json!({ "transitions": records })))
}
