//! Report routes.
//!
//! Figures are computed at full precision and rounded here, once, for
//! display.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::organization;
use crate::error::ApiError;
use crate::{AppState, middleware::AuthUser};
use fiscus_core::account::{AccountType, Nature};
use fiscus_core::fiscal::PeriodScope;
use fiscus_core::reports::{
    BalanceVerifier, HierarchicalBalance, TrialBalance, TrialBalanceQuery,
};
use fiscus_db::RepositoryError;
use fiscus_shared::types::AccountId;
use fiscus_shared::types::money::present;

/// Creates the report routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/organizations/{org_id}/reports/trial-balance",
        get(get_trial_balance),
    )
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Query parameters for the trial balance.
///
/// Either `start_date` and `end_date`, or `scope` and `period_id`.
#[derive(Debug, Default, Deserialize)]
pub struct TrialBalanceParams {
    /// First day covered.
    pub start_date: Option<NaiveDate>,
    /// Last day covered.
    pub end_date: Option<NaiveDate>,
    /// `fiscal_year` or `monthly_period`.
    pub scope: Option<PeriodScope>,
    /// Fiscal year or monthly period bounding the report.
    pub period_id: Option<Uuid>,
    /// Comma-separated account types; empty means all.
    #[serde(alias = "types")]
    pub account_types: Option<String>,
}

impl TrialBalanceParams {
    fn account_types(&self) -> Result<Vec<AccountType>, ApiError> {
        self.account_types
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse()
                    .map_err(|_| ApiError::bad_request(format!("Unknown account type '{s}'")))
            })
            .collect()
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// One row of the trial balance, rounded for display.
#[derive(Debug, Serialize)]
pub struct TrialBalanceRow {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Normal balance side.
    pub nature: Nature,
    /// Parent account.
    pub parent_id: Option<AccountId>,
    /// Depth in the hierarchy.
    pub depth: usize,
    /// Whether the row is a posting account.
    pub is_leaf: bool,
    /// Signed balance before the range.
    pub opening_balance: Decimal,
    /// Debits inside the range.
    pub period_debits: Decimal,
    /// Credits inside the range.
    pub period_credits: Decimal,
    /// Signed balance at the end of the range.
    pub closing_balance: Decimal,
    /// Closing balance in the debit column.
    pub closing_debit: Decimal,
    /// Closing balance in the credit column.
    pub closing_credit: Decimal,
}

impl From<&HierarchicalBalance> for TrialBalanceRow {
    fn from(row: &HierarchicalBalance) -> Self {
        Self {
            account_id: row.account_id,
            code: row.code.clone(),
            name: row.name.clone(),
            account_type: row.account_type,
            nature: row.nature,
            parent_id: row.parent_id,
            depth: row.depth,
            is_leaf: row.is_leaf,
            opening_balance: present(row.opening_balance),
            period_debits: present(row.period_debits),
            period_credits: present(row.period_credits),
            closing_balance: present(row.closing_balance),
            closing_debit: present(row.closing_debit()),
            closing_credit: present(row.closing_credit()),
        }
    }
}

/// Trial balance response.
#[derive(Debug, Serialize)]
pub struct TrialBalanceResponse {
    /// First day covered.
    pub start_date: NaiveDate,
    /// Last day covered.
    pub end_date: NaiveDate,
    /// Rows in hierarchy order.
    pub accounts: Vec<TrialBalanceRow>,
    /// Sum of leaf debits.
    pub total_debits: Decimal,
    /// Sum of leaf credits.
    pub total_credits: Decimal,
    /// Debits minus credits.
    pub difference: Decimal,
    /// Whether debits and credits agree within tolerance.
    pub is_balanced: bool,
    /// Whether every group equals the sum of its leaves.
    pub rollups_consistent: bool,
}

impl TrialBalanceResponse {
    fn build(report: &TrialBalance, verifier: &BalanceVerifier) -> Result<Self, ApiError> {
        let check = verifier.verify(report).map_err(RepositoryError::from)?;
        let rollups_consistent = match BalanceVerifier::verify_rollups(report) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Trial balance roll-up mismatch");
                false
            }
        };
        Ok(Self {
            start_date: report.start_date,
            end_date: report.end_date,
            accounts: report.accounts.iter().map(TrialBalanceRow::from).collect(),
            total_debits: present(check.total_debits),
            total_credits: present(check.total_credits),
            difference: present(check.difference),
            is_balanced: check.is_balanced,
            rollups_consistent,
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/organizations/{org_id}/reports/trial-balance`
async fn get_trial_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Query(params): Query<TrialBalanceParams>,
) -> Result<impl IntoResponse, ApiError> {
    let org = organization(&auth, org_id)?;
    let account_types = params.account_types()?;
    let reports = state.reports();

    let report = match (params.scope, params.period_id, params.start_date, params.end_date) {
        (Some(scope), Some(period_id), None, None) => {
            reports
                .trial_balance_for_period(auth.actor(), org, scope, period_id, account_types)
                .await?
        }
        (None, None, Some(start), Some(end)) => {
            let query = TrialBalanceQuery::new(start, end).with_types(account_types);
            reports.trial_balance(auth.actor(), org, query).await?
        }
        _ => {
            return Err(ApiError::bad_request(
                "Provide either start_date and end_date, or scope and period_id",
            ));
        }
    };

    Ok(Json(TrialBalanceResponse::build(&report, &state.verifier)?))
}
