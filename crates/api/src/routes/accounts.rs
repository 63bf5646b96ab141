//! Account management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::organization;
use crate::error::ApiError;
use crate::{AppState, middleware::AuthUser};
use fiscus_core::account::NewAccount;
use fiscus_shared::types::AccountId;

/// Creates the account routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/accounts",
            get(list_accounts).post(create_account),
        )
        .route(
            "/organizations/{org_id}/accounts/{account_id}",
            get(get_account),
        )
        .route(
            "/organizations/{org_id}/accounts/{account_id}/parent",
            patch(move_account),
        )
}

/// Query parameters for listing accounts.
#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    /// Include deactivated accounts (default: false).
    #[serde(default)]
    pub include_inactive: bool,
}

/// Request body for moving an account.
#[derive(Debug, Deserialize)]
pub struct MoveAccountRequest {
    /// New parent, or null for the top level.
    pub parent_id: Option<AccountId>,
}

/// GET `/organizations/{org_id}/accounts` - Chart of accounts in hierarchy order.
async fn list_accounts(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Query(query): Query<ListAccountsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let org = organization(&auth, org_id)?;
    let accounts = state.accounts().list(org, query.include_inactive).await?;
    Ok(Json(json!({ "accounts": accounts })))
}

/// POST `/organizations/{org_id}/accounts` - Open an account; the code is generated.
async fn create_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<NewAccount>,
) -> Result<impl IntoResponse, ApiError> {
    let org = organization(&auth, org_id)?;
    let account = state.accounts().create(auth.actor(), org, payload).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET `/organizations/{org_id}/accounts/{account_id}`
async fn get_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, account_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let org = organization(&auth, org_id)?;
    let account = state
        .accounts()
        .find(org, AccountId::from_uuid(account_id))
        .await?;
    Ok(Json(account))
}

/// PATCH `/organizations/{org_id}/accounts/{account_id}/parent` - Move an account
/// and re-code its subtree.
async fn move_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, account_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<MoveAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let org = organization(&auth, org_id)?;
    let account = state
        .accounts()
        .reparent(
            auth.actor(),
            org,
            AccountId::from_uuid(account_id),
            payload.parent_id,
        )
        .await?;
    Ok(Json(account))
}
