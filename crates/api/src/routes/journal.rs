//! Journal entry routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use uuid::Uuid;

use super::organization;
use crate::error::ApiError;
use crate::{AppState, middleware::AuthUser};
use fiscus_core::ledger::NewJournalEntry;
use fiscus_shared::types::JournalEntryId;

/// Creates the journal routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/organizations/{org_id}/journal-entries", post(post_entry))
        .route(
            "/organizations/{org_id}/journal-entries/{entry_id}",
            get(get_entry),
        )
        .route(
            "/organizations/{org_id}/journal-entries/{entry_id}/void",
            post(void_entry),
        )
        .route(
            "/organizations/{org_id}/journal-entries/{entry_id}/verify",
            get(verify_entry),
        )
}

/// POST `/organizations/{org_id}/journal-entries` - Post a balanced entry into an
/// active period.
async fn post_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<NewJournalEntry>,
) -> Result<impl IntoResponse, ApiError> {
    let org = organization(&auth, org_id)?;
    let posted = state.journal().post(auth.actor(), org, &payload).await?;
    Ok((StatusCode::CREATED, Json(posted)))
}

/// GET `/organizations/{org_id}/journal-entries/{entry_id}`
async fn get_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, entry_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let org = organization(&auth, org_id)?;
    let entry = state
        .journal()
        .find(org, JournalEntryId::from_uuid(entry_id))
        .await?;
    Ok(Json(entry))
}

/// POST `/organizations/{org_id}/journal-entries/{entry_id}/void`
async fn void_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, entry_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let org = organization(&auth, org_id)?;
    let entry = state
        .journal()
        .void(auth.actor(), org, JournalEntryId::from_uuid(entry_id))
        .await?;
    Ok(Json(entry))
}

/// GET `/organizations/{org_id}/journal-entries/{entry_id}/verify` - Re-check a
/// stored entry against its lines.
async fn verify_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, entry_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let org = organization(&auth, org_id)?;
    state
        .journal()
        .verify(org, JournalEntryId::from_uuid(entry_id))
        .await?;
    Ok(Json(json!({ "entry_id": entry_id, "verified": true })))
}
