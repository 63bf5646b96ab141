//! API route definitions.

use axum::{Router, middleware};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::{AppState, middleware::auth_middleware};
use fiscus_shared::AppError;
use fiscus_shared::types::OrganizationId;

pub mod accounts;
pub mod fiscal;
pub mod health;
pub mod journal;
pub mod reports;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(fiscal::routes())
        .merge(accounts::routes())
        .merge(journal::routes())
        .merge(reports::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

/// Checks that the path organization is the one the token is scoped to.
pub(crate) fn organization(auth: &AuthUser, org_id: Uuid) -> Result<OrganizationId, ApiError> {
    let scoped = auth.organization_id();
    if scoped.into_inner() == org_id {
        Ok(scoped)
    } else {
        Err(AppError::Forbidden(format!("Not a member of organization {org_id}")).into())
    }
}
