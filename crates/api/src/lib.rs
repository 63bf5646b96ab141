//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for the fiscal calendar, accounts, journal and reports
//! - Authentication middleware
//! - Error responses

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use fiscus_core::account::CodeGenerator;
use fiscus_core::reports::{BalanceVerifier, TrialBalanceAggregator};
use fiscus_db::{AccountRepository, FiscalRepository, JournalRepository, ReportRepository};
use fiscus_shared::JwtService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Account code layout.
    pub account_codes: CodeGenerator,
    /// Trial balance aggregator with the configured tolerance.
    pub aggregator: TrialBalanceAggregator,
    /// Balance verifier with the configured tolerance.
    pub verifier: BalanceVerifier,
}

impl AppState {
    /// Fiscal calendar repository.
    #[must_use]
    pub fn fiscal(&self) -> FiscalRepository {
        FiscalRepository::new((*self.db).clone())
    }

    /// Chart of accounts repository.
    #[must_use]
    pub fn accounts(&self) -> AccountRepository {
        AccountRepository::new((*self.db).clone(), self.account_codes)
    }

    /// Journal repository.
    #[must_use]
    pub fn journal(&self) -> JournalRepository {
        JournalRepository::new((*self.db).clone())
    }

    /// Report repository.
    #[must_use]
    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new((*self.db).clone(), self.aggregator)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
