//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - General ledger report routes
//! - Bearer token authentication middleware
//! - The JSON response envelope and error mapping

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use glreport_core::reports::ReportService;
use glreport_db::PgReportRepository;
use glreport_shared::JwtService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Report generation over the Postgres repository.
    pub reports: ReportService<PgReportRepository>,
}

impl AppState {
    /// Wires the report service onto a connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection, jwt_service: JwtService) -> Self {
        let repository = PgReportRepository::new(db.clone());
        Self {
            db: Arc::new(db),
            jwt_service: Arc::new(jwt_service),
            reports: ReportService::new(Arc::new(repository)),
        }
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
