//! # certreg-api: HTTP Service for the Certificate Registry
//!
//! Exposes the ledger in `certreg-ledger` over HTTP with bearer token
//! authentication, Postgres journal persistence, Prometheus metrics, and an
//! OpenAPI document.
//!
//! ## API Surface
//!
//! | Prefix | Module | Domain |
//! |---|---|---|
//! | `/v1/admins/*` | [`routes::admins`] | Admin set |
//! | `/v1/certificates/*`, `/v1/students/*` | [`routes::certificates`] | Certificates |
//! | `/v1/journal/*` | [`routes::journal`] | Mutation journal |
//! | `/openapi.json` | [`openapi`] | API document |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```
//!
//! Health probes and `/metrics` are mounted outside the auth middleware.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::error::AppError;
use crate::state::AppState;

/// Assemble the application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = state.auth.clone();

    let api = Router::new()
        .merge(routes::admins::router())
        .merge(routes::certificates::router())
        .merge(routes::journal::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(axum::Extension(auth_config));

    let ops = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(render_metrics));

    Router::new()
        .merge(ops)
        .merge(api)
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
        .with_state(state)
}

/// Liveness probe. 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. 503 when the configured database is unreachable.
async fn readiness(State(state): State<AppState>) -> Response {
    if let Some(pool) = &state.db_pool {
        if let Err(err) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(error = %err, "readiness check failed: database unreachable");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }
    "ready".into_response()
}

/// Prometheus text exposition of all recorded metrics.
async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => AppError::NotFound("metrics recorder not installed".into()).into_response(),
    }
}
