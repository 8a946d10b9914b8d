//! LedgerDesk core: discount reconciliation tracking over a customer ledger.
//!
//! The crate computes, per customer, which months carry a posted discount
//! bill, which were reconciled by hand and which are still missing, and
//! serves that picture over a small JSON API.

pub mod auth;
pub mod config;
pub mod db;
pub mod discounts;
pub mod error;
pub mod extract;
pub mod models;
pub mod months;
pub mod store;

use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::error::AppError;
use crate::store::SheetStore;

/// Application state containing shared resources.
///
/// Holds the row store and the token settings that route handlers and the
/// auth middleware need.
#[derive(Clone)]
pub struct AppState {
    /// Backing row store
    pub store: SheetStore,

    /// JWT verification and reconcile allow-list
    pub auth: AuthConfig,
}

/// Health check endpoint.
///
/// Returns a simple JSON response indicating the server is running.
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "ledgerdesk-core",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Store health check endpoint.
///
/// Verifies that the configured row store answers.
async fn store_health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.ping().await?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "store": state.store.backend_name()
    })))
}

/// Creates the main application router.
///
/// Health routes are public. Everything under `/api` requires a bearer
/// token.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/discounts", get(discounts::list_entries_handler))
        .route("/discounts/reconcile", post(discounts::reconcile_handler))
        .route("/discounts/summary", get(discounts::summary_handler))
        .route("/discounts/export", get(discounts::export_handler))
        .route("/discounts/grid", get(discounts::grid_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::jwt_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/health/store", get(store_health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
