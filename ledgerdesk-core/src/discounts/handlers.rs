use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json},
    Extension,
};
use tracing::{info, warn};

use crate::auth::CurrentUser;
use crate::discounts::export::summaries_to_csv;
use crate::discounts::reconcile::is_allowed;
use crate::discounts::summary::{compute_summary, summarize_all, DiscountSummary};
use crate::discounts::types::{
    GridQuery, GridResponse, ReconcileRequest, ReconcileResponse, SummaryQuery, SummaryResponse,
};
use crate::error::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::models::TrackerEntriesResponse;
use crate::months::{MonthKey, MAX_YEAR, MIN_YEAR};
use crate::store::StoreError;
use crate::AppState;

/// Tracker entries endpoint handler.
///
/// Handles GET requests to `/api/discounts`, returning every discount
/// tracker row as stored.
pub async fn list_entries_handler(
    State(state): State<AppState>,
) -> Result<Json<TrackerEntriesResponse>, AppError> {
    let entries = state.store.list_entries().await?;
    info!("Listing {} discount tracker entries", entries.len());
    Ok(Json(TrackerEntriesResponse { entries }))
}

/// Reconcile endpoint handler.
///
/// Handles POST requests to `/api/discounts/reconcile`. Only users on the
/// reconcile allow-list may toggle a month, and future months cannot be
/// reconciled.
pub async fn reconcile_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    AppJson(request): AppJson<ReconcileRequest>,
) -> Result<Json<ReconcileResponse>, AppError> {
    if !state.auth.can_reconcile(&user) {
        warn!("User {} attempted to {} without permission", user.0, request.action);
        return Err(AppError::Forbidden(format!(
            "user {:?} is not allowed to change reconciliations",
            user.0
        )));
    }

    let customer_name = request.customer_name.trim();
    if customer_name.is_empty() {
        return Err(AppError::BadRequest("customerName is required".to_string()));
    }

    let month: MonthKey = request
        .month_key
        .parse()
        .map_err(|e: crate::months::MonthKeyError| AppError::BadRequest(e.to_string()))?;

    if !is_allowed(month, request.action, MonthKey::current()) {
        return Err(AppError::BadRequest(format!(
            "{month} is in the future and cannot be reconciled"
        )));
    }

    info!(
        "User {} requested {} of {} for {}",
        user.0, request.action, month, customer_name
    );

    let reconciliation_months = state
        .store
        .reconcile(customer_name, month, request.action)
        .await?;

    Ok(Json(ReconcileResponse {
        reconciliation_months,
    }))
}

/// Summary endpoint handler.
///
/// Handles GET requests to `/api/discounts/summary`, computing every
/// customer's reconciliation picture as of `asOf` (default: this month).
pub async fn summary_handler(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SummaryQuery>,
) -> Result<Json<SummaryResponse>, AppError> {
    let current_month = query.as_of.unwrap_or_else(MonthKey::current);
    let summaries = load_summaries(&state, current_month).await?;

    Ok(Json(SummaryResponse {
        current_month,
        summaries,
    }))
}

/// Export endpoint handler.
///
/// Handles GET requests to `/api/discounts/export`, returning the
/// summaries as a CSV attachment.
pub async fn export_handler(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SummaryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let current_month = query.as_of.unwrap_or_else(MonthKey::current);
    let summaries = load_summaries(&state, current_month).await?;
    let body = summaries_to_csv(&summaries)?;

    let disposition = format!("attachment; filename=\"discount-summary-{current_month}.csv\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// Year grid endpoint handler.
///
/// Handles GET requests to `/api/discounts/grid`, laying out one
/// customer's calendar year with the status of every month.
pub async fn grid_handler(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<GridQuery>,
) -> Result<Json<GridResponse>, AppError> {
    let current_month = query.as_of.unwrap_or_else(MonthKey::current);
    let year = query.year.unwrap_or_else(|| current_month.year());
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(AppError::BadRequest(format!(
            "year must be between {MIN_YEAR} and {MAX_YEAR}"
        )));
    }

    let customer_name = query.customer.trim();
    let entries = state.store.list_entries().await?;
    let entry = entries
        .iter()
        .find(|e| e.customer_name.trim() == customer_name)
        .ok_or_else(|| StoreError::CustomerNotFound(customer_name.to_string()))?;

    let invoices = state.store.list_invoices().await?;
    let rows = invoices
        .iter()
        .filter(|invoice| invoice.customer_name.trim() == customer_name);
    let summary = compute_summary(entry, rows, current_month);

    Ok(Json(GridResponse {
        customer_name: summary.customer_name.clone(),
        year,
        current_month,
        months: summary.year_grid(year),
    }))
}

async fn load_summaries(
    state: &AppState,
    current_month: MonthKey,
) -> Result<Vec<DiscountSummary>, AppError> {
    let invoices = state.store.list_invoices().await?;
    let entries = state.store.list_entries().await?;

    info!(
        "Summarizing {} customers over {} ledger rows as of {}",
        entries.len(),
        invoices.len(),
        current_month
    );
    Ok(summarize_all(&invoices, &entries, current_month))
}
