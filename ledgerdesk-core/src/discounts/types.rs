use serde::{Deserialize, Serialize};
use std::fmt;

use crate::discounts::summary::{DiscountSummary, MonthCell};
use crate::months::MonthKey;

/// Direction of a manual reconciliation toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileAction {
    /// Mark a missing month as resolved
    Reconcile,

    /// Return a reconciled month to missing
    Unreconcile,
}

impl fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileAction::Reconcile => write!(f, "reconcile"),
            ReconcileAction::Unreconcile => write!(f, "unreconcile"),
        }
    }
}

/// Body of `POST /api/discounts/reconcile`.
///
/// `month_key` stays a plain string here so a malformed key can be
/// reported with the offending value instead of a generic JSON error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    pub customer_name: String,
    pub month_key: String,
    pub action: ReconcileAction,
}

/// Response of `POST /api/discounts/reconcile`: the full persisted list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    pub reconciliation_months: Vec<String>,
}

/// Query string shared by the summary and export endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    /// Month treated as "now"; defaults to the server's current month
    pub as_of: Option<MonthKey>,
}

/// Response of `GET /api/discounts/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub current_month: MonthKey,
    pub summaries: Vec<DiscountSummary>,
}

/// Query string of `GET /api/discounts/grid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridQuery {
    pub customer: String,

    /// Calendar year to lay out; defaults to the year of `as_of`
    pub year: Option<i32>,

    pub as_of: Option<MonthKey>,
}

/// Response of `GET /api/discounts/grid`: one customer's year, month by month.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridResponse {
    pub customer_name: String,
    pub year: i32,
    pub current_month: MonthKey,
    pub months: Vec<MonthCell>,
}
