use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;

use crate::months::MonthKey;

/// Discount tracker row for a single customer.
///
/// The customer name is the row key. `reconciliation_months` holds the
/// months an operator has manually marked as resolved; it is the only field
/// this service ever writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DiscountTrackerEntry {
    /// Customer name (unique key)
    pub customer_name: String,

    /// Manually reconciled month keys (`YYYY-MM`)
    #[serde(default)]
    pub reconciliation_months: Vec<String>,

    /// Agreed monthly rebate
    #[serde(default)]
    pub monthly_rebate: Option<Decimal>,

    /// Quarterly rent rate
    #[serde(default)]
    pub q_rent: Option<Decimal>,

    /// Bi-annual rent rate
    #[serde(default)]
    pub b_rent: Option<Decimal>,
}

impl DiscountTrackerEntry {
    /// Creates an entry with no reconciled months and no rates.
    pub fn new(customer_name: impl Into<String>) -> Self {
        Self {
            customer_name: customer_name.into(),
            reconciliation_months: Vec::new(),
            monthly_rebate: None,
            q_rent: None,
            b_rent: None,
        }
    }

    /// Reconciled months that are valid keys. Malformed cells are skipped.
    pub fn reconciled_keys(&self) -> Vec<MonthKey> {
        self.reconciliation_months
            .iter()
            .filter_map(|raw| match raw.parse::<MonthKey>() {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!(
                        "Ignoring reconciliation month for {}: {}",
                        self.customer_name, e
                    );
                    None
                }
            })
            .collect()
    }
}

/// Response body for `GET /api/discounts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerEntriesResponse {
    pub entries: Vec<DiscountTrackerEntry>,
}
