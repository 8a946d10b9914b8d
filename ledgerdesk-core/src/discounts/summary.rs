use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{DiscountTrackerEntry, DocumentKind, InvoiceRow};
use crate::months::MonthKey;

/// Reconciliation state of one customer month.
///
/// `Posted` is derived from discount bills only. Operators move months
/// between `Missing` and `Reconciled`; `Future` months cannot be touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthStatus {
    Posted,
    Reconciled,
    Missing,
    Future,
}

/// One cell of a customer's calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthCell {
    pub month: MonthKey,

    /// Display label such as `Mar 2024`
    pub label: String,

    /// `None` before the tracked range when no bill was posted
    pub status: Option<MonthStatus>,
}

/// Discount bills posted in a single month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostedMonth {
    pub month: MonthKey,

    /// Number of `BIL` documents dated in this month
    pub count: usize,

    /// Sum of credit minus debit over those documents
    pub amount: Decimal,

    /// More than one bill was posted for the month
    pub duplicate: bool,
}

/// Per-customer reconciliation picture between the first sale month and
/// the current month.
///
/// Never persisted. It is rebuilt from the ledger rows and the tracker
/// entry on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountSummary {
    pub customer_name: String,

    /// First month of the tracked range
    pub start_month: MonthKey,

    /// Last month of the tracked range
    pub current_month: MonthKey,

    /// Months with at least one discount bill, up to the current month
    pub posted_months: Vec<PostedMonth>,

    /// Months in range that were reconciled by hand and have no bill
    pub reconciled_months: Vec<MonthKey>,

    /// Months in range with neither a bill nor a manual reconciliation
    pub missing_months: Vec<MonthKey>,

    /// Posted months carrying more than one bill
    pub duplicate_months: Vec<MonthKey>,

    /// Sum of credit minus debit over every discount bill
    pub total_discounts: Decimal,

    /// `total_discounts` spread over the months with sales
    pub average_monthly_discount: Decimal,

    /// Distinct months containing a sales invoice
    pub active_months_count: usize,

    pub monthly_rebate: Option<Decimal>,
    pub q_rent: Option<Decimal>,
    pub b_rent: Option<Decimal>,
}

impl DiscountSummary {
    /// Status of `month` for this customer.
    ///
    /// Returns `None` for months before the tracked range that carry no
    /// discount bill.
    pub fn month_status(&self, month: MonthKey) -> Option<MonthStatus> {
        if month > self.current_month {
            return Some(MonthStatus::Future);
        }
        if self
            .posted_months
            .binary_search_by(|p| p.month.cmp(&month))
            .is_ok()
        {
            return Some(MonthStatus::Posted);
        }
        if month < self.start_month {
            return None;
        }
        if self.reconciled_months.binary_search(&month).is_ok() {
            Some(MonthStatus::Reconciled)
        } else {
            Some(MonthStatus::Missing)
        }
    }

    /// The twelve months of `year` with their status, January first.
    pub fn year_grid(&self, year: i32) -> Vec<MonthCell> {
        (1..=12)
            .filter_map(|m| MonthKey::new(year, m))
            .map(|month| MonthCell {
                month,
                label: month.label(),
                status: self.month_status(month),
            })
            .collect()
    }
}

/// Builds the reconciliation summary for one customer.
///
/// Sales invoices (`SAL`) mark active months and fix the start of the
/// range. Discount bills (`BIL`) mark posted months. Rows whose date cell
/// cannot be read still count toward `total_discounts` but contribute no
/// month.
///
/// The range starts at the earliest sales month. Without sales it falls
/// back to the earliest posted or reconciled month, then to January of
/// `current_month`'s year.
pub fn compute_summary<'a, I>(
    entry: &DiscountTrackerEntry,
    invoices: I,
    current_month: MonthKey,
) -> DiscountSummary
where
    I: IntoIterator<Item = &'a InvoiceRow>,
{
    let mut sales_months = BTreeSet::new();
    let mut bills: BTreeMap<MonthKey, (usize, Decimal)> = BTreeMap::new();
    let mut total_discounts = Decimal::ZERO;

    for invoice in invoices {
        match invoice.kind() {
            DocumentKind::Sale => {
                if let Some(month) = invoice.month() {
                    sales_months.insert(month);
                }
            }
            DocumentKind::DiscountBill => {
                total_discounts += invoice.net_credit();
                if let Some(month) = invoice.month() {
                    let slot = bills.entry(month).or_insert((0, Decimal::ZERO));
                    slot.0 += 1;
                    slot.1 += invoice.net_credit();
                }
            }
            _ => {}
        }
    }

    let reconciled: BTreeSet<MonthKey> = entry.reconciled_keys().into_iter().collect();

    let start_month = sales_months
        .first()
        .copied()
        .or_else(|| {
            let first_bill = bills.keys().next().copied();
            let first_reconciled = reconciled.first().copied();
            first_bill.into_iter().chain(first_reconciled).min()
        })
        .unwrap_or_else(|| current_month.january());

    let posted_months: Vec<PostedMonth> = bills
        .range(..=current_month)
        .map(|(month, (count, amount))| PostedMonth {
            month: *month,
            count: *count,
            amount: *amount,
            duplicate: *count > 1,
        })
        .collect();

    let mut reconciled_months = Vec::new();
    let mut missing_months = Vec::new();
    for month in MonthKey::range(start_month, current_month) {
        if bills.contains_key(&month) {
            continue;
        }
        if reconciled.contains(&month) {
            reconciled_months.push(month);
        } else {
            missing_months.push(month);
        }
    }

    let duplicate_months = posted_months
        .iter()
        .filter(|p| p.duplicate)
        .map(|p| p.month)
        .collect();

    let active_months_count = sales_months.len();
    let average_monthly_discount = if active_months_count == 0 {
        Decimal::ZERO
    } else {
        (total_discounts / Decimal::from(active_months_count)).round_dp(2)
    };

    DiscountSummary {
        customer_name: entry.customer_name.clone(),
        start_month,
        current_month,
        posted_months,
        reconciled_months,
        missing_months,
        duplicate_months,
        total_discounts,
        average_monthly_discount,
        active_months_count,
        monthly_rebate: entry.monthly_rebate,
        q_rent: entry.q_rent,
        b_rent: entry.b_rent,
    }
}

/// Summarizes every tracker entry against the full ledger.
///
/// Ledger rows are matched to entries by trimmed customer name. Output
/// order follows `entries`.
pub fn summarize_all(
    invoices: &[InvoiceRow],
    entries: &[DiscountTrackerEntry],
    current_month: MonthKey,
) -> Vec<DiscountSummary> {
    let mut by_customer: HashMap<&str, Vec<&InvoiceRow>> = HashMap::new();
    for invoice in invoices {
        by_customer
            .entry(invoice.customer_name.trim())
            .or_default()
            .push(invoice);
    }

    entries
        .iter()
        .map(|entry| {
            let rows = by_customer
                .get(entry.customer_name.trim())
                .map(Vec::as_slice)
                .unwrap_or_default();
            compute_summary(entry, rows.iter().copied(), current_month)
        })
        .collect()
}
